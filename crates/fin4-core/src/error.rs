//! Error taxonomy for call construction, reads and submission.
//!
//! Construction errors (`UnknownMethod`, `UnregisteredContract`, argument
//! mismatches) are caller bugs and are never retried. A rejected dry run is
//! not an error at all; it comes back as data in the submit report.

use fin4_transport::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("contract {contract} has no method named {method}")]
    UnknownMethod { contract: String, method: String },

    #[error("contract {0} is not registered")]
    UnregisteredContract(String),

    #[error("{contract}.{method} expects {expected} arguments, got {got}")]
    ArgumentCount {
        contract: String,
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("{contract}.{method} argument {index}: {reason}")]
    ArgumentEncoding {
        contract: String,
        method: String,
        index: usize,
        reason: String,
    },

    #[error("could not decode return value of {contract}.{method}: {reason}")]
    ReturnDecoding {
        contract: String,
        method: String,
        reason: String,
    },

    #[error("invalid interface description for {contract}: {reason}")]
    InterfaceDescription { contract: String, reason: String },

    #[error("artifact {name}: {reason}")]
    Artifact { name: String, reason: String },

    #[error("read call {contract}.{method} failed: {source}")]
    Read {
        contract: String,
        method: String,
        source: ProviderError,
    },

    #[error("submission of {signature} failed: {source}")]
    Submission {
        signature: String,
        source: ProviderError,
    },
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
