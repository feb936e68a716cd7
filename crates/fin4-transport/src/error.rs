//! Errors surfaced by the remote node.

use serde_json::Value;

/// What kind of failure the node client reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The node answered with a JSON-RPC error object.
    Rpc,
    /// The request never produced a JSON-RPC answer.
    Transport,
    /// The node answered with something that is not a valid result.
    Malformed,
}

/// An opaque error from the node client.
///
/// Callers that need a revert reason must go through a provider-error
/// decoder; the rendered `message` is the only contract and its layout
/// follows whatever the node emits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Render a JSON-RPC `error` object the way node clients print it:
    /// a prefix followed by the serialized object.
    pub fn rpc(error: &Value) -> Self {
        Self::new(ProviderErrorKind::Rpc, format!("Error: {error}"))
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }
}
