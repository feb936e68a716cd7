//! Fin4 Transport Layer
//!
//! Remote ledger access for the orchestrator and the fetch aggregator.
//!
//! This crate provides:
//! - [`Ledger`]: the two remote primitives everything else is built on,
//!   a read-only call and a fire-and-forget submission
//! - [`jsonrpc`]: [`JsonRpcLedger`], the node-backed implementation
//! - [`stack`]: [`TransactionStack`], the local record of submissions
//! - `test_utils` (feature `test-utils`): `MockLedger` for tests
//!
//! # Example
//!
//! ```ignore
//! use fin4_transport::{CallRequest, JsonRpcLedger, Ledger};
//!
//! let ledger = JsonRpcLedger::new("http://127.0.0.1:8545");
//! let raw = ledger.call(&CallRequest { from, to, data }).await?;
//! ```

pub mod error;
pub mod jsonrpc;
pub mod stack;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use fin4_types::{env_string_or, StackId};
use serde_json::{json, Value};

pub use error::{ProviderError, ProviderErrorKind};
pub use jsonrpc::JsonRpcLedger;
pub use stack::{PendingStatus, StackEntry, TransactionStack};

/// Default local development node.
pub const DEFAULT_RPC_ENDPOINT: &str = "http://127.0.0.1:8545";

/// One invocation addressed to a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    /// Selector followed by the ABI-encoded parameters.
    pub data: Bytes,
}

impl CallRequest {
    /// The transaction-call object shared by `eth_call` and
    /// `eth_sendTransaction`.
    pub fn to_rpc_object(&self) -> Value {
        json!({
            "from": self.from,
            "to": self.to,
            "data": self.data,
        })
    }
}

/// The remote ledger as seen by this layer.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Execute `request` read-only against current state and return the raw
    /// return data. Never mutates chain state.
    async fn call(&self, request: &CallRequest) -> Result<Bytes, ProviderError>;

    /// Queue `request` for submission and return its stack id immediately.
    /// Mining and confirmation are tracked elsewhere.
    async fn send_transaction(&self, request: &CallRequest) -> Result<StackId, ProviderError>;
}

/// Create a JSON-RPC ledger for the endpoint in `FIN4_RPC_ENDPOINT`
/// (default: [`DEFAULT_RPC_ENDPOINT`]).
pub fn create_ledger_from_env() -> JsonRpcLedger {
    JsonRpcLedger::new(&env_string_or("FIN4_RPC_ENDPOINT", DEFAULT_RPC_ENDPOINT))
}
