//! JSON-RPC client for an Ethereum-compatible node.
//!
//! Requests go out over a blocking `ureq` agent on the blocking thread pool,
//! so the async callers never stall the runtime.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use fin4_types::{env_var_or, StackId};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::stack::{PendingStatus, TransactionStack};
use crate::{CallRequest, Ledger};

/// Ledger backed by a node's JSON-RPC endpoint.
///
/// Writes use `eth_sendTransaction`, so the node (or a signing proxy in
/// front of it) must hold the sender's key.
#[derive(Debug, Clone)]
pub struct JsonRpcLedger {
    endpoint: String,
    agent: ureq::Agent,
    next_id: Arc<AtomicU64>,
    stack: Arc<TransactionStack>,
}

impl JsonRpcLedger {
    /// Default request timeout in seconds (can be overridden by env).
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connect timeout in seconds (can be overridden by env).
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    fn default_timeouts() -> (Duration, Duration) {
        (
            Duration::from_secs(env_var_or(
                "FIN4_RPC_TIMEOUT_SECS",
                Self::DEFAULT_TIMEOUT_SECS,
            )),
            Duration::from_secs(env_var_or(
                "FIN4_RPC_CONNECT_TIMEOUT_SECS",
                Self::DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
        )
    }

    /// Create a client for `endpoint` with timeouts from the environment.
    pub fn new(endpoint: &str) -> Self {
        let (timeout, connect_timeout) = Self::default_timeouts();
        Self::with_timeouts(endpoint, timeout, connect_timeout)
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(endpoint: &str, timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .timeout_connect(connect_timeout)
                .build(),
            next_id: Arc::new(AtomicU64::new(1)),
            stack: Arc::new(TransactionStack::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submissions made through this client, for confirmation tracking.
    pub fn stack(&self) -> Arc<TransactionStack> {
        self.stack.clone()
    }

    async fn request(&self, method: &'static str, params: Value) -> Result<Value, ProviderError> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            request_blocking(&agent, &endpoint, id, method, params)
        })
        .await
        .map_err(|e| ProviderError::transport(format!("request task failed: {e}")))?;

        debug!(
            method,
            id,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "json-rpc request"
        );
        result
    }
}

fn request_blocking(
    agent: &ureq::Agent,
    endpoint: &str,
    id: u64,
    method: &str,
    params: Value,
) -> Result<Value, ProviderError> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    });

    let response: Value = match agent
        .post(endpoint)
        .set("Content-Type", "application/json")
        .send_json(&body)
    {
        Ok(response) => response
            .into_json()
            .map_err(|e| ProviderError::malformed(format!("unreadable response: {e}")))?,
        // Some nodes answer reverted calls with a non-2xx status and the
        // JSON-RPC error in the body.
        Err(ureq::Error::Status(code, response)) => response.into_json().map_err(|_| {
            ProviderError::transport(format!("{method} failed with HTTP status {code}"))
        })?,
        Err(e) => return Err(ProviderError::transport(format!("{method} failed: {e}"))),
    };

    parse_rpc_response(response)
}

/// Split a JSON-RPC envelope into its `result` or a [`ProviderError`].
pub fn parse_rpc_response(mut response: Value) -> Result<Value, ProviderError> {
    if let Some(error) = response.get("error") {
        if !error.is_null() {
            return Err(ProviderError::rpc(error));
        }
    }
    if let Some(result) = response.get_mut("result") {
        return Ok(result.take());
    }
    Err(ProviderError::malformed(format!(
        "response has neither result nor error: {response}"
    )))
}

fn parse_bytes(value: &Value) -> Result<Bytes, ProviderError> {
    value
        .as_str()
        .and_then(|s| Bytes::from_str(s).ok())
        .ok_or_else(|| ProviderError::malformed(format!("expected hex data, got {value}")))
}

fn parse_hash(value: &Value) -> Result<B256, ProviderError> {
    value
        .as_str()
        .and_then(|s| B256::from_str(s).ok())
        .ok_or_else(|| ProviderError::malformed(format!("expected transaction hash, got {value}")))
}

#[async_trait]
impl Ledger for JsonRpcLedger {
    async fn call(&self, request: &CallRequest) -> Result<Bytes, ProviderError> {
        let result = self
            .request("eth_call", json!([request.to_rpc_object(), "latest"]))
            .await?;
        parse_bytes(&result)
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<StackId, ProviderError> {
        let stack_id = self.stack.push(request.clone());
        let this = self.clone();
        let params = json!([request.to_rpc_object()]);

        tokio::spawn(async move {
            let status = match this.request("eth_sendTransaction", params).await {
                Ok(value) => match parse_hash(&value) {
                    Ok(tx_hash) => PendingStatus::Sent { tx_hash },
                    Err(e) => PendingStatus::Rejected {
                        reason: e.to_string(),
                    },
                },
                Err(e) => {
                    warn!(stack_id = stack_id.0, error = %e, "node rejected transaction");
                    PendingStatus::Rejected {
                        reason: e.to_string(),
                    }
                }
            };
            this.stack.resolve(stack_id, status);
        });

        Ok(stack_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;

    #[test]
    fn test_parse_rpc_response_result() {
        let result = parse_rpc_response(json!({"jsonrpc": "2.0", "id": 1, "result": "0x01"}));
        assert_eq!(result.unwrap(), json!("0x01"));
    }

    #[test]
    fn test_parse_rpc_response_error_keeps_error_object_in_text() {
        let err = parse_rpc_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "VM Exception", "data": {}}
        }))
        .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Rpc);
        assert!(err.message.starts_with("Error: {"));
        assert!(err.message.contains("\"code\":-32000"));
    }

    #[test]
    fn test_parse_rpc_response_missing_result() {
        let err = parse_rpc_response(json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
    }

    #[test]
    fn test_parse_bytes() {
        assert_eq!(
            parse_bytes(&json!("0xdeadbeef")).unwrap(),
            Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef])
        );
        assert!(parse_bytes(&json!(12)).is_err());
    }

    #[test]
    fn test_new_uses_endpoint() {
        let ledger = JsonRpcLedger::new("http://127.0.0.1:8545");
        assert_eq!(ledger.endpoint(), "http://127.0.0.1:8545");
        assert!(ledger.stack().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_node_settles_as_rejected() {
        let ledger = JsonRpcLedger::with_timeouts(
            "http://127.0.0.1:1",
            Duration::from_secs(2),
            Duration::from_secs(2),
        );
        let request = CallRequest {
            from: alloy_primitives::Address::repeat_byte(0x11),
            to: alloy_primitives::Address::repeat_byte(0x22),
            data: Bytes::from_static(&[0x01, 0x02, 0x03, 0x04]),
        };

        let id = ledger.send_transaction(&request).await.unwrap();
        assert!(matches!(
            ledger.stack().settled(id).await,
            Some(PendingStatus::Rejected { .. })
        ));
    }
}
