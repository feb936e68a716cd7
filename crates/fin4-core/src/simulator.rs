//! Dry-run simulation.

use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::{Address, Bytes};
use fin4_transport::{CallRequest, Ledger};
use tracing::{debug, warn};

use crate::encoder::EncodedCall;
use crate::provider_error::ProviderErrorDecoder;

/// Result of a read-only simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DryRunOutcome {
    /// Raw return data.
    Success(Bytes),
    /// Decoded revert reason, empty when the provider error could not be decoded.
    Failure(String),
}

impl DryRunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DryRunOutcome::Success(_))
    }
}

/// Runs an encoded call against current state without committing it.
#[derive(Clone)]
pub struct DryRunSimulator {
    ledger: Arc<dyn Ledger>,
    decoder: Arc<dyn ProviderErrorDecoder>,
}

impl DryRunSimulator {
    pub fn new(ledger: Arc<dyn Ledger>, decoder: Arc<dyn ProviderErrorDecoder>) -> Self {
        Self { ledger, decoder }
    }

    pub async fn simulate(&self, call: &EncodedCall, from: Address, to: Address) -> DryRunOutcome {
        let request = CallRequest {
            from,
            to,
            data: call.data.clone(),
        };
        let started = Instant::now();

        match self.ledger.call(&request).await {
            Ok(raw) => {
                debug!(
                    %to,
                    selector = %call.selector,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "dry run succeeded"
                );
                DryRunOutcome::Success(raw)
            }
            Err(error) => {
                let raw = error.to_string();
                let reason = match self.decoder.decode(&raw) {
                    Ok(reason) => reason,
                    Err(unparsable) => {
                        warn!(%to, error = %unparsable, raw = %raw, "could not decode dry run failure");
                        String::new()
                    }
                };
                debug!(
                    %to,
                    selector = %call.selector,
                    reason = %reason,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "dry run failed"
                );
                DryRunOutcome::Failure(reason)
            }
        }
    }
}

impl std::fmt::Debug for DryRunSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DryRunSimulator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider_error::default_decoder;
    use alloy_primitives::Selector;
    use fin4_transport::test_utils::MockLedger;
    use fin4_transport::ProviderError;

    fn call() -> EncodedCall {
        EncodedCall {
            selector: Selector::from([1, 2, 3, 4]),
            data: Bytes::from_static(&[1, 2, 3, 4]),
        }
    }

    #[tokio::test]
    async fn test_success_returns_raw_value() {
        let ledger = Arc::new(MockLedger::new());
        let to = Address::repeat_byte(7);
        ledger.respond(to, vec![1u8, 2, 3, 4], vec![0u8; 32]);
        let simulator = DryRunSimulator::new(ledger.clone(), Arc::new(default_decoder()));

        let outcome = simulator.simulate(&call(), Address::ZERO, to).await;
        assert_eq!(outcome, DryRunOutcome::Success(Bytes::from(vec![0u8; 32])));
        assert_eq!(ledger.calls()[0].from, Address::ZERO);
    }

    #[tokio::test]
    async fn test_rejection_is_decoded() {
        let ledger = Arc::new(MockLedger::new());
        let to = Address::repeat_byte(7);
        ledger.reject(
            to,
            vec![1u8, 2, 3, 4],
            ProviderError::rpc(&serde_json::json!({
                "code": -32000,
                "data": {"0xfeed": {"reason": "insufficient balance"}}
            })),
        );
        let simulator = DryRunSimulator::new(ledger, Arc::new(default_decoder()));

        let outcome = simulator.simulate(&call(), Address::ZERO, to).await;
        assert_eq!(outcome, DryRunOutcome::Failure("insufficient balance".into()));
    }

    #[tokio::test]
    async fn test_unparsable_error_degrades_to_empty_reason() {
        let ledger = Arc::new(MockLedger::new());
        let simulator = DryRunSimulator::new(ledger, Arc::new(default_decoder()));

        // No mock response: the ledger reports a plain transport error.
        let outcome = simulator
            .simulate(&call(), Address::ZERO, Address::repeat_byte(9))
            .await;
        assert_eq!(outcome, DryRunOutcome::Failure(String::new()));
        assert!(!outcome.is_success());
    }
}
