//! Per-transaction lifecycle hooks.
//!
//! A caller hands a [`LifecycleCallbacks`] set to the orchestrator. The
//! dry-run and `transactionSent` hooks fire from the orchestrator itself;
//! `transactionCompleted` / `transactionFailed` travel with the
//! `ENRICH_PENDING_TRANSACTION` update so the external confirmation tracker
//! can fire them against the same set.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::Bytes;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// Opaque handle assigned by the submission layer to a sent transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(pub u64);

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that happened to one orchestrated call.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Raw return data of the successful simulation.
    DryRunSucceeded(Bytes),
    /// Decoded revert reason.
    DryRunFailed(String),
    TransactionSent(StackId),
    /// Transaction hash of the mined transaction.
    TransactionCompleted(String),
    /// Failure description reported by the confirmation tracker.
    TransactionFailed(String),
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::DryRunSucceeded(_) => "dryRunSucceeded",
            LifecycleEvent::DryRunFailed(_) => "dryRunFailed",
            LifecycleEvent::TransactionSent(_) => "transactionSent",
            LifecycleEvent::TransactionCompleted(_) => "transactionCompleted",
            LifecycleEvent::TransactionFailed(_) => "transactionFailed",
        }
    }
}

type Hook<T> = Arc<dyn Fn(T) + Send + Sync>;

/// The hooks a caller asked for. Unset hooks are skipped silently.
#[derive(Clone, Default)]
pub struct LifecycleCallbacks {
    dry_run_succeeded: Option<Hook<Bytes>>,
    dry_run_failed: Option<Hook<String>>,
    transaction_sent: Option<Hook<StackId>>,
    transaction_completed: Option<Hook<String>>,
    transaction_failed: Option<Hook<String>>,
}

impl LifecycleCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_dry_run_succeeded(mut self, f: impl Fn(Bytes) + Send + Sync + 'static) -> Self {
        self.dry_run_succeeded = Some(Arc::new(f));
        self
    }

    pub fn on_dry_run_failed(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.dry_run_failed = Some(Arc::new(f));
        self
    }

    pub fn on_transaction_sent(mut self, f: impl Fn(StackId) + Send + Sync + 'static) -> Self {
        self.transaction_sent = Some(Arc::new(f));
        self
    }

    pub fn on_transaction_completed(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.transaction_completed = Some(Arc::new(f));
        self
    }

    pub fn on_transaction_failed(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.transaction_failed = Some(Arc::new(f));
        self
    }

    /// Invoke the hook matching `event`, if one was requested.
    pub fn fire(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::DryRunSucceeded(raw) => {
                if let Some(hook) = &self.dry_run_succeeded {
                    hook(raw);
                }
            }
            LifecycleEvent::DryRunFailed(reason) => {
                if let Some(hook) = &self.dry_run_failed {
                    hook(reason);
                }
            }
            LifecycleEvent::TransactionSent(stack_id) => {
                if let Some(hook) = &self.transaction_sent {
                    hook(stack_id);
                }
            }
            LifecycleEvent::TransactionCompleted(tx_hash) => {
                if let Some(hook) = &self.transaction_completed {
                    hook(tx_hash);
                }
            }
            LifecycleEvent::TransactionFailed(reason) => {
                if let Some(hook) = &self.transaction_failed {
                    hook(reason);
                }
            }
        }
    }

    /// Names of the hooks that are set, in lifecycle order.
    pub fn requested(&self) -> Vec<&'static str> {
        [
            ("dryRunSucceeded", self.dry_run_succeeded.is_some()),
            ("dryRunFailed", self.dry_run_failed.is_some()),
            ("transactionSent", self.transaction_sent.is_some()),
            ("transactionCompleted", self.transaction_completed.is_some()),
            ("transactionFailed", self.transaction_failed.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

impl fmt::Debug for LifecycleCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.requested()).finish()
    }
}

// Hooks are not data; the store only learns which ones exist.
impl Serialize for LifecycleCallbacks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.requested();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_fire_only_reaches_requested_hooks() {
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = sent.clone();
        let callbacks = LifecycleCallbacks::new().on_transaction_sent(move |id| {
            assert_eq!(id, StackId(7));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        callbacks.fire(LifecycleEvent::DryRunFailed("nope".into()));
        callbacks.fire(LifecycleEvent::TransactionSent(StackId(7)));

        assert_eq!(sent.load(Ordering::SeqCst), 1);
        assert_eq!(callbacks.requested(), vec!["transactionSent"]);
    }

    #[test]
    fn test_serializes_as_hook_names() {
        let callbacks = LifecycleCallbacks::new()
            .on_dry_run_failed(|_| {})
            .on_transaction_completed(|_| {});
        let json = serde_json::to_value(&callbacks).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["dryRunFailed", "transactionCompleted"])
        );
    }
}
