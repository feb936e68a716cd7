//! Local record of submitted transactions.
//!
//! Submission is fire-and-forget: the ledger assigns a [`StackId`] as soon
//! as a transaction is queued and resolves the entry once the node answers.
//! An external confirmation tracker polls entries by id, or awaits
//! [`TransactionStack::settled`].

use alloy_primitives::B256;
use fin4_types::StackId;
use parking_lot::RwLock;
use tokio::sync::Notify;

use crate::CallRequest;

/// Where a queued transaction currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingStatus {
    /// Handed to the node, no answer yet.
    Queued,
    /// Accepted by the node.
    Sent { tx_hash: B256 },
    /// Refused by the node before a hash was assigned.
    Rejected { reason: String },
}

#[derive(Debug, Clone)]
pub struct StackEntry {
    pub request: CallRequest,
    pub status: PendingStatus,
}

/// Append-only list of submissions; the index is the stack id.
#[derive(Debug, Default)]
pub struct TransactionStack {
    entries: RwLock<Vec<StackEntry>>,
    resolved: Notify,
}

impl TransactionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request and return its id.
    pub fn push(&self, request: CallRequest) -> StackId {
        let mut entries = self.entries.write();
        entries.push(StackEntry {
            request,
            status: PendingStatus::Queued,
        });
        StackId((entries.len() - 1) as u64)
    }

    /// Record the node's answer. Unknown ids are ignored.
    pub fn resolve(&self, id: StackId, status: PendingStatus) {
        if let Some(entry) = self.entries.write().get_mut(id.0 as usize) {
            entry.status = status;
        }
        self.resolved.notify_waiters();
    }

    /// Wait until the node has answered for `id`. `None` for unknown ids.
    pub async fn settled(&self, id: StackId) -> Option<PendingStatus> {
        loop {
            let resolved = self.resolved.notified();
            match self.status(id)? {
                PendingStatus::Queued => resolved.await,
                status => return Some(status),
            }
        }
    }

    pub fn status(&self, id: StackId) -> Option<PendingStatus> {
        self.entries
            .read()
            .get(id.0 as usize)
            .map(|entry| entry.status.clone())
    }

    pub fn get(&self, id: StackId) -> Option<StackEntry> {
        self.entries.read().get(id.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};

    fn request() -> CallRequest {
        CallRequest {
            from: Address::repeat_byte(0x11),
            to: Address::repeat_byte(0x22),
            data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        }
    }

    #[test]
    fn test_ids_are_sequential() {
        let stack = TransactionStack::new();
        assert_eq!(stack.push(request()), StackId(0));
        assert_eq!(stack.push(request()), StackId(1));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.status(StackId(1)), Some(PendingStatus::Queued));
    }

    #[test]
    fn test_resolve_updates_only_known_entries() {
        let stack = TransactionStack::new();
        let id = stack.push(request());
        stack.resolve(
            id,
            PendingStatus::Sent {
                tx_hash: B256::repeat_byte(0x01),
            },
        );
        stack.resolve(StackId(99), PendingStatus::Queued);

        assert!(matches!(stack.status(id), Some(PendingStatus::Sent { .. })));
        assert!(stack.status(StackId(99)).is_none());
    }

    #[tokio::test]
    async fn test_settled_waits_for_resolution() {
        let stack = std::sync::Arc::new(TransactionStack::new());
        let id = stack.push(request());
        assert!(stack.settled(StackId(7)).await.is_none());

        let resolver = stack.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            resolver.resolve(
                id,
                PendingStatus::Rejected {
                    reason: "unknown account".into(),
                },
            );
        });

        assert_eq!(
            stack.settled(id).await,
            Some(PendingStatus::Rejected {
                reason: "unknown account".into()
            })
        );
    }
}
