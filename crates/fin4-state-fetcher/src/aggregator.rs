//! Dependent-fetch aggregation.
//!
//! A [`FetchPlan`] describes one collection: a root listing, a per-key
//! expansion (detail reads plus any nested listing), and the state updates
//! the assembled result is published as. [`run_plan`] executes a plan with
//! every expansion in flight at once and joins them in listing order.
//!
//! Publishing is all-or-nothing: if any read of any key fails, the plan
//! publishes nothing and the caller gets [`FetchError::Aggregate`].

use std::fmt;
use std::time::Instant;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use fin4_core::{CoreError, Session};
use fin4_types::StateUpdate;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::error::{FetchError, Result};

/// Key of one assembled record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Address(Address),
    Id(U256),
    /// e.g. `<token>_<claimId>` when one parent key expands to many records.
    Composite(String),
    Name(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Address(a) => write!(f, "{a}"),
            EntityKey::Id(id) => write!(f, "{id}"),
            EntityKey::Composite(s) | EntityKey::Name(s) => f.write_str(s),
        }
    }
}

/// Assembled records of one plan execution, in listing order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    entries: Vec<(EntityKey, T)>,
}

impl<T> Default for AggregateResult<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> AggregateResult<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: EntityKey, record: T) {
        self.entries.push((key, record));
    }

    pub fn get(&self, key: &EntityKey) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EntityKey, T)> {
        self.entries.iter()
    }

    pub fn into_records(self) -> Vec<T> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> IntoIterator for AggregateResult<T> {
    type Item = (EntityKey, T);
    type IntoIter = std::vec::IntoIter<(EntityKey, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The shape of one dependent read.
#[async_trait]
pub trait FetchPlan: Send + Sync {
    /// Root listing key (address, index, or a listing row).
    type Key: Send + Sync;
    type Record: Send;

    /// Collection name used in logs and errors.
    const NAME: &'static str;

    /// Root listing call.
    async fn list(&self, session: &Session) -> std::result::Result<Vec<Self::Key>, CoreError>;

    /// Detail and nested reads for one listed key. May yield several records
    /// (flattened under composite keys) or none.
    async fn expand(
        &self,
        session: &Session,
        key: &Self::Key,
    ) -> std::result::Result<Vec<(EntityKey, Self::Record)>, CoreError>;

    /// The updates the complete result is published as.
    fn publish(&self, result: &AggregateResult<Self::Record>) -> Vec<StateUpdate>;
}

/// Execute `plan` without publishing.
pub async fn execute<P: FetchPlan>(
    session: &Session,
    plan: &P,
) -> Result<AggregateResult<P::Record>> {
    let aggregate = |source| FetchError::Aggregate {
        plan: P::NAME,
        source,
    };
    let started = Instant::now();

    let keys = plan.list(session).await.map_err(aggregate)?;
    debug!(plan = P::NAME, keys = keys.len(), "root listing fetched");

    let expanded = try_join_all(keys.iter().map(|key| plan.expand(session, key)))
        .await
        .map_err(aggregate)?;

    let mut result = AggregateResult::new();
    for (key, record) in expanded.into_iter().flatten() {
        result.insert(key, record);
    }
    debug!(
        plan = P::NAME,
        keys = keys.len(),
        records = result.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetch plan joined"
    );
    Ok(result)
}

/// Execute `plan` and publish its updates, or publish nothing on failure.
pub async fn run_plan<P: FetchPlan>(
    session: &Session,
    plan: &P,
) -> Result<AggregateResult<P::Record>> {
    info!(plan = P::NAME, "fetch plan started");
    let result = match execute(session, plan).await {
        Ok(result) => result,
        Err(e) => {
            warn!(plan = P::NAME, error = %e, "fetch plan failed; nothing published");
            return Err(e);
        }
    };

    let updates = plan.publish(&result);
    let published = updates.len();
    for update in updates {
        session.dispatch(update);
    }
    info!(plan = P::NAME, records = result.len(), published, "fetch plan finished");
    Ok(result)
}

/// `0..count` as listing keys for count-then-index contracts.
pub(crate) fn indices(count: u64) -> Vec<u64> {
    (0..count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fin4_core::ArtifactStore;
    use fin4_transport::test_utils::MockLedger;
    use fin4_types::RecordingDispatcher;
    use std::sync::Arc;

    /// Lists `keys`; expanding key 0 fails when `fail_zero` is set.
    struct NumberPlan {
        keys: Vec<u64>,
        fail_zero: bool,
    }

    #[async_trait]
    impl FetchPlan for NumberPlan {
        type Key = u64;
        type Record = u64;
        const NAME: &'static str = "numbers";

        async fn list(&self, _session: &Session) -> std::result::Result<Vec<u64>, CoreError> {
            Ok(self.keys.clone())
        }

        async fn expand(
            &self,
            _session: &Session,
            key: &u64,
        ) -> std::result::Result<Vec<(EntityKey, u64)>, CoreError> {
            if self.fail_zero && *key == 0 {
                return Err(CoreError::UnregisteredContract("Numbers".into()));
            }
            Ok(vec![(EntityKey::Id(U256::from(*key)), key * 10)])
        }

        fn publish(&self, result: &AggregateResult<u64>) -> Vec<StateUpdate> {
            vec![StateUpdate::AddMultipleClaims {
                claim_arr: Vec::with_capacity(result.len()),
            }]
        }
    }

    fn session(recorder: Arc<RecordingDispatcher>) -> Session {
        Session::new(
            Arc::new(MockLedger::new()),
            ArtifactStore::in_memory(),
            recorder,
            Address::ZERO,
        )
    }

    #[tokio::test]
    async fn test_joins_in_listing_order_and_publishes_once() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let session = session(recorder.clone());
        let plan = NumberPlan {
            keys: vec![3, 1, 2],
            fail_zero: false,
        };

        let result = run_plan(&session, &plan).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.clone().into_records(), vec![30, 10, 20]);
        assert_eq!(result.get(&EntityKey::Id(U256::from(1))), Some(&10));
        assert_eq!(recorder.len(), 1);
    }

    #[tokio::test]
    async fn test_one_failing_key_publishes_nothing() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let session = session(recorder.clone());
        let plan = NumberPlan {
            keys: vec![1, 0, 2],
            fail_zero: true,
        };

        let err = run_plan(&session, &plan).await.unwrap_err();
        assert!(matches!(err, FetchError::Aggregate { plan: "numbers", .. }));
        assert!(recorder.is_empty());
    }

    #[tokio::test]
    async fn test_empty_listing_still_publishes() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let session = session(recorder.clone());
        let plan = NumberPlan {
            keys: vec![],
            fail_zero: false,
        };

        assert!(run_plan(&session, &plan).await.unwrap().is_empty());
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_entity_key_display() {
        assert_eq!(EntityKey::Id(U256::from(7)).to_string(), "7");
        assert_eq!(EntityKey::Composite("0xab_1".into()).to_string(), "0xab_1");
    }
}
