//! State-update messages and the sinks they are published to.
//!
//! The application-state store is never mutated directly. Every result
//! leaves this layer as one [`StateUpdate`] handed to a [`Dispatch`] sink,
//! so concurrent publishers only ever append.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::encoding::decimal;
use crate::lifecycle::{LifecycleCallbacks, StackId};
use crate::records::{
    Claim, Collection, Fin4Token, Message, ParameterizerParam, SourcererPair, Submission,
    SystemParameter, Underlying, VerifierType,
};

/// A `{type, payload}` message for the application-state store.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StateUpdate {
    #[serde(rename = "DRY_RUN_FAILED", rename_all = "camelCase")]
    DryRunFailed {
        method_str: String,
        display_str: String,
        error_reason: String,
    },

    #[serde(rename = "ENRICH_PENDING_TRANSACTION", rename_all = "camelCase")]
    EnrichPendingTransaction {
        stack_id: StackId,
        method_str: String,
        display_str: String,
        callbacks: LifecycleCallbacks,
    },

    #[serde(rename = "ADD_CONTRACT", rename_all = "camelCase")]
    AddContract {
        contract_name: String,
        address: Address,
        events: Vec<String>,
    },

    #[serde(rename = "ADD_MULTIPLE_FIN4_TOKENS", rename_all = "camelCase")]
    AddMultipleFin4Tokens {
        tokens_obj: BTreeMap<Address, Fin4Token>,
    },

    #[serde(rename = "ADD_MULTIPLE_CLAIMS", rename_all = "camelCase")]
    AddMultipleClaims { claim_arr: Vec<Claim> },

    #[serde(rename = "ADD_MULTIPLE_COLLECTIONS", rename_all = "camelCase")]
    AddMultipleCollections { collections_arr: Vec<Collection> },

    #[serde(rename = "ADD_MULTIPLE_SUBMISSIONS", rename_all = "camelCase")]
    AddMultipleSubmissions { submissions_arr: Vec<Submission> },

    #[serde(rename = "ADD_MULTIPLE_VERIFIER_TYPES", rename_all = "camelCase")]
    AddMultipleVerifierTypes { verifier_types_arr: Vec<VerifierType> },

    #[serde(rename = "ADD_MULTIPLE_MESSAGES", rename_all = "camelCase")]
    AddMultipleMessages { messages_arr: Vec<Message> },

    #[serde(rename = "SET_UNDERLYINGS", rename_all = "camelCase")]
    SetUnderlyings {
        all_underlyings: BTreeMap<String, Underlying>,
    },

    #[serde(rename = "SET_SOURCERER_PAIRS", rename_all = "camelCase")]
    SetSourcererPairs { sourcerer_pairs: Vec<SourcererPair> },

    #[serde(rename = "UPDATE_MULTIPLE_BALANCES", rename_all = "camelCase")]
    UpdateMultipleBalances {
        token_addresses: Vec<Address>,
        #[serde(with = "decimal::vec")]
        balances: Vec<U256>,
    },

    #[serde(rename = "UPDATE_GOVERNANCE_BALANCE", rename_all = "camelCase")]
    UpdateGovernanceBalance {
        token_address: Address,
        #[serde(with = "decimal")]
        balance: U256,
    },

    #[serde(rename = "SET_SYSTEM_PARAMETER", rename_all = "camelCase")]
    SetSystemParameter { parameter: SystemParameter },

    #[serde(rename = "SET_PARAMETERIZER_PARAMS", rename_all = "camelCase")]
    SetParameterizerParams {
        params_obj: BTreeMap<String, ParameterizerParam>,
    },

    #[serde(rename = "MARK_FIN4TOKEN_AS_OPAT", rename_all = "camelCase")]
    MarkFin4TokenAsOpat { lower_case_token_address: String },
}

impl StateUpdate {
    /// The wire `type` discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            StateUpdate::DryRunFailed { .. } => "DRY_RUN_FAILED",
            StateUpdate::EnrichPendingTransaction { .. } => "ENRICH_PENDING_TRANSACTION",
            StateUpdate::AddContract { .. } => "ADD_CONTRACT",
            StateUpdate::AddMultipleFin4Tokens { .. } => "ADD_MULTIPLE_FIN4_TOKENS",
            StateUpdate::AddMultipleClaims { .. } => "ADD_MULTIPLE_CLAIMS",
            StateUpdate::AddMultipleCollections { .. } => "ADD_MULTIPLE_COLLECTIONS",
            StateUpdate::AddMultipleSubmissions { .. } => "ADD_MULTIPLE_SUBMISSIONS",
            StateUpdate::AddMultipleVerifierTypes { .. } => "ADD_MULTIPLE_VERIFIER_TYPES",
            StateUpdate::AddMultipleMessages { .. } => "ADD_MULTIPLE_MESSAGES",
            StateUpdate::SetUnderlyings { .. } => "SET_UNDERLYINGS",
            StateUpdate::SetSourcererPairs { .. } => "SET_SOURCERER_PAIRS",
            StateUpdate::UpdateMultipleBalances { .. } => "UPDATE_MULTIPLE_BALANCES",
            StateUpdate::UpdateGovernanceBalance { .. } => "UPDATE_GOVERNANCE_BALANCE",
            StateUpdate::SetSystemParameter { .. } => "SET_SYSTEM_PARAMETER",
            StateUpdate::SetParameterizerParams { .. } => "SET_PARAMETERIZER_PARAMS",
            StateUpdate::MarkFin4TokenAsOpat { .. } => "MARK_FIN4TOKEN_AS_OPAT",
        }
    }
}

/// Destination for state updates.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, update: StateUpdate);
}

/// Forwards updates into an unbounded channel drained by the store.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<StateUpdate>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StateUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Dispatch for ChannelDispatcher {
    fn dispatch(&self, update: StateUpdate) {
        let kind = update.kind();
        if self.tx.send(update).is_err() {
            debug!(kind, "state store receiver dropped; discarding update");
        }
    }
}

/// Keeps every update in memory. Used by tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    updates: Mutex<Vec<StateUpdate>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything dispatched so far, in dispatch order.
    pub fn updates(&self) -> Vec<StateUpdate> {
        self.updates.lock().clone()
    }

    /// Updates whose `type` is `kind`.
    pub fn of_kind(&self, kind: &str) -> Vec<StateUpdate> {
        self.updates
            .lock()
            .iter()
            .filter(|u| u.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.lock().is_empty()
    }

    pub fn take(&self) -> Vec<StateUpdate> {
        std::mem::take(&mut *self.updates.lock())
    }
}

impl Dispatch for RecordingDispatcher {
    fn dispatch(&self, update: StateUpdate) {
        self.updates.lock().push(update);
    }
}
