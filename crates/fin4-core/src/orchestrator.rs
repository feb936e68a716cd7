//! Two-phase transaction orchestration.
//!
//! Every write goes `encode -> simulate -> submit`. The simulation is a
//! read-only call against current state; if it rejects, nothing is
//! submitted and the caller gets the decoded reason back as data. Callers
//! that have already validated preconditions may skip the simulation.
//!
//! Per call the states are:
//!
//! ```text
//! Idle -> Simulating -> SimulationFailed
//!                    -> SimulationSucceeded -> Submitting -> Submitted
//! Idle -> Submitting -> Submitted                                 (skipped)
//! Submitted -> Completed | Failed                         (external tracker)
//! ```

use fin4_types::{LifecycleCallbacks, LifecycleEvent, StackId, StateUpdate};
use serde::Serialize;
use tracing::{debug, info};

use crate::encoder::{CallArg, CallParams};
use crate::error::{CoreError, Result};
use crate::session::Session;
use crate::simulator::DryRunOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    Idle,
    Simulating,
    SimulationFailed,
    SimulationSucceeded,
    Submitting,
    Submitted,
    Completed,
    Failed,
}

impl TxState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TxState::SimulationFailed | TxState::Completed | TxState::Failed
        )
    }
}

/// What a caller wants written.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub contract: String,
    pub method: String,
    pub params: Vec<CallArg>,
    /// Label shown to the user; defaults to `method()`.
    pub display: Option<String>,
    pub callbacks: LifecycleCallbacks,
    pub skip_simulation: bool,
}

impl SubmitRequest {
    pub fn new(contract: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            params: Vec::new(),
            display: None,
            callbacks: LifecycleCallbacks::default(),
            skip_simulation: false,
        }
    }

    pub fn params(mut self, params: impl Into<CallParams>) -> Self {
        self.params = params.into().into_vec();
        self
    }

    pub fn display(mut self, label: impl Into<String>) -> Self {
        self.display = Some(label.into());
        self
    }

    pub fn callbacks(mut self, callbacks: LifecycleCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn skip_simulation(mut self, skip: bool) -> Self {
        self.skip_simulation = skip;
        self
    }

    fn display_label(&self) -> String {
        self.display.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    DryRunFailed { reason: String },
    Submitted { stack_id: StackId },
}

/// What happened to one submit call.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    /// Display signature, e.g. `GOV.transfer(0x..,100)`.
    pub signature: String,
    pub display: String,
    pub outcome: SubmitOutcome,
    pub transitions: Vec<TxState>,
}

/// A submitted transaction awaiting resolution by the confirmation tracker.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub stack_id: StackId,
    pub signature: String,
    pub display: String,
    pub callbacks: LifecycleCallbacks,
    state: TxState,
}

impl PendingTransaction {
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Mark mined. Returns `false` if already resolved.
    pub fn complete(&mut self, tx_hash: impl Into<String>) -> bool {
        self.resolve(TxState::Completed, LifecycleEvent::TransactionCompleted(tx_hash.into()))
    }

    /// Mark failed. Returns `false` if already resolved.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.resolve(TxState::Failed, LifecycleEvent::TransactionFailed(reason.into()))
    }

    fn resolve(&mut self, state: TxState, event: LifecycleEvent) -> bool {
        if self.state != TxState::Submitted {
            return false;
        }
        self.state = state;
        debug!(stack_id = self.stack_id.0, state = ?state, "pending transaction resolved");
        self.callbacks.fire(event);
        true
    }
}

pub struct TransactionOrchestrator<'s> {
    session: &'s Session,
}

impl<'s> TransactionOrchestrator<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Run one write through simulation and submission.
    ///
    /// Construction errors (unknown contract or method, bad arguments) and
    /// a failing submission primitive are `Err`; a rejected simulation is a
    /// normal [`SubmitOutcome::DryRunFailed`].
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitReport> {
        let display = request.display_label();
        let mut transitions = vec![TxState::Idle];

        let prepared = self
            .session
            .prepare(&request.contract, &request.method, request.params.clone())?;
        let signature = prepared.signature.clone();
        let from = self.session.default_account();

        if request.skip_simulation {
            debug!(signature = %signature, "skipping dry run");
        } else {
            transitions.push(TxState::Simulating);
            info!(signature = %signature, "initiating dry run");

            match self
                .session
                .simulator()
                .simulate(&prepared.encoded, from, prepared.contract.address)
                .await
            {
                DryRunOutcome::Failure(reason) => {
                    transitions.push(TxState::SimulationFailed);
                    info!(signature = %signature, reason = %reason, "dry run failed");
                    self.session.dispatch(StateUpdate::DryRunFailed {
                        method_str: signature.clone(),
                        display_str: display.clone(),
                        error_reason: reason.clone(),
                    });
                    request
                        .callbacks
                        .fire(LifecycleEvent::DryRunFailed(reason.clone()));
                    return Ok(SubmitReport {
                        signature,
                        display,
                        outcome: SubmitOutcome::DryRunFailed { reason },
                        transitions,
                    });
                }
                DryRunOutcome::Success(raw) => {
                    transitions.push(TxState::SimulationSucceeded);
                    request.callbacks.fire(LifecycleEvent::DryRunSucceeded(raw));
                }
            }
        }

        transitions.push(TxState::Submitting);
        let stack_id = self
            .session
            .ledger()
            .send_transaction(&prepared.to_request(from))
            .await
            .map_err(|source| CoreError::Submission {
                signature: signature.clone(),
                source,
            })?;
        transitions.push(TxState::Submitted);
        info!(signature = %signature, stack_id = stack_id.0, "transaction sent");

        request
            .callbacks
            .fire(LifecycleEvent::TransactionSent(stack_id));
        self.session.dispatch(StateUpdate::EnrichPendingTransaction {
            stack_id,
            method_str: signature.clone(),
            display_str: display.clone(),
            callbacks: request.callbacks,
        });

        Ok(SubmitReport {
            signature,
            display,
            outcome: SubmitOutcome::Submitted { stack_id },
            transitions,
        })
    }

    /// Like [`submit`](Self::submit), but hands back the submitted
    /// transaction for local resolution instead of only publishing it.
    pub async fn submit_tracked(
        &self,
        request: SubmitRequest,
    ) -> Result<(SubmitReport, Option<PendingTransaction>)> {
        let callbacks = request.callbacks.clone();
        let report = self.submit(request).await?;
        let pending = match report.outcome {
            SubmitOutcome::Submitted { stack_id } => Some(PendingTransaction {
                stack_id,
                signature: report.signature.clone(),
                display: report.display.clone(),
                callbacks,
                state: TxState::Submitted,
            }),
            SubmitOutcome::DryRunFailed { .. } => None,
        };
        Ok((report, pending))
    }
}
