//! Per-session context.
//!
//! A [`Session`] is created when a user connects and dropped when they
//! leave. It owns the contract registry and artifact store and is passed by
//! reference to the orchestrator and every fetch plan.

use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::Address;
use fin4_transport::Ledger;
use fin4_types::{Dispatch, StateUpdate};
use tracing::debug;

use crate::artifacts::ArtifactStore;
use crate::decode::FromReturn;
use crate::encoder::{encode_call, CallDescriptor, CallParams, PreparedCall};
use crate::error::{CoreError, Result};
use crate::provider_error::{default_decoder, ProviderErrorDecoder};
use crate::registry::{ContractHandle, ContractRegistry};
use crate::simulator::DryRunSimulator;

pub struct Session {
    ledger: Arc<dyn Ledger>,
    registry: ContractRegistry,
    artifacts: ArtifactStore,
    dispatcher: Arc<dyn Dispatch>,
    decoder: Arc<dyn ProviderErrorDecoder>,
    default_account: Address,
}

impl Session {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        artifacts: ArtifactStore,
        dispatcher: Arc<dyn Dispatch>,
        default_account: Address,
    ) -> Self {
        Self {
            ledger,
            registry: ContractRegistry::new(),
            artifacts,
            dispatcher,
            decoder: Arc::new(default_decoder()),
            default_account,
        }
    }

    /// Replace the provider-error decoder used for dry runs.
    pub fn with_decoder(mut self, decoder: Arc<dyn ProviderErrorDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn default_account(&self) -> Address {
        self.default_account
    }

    pub fn simulator(&self) -> DryRunSimulator {
        DryRunSimulator::new(self.ledger.clone(), self.decoder.clone())
    }

    pub fn dispatch(&self, update: StateUpdate) {
        self.dispatcher.dispatch(update);
    }

    pub fn contract(&self, name: &str) -> Result<Arc<ContractHandle>> {
        self.registry.lookup(name)
    }

    /// Encode `method` on the registered contract `contract`.
    pub fn prepare(
        &self,
        contract: &str,
        method: &str,
        params: impl Into<CallParams>,
    ) -> Result<PreparedCall> {
        let handle = self.registry.lookup(contract)?;
        encode_call(&CallDescriptor::new(handle, method, params))
    }

    /// Load the interface of `artifact`, register it as `name` at `address`
    /// and announce it with `ADD_CONTRACT`.
    pub fn add_contract(
        &self,
        name: &str,
        artifact: &str,
        address: Address,
        events: Vec<String>,
    ) -> Result<Arc<ContractHandle>> {
        let interface = self.artifacts.interface(artifact)?;
        let handle = self
            .registry
            .register(name, address, interface, events.clone());
        self.dispatch(StateUpdate::AddContract {
            contract_name: name.to_string(),
            address,
            events,
        });
        Ok(handle)
    }

    /// Read-only call from the default account, decoded into `R`.
    pub async fn read<R: FromReturn>(
        &self,
        contract: &str,
        method: &str,
        params: impl Into<CallParams>,
    ) -> Result<R> {
        let prepared = self.prepare(contract, method, params)?;
        self.read_prepared(&prepared).await
    }

    pub async fn read_prepared<R: FromReturn>(&self, prepared: &PreparedCall) -> Result<R> {
        let started = Instant::now();
        let raw = self
            .ledger
            .call(&prepared.to_request(self.default_account))
            .await
            .map_err(|source| CoreError::Read {
                contract: prepared.contract.name.clone(),
                method: prepared.method.name.clone(),
                source,
            })?;
        debug!(
            contract = %prepared.contract.name,
            method = %prepared.method.name,
            bytes = raw.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "read call"
        );

        let mut values = prepared.contract.decode_output(&prepared.method, &raw)?;
        R::from_return(&mut values)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("default_account", &self.default_account)
            .field("contracts", &self.registry.names())
            .finish_non_exhaustive()
    }
}
