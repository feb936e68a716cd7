//! Test doubles for the remote ledger.
//!
//! [`MockLedger`] answers read calls from a table keyed by
//! `(target address, calldata)` and records every call and submission, so
//! tests can assert exactly what went over the wire.

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use fin4_types::StackId;
use parking_lot::Mutex;

use crate::error::ProviderError;
use crate::{CallRequest, Ledger};

#[derive(Debug, Default)]
pub struct MockLedger {
    responses: Mutex<HashMap<(Address, Bytes), Result<Bytes, ProviderError>>>,
    calls: Mutex<Vec<CallRequest>>,
    sent: Mutex<Vec<CallRequest>>,
    send_error: Mutex<Option<ProviderError>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer read calls of `data` against `to` with `ret`.
    pub fn respond(&self, to: Address, data: impl Into<Bytes>, ret: impl Into<Bytes>) {
        self.responses
            .lock()
            .insert((to, data.into()), Ok(ret.into()));
    }

    /// Make read calls of `data` against `to` fail with `error`.
    pub fn reject(&self, to: Address, data: impl Into<Bytes>, error: ProviderError) {
        self.responses.lock().insert((to, data.into()), Err(error));
    }

    /// Make every subsequent submission fail with `error`.
    pub fn fail_sends(&self, error: ProviderError) {
        *self.send_error.lock() = Some(error);
    }

    /// Every read call issued so far, in issue order.
    pub fn calls(&self) -> Vec<CallRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Every accepted submission so far; the index is the stack id.
    pub fn sent(&self) -> Vec<CallRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn call(&self, request: &CallRequest) -> Result<Bytes, ProviderError> {
        self.calls.lock().push(request.clone());
        // Let sibling fan-out calls interleave.
        tokio::task::yield_now().await;
        self.responses
            .lock()
            .get(&(request.to, request.data.clone()))
            .cloned()
            .unwrap_or_else(|| {
                Err(ProviderError::transport(format!(
                    "no mock response for {} with data {}",
                    request.to, request.data
                )))
            })
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<StackId, ProviderError> {
        if let Some(error) = self.send_error.lock().clone() {
            return Err(error);
        }
        let mut sent = self.sent.lock();
        sent.push(request.clone());
        Ok(StackId((sent.len() - 1) as u64))
    }
}
