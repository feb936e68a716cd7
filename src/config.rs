//! Client configuration.
//!
//! Resolved from `FIN4_*` environment variables, then overridden by CLI
//! flags. Timeouts configure the transport only.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use fin4_core::{ArtifactStore, Session};
use fin4_transport::{JsonRpcLedger, Ledger, DEFAULT_RPC_ENDPOINT};
use fin4_types::{env_address, env_bool_or, env_path_or, env_string_or, env_var_or, Dispatch};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub rpc_endpoint: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Directory of `<Name>.json` compiled-contract artifacts.
    pub artifacts_dir: PathBuf,
    pub main_address: Option<Address>,
    pub default_account: Option<Address>,
    pub underlyings_active: bool,
    pub export_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            artifacts_dir: PathBuf::from("build/contracts"),
            main_address: None,
            default_account: None,
            underlyings_active: true,
            export_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rpc_endpoint: env_string_or("FIN4_RPC_ENDPOINT", &defaults.rpc_endpoint),
            timeout: Duration::from_secs(env_var_or("FIN4_RPC_TIMEOUT_SECS", 30)),
            connect_timeout: Duration::from_secs(env_var_or("FIN4_RPC_CONNECT_TIMEOUT_SECS", 10)),
            artifacts_dir: env_path_or("FIN4_ARTIFACTS_DIR", "build/contracts"),
            main_address: env_address("FIN4_MAIN_ADDRESS"),
            default_account: env_address("FIN4_DEFAULT_ACCOUNT"),
            underlyings_active: env_bool_or("FIN4_UNDERLYINGS_ACTIVE", defaults.underlyings_active),
            export_dir: env_path_or("FIN4_EXPORT_DIR", "."),
        }
    }

    pub fn with_rpc_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.rpc_endpoint = endpoint.into();
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    pub fn with_main_address(mut self, address: Address) -> Self {
        self.main_address = Some(address);
        self
    }

    pub fn with_default_account(mut self, account: Address) -> Self {
        self.default_account = Some(account);
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn main_address(&self) -> Result<Address> {
        self.main_address
            .context("Fin4Main address not configured (set FIN4_MAIN_ADDRESS or --main)")
    }

    /// Sender for submissions. Reads fall back to the zero address.
    pub fn default_account(&self) -> Result<Address> {
        self.default_account
            .context("default account not configured (set FIN4_DEFAULT_ACCOUNT or --account)")
    }

    pub fn ledger(&self) -> JsonRpcLedger {
        JsonRpcLedger::with_timeouts(&self.rpc_endpoint, self.timeout, self.connect_timeout)
    }

    pub fn artifacts(&self) -> Result<ArtifactStore> {
        if !self.artifacts_dir.is_dir() {
            anyhow::bail!(
                "artifacts directory {} does not exist",
                self.artifacts_dir.display()
            );
        }
        Ok(ArtifactStore::from_dir(self.artifacts_dir.clone()))
    }

    pub fn session(&self, ledger: Arc<dyn Ledger>, dispatcher: Arc<dyn Dispatch>) -> Result<Session> {
        let artifacts = self
            .artifacts()
            .context("Failed to open contract artifacts")?;
        Ok(Session::new(
            ledger,
            artifacts,
            dispatcher,
            self.default_account.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.rpc_endpoint, "http://127.0.0.1:8545");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.underlyings_active);
        assert!(config.main_address().is_err());
    }

    #[test]
    fn test_overrides() {
        let main = Address::repeat_byte(0x11);
        let config = ClientConfig::default()
            .with_rpc_endpoint("http://node:8545")
            .with_main_address(main)
            .with_export_dir("/tmp/exports");
        assert_eq!(config.rpc_endpoint, "http://node:8545");
        assert_eq!(config.main_address().unwrap(), main);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
        assert!(config.default_account().is_err());
    }

    #[test]
    fn test_missing_artifacts_dir_is_reported() {
        let config = ClientConfig::default().with_artifacts_dir("/nonexistent/fin4/artifacts");
        let err = config.artifacts().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
