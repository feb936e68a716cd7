//! Fin4 Client
//!
//! Client-side layer between a UI and the Fin4 contracts on a JSON-RPC
//! ledger:
//!
//! - **Transaction orchestration**: encode, dry-run, then submit, with
//!   lifecycle callbacks and state updates ([`fin4_core`])
//! - **Dependent-fetch aggregation**: list, expand and join reads into one
//!   all-or-nothing update per collection ([`fin4_state_fetcher`])
//! - **Transport**: the [`Ledger`](fin4_transport::Ledger) seam and its
//!   JSON-RPC implementation ([`fin4_transport`])
//!
//! See [`config`] for how a session is configured.

pub mod config;

pub use config::ClientConfig;

pub use fin4_core;
pub use fin4_state_fetcher;
pub use fin4_transport;
pub use fin4_types;
