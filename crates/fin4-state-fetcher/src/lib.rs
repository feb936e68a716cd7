//! Dependent-fetch aggregation of Fin4 application state.
//!
//! Each collection (tokens, claims, collections, submissions, messages,
//! verifier types, underlyings) is a [`FetchPlan`]: a root listing, a
//! concurrent per-key expansion, and the state updates the joined result is
//! published as. A plan publishes everything or nothing.
//!
//! [`StateFetcher`] is the single entry point over the plans, the
//! single-shot [`readers`] and the claim [`export`].
//!
//! # Example
//!
//! ```ignore
//! use fin4_state_fetcher::{CsvExporter, StateFetcher};
//!
//! let fetcher = StateFetcher::new(&session, true);
//! fetcher.fetch_tokens().await?;
//! fetcher.fetch_claims().await?;
//! fetcher.export_collection("GRN", &CsvExporter::new(".")).await?;
//! ```

pub mod aggregator;
pub mod contracts;
pub mod error;
pub mod export;
pub mod plans;
pub mod provider;
pub mod readers;
pub mod returns;

pub use aggregator::{execute, run_plan, AggregateResult, EntityKey, FetchPlan};
pub use error::{FetchError, Result};
pub use export::{
    collection_symbols, download_claims_on_collection, download_claims_on_token,
    fetch_all_claims_on_token, fetch_claims_sequentially, CsvExporter, ExportFormatter,
};
pub use plans::{
    ClaimsPlan, CollectionsPlan, MessagesPlan, SubmissionsPlan, TokensPlan, UnderlyingRecord,
    UnderlyingsPlan, VerifierTypesPlan,
};
pub use provider::StateFetcher;
pub use readers::{
    find_token_by_symbol, is_valid_public_address, token_select_options, PollPeriod, PollStatus,
    SelectOption,
};
