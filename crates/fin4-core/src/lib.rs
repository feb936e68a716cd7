//! Fin4 Core
//!
//! Contract calls for the Fin4 client: how a call is built, checked before
//! it costs anything, and submitted.
//!
//! This crate provides:
//! - [`abi`]: [`InterfaceDescription`], the per-contract method table
//! - [`encoder`]: selector + ABI payload construction and display signatures
//! - [`decode`]: [`ReturnValues`] / [`FromReturn`] for named return records
//! - [`registry`]: [`ContractRegistry`] of [`ContractHandle`]s
//! - [`artifacts`]: [`ArtifactStore`] of compiled-contract interfaces
//! - [`provider_error`]: revert-reason extraction from node errors
//! - [`simulator`]: [`DryRunSimulator`]
//! - [`session`]: [`Session`], the per-user context everything runs in
//! - [`orchestrator`]: [`TransactionOrchestrator`], simulate-then-submit
//! - [`bootstrap`]: registration of the satellite and curation contracts
//!
//! # Example
//!
//! ```ignore
//! use fin4_core::{Session, SubmitRequest, TransactionOrchestrator};
//!
//! let session = Session::new(ledger, ArtifactStore::from_dir("build/contracts"), dispatcher, account);
//! fin4_core::bootstrap::bootstrap(&session, main_address).await?;
//!
//! let report = TransactionOrchestrator::new(&session)
//!     .submit(SubmitRequest::new("Fin4Claiming", "submitClaim").params(args).display("Claim"))
//!     .await?;
//! ```

pub mod abi;
pub mod artifacts;
pub mod bootstrap;
pub mod decode;
pub mod encoder;
pub mod error;
pub mod orchestrator;
pub mod provider_error;
pub mod registry;
pub mod session;
pub mod simulator;

pub use abi::{InterfaceDescription, MethodEntry};
pub use artifacts::ArtifactStore;
pub use bootstrap::{SatelliteAddresses, TcrAddresses, MAIN_CONTRACT};
pub use decode::{FromReturn, ReturnValues};
pub use encoder::{
    encode_call, render_signature, CallArg, CallDescriptor, CallParams, EncodedCall, PreparedCall,
};
pub use error::{CoreError, Result};
pub use orchestrator::{
    PendingTransaction, SubmitOutcome, SubmitReport, SubmitRequest, TransactionOrchestrator,
    TxState,
};
pub use provider_error::{
    default_decoder, ChainedDecoder, EmbeddedJsonErrorDecoder, ProviderErrorDecoder,
    RevertDataDecoder, UnparsableProviderError,
};
pub use registry::{ContractHandle, ContractRegistry};
pub use session::Session;
pub use simulator::{DryRunOutcome, DryRunSimulator};
