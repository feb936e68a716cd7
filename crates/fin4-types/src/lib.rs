//! Shared types for the fin4-client workspace.
//!
//! This crate holds what every other crate agrees on:
//! - [`records`]: assembled application-state records (tokens, claims, ...)
//! - [`updates`]: [`StateUpdate`] messages and the [`Dispatch`] sinks they go to
//! - [`lifecycle`]: per-transaction [`LifecycleCallbacks`] and [`StackId`]
//! - [`encoding`]: `bytes32` helpers
//! - [`env_utils`]: environment-variable parsing for configuration

pub mod encoding;
pub mod env_utils;
pub mod lifecycle;
pub mod records;
pub mod updates;

pub use encoding::{bytes32_to_string, listing_key_to_address};
pub use env_utils::{env_address, env_bool_or, env_path_or, env_string_or, env_var, env_var_or};
pub use lifecycle::{LifecycleCallbacks, LifecycleEvent, StackId};
pub use records::{
    Claim, ClaimExportRow, Collection, DetailedTokenInfo, Fin4Token, Message, ParameterizerParam,
    SourcererPair, Submission, SystemParameter, Underlying, VerifierStatus, VerifierType,
};
pub use updates::{ChannelDispatcher, Dispatch, RecordingDispatcher, StateUpdate};
