//! Environment variable helpers used when resolving client configuration.
//!
//! Every `FIN4_*` setting goes through one of these so that parsing and
//! defaulting behave the same everywhere:
//!
//! ```
//! use fin4_types::env_utils::{env_bool_or, env_var_or};
//!
//! let timeout_secs: u64 = env_var_or("FIN4_RPC_TIMEOUT_SECS", 30);
//! let underlyings = env_bool_or("FIN4_UNDERLYINGS_ACTIVE", true);
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use alloy_primitives::Address;

/// Parse an environment variable into any `FromStr` type.
///
/// Unset and unparsable values both yield `None`.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable, falling back to `default`.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Read a boolean flag. `1`, `true`, `yes` and `on` are truthy, any other
/// value is falsy, and an unset variable yields `default`.
pub fn env_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Read a non-empty string, falling back to `default` when unset or blank.
pub fn env_string_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Read a path, falling back to `default`.
pub fn env_path_or(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env_string_or(key, default))
}

/// Read a hex account or contract address.
pub fn env_address(key: &str) -> Option<Address> {
    env_var::<Address>(key)
}
