//! Provider-error decoding.
//!
//! Node client libraries report a reverted call as an opaque error whose
//! text shape is not part of any contract and has changed between versions.
//! Everything that knows about those shapes lives behind
//! [`ProviderErrorDecoder`], so a new shape means a new decoder and nothing
//! else. Failure to decode is returned as [`UnparsableProviderError`] and
//! must be treated as data.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::hex;
use serde_json::Value;

/// Selector of `Error(string)`.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// Selector of `Panic(uint256)`.
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];
const EXECUTION_REVERTED: &str = "execution reverted";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparsable provider error: {reason}")]
pub struct UnparsableProviderError {
    pub reason: String,
}

impl UnparsableProviderError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Extracts a revert reason from the text of a provider error.
pub trait ProviderErrorDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<String, UnparsableProviderError>;
}

/// Parses the first JSON object embedded in the error text.
fn embedded_json(raw: &str) -> Result<Value, UnparsableProviderError> {
    let start = raw
        .find('{')
        .ok_or_else(|| UnparsableProviderError::new("no structured data in error text"))?;
    // Anything after the object is ignored.
    serde_json::Deserializer::from_str(&raw[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| UnparsableProviderError::new("empty structured data"))?
        .map_err(|e| UnparsableProviderError::new(format!("invalid structured data: {e}")))
}

/// The ganache-style shape: `..{"data": {"0x<txhash>": {"reason": ".."}}}`.
/// Reads `reason` from the first record under `data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedJsonErrorDecoder;

impl ProviderErrorDecoder for EmbeddedJsonErrorDecoder {
    fn decode(&self, raw: &str) -> Result<String, UnparsableProviderError> {
        let parsed = embedded_json(raw)?;
        let records = parsed
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| UnparsableProviderError::new("no data records"))?;
        let (_, first) = records
            .iter()
            .next()
            .ok_or_else(|| UnparsableProviderError::new("data records are empty"))?;
        first
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| UnparsableProviderError::new("first data record has no reason"))
    }
}

/// The geth-style shape: `{"code":3,"message":"execution reverted: ..","data":"0x08c379a0.."}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevertDataDecoder;

impl RevertDataDecoder {
    fn decode_revert_data(data: &[u8]) -> Option<String> {
        if data.len() < 4 {
            return None;
        }
        let (selector, payload) = data.split_at(4);
        if selector == ERROR_STRING_SELECTOR {
            match DynSolType::Tuple(vec![DynSolType::String]).abi_decode_params(payload) {
                Ok(DynSolValue::Tuple(values)) => match values.into_iter().next() {
                    Some(DynSolValue::String(reason)) => Some(reason),
                    _ => None,
                },
                _ => None,
            }
        } else if selector == PANIC_SELECTOR {
            match DynSolType::Tuple(vec![DynSolType::Uint(256)]).abi_decode_params(payload) {
                Ok(DynSolValue::Tuple(values)) => values
                    .first()
                    .and_then(DynSolValue::as_uint)
                    .map(|(code, _)| format!("panic code {code}")),
                _ => None,
            }
        } else {
            None
        }
    }
}

impl ProviderErrorDecoder for RevertDataDecoder {
    fn decode(&self, raw: &str) -> Result<String, UnparsableProviderError> {
        let parsed = embedded_json(raw)?;

        if let Some(data) = parsed.get("data").and_then(Value::as_str) {
            if let Some(reason) = hex::decode(data)
                .ok()
                .and_then(|bytes| Self::decode_revert_data(&bytes))
            {
                return Ok(reason);
            }
        }

        let message = parsed
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| UnparsableProviderError::new("no revert data or message"))?;
        message
            .strip_prefix(EXECUTION_REVERTED)
            .map(|rest| rest.trim_start_matches(':').trim().to_string())
            .ok_or_else(|| UnparsableProviderError::new("message is not a revert"))
    }
}

/// Tries each decoder in order and returns the first reason found.
pub struct ChainedDecoder {
    decoders: Vec<Box<dyn ProviderErrorDecoder>>,
}

impl ChainedDecoder {
    pub fn new(decoders: Vec<Box<dyn ProviderErrorDecoder>>) -> Self {
        Self { decoders }
    }
}

impl ProviderErrorDecoder for ChainedDecoder {
    fn decode(&self, raw: &str) -> Result<String, UnparsableProviderError> {
        let mut last = UnparsableProviderError::new("no decoders configured");
        for decoder in &self.decoders {
            match decoder.decode(raw) {
                Ok(reason) => return Ok(reason),
                Err(e) => last = e,
            }
        }
        Err(last)
    }
}

/// The embedded-record shape first, then revert data.
pub fn default_decoder() -> ChainedDecoder {
    ChainedDecoder::new(vec![
        Box::new(EmbeddedJsonErrorDecoder),
        Box::new(RevertDataDecoder),
    ])
}
