//! Return-tuple decoding.
//!
//! Remote calls come back as positional tuples. [`ReturnValues`] walks such
//! a tuple front to back with typed accessors, and [`FromReturn`] turns it
//! into a named record exactly once, at the call boundary.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256};

use crate::error::{CoreError, Result};

/// The decoded outputs of one call, consumed in declaration order.
#[derive(Debug, Clone)]
pub struct ReturnValues {
    contract: String,
    method: String,
    values: std::vec::IntoIter<DynSolValue>,
    position: usize,
}

impl ReturnValues {
    pub fn new(contract: &str, method: &str, values: Vec<DynSolValue>) -> Self {
        Self {
            contract: contract.to_string(),
            method: method.to_string(),
            values: values.into_iter(),
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    fn error(&self, reason: String) -> CoreError {
        CoreError::ReturnDecoding {
            contract: self.contract.clone(),
            method: self.method.clone(),
            reason,
        }
    }

    fn next_value(&mut self) -> Result<DynSolValue> {
        let position = self.position;
        self.position += 1;
        self.values
            .next()
            .ok_or_else(|| self.error(format!("missing output {position}")))
    }

    fn mismatch(&self, expected: &str, got: &DynSolValue) -> CoreError {
        self.error(format!(
            "output {} is not {expected}: {got:?}",
            self.position - 1
        ))
    }

    pub fn address(&mut self) -> Result<Address> {
        let value = self.next_value()?;
        value.as_address().ok_or_else(|| self.mismatch("an address", &value))
    }

    pub fn uint(&mut self) -> Result<U256> {
        let value = self.next_value()?;
        value
            .as_uint()
            .map(|(u, _)| u)
            .ok_or_else(|| self.mismatch("an unsigned integer", &value))
    }

    /// An unsigned integer that must fit in 64 bits (counts, ids, enums).
    pub fn u64(&mut self) -> Result<u64> {
        let value = self.uint()?;
        u64::try_from(value).map_err(|_| self.error(format!("{value} does not fit in u64")))
    }

    pub fn boolean(&mut self) -> Result<bool> {
        let value = self.next_value()?;
        value.as_bool().ok_or_else(|| self.mismatch("a bool", &value))
    }

    pub fn string(&mut self) -> Result<String> {
        let value = self.next_value()?;
        match value {
            DynSolValue::String(s) => Ok(s),
            other => Err(self.mismatch("a string", &other)),
        }
    }

    pub fn bytes(&mut self) -> Result<Bytes> {
        let value = self.next_value()?;
        match value {
            DynSolValue::Bytes(b) => Ok(b.into()),
            other => Err(self.mismatch("dynamic bytes", &other)),
        }
    }

    pub fn bytes32(&mut self) -> Result<B256> {
        let value = self.next_value()?;
        match value {
            DynSolValue::FixedBytes(word, 32) => Ok(word),
            other => Err(self.mismatch("bytes32", &other)),
        }
    }

    fn list(&mut self, expected: &str) -> Result<Vec<DynSolValue>> {
        let value = self.next_value()?;
        match value {
            DynSolValue::Array(items) | DynSolValue::FixedArray(items) => Ok(items),
            other => Err(self.mismatch(expected, &other)),
        }
    }

    pub fn addresses(&mut self) -> Result<Vec<Address>> {
        let items = self.list("an address list")?;
        items
            .iter()
            .map(|v| v.as_address().ok_or_else(|| self.mismatch("an address", v)))
            .collect()
    }

    pub fn uints(&mut self) -> Result<Vec<U256>> {
        let items = self.list("an integer list")?;
        items
            .iter()
            .map(|v| {
                v.as_uint()
                    .map(|(u, _)| u)
                    .ok_or_else(|| self.mismatch("an unsigned integer", v))
            })
            .collect()
    }

    pub fn bools(&mut self) -> Result<Vec<bool>> {
        let items = self.list("a bool list")?;
        items
            .iter()
            .map(|v| v.as_bool().ok_or_else(|| self.mismatch("a bool", v)))
            .collect()
    }

    pub fn bytes32s(&mut self) -> Result<Vec<B256>> {
        let items = self.list("a bytes32 list")?;
        items
            .into_iter()
            .map(|v| match v {
                DynSolValue::FixedBytes(word, 32) => Ok(word),
                other => Err(self.mismatch("bytes32", &other)),
            })
            .collect()
    }
}

/// A named record decoded from one method's return tuple.
pub trait FromReturn: Sized {
    fn from_return(values: &mut ReturnValues) -> Result<Self>;
}

impl FromReturn for () {
    fn from_return(_: &mut ReturnValues) -> Result<Self> {
        Ok(())
    }
}

macro_rules! single_output {
    ($ty:ty, $accessor:ident) => {
        impl FromReturn for $ty {
            fn from_return(values: &mut ReturnValues) -> Result<Self> {
                values.$accessor()
            }
        }
    };
}

single_output!(Address, address);
single_output!(U256, uint);
single_output!(u64, u64);
single_output!(bool, boolean);
single_output!(String, string);
single_output!(Bytes, bytes);
single_output!(B256, bytes32);
single_output!(Vec<Address>, addresses);
single_output!(Vec<U256>, uints);
single_output!(Vec<bool>, bools);
single_output!(Vec<B256>, bytes32s);

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: Vec<DynSolValue>) -> ReturnValues {
        ReturnValues::new("Fin4Claiming", "getClaimOnThisToken", items)
    }

    #[test]
    fn test_accessors_walk_outputs_in_order() {
        let claimer = Address::repeat_byte(0x11);
        let mut out = values(vec![
            DynSolValue::Address(claimer),
            DynSolValue::Bool(true),
            DynSolValue::Uint(U256::from(5), 256),
            DynSolValue::String("walked to work".into()),
            DynSolValue::Array(vec![DynSolValue::Uint(U256::from(2), 8)]),
        ]);

        assert_eq!(out.address().unwrap(), claimer);
        assert!(out.boolean().unwrap());
        assert_eq!(out.u64().unwrap(), 5);
        assert_eq!(out.string().unwrap(), "walked to work");
        assert_eq!(out.uints().unwrap(), vec![U256::from(2)]);
        assert_eq!(out.remaining(), 0);
    }

    #[test]
    fn test_type_mismatch_is_reported_with_position() {
        let mut out = values(vec![DynSolValue::Bool(false)]);
        let err = out.address().unwrap_err();
        match err {
            CoreError::ReturnDecoding { method, reason, .. } => {
                assert_eq!(method, "getClaimOnThisToken");
                assert!(reason.starts_with("output 0"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_output() {
        let mut out = values(vec![]);
        assert!(matches!(
            out.uint().unwrap_err(),
            CoreError::ReturnDecoding { .. }
        ));
    }

    #[test]
    fn test_u64_overflow() {
        let mut out = values(vec![DynSolValue::Uint(U256::MAX, 256)]);
        assert!(out.u64().is_err());
    }

    #[test]
    fn test_from_return_primitives() {
        let word = B256::repeat_byte(0x42);
        let mut out = values(vec![DynSolValue::Array(vec![
            DynSolValue::FixedBytes(word, 32),
            DynSolValue::FixedBytes(B256::ZERO, 32),
        ])]);
        let decoded = Vec::<B256>::from_return(&mut out).unwrap();
        assert_eq!(decoded, vec![word, B256::ZERO]);
    }
}
