//! Contract interface descriptions.
//!
//! An [`InterfaceDescription`] is built once per contract artifact and turns
//! the ABI into a lookup table: method name or selector to a
//! [`MethodEntry`] carrying the resolved parameter and return types. Calls
//! are dispatched through this table only; a missing entry is an error,
//! never a guess.

use std::collections::HashMap;

use alloy_dyn_abi::{DynSolType, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::Selector;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// One callable method of a contract.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub name: String,
    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub signature: String,
    pub selector: Selector,
    pub inputs: Vec<DynSolType>,
    pub outputs: Vec<DynSolType>,
}

impl MethodEntry {
    fn from_function(contract: &str, function: &Function) -> Result<Self> {
        let resolve = |params: &[alloy_json_abi::Param]| {
            params
                .iter()
                .map(|p| p.resolve())
                .collect::<std::result::Result<Vec<DynSolType>, _>>()
                .map_err(|e| CoreError::InterfaceDescription {
                    contract: contract.to_string(),
                    reason: format!("{}: {e}", function.name),
                })
        };
        Ok(Self {
            name: function.name.clone(),
            signature: function.signature(),
            selector: function.selector(),
            inputs: resolve(&function.inputs)?,
            outputs: resolve(&function.outputs)?,
        })
    }

    /// Solidity type names of the inputs, in order.
    pub fn input_type_names(&self) -> Vec<String> {
        self.inputs.iter().map(|t| t.sol_type_name().into_owned()).collect()
    }
}

/// Method table of one contract interface.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDescription {
    methods: Vec<MethodEntry>,
    by_name: HashMap<String, usize>,
    by_selector: HashMap<Selector, usize>,
}

impl InterfaceDescription {
    /// Build the table from a parsed ABI. For overloaded names the first
    /// declaration wins name lookup; every overload stays reachable by
    /// selector.
    pub fn from_abi(contract: &str, abi: &JsonAbi) -> Result<Self> {
        let mut description = Self::default();
        for function in abi.functions() {
            let entry = MethodEntry::from_function(contract, function)?;
            let index = description.methods.len();
            description.by_name.entry(entry.name.clone()).or_insert(index);
            description.by_selector.entry(entry.selector).or_insert(index);
            description.methods.push(entry);
        }
        Ok(description)
    }

    /// Build from a JSON ABI array.
    pub fn from_json_str(contract: &str, json: &str) -> Result<Self> {
        let abi: JsonAbi =
            serde_json::from_str(json).map_err(|e| CoreError::InterfaceDescription {
                contract: contract.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_abi(contract, &abi)
    }

    /// Build from a compiled-contract artifact (`{"contractName": .., "abi": [..], ..}`).
    pub fn from_artifact_json(contract: &str, json: &str) -> Result<Self> {
        let invalid = |reason: String| CoreError::InterfaceDescription {
            contract: contract.to_string(),
            reason,
        };
        let mut artifact: Value = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        let abi = artifact
            .get_mut("abi")
            .map(Value::take)
            .ok_or_else(|| invalid("artifact has no abi".to_string()))?;
        let abi: JsonAbi = serde_json::from_value(abi).map_err(|e| invalid(e.to_string()))?;
        Self::from_abi(contract, &abi)
    }

    /// Build from human-readable signatures such as
    /// `function balanceOf(address) view returns (uint256)`.
    pub fn parse(contract: &str, signatures: &[&str]) -> Result<Self> {
        let abi = JsonAbi::parse(signatures.iter().copied()).map_err(|e| {
            CoreError::InterfaceDescription {
                contract: contract.to_string(),
                reason: e.to_string(),
            }
        })?;
        Self::from_abi(contract, &abi)
    }

    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.by_name.get(name).map(|&i| &self.methods[i])
    }

    pub fn method_by_selector(&self, selector: &Selector) -> Option<&MethodEntry> {
        self.by_selector.get(selector).map(|&i| &self.methods[i])
    }

    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
