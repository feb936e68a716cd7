//! Contract registry.
//!
//! Handles are registered by logical name and looked up by name for the
//! lifetime of a session. Registration always replaces; callers must not
//! keep relying on an older `Arc<ContractHandle>` after re-registering.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;
use parking_lot::RwLock;
use tracing::debug;

use crate::abi::{InterfaceDescription, MethodEntry};
use crate::decode::ReturnValues;
use crate::error::{CoreError, Result};

/// One deployed contract: name, address and method table.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    pub name: String,
    pub address: Address,
    pub interface: Arc<InterfaceDescription>,
    /// Events the external event listener should watch on this contract.
    pub events: Vec<String>,
}

impl ContractHandle {
    pub fn method(&self, name: &str) -> Result<&MethodEntry> {
        self.interface
            .method(name)
            .ok_or_else(|| CoreError::UnknownMethod {
                contract: self.name.clone(),
                method: name.to_string(),
            })
    }

    /// Decode raw return data of `method` into its output values.
    pub fn decode_output(&self, method: &MethodEntry, data: &[u8]) -> Result<ReturnValues> {
        let decoded = DynSolType::Tuple(method.outputs.clone())
            .abi_decode_params(data)
            .map_err(|e| CoreError::ReturnDecoding {
                contract: self.name.clone(),
                method: method.name.clone(),
                reason: e.to_string(),
            })?;
        let values = match decoded {
            DynSolValue::Tuple(values) => values,
            single => vec![single],
        };
        Ok(ReturnValues::new(&self.name, &method.name, values))
    }
}

/// Name-keyed store of contract handles.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    handles: RwLock<HashMap<String, Arc<ContractHandle>>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handle under `name`, replacing any previous one.
    pub fn register(
        &self,
        name: &str,
        address: Address,
        interface: Arc<InterfaceDescription>,
        events: Vec<String>,
    ) -> Arc<ContractHandle> {
        let handle = Arc::new(ContractHandle {
            name: name.to_string(),
            address,
            interface,
            events,
        });
        let previous = self
            .handles
            .write()
            .insert(name.to_string(), handle.clone());
        debug!(
            contract = name,
            %address,
            replaced = previous.is_some(),
            "registered contract"
        );
        handle
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<ContractHandle>> {
        self.handles
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnregisteredContract(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handles.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn interface() -> Arc<InterfaceDescription> {
        Arc::new(
            InterfaceDescription::parse(
                "Fin4Collections",
                &["function getCollectionsCount() view returns (uint256)"],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_lookup_before_register_fails() {
        let registry = ContractRegistry::new();
        let err = registry.lookup("Fin4Collections").unwrap_err();
        assert!(matches!(err, CoreError::UnregisteredContract(name) if name == "Fin4Collections"));
    }

    #[test]
    fn test_register_overwrites() {
        let registry = ContractRegistry::new();
        let first = registry.register("Fin4Collections", Address::repeat_byte(1), interface(), vec![]);
        let second = registry.register(
            "Fin4Collections",
            Address::repeat_byte(2),
            interface(),
            vec!["CollectionCreated".into()],
        );

        let found = registry.lookup("Fin4Collections").unwrap();
        assert_eq!(found.address, Address::repeat_byte(2));
        assert!(Arc::ptr_eq(&found, &second));
        assert!(!Arc::ptr_eq(&found, &first));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["Fin4Collections".to_string()]);
    }

    #[test]
    fn test_decode_output() {
        let registry = ContractRegistry::new();
        let handle = registry.register("Fin4Collections", Address::ZERO, interface(), vec![]);
        let method = handle.method("getCollectionsCount").unwrap().clone();

        let mut values = handle
            .decode_output(&method, U256::from(3).to_be_bytes::<32>().as_slice())
            .unwrap();
        assert_eq!(values.uint().unwrap(), U256::from(3));

        assert!(handle.decode_output(&method, &[0u8; 3]).is_err());
        assert!(matches!(
            handle.method("getCollection").unwrap_err(),
            CoreError::UnknownMethod { .. }
        ));
    }
}
