//! Compiled-contract artifacts.
//!
//! Interface descriptions are loaded from `<dir>/<Name>.json` the first time
//! a contract name is needed and cached for the rest of the session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::abi::InterfaceDescription;
use crate::error::{CoreError, Result};

#[derive(Debug, Default)]
pub struct ArtifactStore {
    dir: Option<PathBuf>,
    cache: RwLock<HashMap<String, Arc<InterfaceDescription>>>,
}

impl ArtifactStore {
    /// Store backed by an artifact directory.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            cache: RwLock::default(),
        }
    }

    /// Store holding only what is [`insert`](Self::insert)ed.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn insert(&self, name: &str, interface: InterfaceDescription) -> Arc<InterfaceDescription> {
        let interface = Arc::new(interface);
        self.cache.write().insert(name.to_string(), interface.clone());
        interface
    }

    /// Interface description of the artifact called `name`.
    pub fn interface(&self, name: &str) -> Result<Arc<InterfaceDescription>> {
        if let Some(cached) = self.cache.read().get(name) {
            return Ok(cached.clone());
        }

        let dir = self.dir.as_ref().ok_or_else(|| CoreError::Artifact {
            name: name.to_string(),
            reason: "not loaded and no artifact directory configured".to_string(),
        })?;
        let path = dir.join(format!("{name}.json"));
        let json = std::fs::read_to_string(&path).map_err(|e| CoreError::Artifact {
            name: name.to_string(),
            reason: format!("{}: {e}", path.display()),
        })?;
        let interface = InterfaceDescription::from_artifact_json(name, &json)?;
        debug!(artifact = name, methods = interface.len(), "loaded artifact");

        Ok(self
            .cache
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(interface))
            .clone())
    }
}
