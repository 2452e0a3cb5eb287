//! Save and load the engine to/from disk.
//!
//! Requires the `persistence` feature flag. The serialized state covers
//! everything needed to reproduce queries exactly: every table's projection
//! vectors, every bucket's id sequence (order and duplicates included), the
//! stored vectors, and the configuration scalars.

use std::path::Path;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::element::Element;
use crate::error::{LshError, Result};
use crate::probe::{MultiProbeEngine, ProbeInner};

impl<E: Element + Serialize + DeserializeOwned> MultiProbeEngine<E> {
    /// Serialize the engine to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let inner = self.inner.read();
        let json = serde_json::to_string_pretty(&*inner)
            .map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Deserialize an engine from a JSON file. Metrics restart disabled.
    pub fn load_json(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let inner: ProbeInner<E> =
            serde_json::from_str(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        Ok(Self {
            inner: RwLock::new(inner),
            metrics: None,
        })
    }

    /// Serialize the engine to a compact bincode file.
    pub fn save_bincode(&self, path: &Path) -> Result<()> {
        let inner = self.inner.read();
        let bytes = bincode::serialize(&*inner)
            .map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Deserialize an engine from a bincode file.
    pub fn load_bincode(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let inner: ProbeInner<E> =
            bincode::deserialize(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        Ok(Self {
            inner: RwLock::new(inner),
            metrics: None,
        })
    }
}
