//! In-memory model registry
//!
//! Built once before serving starts and read-only afterwards, so it can be
//! shared behind an `Arc` without locking.

use crate::artifact::FittedArtifact;
use crate::error::Result;
use crate::models::MethodKind;
use crate::store::ModelStore;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fitted artifacts keyed by `<dataset>_<method>`
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, FittedArtifact>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the given artifacts; later duplicates replace earlier ones
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = FittedArtifact>) -> Self {
        let models = artifacts.into_iter().map(|a| (a.key(), a)).collect();
        Self { models }
    }

    /// Load every artifact in a store; unreadable files are skipped
    pub fn load(store: &ModelStore) -> Result<Self> {
        let mut models = BTreeMap::new();
        for path in store.artifact_paths()? {
            match ModelStore::read(&path) {
                Ok(artifact) => {
                    debug!(key = %artifact.key(), model = artifact.model.as_model().name(), "artifact loaded");
                    models.insert(artifact.key(), artifact);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable artifact"),
            }
        }
        info!(models = models.len(), dir = %store.dir().display(), "model registry loaded");
        Ok(Self { models })
    }

    /// Load every artifact stored in a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(&ModelStore::new(dir.as_ref()))
    }

    pub fn get(&self, key: &str) -> Option<&FittedArtifact> {
        self.models.get(key)
    }

    pub fn get_for(&self, dataset: &str, kind: MethodKind) -> Option<&FittedArtifact> {
        self.get(&kind.registry_key(dataset))
    }

    /// Sorted registry keys
    pub fn keys(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Release every loaded model
    pub fn teardown(mut self) {
        let count = self.models.len();
        self.models.clear();
        info!(models = count, "model registry torn down");
    }
}
