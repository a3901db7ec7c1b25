//! JSON artifact files on disk

use crate::artifact::FittedArtifact;
use crate::error::{ForecastError, Result};
use crate::models::MethodKind;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory of `<dataset>_<method>.json` artifacts
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File an artifact with this key is stored in
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Write an artifact, replacing any previous one for the same key
    pub fn save(&self, artifact: &FittedArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&artifact.key());
        let json = serde_json::to_string(artifact)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), "model saved");
        Ok(path)
    }

    /// Read the artifact of one dataset and method
    pub fn load(&self, dataset: &str, kind: MethodKind) -> Result<FittedArtifact> {
        let key = kind.registry_key(dataset);
        let path = self.path_for(&key);
        if !path.exists() {
            return Err(ForecastError::ModelNotFound(key));
        }
        Self::read(&path)
    }

    /// Read an artifact from an explicit file
    pub fn read(path: &Path) -> Result<FittedArtifact> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Every `.json` file in the store directory, sorted
    pub fn artifact_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();
        Ok(paths)
    }
}
