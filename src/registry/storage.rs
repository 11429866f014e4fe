//! Durable storage for the registry document.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::transformer::RegistryFile;

/// Backend holding the serialized registry.
#[cfg_attr(test, mockall::automock)]
pub trait Storage {
    /// True if a previously written document exists.
    fn has_data(&self) -> bool;
    fn read(&self) -> Result<RegistryFile>;
    /// Replace the stored document. A failed write leaves the previous
    /// document in place.
    fn write(&self, file: &RegistryFile) -> Result<()>;
}

/// Pretty-printed JSON file, replaced through a temporary sibling and a rename.
pub struct JsonFileStorage<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> JsonFileStorage<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl<R: Runtime> Storage for JsonFileStorage<'_, R> {
    fn has_data(&self) -> bool {
        self.runtime.exists(&self.path)
    }

    #[tracing::instrument(skip(self))]
    fn read(&self) -> Result<RegistryFile> {
        let content = self.runtime.read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse link registry {:?}", self.path))
    }

    #[tracing::instrument(skip(self, file))]
    fn write(&self, file: &RegistryFile) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(file)?;
        let tmp_path = self.tmp_path();
        debug!("Writing {} link(s) to {:?}", file.packages.len(), self.path);

        self.runtime
            .write(&tmp_path, json.as_bytes())
            .with_context(|| format!("Failed to save link registry to {:?}", self.path))?;
        if let Err(e) = self.runtime.rename(&tmp_path, &self.path) {
            if let Err(cleanup) = self.runtime.remove_file(&tmp_path) {
                warn!("Failed to remove {:?}: {}", tmp_path, cleanup);
            }
            return Err(e.context(format!("Failed to save link registry to {:?}", self.path)));
        }
        Ok(())
    }
}
