//! Reading package manifests from working copies.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::runtime::Runtime;

use super::model::{Package, PackageRecord};
use super::version::DEFAULT_MANIFEST_VERSION;

/// Default manifest file name inside a package directory.
pub const DEFAULT_MANIFEST_NAME: &str = "manifest.json";

/// Reads the manifest file of a package directory.
pub struct ManifestReader<'a, R: Runtime> {
    runtime: &'a R,
    file_name: String,
}

impl<'a, R: Runtime> ManifestReader<'a, R> {
    pub fn new(runtime: &'a R, file_name: impl Into<String>) -> Self {
        Self {
            runtime,
            file_name: file_name.into(),
        }
    }

    pub fn manifest_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }

    /// Read and parse the manifest in `dir`.
    ///
    /// A manifest without `version` gets [`DEFAULT_MANIFEST_VERSION`].
    #[tracing::instrument(skip(self))]
    pub fn read(&self, dir: &Path) -> Result<Package> {
        let manifest_path = self.manifest_path(dir);
        if dir.as_os_str().is_empty() || !self.runtime.exists(&manifest_path) {
            return Err(LinkError::ManifestNotFound {
                path: manifest_path,
            }
            .into());
        }

        let content = self.runtime.read_to_string(&manifest_path)?;
        let mut record: PackageRecord =
            serde_json::from_str(&content).map_err(|e| LinkError::ManifestInvalid {
                path: manifest_path.clone(),
                reason: e.to_string(),
            })?;

        if record.version.is_none() {
            debug!(
                "{:?} declares no version, using {}",
                manifest_path, DEFAULT_MANIFEST_VERSION
            );
            record.version = Some(DEFAULT_MANIFEST_VERSION.to_string());
        }

        Package::from_record(record).map_err(|reason| {
            LinkError::ManifestInvalid {
                path: manifest_path,
                reason,
            }
            .into()
        })
    }
}
