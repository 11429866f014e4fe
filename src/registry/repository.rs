use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

use crate::error::LinkError;
use crate::package::{LinkedPackage, PackageInfo};
use crate::runtime::{Runtime, same_path};

use super::storage::Storage;
use super::transformer::{RegistryFile, Transformer, export};

/// The set of currently linked packages.
///
/// Holds at most one entry per package name. Mutations only touch memory
/// until [`persist`](Self::persist) is called.
pub struct LinkedPackagesRepository<S: Storage> {
    storage: S,
    packages: Vec<LinkedPackage>,
}

impl<S: Storage> LinkedPackagesRepository<S> {
    /// An empty registry backed by `storage`. Nothing is read.
    pub fn empty(storage: S) -> Self {
        Self {
            storage,
            packages: Vec::new(),
        }
    }

    /// Load the registry, re-reading every linked package's manifest.
    ///
    /// A missing document is an empty registry. A record that cannot be
    /// rebuilt fails the whole load.
    #[tracing::instrument(skip(storage, transformer))]
    pub fn load<R: Runtime>(storage: S, transformer: &Transformer<'_, R>) -> Result<Self> {
        if !storage.has_data() {
            debug!("No link registry yet");
            return Ok(Self::empty(storage));
        }

        let file = storage.read()?;
        let mut packages = Vec::with_capacity(file.packages.len());
        for record in &file.packages {
            let package = transformer
                .load(record)
                .with_context(|| format!("Failed to load linked package at {:?}", record.path))?;
            packages.push(package);
        }
        debug!("Loaded {} linked package(s)", packages.len());

        Ok(Self { storage, packages })
    }

    /// Add `package`, replacing an entry with the same name in place.
    pub fn store(&mut self, package: &LinkedPackage) {
        match self
            .packages
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(package.name()))
        {
            Some(index) => self.packages[index] = package.clone(),
            None => self.packages.push(package.clone()),
        }
    }

    pub fn all(&self) -> Vec<LinkedPackage> {
        self.packages.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn find_by_path(&self, path: &Path) -> Option<LinkedPackage> {
        self.packages
            .iter()
            .find(|p| same_path(p.path(), path))
            .cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<LinkedPackage> {
        self.packages
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Remove the entry for `package`'s name.
    pub fn remove(&mut self, package: &LinkedPackage) -> Result<()> {
        let index = self
            .packages
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(package.name()))
            .ok_or_else(|| LinkError::EntryNotFound(package.name().to_string()))?;
        self.packages.remove(index);
        Ok(())
    }

    /// Write the current entries through the storage backend.
    pub fn persist(&self) -> Result<()> {
        let file = RegistryFile {
            packages: self.packages.iter().map(export).collect(),
        };
        self.storage.write(&file)?;
        info!("Saved {} linked package(s)", file.packages.len());
        Ok(())
    }
}
