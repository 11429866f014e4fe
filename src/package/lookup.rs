//! Lookups into the package sets produced by the dependency resolver.
//!
//! The resolver writes two files this tool reads but never writes:
//! `<vendor>/installed.json` (what is installed right now) and the lock
//! file next to the root manifest (what is pinned). Both hold
//! `{ "packages": [ <package record>, ... ] }`.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::model::{Package, PackageRecord, check_package_name};

/// Canonical lookup of a resolved package by name.
#[cfg_attr(test, mockall::automock)]
pub trait PackageLookup {
    /// The package named `name` (case-insensitive), or `None` when the set
    /// holds no package or more than one package with that name.
    fn find_by_name(&self, name: &str) -> Option<Package>;
}

/// Where the consuming project installs a package.
#[cfg_attr(test, mockall::automock)]
pub trait InstallPaths {
    /// Fails for names that cannot map to a package directory of their own.
    fn install_path(&self, package: &Package) -> Result<PathBuf>;
}

#[derive(Deserialize, Debug, Default)]
struct PackageSetFile {
    #[serde(default)]
    packages: Vec<PackageRecord>,
}

/// A resolved package set loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct PackageSet {
    packages: Vec<Package>,
}

#[cfg(test)]
impl PackageSet {
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }
}

impl PackageSet {
    /// Load a package set file. A missing file is an empty set.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.exists(path) {
            debug!("{:?} does not exist, using empty package set", path);
            return Ok(Self::default());
        }

        let content = runtime.read_to_string(path)?;
        let file: PackageSetFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse package set {:?}", path))?;

        let packages = file
            .packages
            .into_iter()
            .map(Package::from_record)
            .collect::<Result<Vec<_>, String>>()
            .map_err(|reason| anyhow::anyhow!("Invalid package in {:?}: {}", path, reason))?;

        debug!("Loaded {} package(s) from {:?}", packages.len(), path);
        Ok(Self { packages })
    }
}

impl PackageLookup for PackageSet {
    fn find_by_name(&self, name: &str) -> Option<Package> {
        let mut matches = self
            .packages
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name));
        let first = matches.next()?;
        if matches.next().is_some() {
            warn!("More than one package named {} is installed, ignoring all of them", name);
            return None;
        }
        Some(first.clone())
    }
}

/// `<vendor>/<vendor-name>/<package-name>` layout.
#[derive(Debug, Clone)]
pub struct VendorLayout {
    vendor_dir: PathBuf,
}

impl VendorLayout {
    pub fn new(vendor_dir: PathBuf) -> Self {
        Self { vendor_dir }
    }
}

impl InstallPaths for VendorLayout {
    fn install_path(&self, package: &Package) -> Result<PathBuf> {
        check_package_name(&package.name).map_err(|reason| anyhow::anyhow!(reason))?;
        match package.name.split_once('/') {
            Some((vendor, name)) if !name.contains('/') => {
                Ok(self.vendor_dir.join(vendor).join(name))
            }
            _ => bail!(
                "Package name {} does not have the form <vendor>/<name>",
                package.name
            ),
        }
    }
}
