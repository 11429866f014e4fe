use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::config::{Config, ConfigOverrides};
use crate::install::DistInstaller;
use crate::package::{LinkedPackageFactory, ManifestReader, PackageInfo, PackageSet, VendorLayout};
use crate::runtime::{Runtime, expand_paths};

/// Requirement source used when the project has no readable root manifest.
const FALLBACK_ROOT_NAME: &str = "__root__";

/// Everything a command needs to know about the consuming project.
pub struct Project<'a, R: Runtime> {
    pub runtime: &'a R,
    pub config: Config,
    pub installed: PackageSet,
    pub locked: PackageSet,
    pub layout: VendorLayout,
}

impl<'a, R: Runtime> Project<'a, R> {
    pub fn load(runtime: &'a R, overrides: ConfigOverrides) -> Result<Self> {
        let config = Config::load(runtime, overrides)?;
        let installed = PackageSet::load(runtime, &config.installed_path())?;
        let locked = PackageSet::load(runtime, &config.lock_path())?;
        let layout = VendorLayout::new(config.vendor_dir.clone());
        Ok(Self {
            runtime,
            config,
            installed,
            locked,
            layout,
        })
    }

    pub fn manifest_reader(&self) -> ManifestReader<'a, R> {
        ManifestReader::new(self.runtime, self.config.manifest_name.clone())
    }

    pub fn factory(&self) -> LinkedPackageFactory<'_, R> {
        LinkedPackageFactory::new(
            self.manifest_reader(),
            &self.installed,
            &self.locked,
            &self.layout,
        )
    }

    pub fn dist_installer(&self) -> Result<DistInstaller<'a, R>> {
        Ok(DistInstaller::new(
            self.runtime,
            self.config.http_client(self.runtime)?,
            self.config.cache_dir(),
        ))
    }

    /// Name of the root package, used as the source of link requirements.
    pub fn root_name(&self) -> String {
        match self.manifest_reader().read(&self.config.project_dir) {
            Ok(root) => root.name().to_string(),
            Err(e) => {
                debug!("No usable root manifest: {}", e);
                FALLBACK_ROOT_NAME.to_string()
            }
        }
    }

    /// Expand every user supplied path, keeping their order.
    pub fn expand(&self, inputs: &[String]) -> Result<Vec<PathBuf>> {
        let cwd = self.runtime.current_dir()?;
        let mut paths = Vec::new();
        for input in inputs {
            let expanded = expand_paths(&cwd, input)?;
            if expanded.is_empty() {
                eprintln!("warning: '{}' does not match any directory", input);
            }
            paths.extend(expanded);
        }
        Ok(paths)
    }
}
