use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use crate::package::{LinkedPackage, PackageInfo};
use crate::runtime::{Runtime, is_path_under, relative_symlink_path, same_path};

/// Installs a linked package as a directory link to its working copy.
pub struct LocalPathInstaller<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> LocalPathInstaller<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Refuse a working copy that is missing, or that lies at or below its
    /// installation path. Runs before anything at the installation path is
    /// removed.
    pub fn check_source(&self, package: &LinkedPackage) -> Result<()> {
        let source = package.path();
        if !self.runtime.is_dir(source) {
            bail!("Source path {:?} of {} is not a directory", source, package.name());
        }

        let target = package.installation_path();
        if is_path_under(source, target) {
            bail!(
                "Source path {:?} of {} lies inside its installation path {:?}",
                source,
                package.name(),
                target
            );
        }
        Ok(())
    }

    /// Make room for the link: create the parent directory and drop
    /// whatever is still at the installation path.
    #[tracing::instrument(skip(self, package), fields(package = %package.name()))]
    pub fn prepare(&self, package: &LinkedPackage) -> Result<()> {
        let target = package.installation_path();
        if let Some(parent) = target.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        if self.runtime.is_symlink(target) || self.runtime.is_junction(target) {
            debug!("Replacing existing link at {:?}", target);
            self.runtime.remove_symlink(target)?;
        } else if self.runtime.is_dir(target) {
            debug!("Removing leftover directory {:?}", target);
            self.runtime.remove_dir_all(target)?;
        } else if self.runtime.exists(target) {
            self.runtime.remove_file(target)?;
        }
        Ok(())
    }

    /// Link the installation path to the working copy, relative when possible.
    #[tracing::instrument(skip(self, package), fields(package = %package.name()))]
    pub fn install(&self, package: &LinkedPackage) -> Result<()> {
        let source = package.path();
        let target = package.installation_path();
        let link_target =
            relative_symlink_path(target, source).unwrap_or_else(|| source.to_path_buf());

        info!("Linking {} from {:?}", package.name(), source);
        self.runtime
            .symlink_dir(&link_target, target)
            .with_context(|| format!("Failed to link {:?} to {:?}", target, source))
    }

    /// Check that the link resolves to the working copy.
    pub fn cleanup(&self, package: &LinkedPackage) -> Result<()> {
        let target = package.installation_path();
        match self.runtime.resolve_link(target) {
            Ok(resolved) if same_path(&resolved, package.path()) => Ok(()),
            Ok(resolved) => {
                warn!(
                    "{:?} resolves to {:?} instead of {:?}",
                    target,
                    resolved,
                    package.path()
                );
                Ok(())
            }
            Err(e) => Err(e.context(format!("{:?} is not a link after install", target))),
        }
    }

    /// Remove the link at the installation path. The working copy is untouched.
    pub fn uninstall(&self, package: &LinkedPackage) -> Result<()> {
        let target = package.installation_path();
        if self.runtime.is_symlink(target) || self.runtime.is_junction(target) {
            info!("Removing link {:?}", target);
            self.runtime.remove_symlink(target)?;
        }
        Ok(())
    }
}
