use anyhow::Result;
use log::{debug, info};

use crate::error::LinkError;
use crate::package::{LinkedPackage, PackageInfo};
use crate::runtime::Runtime;

use super::installer::Installer;
use super::local::LocalPathInstaller;

/// Switches a package's installation path between the working-copy link
/// and a regular install of the original package.
pub struct LinkManager<'a, R: Runtime> {
    runtime: &'a R,
    local: LocalPathInstaller<'a, R>,
    installer: &'a dyn Installer,
}

impl<'a, R: Runtime> LinkManager<'a, R> {
    pub fn new(runtime: &'a R, installer: &'a dyn Installer) -> Self {
        Self {
            runtime,
            local: LocalPathInstaller::new(runtime),
            installer,
        }
    }

    /// The installation path is a directory symlink or a junction.
    pub fn is_linked(&self, package: &LinkedPackage) -> bool {
        let path = package.installation_path();
        self.runtime.is_symlinked_dir(path) || self.runtime.is_junction(path)
    }

    /// Fails when linking `package` would remove its own working copy.
    pub fn check(&self, package: &LinkedPackage) -> Result<()> {
        self.local.check_source(package)
    }

    /// Replace whatever is installed with a link to the working copy.
    ///
    /// The working copy is checked before anything is removed. An existing
    /// link is re-created; a regular install goes through the installer.
    #[tracing::instrument(skip(self, package), fields(package = %package.name()))]
    pub fn link(&self, package: &LinkedPackage) -> Result<()> {
        self.check(package)?;

        if self.is_linked(package) {
            debug!("{} is already linked, re-creating the link", package.name());
        } else if let Some(original) = package.original_package() {
            self.installer.remove(original, package.installation_path())?;
        }

        self.local.prepare(package)?;
        self.local.install(package)?;
        self.local.cleanup(package)?;
        Ok(())
    }

    /// Remove the link and restore the original package.
    ///
    /// Fails with [`LinkError::NoOriginalPackage`] before touching the
    /// filesystem when there is nothing to restore.
    #[tracing::instrument(skip(self, package), fields(package = %package.name()))]
    pub async fn unlink(&self, package: &LinkedPackage) -> Result<()> {
        let Some(original) = package.original_package() else {
            return Err(LinkError::NoOriginalPackage(package.name().to_string()).into());
        };
        let path = package.installation_path();

        if self.is_linked(package) {
            self.local.uninstall(package)?;
        } else {
            self.installer.remove(original, path)?;
        }

        self.installer.download(original, path).await?;
        self.installer.install(original, path).await?;
        info!("Restored {} ({})", original.name, original.pretty_version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClient;
    use crate::install::DistInstaller;
    use crate::install::installer::MockInstaller;
    use crate::package::Package;
    use crate::runtime::{MockRuntime, RealRuntime, same_path};
    use mockall::Sequence;
    use mockall::predicate::{always, eq};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn original() -> Package {
        Package::new("acme/foo", "1.0.0").with_dist("zip", "https://example.com/foo.zip")
    }

    #[tokio::test]
    async fn test_unlink_without_original_touches_nothing() {
        // No expectations: any filesystem or installer call fails the test
        let runtime = MockRuntime::new();
        let installer = MockInstaller::new();
        let manager = LinkManager::new(&runtime, &installer);

        let pkg = LinkedPackage::new(
            PathBuf::from("/work/foo"),
            PathBuf::from("/project/vendor/acme/foo"),
            Package::new("acme/foo", "2.0.0"),
            None,
        );

        let err = manager.unlink(&pkg).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::NoOriginalPackage(name)) if name == "acme/foo"
        ));
    }

    #[tokio::test]
    async fn test_unlink_downloads_before_install() {
        let target = PathBuf::from("/project/vendor/acme/foo");
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_symlinked_dir()
            .with(eq(target.clone()))
            .returning(|_| true);
        runtime.expect_is_symlink().returning(|_| true);
        runtime
            .expect_remove_symlink()
            .with(eq(target.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let mut seq = Sequence::new();
        let mut installer = MockInstaller::new();
        installer
            .expect_download()
            .with(eq(original()), eq(target.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        installer
            .expect_install()
            .with(eq(original()), eq(target.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let manager = LinkManager::new(&runtime, &installer);
        let pkg = LinkedPackage::new(
            PathBuf::from("/work/foo"),
            target,
            Package::new("acme/foo", "2.0.0"),
            Some(original()),
        );
        manager.unlink(&pkg).await.unwrap();
    }

    #[tokio::test]
    async fn test_unlink_propagates_download_failure() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_symlinked_dir().returning(|_| false);
        runtime.expect_is_junction().returning(|_| false);

        let mut installer = MockInstaller::new();
        installer.expect_remove().returning(|_, _| Ok(()));
        installer
            .expect_download()
            .returning(|_, _| Err(anyhow::anyhow!("network down")));
        installer.expect_install().times(0);

        let manager = LinkManager::new(&runtime, &installer);
        let pkg = LinkedPackage::new(
            PathBuf::from("/work/foo"),
            PathBuf::from("/project/vendor/acme/foo"),
            Package::new("acme/foo", "2.0.0"),
            Some(original()),
        );
        let err = manager.unlink(&pkg).await.unwrap_err();
        assert!(err.to_string().contains("network down"));
    }

    #[test]
    #[cfg_attr(
        pkglink_skip_cross_windows_tests,
        ignore = "symlink tests are skipped for cross-compiled Windows runs"
    )]
    fn test_link_replaces_materialized_copy() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("work/foo");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("manifest.json"), r#"{"name": "acme/foo"}"#).unwrap();
        let target = dir.path().join("vendor/acme/foo");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("installed.txt"), "1.0.0").unwrap();

        let runtime = RealRuntime;
        let mut installer = MockInstaller::new();
        let removed_target = target.clone();
        installer
            .expect_remove()
            .with(eq(original()), always())
            .times(1)
            .returning(move |_, path| {
                assert_eq!(path, removed_target.as_path());
                fs::remove_dir_all(path)?;
                Ok(())
            });

        let manager = LinkManager::new(&runtime, &installer);
        let pkg = LinkedPackage::new(
            source.clone(),
            target.clone(),
            Package::new("acme/foo", "2.0.0"),
            Some(original()),
        );

        assert!(!manager.is_linked(&pkg));
        manager.link(&pkg).unwrap();

        assert!(manager.is_linked(&pkg));
        assert!(!target.join("installed.txt").exists());
        assert!(target.join("manifest.json").exists());
        assert_eq!(
            runtime.resolve_link(&target).unwrap(),
            crate::runtime::normalize_path(&source)
        );
    }

    #[test]
    #[cfg_attr(
        pkglink_skip_cross_windows_tests,
        ignore = "symlink tests are skipped for cross-compiled Windows runs"
    )]
    fn test_link_is_idempotent() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("work/foo");
        fs::create_dir_all(&source).unwrap();
        let target = dir.path().join("vendor/acme/foo");

        let runtime = RealRuntime;
        // Nothing installed yet, so nothing to remove
        let installer = MockInstaller::new();
        let manager = LinkManager::new(&runtime, &installer);
        let pkg = LinkedPackage::new(
            source.clone(),
            target.clone(),
            Package::new("acme/foo", "2.0.0"),
            None,
        );

        manager.link(&pkg).unwrap();
        let first = fs::read_link(&target).unwrap();
        manager.link(&pkg).unwrap();

        assert!(manager.is_linked(&pkg));
        assert_eq!(fs::read_link(&target).unwrap(), first);
    }

    #[test]
    #[cfg_attr(
        pkglink_skip_cross_windows_tests,
        ignore = "symlink tests are skipped for cross-compiled Windows runs"
    )]
    fn test_link_repoints_existing_link() {
        let dir = tempdir().unwrap();
        let old_source = dir.path().join("work/foo-old");
        let source = dir.path().join("work/foo");
        fs::create_dir_all(&old_source).unwrap();
        fs::create_dir_all(&source).unwrap();
        let target = dir.path().join("vendor/acme/foo");
        fs::create_dir_all(target.parent().unwrap()).unwrap();

        let runtime = RealRuntime;
        runtime.symlink_dir(&old_source, &target).unwrap();
        // Already linked, so the released package is not removed
        let installer = MockInstaller::new();
        let manager = LinkManager::new(&runtime, &installer);
        let pkg = LinkedPackage::new(
            source.clone(),
            target.clone(),
            Package::new("acme/foo", "2.0.0"),
            Some(Package::new("acme/foo", "1.0.0")),
        );

        manager.link(&pkg).unwrap();

        assert!(manager.is_linked(&pkg));
        assert!(same_path(&runtime.resolve_link(&target).unwrap(), &source));
        assert!(old_source.is_dir());
    }

    #[test]
    fn test_link_refuses_working_copy_at_installation_path() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("vendor/acme/foo");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("manifest.json"), r#"{"name": "acme/foo"}"#).unwrap();
        fs::write(target.join("precious.txt"), "work in progress").unwrap();

        let runtime = RealRuntime;
        let client = HttpClient::new(reqwest::Client::new());
        let installer = DistInstaller::new(&runtime, client, dir.path().join("vendor/.cache"));
        let manager = LinkManager::new(&runtime, &installer);
        let pkg = LinkedPackage::new(
            target.clone(),
            target.clone(),
            Package::new("acme/foo", "2.0.0"),
            Some(Package::new("acme/foo", "1.0.0")),
        );

        let err = manager.link(&pkg).unwrap_err();
        assert!(err.to_string().contains("lies inside its installation path"));
        assert_eq!(
            fs::read_to_string(target.join("precious.txt")).unwrap(),
            "work in progress"
        );
    }
}
