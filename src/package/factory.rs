//! Builds linked packages from working-copy directories.

use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::runtime::Runtime;

use super::linked::LinkedPackage;
use super::lookup::{InstallPaths, PackageLookup};
use super::manifest::ManifestReader;

/// Reads a working copy and resolves everything a [`LinkedPackage`] needs:
/// the manifest, the currently installed package of the same name, the
/// locked version and the installation path.
pub struct LinkedPackageFactory<'a, R: Runtime> {
    reader: ManifestReader<'a, R>,
    installed: &'a dyn PackageLookup,
    locked: &'a dyn PackageLookup,
    install_paths: &'a dyn InstallPaths,
}

impl<'a, R: Runtime> LinkedPackageFactory<'a, R> {
    pub fn new(
        reader: ManifestReader<'a, R>,
        installed: &'a dyn PackageLookup,
        locked: &'a dyn PackageLookup,
        install_paths: &'a dyn InstallPaths,
    ) -> Self {
        Self {
            reader,
            installed,
            locked,
            install_paths,
        }
    }

    /// The installed package set, used to refresh original packages.
    pub fn installed(&self) -> &'a dyn PackageLookup {
        self.installed
    }

    /// Build a linked package from the manifest at `path`.
    ///
    /// A package that is not installed yet gets no original package; that
    /// is a valid state for linking something the project does not require
    /// yet.
    #[tracing::instrument(skip(self))]
    pub fn from_path(&self, path: &Path) -> Result<LinkedPackage> {
        let package = self.reader.read(path)?;
        let original = self.installed.find_by_name(&package.name);
        if original.is_none() {
            debug!("{} is not installed, linking without an original package", package.name);
        }
        let locked = self.locked.find_by_name(&package.name);
        let installation_path = self.install_paths.install_path(&package)?;

        let mut linked =
            LinkedPackage::new(path.to_path_buf(), installation_path, package, original);
        linked.set_locked_package(locked);
        Ok(linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use crate::package::lookup::{MockInstallPaths, MockPackageLookup};
    use crate::package::manifest::DEFAULT_MANIFEST_NAME;
    use crate::package::{LINKED_VERSION, Package, PackageInfo};
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn manifest_runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/work/foo/manifest.json")))
            .returning(|_| true);
        runtime.expect_read_to_string().returning(|_| {
            Ok(r#"{"name": "acme/foo", "version": "3.0.0", "require": {"acme/new": "^1.0"}}"#
                .to_string())
        });
        runtime
    }

    fn install_paths() -> MockInstallPaths {
        let mut paths = MockInstallPaths::new();
        paths
            .expect_install_path()
            .returning(|p| Ok(PathBuf::from("/project/vendor").join(&p.name)));
        paths
    }

    fn lookup(found: Option<Package>) -> MockPackageLookup {
        let mut lookup = MockPackageLookup::new();
        lookup
            .expect_find_by_name()
            .with(eq("acme/foo"))
            .returning(move |_| found.clone());
        lookup
    }

    #[test]
    fn test_from_path_with_installed_original() {
        let runtime = manifest_runtime();
        let installed = lookup(Some(Package::new("acme/foo", "1.0.0")));
        let locked = lookup(Some(Package::new("acme/foo", "1.0.0")));
        let paths = install_paths();
        let factory = LinkedPackageFactory::new(
            ManifestReader::new(&runtime, DEFAULT_MANIFEST_NAME),
            &installed,
            &locked,
            &paths,
        );

        let pkg = factory.from_path(Path::new("/work/foo")).unwrap();
        assert_eq!(pkg.name(), "acme/foo");
        assert_eq!(pkg.version(), LINKED_VERSION);
        assert_eq!(pkg.path(), Path::new("/work/foo"));
        assert_eq!(pkg.installation_path(), Path::new("/project/vendor/acme/foo"));
        assert_eq!(pkg.original_package().unwrap().pretty_version, "1.0.0");
        assert_eq!(pkg.locked_package().unwrap().pretty_version, "1.0.0");
        assert_eq!(pkg.requires()[0].target, "acme/new");
        assert!(!pkg.without_dependencies());
    }

    #[test]
    fn test_from_path_not_installed_is_valid() {
        let runtime = manifest_runtime();
        let installed = lookup(None);
        let locked = lookup(None);
        let paths = install_paths();
        let factory = LinkedPackageFactory::new(
            ManifestReader::new(&runtime, DEFAULT_MANIFEST_NAME),
            &installed,
            &locked,
            &paths,
        );

        let pkg = factory.from_path(Path::new("/work/foo")).unwrap();
        assert!(pkg.original_package().is_none());
        assert!(pkg.locked_package().is_none());
    }

    #[test]
    fn test_from_path_without_manifest() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        // Lookups must not be consulted when the manifest is missing
        let installed = MockPackageLookup::new();
        let locked = MockPackageLookup::new();
        let paths = MockInstallPaths::new();
        let factory = LinkedPackageFactory::new(
            ManifestReader::new(&runtime, DEFAULT_MANIFEST_NAME),
            &installed,
            &locked,
            &paths,
        );

        let err = factory.from_path(Path::new("/work/missing")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::ManifestNotFound { .. })
        ));
    }
}
