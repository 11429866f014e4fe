//! Conversion between linked packages and their persisted records.
//!
//! Only identity survives a round trip through storage. Dependency lists and
//! other manifest fields are read again from the working copy on load, so
//! edits made between runs are always picked up.

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::package::{LinkedPackage, LinkedPackageFactory, Package};
use crate::runtime::Runtime;

/// The registry document: `{ "packages": [ ... ] }`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RegistryFile {
    #[serde(default)]
    pub packages: Vec<LinkedPackageRecord>,
}

/// Identity-level package fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageStub {
    pub name: String,
    pub version: String,
    pub version_normalized: String,
    #[serde(rename = "type")]
    pub package_type: String,
}

impl PackageStub {
    fn from_package(package: &Package) -> Self {
        Self {
            name: package.name.clone(),
            version: package.pretty_version.clone(),
            version_normalized: package.version_normalized.clone(),
            package_type: package.package_type.clone(),
        }
    }

    fn to_package(&self) -> Package {
        let mut package = Package::new(&self.name, &self.version);
        package.version_normalized = self.version_normalized.clone();
        package.package_type = self.package_type.clone();
        package
    }
}

/// One persisted link.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkedPackageRecord {
    pub path: PathBuf,
    #[serde(rename = "installationPath")]
    pub installation_path: PathBuf,
    pub package: PackageStub,
    #[serde(
        rename = "originalPackage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_package: Option<PackageStub>,
    #[serde(rename = "withoutDependencies", default)]
    pub without_dependencies: bool,
}

/// The persisted form of `package`.
pub fn export(package: &LinkedPackage) -> LinkedPackageRecord {
    LinkedPackageRecord {
        path: package.path().to_path_buf(),
        installation_path: package.installation_path().to_path_buf(),
        package: PackageStub::from_package(package.linked_package()),
        original_package: package.original_package().map(PackageStub::from_package),
        without_dependencies: package.without_dependencies(),
    }
}

pub struct Transformer<'a, R: Runtime> {
    factory: &'a LinkedPackageFactory<'a, R>,
}

impl<'a, R: Runtime> Transformer<'a, R> {
    pub fn new(factory: &'a LinkedPackageFactory<'a, R>) -> Self {
        Self { factory }
    }

    /// Rebuild a linked package by re-reading the manifest at `record.path`.
    ///
    /// The stored original package is restored. When the installed set still
    /// holds that exact release, the installed record is used since it
    /// carries dependency lists and dist information the stub lacks.
    #[tracing::instrument(skip(self, record), fields(path = ?record.path))]
    pub fn load(&self, record: &LinkedPackageRecord) -> Result<LinkedPackage> {
        let mut package = self.factory.from_path(&record.path)?;

        if package.linked_package().name.eq_ignore_ascii_case(&record.package.name) {
            package.set_installation_path(record.installation_path.clone());
        } else {
            warn!(
                "Package at {:?} was renamed from {} to {}",
                record.path,
                record.package.name,
                package.linked_package().name
            );
        }

        package.set_without_dependencies(record.without_dependencies);

        if let Some(stub) = &record.original_package {
            let installed = self
                .factory
                .installed()
                .find_by_name(&stub.name)
                .filter(|p| p.version_normalized == stub.version_normalized);
            if installed.is_none() {
                debug!(
                    "{} {} is no longer installed, restoring stored reference",
                    stub.name, stub.version
                );
            }
            package.set_original_package(Some(installed.unwrap_or_else(|| stub.to_package())));
        }

        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{
        DEFAULT_MANIFEST_NAME, ManifestReader, MockInstallPaths, MockPackageLookup, PackageInfo,
    };
    use crate::runtime::MockRuntime;
    use std::path::Path;

    fn manifest_runtime(name: &'static str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime.expect_read_to_string().returning(move |_| {
            Ok(format!(
                r#"{{"name": "{}", "version": "2.0.0", "require": {{"acme/dep": "^3.0"}}}}"#,
                name
            ))
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

    fn lookup_of(packages: Vec<Package>) -> MockPackageLookup {
        let mut lookup = MockPackageLookup::new();
        lookup.expect_find_by_name().returning(move |name| {
            packages.iter().find(|p| p.name == name).cloned()
        });
        lookup
    }

    fn record() -> LinkedPackageRecord {
        LinkedPackageRecord {
            path: PathBuf::from("/work/foo"),
            installation_path: PathBuf::from("/project/vendor/acme/foo"),
            package: PackageStub {
                name: "acme/foo".into(),
                version: "1.5.0".into(),
                version_normalized: "1.5.0.0".into(),
                package_type: "library".into(),
            },
            original_package: Some(PackageStub {
                name: "acme/foo".into(),
                version: "1.0.0".into(),
                version_normalized: "1.0.0.0".into(),
                package_type: "library".into(),
            }),
            without_dependencies: true,
        }
    }

    #[test]
    fn test_export_keeps_identity_only() {
        let inner = Package::new("acme/foo", "2.0.0").with_requires(&[("acme/dep", "^3.0")]);
        let original = Package::new("acme/foo", "1.0.0").with_dist("zip", "https://x/foo.zip");
        let mut pkg = LinkedPackage::new(
            PathBuf::from("/work/foo"),
            PathBuf::from("/project/vendor/acme/foo"),
            inner,
            Some(original),
        );
        pkg.set_without_dependencies(true);

        let record = export(&pkg);
        assert_eq!(record.path, PathBuf::from("/work/foo"));
        assert_eq!(record.package.version, "2.0.0");
        assert_eq!(record.original_package.as_ref().unwrap().version, "1.0.0");
        assert!(record.without_dependencies);

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("require"));
        assert!(!json.contains("dist"));
    }

    #[test]
    fn test_export_omits_missing_original() {
        let pkg = LinkedPackage::new(
            PathBuf::from("/work/foo"),
            PathBuf::from("/project/vendor/acme/foo"),
            Package::new("acme/foo", "2.0.0"),
            None,
        );
        let json = serde_json::to_value(export(&pkg)).unwrap();
        assert!(json.get("originalPackage").is_none());
        assert_eq!(json["withoutDependencies"], false);
    }

    #[test]
    fn test_load_rereads_manifest() {
        let runtime = manifest_runtime("acme/foo");
        let installed = lookup_of(vec![]);
        let locked = lookup_of(vec![]);
        let paths = install_paths();
        let factory = LinkedPackageFactory::new(
            ManifestReader::new(&runtime, DEFAULT_MANIFEST_NAME),
            &installed,
            &locked,
            &paths,
        );
        let transformer = Transformer::new(&factory);

        let pkg = transformer.load(&record()).unwrap();
        // Stored 1.5.0 is stale; the manifest now says 2.0.0
        assert_eq!(pkg.linked_package().pretty_version, "2.0.0");
        assert_eq!(pkg.requires().len(), 0, "without dependencies and stub original");
        assert!(pkg.without_dependencies());
        assert_eq!(pkg.original_package().unwrap().pretty_version, "1.0.0");
        assert_eq!(pkg.installation_path(), Path::new("/project/vendor/acme/foo"));
    }

    #[test]
    fn test_load_prefers_installed_original_of_same_release() {
        let runtime = manifest_runtime("acme/foo");
        let installed = lookup_of(vec![
            Package::new("acme/foo", "1.0.0")
                .with_requires(&[("acme/orig-dep", "^1.0")])
                .with_dist("zip", "https://example.com/foo.zip"),
        ]);
        let locked = lookup_of(vec![]);
        let paths = install_paths();
        let factory = LinkedPackageFactory::new(
            ManifestReader::new(&runtime, DEFAULT_MANIFEST_NAME),
            &installed,
            &locked,
            &paths,
        );
        let transformer = Transformer::new(&factory);

        let pkg = transformer.load(&record()).unwrap();
        let original = pkg.original_package().unwrap();
        assert!(original.dist.is_some());
        assert_eq!(pkg.requires()[0].target, "acme/orig-dep");
    }

    #[test_log::test]
    fn test_load_renamed_package_keeps_derived_path() {
        let runtime = manifest_runtime("acme/renamed");
        let installed = lookup_of(vec![]);
        let locked = lookup_of(vec![]);
        let paths = install_paths();
        let factory = LinkedPackageFactory::new(
            ManifestReader::new(&runtime, DEFAULT_MANIFEST_NAME),
            &installed,
            &locked,
            &paths,
        );

        let pkg = Transformer::new(&factory).load(&record()).unwrap();
        assert_eq!(pkg.name(), "acme/renamed");
        assert_eq!(
            pkg.installation_path(),
            Path::new("/project/vendor/acme/renamed")
        );
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["path"], "/work/foo");
        assert_eq!(json["installationPath"], "/project/vendor/acme/foo");
        assert_eq!(json["package"]["type"], "library");
        assert_eq!(json["package"]["version_normalized"], "1.5.0.0");
        assert_eq!(json["originalPackage"]["version"], "1.0.0");
        assert_eq!(json["withoutDependencies"], true);
    }
}
