//! A package whose installed copy is replaced by a local working directory.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::model::{DependencyLink, LinkKind, Package, PackageInfo};
use super::version::LINKED_VERSION;

/// Dist type that makes an installer link the package from a directory.
pub const PATH_DIST_TYPE: &str = "path";

/// One registered link.
///
/// Wraps the package read from the working copy's manifest and overrides
/// the fields an installer or resolver looks at:
///
/// - version is always [`LINKED_VERSION`]
/// - dist is always `path` pointing at the working copy, stability `stable`
/// - dependency lists come from either the manifest or the original
///   package, depending on `without_dependencies`
///
/// Everything else forwards to the wrapped package.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedPackage {
    path: PathBuf,
    dist_url: String,
    installation_path: PathBuf,
    inner: Package,
    original: Option<Package>,
    locked: Option<Package>,
    without_dependencies: bool,
}

impl LinkedPackage {
    pub fn new(
        path: PathBuf,
        installation_path: PathBuf,
        inner: Package,
        original: Option<Package>,
    ) -> Self {
        let dist_url = path.to_string_lossy().into_owned();
        Self {
            path,
            dist_url,
            installation_path,
            inner,
            original,
            locked: None,
            without_dependencies: false,
        }
    }

    /// The working copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the consuming project expects this package.
    pub fn installation_path(&self) -> &Path {
        &self.installation_path
    }

    pub fn set_installation_path(&mut self, installation_path: PathBuf) {
        self.installation_path = installation_path;
    }

    /// The package exactly as declared by the working copy's manifest.
    pub fn linked_package(&self) -> &Package {
        &self.inner
    }

    pub fn original_package(&self) -> Option<&Package> {
        self.original.as_ref()
    }

    pub fn set_original_package(&mut self, original: Option<Package>) {
        self.original = original;
    }

    pub fn locked_package(&self) -> Option<&Package> {
        self.locked.as_ref()
    }

    pub fn set_locked_package(&mut self, locked: Option<Package>) {
        self.locked = locked;
    }

    pub fn without_dependencies(&self) -> bool {
        self.without_dependencies
    }

    pub fn set_without_dependencies(&mut self, without_dependencies: bool) {
        self.without_dependencies = without_dependencies;
    }

    /// Requirement edge from the root package to this one.
    ///
    /// The constraint is the locked version when the lock file pins one,
    /// otherwise [`LINKED_VERSION`].
    pub fn create_link(&self, root_name: &str) -> DependencyLink {
        let constraint = self
            .locked
            .as_ref()
            .map(|locked| locked.pretty_version.as_str())
            .unwrap_or(LINKED_VERSION);
        DependencyLink::new(root_name, self.name(), constraint, LinkKind::Requires)
    }
}

impl PackageInfo for LinkedPackage {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn pretty_version(&self) -> &str {
        LINKED_VERSION
    }

    fn version(&self) -> &str {
        LINKED_VERSION
    }

    fn package_type(&self) -> &str {
        &self.inner.package_type
    }

    fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    fn requires(&self) -> &[DependencyLink] {
        if !self.without_dependencies {
            return &self.inner.requires;
        }
        self.original
            .as_ref()
            .map(|original| original.requires.as_slice())
            .unwrap_or(&[])
    }

    fn dev_requires(&self) -> &[DependencyLink] {
        if !self.without_dependencies {
            return &self.inner.dev_requires;
        }
        self.original
            .as_ref()
            .map(|original| original.dev_requires.as_slice())
            .unwrap_or(&[])
    }

    fn dist_type(&self) -> Option<&str> {
        Some(PATH_DIST_TYPE)
    }

    fn dist_url(&self) -> Option<&str> {
        Some(&self.dist_url)
    }

    fn installation_source(&self) -> Option<&str> {
        Some("dist")
    }

    fn stability(&self) -> &str {
        "stable"
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.inner.extra
    }
}
