//! Package model.
//!
//! Manifests, resolved package sets, and the [`LinkedPackage`] decorator that
//! makes a working copy look like an installable package.

mod factory;
mod linked;
mod lookup;
mod manifest;
mod model;
mod version;

pub use factory::LinkedPackageFactory;
pub use linked::{LinkedPackage, PATH_DIST_TYPE};
pub use lookup::{InstallPaths, PackageLookup, PackageSet, VendorLayout};
pub use manifest::{DEFAULT_MANIFEST_NAME, ManifestReader};
pub use model::{
    DependencyLink, Dist, LinkKind, Package, PackageInfo, PackageRecord, check_package_name,
};
pub use version::{DEFAULT_MANIFEST_VERSION, LINKED_VERSION, normalize_version};

#[cfg(test)]
pub use lookup::{MockInstallPaths, MockPackageLookup};
