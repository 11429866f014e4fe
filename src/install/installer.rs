use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::package::Package;

/// Download and install pipeline for ordinary (non-linked) packages.
///
/// Used to clear the installation path before linking and to restore the
/// original package on unlink. `download` always completes before
/// `install` is issued for the same package.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Installer: Send + Sync {
    /// Remove whatever is installed at `path`. Nothing there is not an error.
    fn remove(&self, package: &Package, path: &Path) -> Result<()>;

    /// Fetch the package's dist so `install` can run offline.
    async fn download(&self, package: &Package, path: &Path) -> Result<()>;

    /// Materialize the package at `path`.
    async fn install(&self, package: &Package, path: &Path) -> Result<()>;
}
