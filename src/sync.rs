//! Re-applying registered links after the dependency installer ran.
//!
//! An install run replaces linked directories with regular copies. Sync
//! walks the registry, picks up the freshly installed release as each
//! package's original and links the working copy back in.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::install::LinkManager;
use crate::package::{DependencyLink, PackageInfo, PackageLookup};
use crate::registry::{LinkedPackagesRepository, Storage};
use crate::runtime::Runtime;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub relinked: usize,
    pub already_linked: usize,
}

pub struct LinkSync<'a, R: Runtime, S: Storage> {
    registry: &'a mut LinkedPackagesRepository<S>,
    manager: &'a LinkManager<'a, R>,
    installed: &'a dyn PackageLookup,
}

impl<'a, R: Runtime, S: Storage> LinkSync<'a, R, S> {
    pub fn new(
        registry: &'a mut LinkedPackagesRepository<S>,
        manager: &'a LinkManager<'a, R>,
        installed: &'a dyn PackageLookup,
    ) -> Self {
        Self {
            registry,
            manager,
            installed,
        }
    }

    /// Link every registered package whose link is gone.
    ///
    /// The registry is persisted before each link, so a failure part way
    /// through keeps the refreshed originals of the packages handled so far.
    #[tracing::instrument(skip(self))]
    pub fn execute(&mut self) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        for mut package in self.registry.all() {
            if self.manager.is_linked(&package) {
                debug!("{} is still linked", package.name());
                summary.already_linked += 1;
                continue;
            }

            package.set_original_package(self.installed.find_by_name(package.name()));
            self.registry.store(&package);
            self.registry.persist()?;

            self.manager
                .link(&package)
                .with_context(|| format!("Failed to relink {}", package.name()))?;
            info!("Relinked {} from {:?}", package.name(), package.path());
            summary.relinked += 1;
        }

        self.registry.persist()?;
        Ok(summary)
    }

    /// Requirements a resolver should apply on behalf of `root_name` so each
    /// linked package resolves to its locked release or the linked marker.
    pub fn requirements(&self, root_name: &str) -> Vec<DependencyLink> {
        self.registry
            .all()
            .iter()
            .map(|package| package.create_link(root_name))
            .collect()
    }
}
