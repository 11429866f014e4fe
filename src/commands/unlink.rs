use anyhow::{Context, Result};
use log::debug;

use crate::config::ConfigOverrides;
use crate::install::LinkManager;
use crate::package::{LinkedPackage, PackageInfo};
use crate::registry::{JsonFileStorage, LinkedPackagesRepository, Storage, Transformer};
use crate::runtime::Runtime;

use super::project::Project;

/// Restore the original packages for the given working copies.
#[tracing::instrument(skip(runtime, overrides))]
pub async fn unlink<R: Runtime>(
    runtime: R,
    paths: &[String],
    overrides: ConfigOverrides,
) -> Result<()> {
    let project = Project::load(&runtime, overrides)?;
    let factory = project.factory();
    let transformer = Transformer::new(&factory);
    let mut registry = LinkedPackagesRepository::load(
        JsonFileStorage::new(&runtime, project.config.registry_path.clone()),
        &transformer,
    )?;
    let installer = project.dist_installer()?;
    let manager = LinkManager::new(&runtime, &installer);

    for path in project.expand(paths)? {
        match registry.find_by_path(&path) {
            Some(package) => unlink_one(&manager, &mut registry, &package).await?,
            None => eprintln!("warning: {} is not linked, skipping", path.display()),
        }
    }
    Ok(())
}

/// Unlink every registered package.
#[tracing::instrument(skip(runtime, overrides))]
pub async fn unlink_all<R: Runtime>(runtime: R, overrides: ConfigOverrides) -> Result<()> {
    let project = Project::load(&runtime, overrides)?;
    let factory = project.factory();
    let transformer = Transformer::new(&factory);
    let mut registry = LinkedPackagesRepository::load(
        JsonFileStorage::new(&runtime, project.config.registry_path.clone()),
        &transformer,
    )?;
    let installer = project.dist_installer()?;
    let manager = LinkManager::new(&runtime, &installer);

    let packages = registry.all();
    if packages.is_empty() {
        println!("No linked packages.");
        return Ok(());
    }
    for package in packages {
        unlink_one(&manager, &mut registry, &package).await?;
    }
    Ok(())
}

/// Restore first, then forget the entry, so a package that cannot be
/// restored stays registered.
async fn unlink_one<R: Runtime, S: Storage>(
    manager: &LinkManager<'_, R>,
    registry: &mut LinkedPackagesRepository<S>,
    package: &LinkedPackage,
) -> Result<()> {
    debug!("Unlinking {} at {:?}", package.name(), package.path());
    manager
        .unlink(package)
        .await
        .with_context(|| format!("Failed to unlink {}", package.name()))?;
    registry.remove(package)?;
    registry.persist()?;

    match package.original_package() {
        Some(original) => println!(
            "Unlinked {}, restored {}",
            package.name(),
            original.pretty_version
        ),
        None => println!("Unlinked {}", package.name()),
    }
    Ok(())
}
