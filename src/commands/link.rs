use anyhow::{Context, Result};
use log::{debug, info};

use crate::config::ConfigOverrides;
use crate::install::LinkManager;
use crate::package::PackageInfo;
use crate::registry::{JsonFileStorage, LinkedPackagesRepository, Transformer};
use crate::runtime::Runtime;

use super::project::Project;

/// Link working copies into the project.
///
/// Linking a path that is already registered only updates its
/// without-dependencies flag and makes sure the link is in place.
#[tracing::instrument(skip(runtime, overrides))]
pub fn link<R: Runtime>(
    runtime: R,
    paths: &[String],
    without_dependencies: bool,
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
        let mut package = match registry.find_by_path(&path) {
            Some(existing) => {
                debug!("{:?} is already registered as {}", path, existing.name());
                existing
            }
            None => factory.from_path(&path)?,
        };
        package.set_without_dependencies(without_dependencies);
        manager.check(&package)?;

        if let Some(previous) = registry.find_by_name(package.name())
            && previous.path() != package.path()
        {
            info!(
                "{} was linked from {:?}, replacing",
                package.name(),
                previous.path()
            );
        }

        registry.store(&package);
        registry.persist()?;
        manager
            .link(&package)
            .with_context(|| format!("Failed to link {}", package.name()))?;

        println!(
            "Linked {} from {}{}",
            package.name(),
            package.path().display(),
            if without_dependencies {
                " (without dependencies)"
            } else {
                ""
            }
        );
    }

    Ok(())
}
