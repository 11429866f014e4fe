use anyhow::Result;
use log::debug;

use crate::config::ConfigOverrides;
use crate::install::LinkManager;
use crate::registry::{JsonFileStorage, LinkedPackagesRepository, Transformer};
use crate::runtime::Runtime;
use crate::sync::LinkSync;

use super::project::Project;

/// Relink every registered package the dependency installer replaced.
#[tracing::instrument(skip(runtime, overrides))]
pub fn sync<R: Runtime>(runtime: R, overrides: ConfigOverrides) -> Result<()> {
    let project = Project::load(&runtime, overrides)?;
    let factory = project.factory();
    let transformer = Transformer::new(&factory);
    let mut registry = LinkedPackagesRepository::load(
        JsonFileStorage::new(&runtime, project.config.registry_path.clone()),
        &transformer,
    )?;
    if registry.is_empty() {
        println!("No linked packages.");
        return Ok(());
    }

    let installer = project.dist_installer()?;
    let manager = LinkManager::new(&runtime, &installer);
    let root_name = project.root_name();

    let mut sync = LinkSync::new(&mut registry, &manager, &project.installed);
    let summary = sync.execute()?;
    for requirement in sync.requirements(&root_name) {
        debug!("{}", requirement);
    }

    println!(
        "Relinked {} package(s), {} already linked",
        summary.relinked, summary.already_linked
    );
    Ok(())
}
