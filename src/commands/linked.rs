use anyhow::Result;

use crate::config::ConfigOverrides;
use crate::install::LinkManager;
use crate::package::{LinkedPackage, PackageInfo};
use crate::registry::{JsonFileStorage, LinkedPackagesRepository, Transformer};
use crate::runtime::Runtime;

use super::project::Project;

/// List registered packages with their link state.
#[tracing::instrument(skip(runtime, overrides))]
pub fn linked<R: Runtime>(runtime: R, overrides: ConfigOverrides) -> Result<()> {
    let project = Project::load(&runtime, overrides)?;
    let factory = project.factory();
    let transformer = Transformer::new(&factory);
    let registry = LinkedPackagesRepository::load(
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

    let root_name = project.root_name();
    for package in &packages {
        println!(
            "{}",
            format_entry(package, manager.is_linked(package), &root_name)
        );
    }
    Ok(())
}

fn format_entry(package: &LinkedPackage, is_linked: bool, root_name: &str) -> String {
    let mut line = format!(
        "{} {} ({}) -> {}",
        package.name(),
        package.path().display(),
        if is_linked { "linked" } else { "not linked" },
        package.create_link(root_name).constraint
    );
    if package.without_dependencies() {
        line.push_str(" [without dependencies]");
    }
    line
}
