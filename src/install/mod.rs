//! Installing and removing packages at their installation path.
//!
//! - `local` - directory links to working copies
//! - `dist` - regular installs from a package's dist (archive or path)
//! - `manager` - the link/unlink state switch built on both

mod dist;
mod installer;
mod local;
mod manager;

pub use dist::DistInstaller;
pub use installer::Installer;
pub use local::LocalPathInstaller;
pub use manager::LinkManager;

#[cfg(test)]
pub use installer::MockInstaller;
