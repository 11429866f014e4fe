//! Persistent registry of linked packages.
//!
//! The registry file keeps only what cannot be derived again: where each
//! working copy lives, where it is installed, the flag it was linked with
//! and which release it replaced. Everything else is re-read from the
//! working copy's manifest on load.

mod repository;
mod storage;
mod transformer;

pub use repository::LinkedPackagesRepository;
pub use storage::{JsonFileStorage, Storage};
pub use transformer::{LinkedPackageRecord, PackageStub, RegistryFile, Transformer, export};

/// Default registry file name inside the vendor directory.
pub const REGISTRY_FILE_NAME: &str = "linked-packages.json";
