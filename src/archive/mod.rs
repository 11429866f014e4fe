//! Unpacking of `zip` and `tar` dist archives.
//!
//! Both formats unpack into a staging directory next to the destination
//! first. If the archive wraps everything in a single top-level directory
//! (the usual layout of release tarballs) that directory is stripped.

mod tar_gz;
mod zip;

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Format-specific archive extractor.
pub trait ArchiveExtractor: Send + Sync {
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Extract into `extract_to`, which must exist.
    fn extract<R: Runtime>(&self, runtime: &R, archive_path: &Path, extract_to: &Path)
    -> Result<()>;
}

/// Picks the extractor matching the archive's file name.
#[derive(Default)]
pub struct ArchiveExtractorImpl {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl ArchiveExtractorImpl {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveExtractor for ArchiveExtractorImpl {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.tar_gz.can_handle(archive_path) || self.zip.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        if self.tar_gz.can_handle(archive_path) {
            return self.tar_gz.extract(runtime, archive_path, extract_to);
        }
        if self.zip.can_handle(archive_path) {
            return self.zip.extract(runtime, archive_path, extract_to);
        }
        Err(anyhow!("Unsupported archive format: {}", archive_path.display()))
    }
}

/// Fresh staging directory beside `extract_to`.
fn prepare_staging_dir<R: Runtime>(runtime: &R, extract_to: &Path) -> Result<PathBuf> {
    let name = extract_to
        .file_name()
        .ok_or_else(|| anyhow!("Invalid extraction target {:?}", extract_to))?;
    let mut staging_name = name.to_os_string();
    staging_name.push("_extract");
    let staging = extract_to.with_file_name(staging_name);

    if runtime.exists(&staging) {
        runtime.remove_dir_all(&staging)?;
    }
    runtime.create_dir_all(&staging)?;
    Ok(staging)
}

/// Run `unpack` against a fresh staging directory, then move the result
/// into `extract_to`. The staging directory never outlives the call.
fn extract_staged<R: Runtime>(
    runtime: &R,
    extract_to: &Path,
    unpack: impl FnOnce(&Path) -> Result<()>,
) -> Result<()> {
    let staging = prepare_staging_dir(runtime, extract_to)?;
    let result = unpack(&staging).and_then(|()| finish_staging(runtime, &staging, extract_to));
    if result.is_err()
        && runtime.exists(&staging)
        && let Err(e) = runtime.remove_dir_all(&staging)
    {
        warn!("Failed to remove staging directory {:?}: {}", staging, e);
    }
    result
}

/// Move the staged contents into `extract_to` and drop the staging directory.
fn finish_staging<R: Runtime>(runtime: &R, staging: &Path, extract_to: &Path) -> Result<()> {
    let entries = runtime
        .read_dir(staging)
        .context("Failed to read staging directory")?;

    let source_dir = match entries.as_slice() {
        [] => return Err(anyhow!("Archive appears to be empty.")),
        [single] if runtime.is_dir(single) => single.clone(),
        _ => staging.to_path_buf(),
    };

    debug!("Moving contents from {:?} to {:?}", source_dir, extract_to);
    for item in runtime.read_dir(&source_dir)? {
        let Some(file_name) = item.file_name() else {
            continue;
        };
        runtime.rename(&item, &extract_to.join(file_name))?;
    }

    runtime.remove_dir_all(staging)
}
