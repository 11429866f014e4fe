use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{debug, info};
use std::io::{Cursor, Read};
use std::path::{Component, Path};
use tar::{Archive, EntryType};

use crate::runtime::Runtime;

use super::{ArchiveExtractor, extract_staged};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extractor for `tar` dists, gzip-compressed or plain.
#[derive(Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz") || name.ends_with(".tar")
    }

    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting tar archive {:?} to {:?}", archive_path, extract_to);
        let mut reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

        // Dists labelled `tar` are usually gzipped; sniff instead of trusting the name
        let source: Box<dyn Read> = if buffer.starts_with(&GZIP_MAGIC) {
            Box::new(GzDecoder::new(Cursor::new(buffer)))
        } else {
            Box::new(Cursor::new(buffer))
        };
        let mut archive = Archive::new(source);

        extract_staged(runtime, extract_to, |staging| {
            let entries = archive
                .entries()
                .with_context(|| format!("Failed to read tar archive {:?}", archive_path))?;
            for entry in entries {
                let mut entry = entry.context("Failed to read tar entry")?;
                let entry_path = entry.path()?.into_owned();

                if entry_path
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
                {
                    debug!("Skipping tar entry with unsafe path {:?}", entry_path);
                    continue;
                }
                let full_path = staging.join(&entry_path);

                match entry.header().entry_type() {
                    EntryType::Directory => runtime.create_dir_all(&full_path)?,
                    EntryType::Regular | EntryType::Continuous => {
                        if let Some(parent) = full_path.parent() {
                            runtime.create_dir_all(parent)?;
                        }
                        let mut dest_file = runtime.create_file(&full_path)?;
                        std::io::copy(&mut entry, &mut dest_file)
                            .with_context(|| format!("Failed to extract file {:?}", full_path))?;
                        drop(dest_file);

                        if let Ok(mode) = entry.header().mode()
                            && let Err(e) = runtime.set_permissions(&full_path, mode)
                        {
                            debug!("Failed to set permissions on {:?}: {}", full_path, e);
                        }
                    }
                    other => debug!("Skipping tar entry {:?} of type {:?}", entry_path, other),
                }
            }
            Ok(())
        })?;
        info!("Extracted {:?}", archive_path);
        Ok(())
    }
}
