use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveExtractor, ArchiveExtractorImpl};
use crate::http::HttpClient;
use crate::package::{Dist, PATH_DIST_TYPE, Package};
use crate::runtime::Runtime;

use super::installer::Installer;

/// Installs packages from their `dist` record.
///
/// `zip` and `tar` dists are downloaded into the cache directory and
/// unpacked from there; `path` dists are copied from a local directory.
pub struct DistInstaller<'a, R: Runtime> {
    runtime: &'a R,
    client: HttpClient,
    extractor: ArchiveExtractorImpl,
    cache_dir: PathBuf,
}

impl<'a, R: Runtime> DistInstaller<'a, R> {
    pub fn new(runtime: &'a R, client: HttpClient, cache_dir: PathBuf) -> Self {
        Self {
            runtime,
            client,
            extractor: ArchiveExtractorImpl::new(),
            cache_dir,
        }
    }

    /// `<cache>/<vendor>-<name>-<version>.<ext>`
    pub fn cache_file(&self, package: &Package, dist: &Dist) -> PathBuf {
        let ext = if dist.dist_type == "zip" { "zip" } else { "tar" };
        let stem = package.name.replace(['/', '\\'], "-");
        self.cache_dir
            .join(format!("{}-{}.{}", stem, package.version_normalized, ext))
    }

    async fn fetch(&self, url: &str, target: &Path) -> Result<()> {
        let mut part_name = target.as_os_str().to_os_string();
        part_name.push(".part");
        let part = PathBuf::from(part_name);

        let fetched = if url.starts_with("http://") || url.starts_with("https://") {
            self.client
                .download_file(url, || self.runtime.create_file(&part))
                .await
                .map(|_| ())
        } else {
            let source = Path::new(url.strip_prefix("file://").unwrap_or(url));
            self.runtime
                .copy(source, &part)
                .map(|_| ())
                .with_context(|| format!("Failed to copy archive from {:?}", source))
        };

        let result = fetched.and_then(|()| self.runtime.rename(&part, target));
        if result.is_err()
            && self.runtime.exists(&part)
            && let Err(e) = self.runtime.remove_file(&part)
        {
            warn!("Failed to remove partial download {:?}: {}", part, e);
        }
        result
    }
}

fn dist_of(package: &Package) -> Result<&Dist> {
    package.dist.as_ref().ok_or_else(|| {
        anyhow!(
            "Package {} {} has no dist to install from",
            package.name,
            package.pretty_version
        )
    })
}

/// Copy the tree at `from` into `to`, creating `to` as needed.
fn copy_dir_recursive<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> Result<()> {
    runtime.create_dir_all(to)?;
    for entry in runtime.read_dir(from)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let dest = to.join(name);
        if runtime.is_dir(&entry) {
            copy_dir_recursive(runtime, &entry, &dest)?;
        } else {
            runtime
                .copy(&entry, &dest)
                .with_context(|| format!("Failed to copy {:?}", entry))?;
        }
    }
    Ok(())
}

#[async_trait]
impl<R: Runtime> Installer for DistInstaller<'_, R> {
    #[tracing::instrument(skip(self, package), fields(package = %package.name))]
    fn remove(&self, package: &Package, path: &Path) -> Result<()> {
        if self.runtime.is_symlink(path) || self.runtime.is_junction(path) {
            debug!("Removing link {:?}", path);
            return self.runtime.remove_symlink(path);
        }
        if self.runtime.is_dir(path) {
            debug!("Removing {} from {:?}", package.name, path);
            return self.runtime.remove_dir_all(path);
        }
        if self.runtime.exists(path) {
            return self.runtime.remove_file(path);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, package, _path), fields(package = %package.name))]
    async fn download(&self, package: &Package, _path: &Path) -> Result<()> {
        let dist = dist_of(package)?;
        if dist.dist_type == PATH_DIST_TYPE {
            return Ok(());
        }

        let target = self.cache_file(package, dist);
        if self.runtime.exists(&target) {
            debug!("Using cached {:?}", target);
            return Ok(());
        }
        if !self.runtime.exists(&self.cache_dir) {
            self.runtime.create_dir_all(&self.cache_dir)?;
        }

        info!("Downloading {} ({})", package.name, package.pretty_version);
        self.fetch(&dist.url, &target)
            .await
            .with_context(|| format!("Failed to download {} from {}", package.name, dist.url))
    }

    #[tracing::instrument(skip(self, package), fields(package = %package.name))]
    async fn install(&self, package: &Package, path: &Path) -> Result<()> {
        let dist = dist_of(package)?;
        info!("Installing {} ({})", package.name, package.pretty_version);

        let result = match dist.dist_type.as_str() {
            PATH_DIST_TYPE => copy_dir_recursive(self.runtime, Path::new(&dist.url), path),
            "zip" | "tar" => {
                let archive = self.cache_file(package, dist);
                if !self.runtime.exists(&archive) {
                    bail!(
                        "{} {} has not been downloaded",
                        package.name,
                        package.pretty_version
                    );
                }
                self.runtime.create_dir_all(path)?;
                self.extractor.extract(self.runtime, &archive, path)
            }
            other => bail!("Unsupported dist type {} for {}", other, package.name),
        };

        if let Err(e) = result {
            if self.runtime.is_dir(path)
                && let Err(cleanup) = self.runtime.remove_dir_all(path)
            {
                warn!("Failed to remove partial install at {:?}: {}", path, cleanup);
            }
            return Err(e.context(format!("Failed to install {}", package.name)));
        }
        Ok(())
    }
}
