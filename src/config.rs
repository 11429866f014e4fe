//! Project layout and settings.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::{Path, PathBuf};

use crate::http::HttpClient;
use crate::package::DEFAULT_MANIFEST_NAME;
use crate::registry::REGISTRY_FILE_NAME;
use crate::runtime::{Runtime, resolve_relative_path};

/// Bearer token sent with dist downloads, for private archive hosts.
pub const AUTH_TOKEN_ENV: &str = "PKGLINK_AUTH_TOKEN";

/// Values given on the command line (or their environment fallbacks).
/// Anything left `None` takes its default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project: Option<PathBuf>,
    pub vendor_dir: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub manifest: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub project_dir: PathBuf,
    pub vendor_dir: PathBuf,
    pub registry_path: PathBuf,
    pub manifest_name: String,
}

impl Config {
    /// Resolve all paths to absolute ones, relative to the working directory.
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let cwd = runtime
            .current_dir()
            .context("Failed to determine the working directory")?;

        let project_dir = match overrides.project {
            Some(path) => resolve_relative_path(&cwd, &path),
            None => cwd.clone(),
        };
        let vendor_dir = match overrides.vendor_dir {
            Some(path) => resolve_relative_path(&cwd, &path),
            None => project_dir.join("vendor"),
        };
        let registry_path = match overrides.registry {
            Some(path) => resolve_relative_path(&cwd, &path),
            None => vendor_dir.join(REGISTRY_FILE_NAME),
        };
        let manifest_name = overrides
            .manifest
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MANIFEST_NAME.to_string());

        let config = Self {
            project_dir,
            vendor_dir,
            registry_path,
            manifest_name,
        };
        debug!("Using {:?}", config);
        Ok(config)
    }

    /// What the dependency installer reports as installed.
    pub fn installed_path(&self) -> PathBuf {
        self.vendor_dir.join("installed.json")
    }

    /// Lock file beside the root manifest: `manifest.json` -> `manifest.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let manifest = Path::new(&self.manifest_name);
        let lock_name = match manifest.extension() {
            Some(ext) if ext == "json" => manifest.with_extension("lock"),
            _ => PathBuf::from(format!("{}.lock", self.manifest_name)),
        };
        self.project_dir.join(lock_name)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.vendor_dir.join(".cache")
    }

    /// HTTP client for dist downloads, authenticated when a token is set.
    pub fn http_client<R: Runtime>(&self, runtime: &R) -> Result<HttpClient> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var(AUTH_TOKEN_ENV)
            && !token.is_empty()
        {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using {} for dist downloads", AUTH_TOKEN_ENV);
        }

        let client = Client::builder()
            .user_agent(concat!("pkglink/", env!("PKGLINK_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(HttpClient::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn runtime_in(cwd: &'static str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(move || Ok(PathBuf::from(cwd)));
        runtime
    }

    #[test]
    fn test_defaults() {
        let runtime = runtime_in("/home/dev/app");
        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();

        assert_eq!(config.project_dir, PathBuf::from("/home/dev/app"));
        assert_eq!(config.vendor_dir, PathBuf::from("/home/dev/app/vendor"));
        assert_eq!(
            config.registry_path,
            PathBuf::from("/home/dev/app/vendor/linked-packages.json")
        );
        assert_eq!(config.manifest_name, "manifest.json");
        assert_eq!(
            config.installed_path(),
            PathBuf::from("/home/dev/app/vendor/installed.json")
        );
        assert_eq!(config.lock_path(), PathBuf::from("/home/dev/app/manifest.lock"));
        assert_eq!(config.cache_dir(), PathBuf::from("/home/dev/app/vendor/.cache"));
    }

    #[test]
    fn test_relative_overrides_resolve_against_cwd() {
        let runtime = runtime_in("/home/dev");
        let config = Config::load(
            &runtime,
            ConfigOverrides {
                project: Some(PathBuf::from("app")),
                vendor_dir: Some(PathBuf::from("app/../deps")),
                registry: None,
                manifest: Some("package.json".into()),
            },
        )
        .unwrap();

        assert_eq!(config.project_dir, PathBuf::from("/home/dev/app"));
        assert_eq!(config.vendor_dir, PathBuf::from("/home/dev/deps"));
        assert_eq!(
            config.registry_path,
            PathBuf::from("/home/dev/deps/linked-packages.json")
        );
        assert_eq!(config.lock_path(), PathBuf::from("/home/dev/app/package.lock"));
    }

    #[test]
    fn test_lock_path_for_manifest_without_json_extension() {
        let runtime = runtime_in("/app");
        let config = Config::load(
            &runtime,
            ConfigOverrides {
                manifest: Some("deps.toml".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.lock_path(), PathBuf::from("/app/deps.toml.lock"));
    }

    #[tokio::test]
    async fn test_http_client_sends_token() {
        let mut runtime = runtime_in("/app");
        runtime
            .expect_env_var()
            .with(eq(AUTH_TOKEN_ENV))
            .returning(|_| Ok("s3cret".to_string()));

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/foo.zip")
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_body("zip")
            .create_async()
            .await;

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        let client = config.http_client(&runtime).unwrap();
        client
            .download_file(&format!("{}/foo.zip", server.url()), || Ok(std::io::sink()))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_client_without_token() {
        let mut runtime = runtime_in("/app");
        runtime
            .expect_env_var()
            .with(eq(AUTH_TOKEN_ENV))
            .returning(|_| Err(std::env::VarError::NotPresent));

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/foo.zip")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .create_async()
            .await;

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        config
            .http_client(&runtime)
            .unwrap()
            .download_file(&format!("{}/foo.zip", server.url()), || Ok(std::io::sink()))
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
