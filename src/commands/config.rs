use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::package::MANIFEST_FILE;
use crate::registry::{DEFAULT_API_URL, DEFAULT_REGISTRY_URL};
use crate::runtime::Runtime;

pub const DEFAULT_INSTALL_DIR: &str = "bower_components";
pub const BOWERRC_FILE: &str = ".bowerrc";

/// Settings taken from the command line or environment. Unset fields fall
/// back to `.bowerrc`, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cwd: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub registry_url: Option<String>,
    pub api_url: Option<String>,
}

/// Everything the installer needs, resolved once before any install starts.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallConfig {
    pub project_dir: PathBuf,
    pub install_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub registry_url: String,
    pub api_url: String,
    pub save_to_manifest: bool,
}

#[derive(Debug, Default, Deserialize)]
struct BowerRc {
    directory: Option<String>,
    registry: Option<Value>,
    storage: Option<Storage>,
}

#[derive(Debug, Default, Deserialize)]
struct Storage {
    packages: Option<String>,
}

impl InstallConfig {
    #[tracing::instrument(skip(runtime))]
    pub fn new<R: Runtime>(
        runtime: &R,
        overrides: ConfigOverrides,
        save_to_manifest: bool,
    ) -> Result<Self> {
        let project_dir = match overrides.cwd {
            Some(dir) => dir,
            None => runtime.current_dir()?,
        };
        let rc = Self::load_bowerrc(runtime, &project_dir)?;

        let install_dir = project_dir.join(rc.directory.as_deref().unwrap_or(DEFAULT_INSTALL_DIR));

        let cache_dir = match (
            overrides.cache_dir,
            rc.storage.and_then(|s| s.packages),
        ) {
            (Some(dir), _) => dir,
            (None, Some(dir)) => project_dir.join(dir),
            (None, None) => Self::default_cache_dir(runtime)?,
        };

        let registry_url = overrides
            .registry_url
            .or_else(|| {
                rc.registry
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        let api_url = overrides
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let config = Self {
            project_dir,
            install_dir,
            cache_dir,
            registry_url,
            api_url,
            save_to_manifest,
        };
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join(MANIFEST_FILE)
    }

    fn load_bowerrc<R: Runtime>(runtime: &R, project_dir: &Path) -> Result<BowerRc> {
        let path = project_dir.join(BOWERRC_FILE);
        if !runtime.exists(&path) {
            return Ok(BowerRc::default());
        }
        let contents = runtime.read_to_string(&path)?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn default_cache_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
        runtime
            .cache_dir()
            .or_else(|| runtime.home_dir().map(|home| home.join(".cache")))
            .map(|dir| dir.join("bowl"))
            .context("Could not determine a cache directory; pass --cache-dir")
    }
}

/// HTTP client shared by the registry lookups, GitHub API calls and downloads.
pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("bowl/", env!("BOWL_VERSION")))
        .build()?;
    Ok(client)
}

/// Token sent with GitHub API requests, from `GITHUB_TOKEN`.
pub fn github_token<R: Runtime>(runtime: &R) -> Option<String> {
    let token = runtime.env_var("GITHUB_TOKEN").ok()?;
    if token.is_empty() {
        return None;
    }
    debug!("Using GITHUB_TOKEN for authentication");
    Some(token)
}
