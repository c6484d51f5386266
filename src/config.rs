use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const URL_ENV: &str = "WORKREPORT_TFS_URL";
pub const PAT_ENV: &str = "WORKREPORT_PAT";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub tfs: Option<TfsConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TfsConfig {
    pub base_url: Option<String>,
    /// Personal access token
    pub pat: Option<String>,
    pub api_version: Option<String>,
}

/// Everything needed to talk to the tracker, after env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub base_url: String,
    pub pat: String,
    pub api_version: String,
}

const DEFAULT_API_VERSION: &str = "5.0";

impl AppConfig {
    pub fn connection(&self) -> Result<Connection> {
        self.connection_with(|key| std::env::var(key).ok())
    }

    fn connection_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<Connection> {
        let tfs = self.tfs.as_ref();
        let pick = |key: &str, from_file: Option<&String>| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| from_file.cloned())
        };

        let Some(base_url) = pick(URL_ENV, tfs.and_then(|t| t.base_url.as_ref())) else {
            bail!("No tracker URL configured. Set [tfs] base_url in {} or {URL_ENV}", config_path().display());
        };
        let Some(pat) = pick(PAT_ENV, tfs.and_then(|t| t.pat.as_ref())) else {
            bail!("No access token configured. Set [tfs] pat in {} or {PAT_ENV}", config_path().display());
        };
        let api_version = tfs
            .and_then(|t| t.api_version.clone())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Connection {
            base_url,
            pat,
            api_version,
        })
    }
}

fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".workreport")
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}
