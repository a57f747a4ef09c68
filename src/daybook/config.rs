use crate::error::{DaybookError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_TOKEN_ENV: &str = "DAYBOOK_TOKEN";
const DEFAULT_RETAIN: usize = 365;

/// Configuration for daybook, stored as config.json in the data directory.
///
/// The access token itself is never stored here — only the name of the
/// environment variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaybookConfig {
    /// Remote repository owner (user or org).
    #[serde(default)]
    pub owner: String,

    /// Remote repository name.
    #[serde(default)]
    pub repo: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Environment variable the access token is read from.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// How many recent entries `prune` keeps cached locally.
    #[serde(default = "default_retain")]
    pub retain_synced: usize,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_retain() -> usize {
    DEFAULT_RETAIN
}

impl Default for DaybookConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            token_env: default_token_env(),
            retain_synced: DEFAULT_RETAIN,
        }
    }
}

impl DaybookConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(DaybookError::Io)?;
        let config: DaybookConfig =
            serde_json::from_str(&content).map_err(DaybookError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(DaybookError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(DaybookError::Serialization)?;
        fs::write(config_path, content).map_err(DaybookError::Io)?;
        Ok(())
    }

    pub fn remote_configured(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }

    /// The access token, if the configured environment variable is set.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }
}
