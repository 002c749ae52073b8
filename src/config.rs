use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::session::{IgnoreTemplate, Visibility};

pub const CONFIG_FILE: &str = "ginit.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Hosting service settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Defaults for new repositories
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Where the access token comes from
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Branch the seed commit lands on
    #[serde(default = "default_branch")]
    pub default_branch: String,

    #[serde(default = "default_remote_name")]
    pub remote_name: String,

    /// Create private repositories unless told otherwise
    #[serde(default)]
    pub private: bool,

    /// Ignore template preselected in prompts and used by `repo` when none is given
    #[serde(default)]
    pub ignore_template: IgnoreTemplate,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            remote_name: default_remote_name(),
            private: false,
            ignore_template: IgnoreTemplate::None,
        }
    }
}

impl RepositoryConfig {
    pub fn visibility(&self) -> Visibility {
        Visibility::from_private(self.private)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CredentialsConfig {
    /// Environment variable holding the token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// KEY=VALUE file the token is read from and saved to
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            env_file: default_env_file(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    format!("ginit/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    30
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote_name() -> String {
    "origin".to_string()
}

fn default_token_env() -> String {
    "GITHUB_PAT".to_string()
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Find the configuration file: `GINIT_CONFIG`, then the current directory, then the
    /// user config directory
    pub fn find_config_file() -> Result<Option<PathBuf>> {
        if let Ok(path) = env::var("GINIT_CONFIG") {
            let pb = PathBuf::from(shellexpand::tilde(&path).as_ref());
            if pb.exists() {
                return Ok(Some(pb));
            } else {
                return Ok(None);
            }
        }

        let current_config = env::current_dir()?.join(CONFIG_FILE);
        if current_config.exists() {
            return Ok(Some(current_config));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ginit").join(CONFIG_FILE);
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        Ok(None)
    }

    /// Load configuration from file or return defaults if none is found
    pub fn load_or_default() -> Result<(Self, Option<PathBuf>)> {
        match Self::find_config_file()? {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Token file path with `~` expanded
    pub fn env_file_path(&self) -> PathBuf {
        let raw = self.credentials.env_file.to_string_lossy();
        PathBuf::from(shellexpand::tilde(&raw).as_ref())
    }
}
