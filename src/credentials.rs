use anyhow::{anyhow, Context, Result};
use dialoguer::Password;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::session::AccessToken;

/// Personal access tokens are at least this long
pub const MIN_TOKEN_LEN: usize = 40;

pub fn validate_token(input: &str) -> Result<(), String> {
    if input.trim().len() < MIN_TOKEN_LEN {
        return Err(format!(
            "Personal Access Token should be at least {MIN_TOKEN_LEN} characters"
        ));
    }
    Ok(())
}

/// Look up `key` in a KEY=VALUE file. A missing file is not an error.
pub fn read_env_file(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_env(&content, key))
}

fn parse_env(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (k, v) = line.split_once('=')?;
        if k.trim() != key {
            return None;
        }
        let v = v.trim();
        let v = v
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
            .unwrap_or(v);
        Some(v.to_string()).filter(|s| !s.is_empty())
    })
}

/// Set `key` in a KEY=VALUE file, keeping every other line
pub fn write_env_file(path: &Path, key: &str, value: &str) -> Result<()> {
    let existing = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        String::new()
    };

    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| {
            let line = line.trim();
            let line = line.strip_prefix("export ").unwrap_or(line);
            line.split_once('=').map(|(k, _)| k.trim()) != Some(key)
        })
        .map(str::to_string)
        .collect();
    lines.push(format!("{key}={value}"));

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    // `mode` only applies on creation; tighten a pre-existing file before the token lands
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }

    file.write_all((lines.join("\n") + "\n").as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Resolve the access token: environment, then the env file, then (interactive only) a
/// masked prompt whose answer is saved to the env file
pub fn resolve_token(config: &Config, interactive: bool) -> Result<AccessToken> {
    let key = &config.credentials.token_env;

    if let Ok(token) = std::env::var(key) {
        if !token.trim().is_empty() {
            debug!("Using token from environment variable {key}");
            return Ok(AccessToken::new(token.trim()));
        }
    }

    let env_file = config.env_file_path();
    if let Some(token) = read_env_file(&env_file, key)? {
        debug!("Using token from {}", env_file.display());
        return Ok(AccessToken::new(token));
    }

    if !interactive {
        return Err(anyhow!(
            "No access token found. Set {key} or add it to {}. Run 'ginit usage' for help.",
            env_file.display()
        ));
    }

    let token = Password::new()
        .with_prompt("Paste your Personal Access Token here")
        .validate_with(|input: &String| validate_token(input))
        .interact()
        .context("Failed to read access token")?;
    let token = token.trim().to_string();

    write_env_file(&env_file, key, &token)?;
    info!("Saved access token to {}", env_file.display());
    Ok(AccessToken::new(token))
}
