use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::proxy::ProxyConfig;

const DATA_DIR: &str = ".allowlist_proxy";
const CONFIG_FILE: &str = "config.json";

/// Dotenv file holding the persisted allowlist, relative to the working directory
pub const ENV_FILE: &str = ".env";
pub const ALLOWED_DOMAINS_VAR: &str = "ALLOWED_DOMAINS";

/// Get data directory path
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);

    // Ensure directory exists
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Load service config from the data directory, falling back to defaults
pub fn load_proxy_config() -> AppResult<ProxyConfig> {
    let config_path = get_data_dir()?.join(CONFIG_FILE);
    load_proxy_config_from(&config_path)
}

pub fn load_proxy_config_from(config_path: &Path) -> AppResult<ProxyConfig> {
    if !config_path.exists() {
        return Ok(ProxyConfig::default());
    }

    let content = fs::read_to_string(config_path)?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::Config(format!(
            "Failed to parse config file {}: {}",
            config_path.display(),
            e
        ))
    })
}

/// `ALLOWED_DOMAINS` from the process environment; unset or blank counts as absent.
pub fn allowed_domains_from_env() -> Option<String> {
    std::env::var(ALLOWED_DOMAINS_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// `ALLOWED_DOMAINS` from a dotenv file. `Ok(None)` when the file or the key is missing.
pub fn read_env_file(path: &Path) -> AppResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_env_value(&content, ALLOWED_DOMAINS_VAR))
}

/// Persist the allowlist the same way it is read back.
pub fn write_env_file(path: &Path, allowed_domains: &str) -> AppResult<()> {
    fs::write(
        path,
        format!("{}={}\n", ALLOWED_DOMAINS_VAR, allowed_domains.trim()),
    )?;
    Ok(())
}

/// Find `key` in dotenv content: `KEY=VALUE` lines, `#` comments, optional
/// `export ` prefix and matching surrounding quotes. The last assignment wins.
pub fn parse_env_value(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (name, value) = line.split_once('=')?;
            (name.trim() == key).then(|| unquote(value.trim()).to_string())
        })
        .last()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
