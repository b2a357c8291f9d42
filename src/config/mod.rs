pub mod generate;
pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};

pub use parse::{load_config, parse_config, resolve_one_shot, resolve_scheduled, ConfigError};
pub use types::{CollectorConfig, Destination, FileConfig, Overrides, SinkConfig};

/// Matches `$env{VAR_NAME}` references in config text.
pub(crate) const UNEXPANDED_VAR: &str = r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// Reads a process environment variable, treating unset and non-UTF-8
/// values alike.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Expands environment variables in a string using `lookup`.
/// Supports $env{VAR_NAME} syntax.
/// If a variable is not found, the reference is left unchanged.
pub fn expand_env_vars_with<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let re = match Regex::new(UNEXPANDED_VAR) {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };

    re.replace_all(text, |caps: &regex::Captures| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        caps.get(1)
            .and_then(|name| lookup(name.as_str()))
            .unwrap_or_else(|| whole.to_string())
    })
    .to_string()
}

/// Expands tilde (~) in paths to the user's home directory.
/// Returns the path unchanged if it doesn't start with tilde or home directory
/// cannot be determined.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Per-user config file location, `~/.config/slow-collector/config.yml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/slow-collector/config.yml"))
}

/// Resolves the config file path based on explicit argument or default locations.
/// Returns the first existing path from:
/// 1. Explicit path (if provided, with tilde expansion)
/// 2. ~/.config/slow-collector/config.yml
/// 3. /etc/slow-collector/config.yml
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/slow-collector/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}
