//! Configuration management.
//!
//! Loads the console's settings from a JSONC file: backend location, the
//! session cookie used for auth/CSRF, list and search tuning, and file
//! locations for logs and exports.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: String,
    /// Session cookie string, as copied from a logged-in browser session
    /// (e.g. "sessionid=...; csrftoken=...")
    pub cookie: String,
    /// Name of the cookie carrying the CSRF token
    pub csrf_cookie_name: String,
    /// Rows per page for list fetches
    pub page_size: u32,
    /// Minimum query length before a student search fires
    pub search_min_chars: usize,
    /// Idle milliseconds before a typed search fires
    pub search_debounce_ms: u64,
    /// Log file path (relative to the config dir or absolute)
    pub log_file: String,
    /// Directory for assignment exports (relative to the config dir or
    /// absolute)
    pub export_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            cookie: String::new(),
            csrf_cookie_name: "csrftoken".to_string(),
            page_size: 20,
            search_min_chars: 2,
            search_debounce_ms: 300,
            log_file: "mschool-tui.log".to_string(),
            export_dir: "exports".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file.
    ///
    /// # Arguments
    /// * `path` - Optional path to the config file; defaults to
    ///   `<config_dir>/mschool-tui/config.jsonc`
    ///
    /// # Details
    /// A missing file yields the defaults. The file may contain `//`
    /// comments, which are stripped before parsing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = serde_json::from_str(&strip_comments(&content))
            .with_context(|| "Failed to deserialize config")?;

        Ok(config)
    }

    /// Save configuration to file, creating the directory if needed.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, json)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            config_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine config directory"))?;
        Ok(config_dir.join("mschool-tui").join("config.jsonc"))
    }

    /// Resolved log file path.
    pub fn log_file_path(&self) -> Result<PathBuf> {
        Self::resolve(&self.log_file)
    }

    /// Resolved export directory.
    pub fn export_dir_path(&self) -> Result<PathBuf> {
        Self::resolve(&self.export_dir)
    }

    fn resolve(value: &str) -> Result<PathBuf> {
        let path = Path::new(value);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let config_dir =
            config_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine config directory"))?;
        Ok(config_dir.join("mschool-tui").join(value))
    }
}

/// Strip `//` comments from JSONC, leaving `//` inside strings intact.
fn strip_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if let Some(comment_pos) = line.find("//") {
                // An odd number of quotes before the marker means it sits
                // inside a string literal
                let before = &line[..comment_pos];
                if before.matches('"').count() % 2 == 0 {
                    return line[..comment_pos].trim_end();
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.csrf_cookie_name, "csrftoken");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.search_min_chars, 2);
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.jsonc");

        let config = Config {
            base_url: "https://admin.example.net".to_string(),
            cookie: "sessionid=abc; csrftoken=tok".to_string(),
            page_size: 50,
            ..Config::default()
        };

        config.save(Some(&config_path)).unwrap();
        assert!(config_path.exists());

        let loaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(loaded.base_url, "https://admin.example.net");
        assert_eq!(loaded.cookie, "sessionid=abc; csrftoken=tok");
        assert_eq!(loaded.page_size, 50);
    }

    #[test]
    fn test_config_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::load(Some(&temp_dir.path().join("absent.jsonc"))).unwrap();
        assert_eq!(loaded.page_size, Config::default().page_size);
    }

    #[test]
    fn test_config_jsonc_with_comments() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.jsonc");

        let jsonc_content = r#"{
            // Backend the console talks to
            "base_url": "http://backoffice.local",
            "search_debounce_ms": 250,
            "log_file": "a//b.log"
        }"#;

        fs::write(&config_path, jsonc_content).unwrap();

        let loaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(loaded.base_url, "http://backoffice.local");
        assert_eq!(loaded.search_debounce_ms, 250);
        // A "//" inside a string survives comment stripping
        assert_eq!(loaded.log_file, "a//b.log");
    }
}
