//! Application configuration
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the database location
pub const DATABASE_ENV: &str = "TODO_DB";

const APP_DIR: &str = "todo-tracker";
const DATABASE_FILE: &str = "todos.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Database file; the platform data directory is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "todo_tracker=warn".to_string()
}

impl Config {
    /// Database location: `TODO_DB`, then the config file, then the data directory
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        let from_env = std::env::var_os(DATABASE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        self.resolve_database_path_with(from_env)
    }

    fn resolve_database_path_with(&self, from_env: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = from_env {
            return Ok(path);
        }
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        Ok(get_data_dir()?.join(DATABASE_FILE))
    }
}

/// Config file path
/// Windows: %APPDATA%\todo-tracker\config.toml
/// macOS: ~/Library/Application Support/todo-tracker/config.toml
/// Linux: ~/.config/todo-tracker/config.toml
pub fn get_config_path() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().context("Failed to get user directories")?;
    Ok(base.config_dir().join(APP_DIR).join("config.toml"))
}

/// Data directory holding the default database and the saved list view
/// Linux: ~/.local/share/todo-tracker
pub fn get_data_dir() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().context("Failed to get user directories")?;
    Ok(base.data_dir().join(APP_DIR))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()?)
}

/// Load a config file; a missing file means defaults
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;

    Ok(())
}

/// Point the app at another database file
pub fn set_database_path(path: PathBuf) -> Result<()> {
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut config = load_config()?;
    config.database_path = Some(path);
    save_config(&config)?;
    if let Some(path) = &config.database_path {
        println!("✓ Database set to: {}", path.display());
    }
    Ok(())
}

pub fn set_log_filter(filter: String) -> Result<()> {
    let mut config = load_config()?;
    config.log_filter = filter;
    save_config(&config)?;
    println!("✓ Log filter set to: {}", config.log_filter);
    Ok(())
}

pub fn show_config() -> Result<()> {
    let config = load_config()?;
    println!("Current configuration:");
    println!("  Database:   {}", config.resolve_database_path()?.display());
    println!("  Log filter: {}", config.log_filter);
    if std::env::var_os(DATABASE_ENV).is_some() {
        println!("  ({} is set and overrides the configured database)", DATABASE_ENV);
    }
    println!();
    println!("Config file: {}", get_config_path()?.display());
    Ok(())
}
