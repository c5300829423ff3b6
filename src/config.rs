use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::display::Stylesheet;
use crate::graph::{MapGraph, DEFAULT_GRAPH_NAME};
use crate::migration::MapSnapshot;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "AGENTMAP_CONFIG";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Map-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_graph_name")]
    pub name: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            name: default_graph_name(),
        }
    }
}

/// Presentation configuration for the display collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,
    #[serde(default = "default_style")]
    pub default_style: String,
    #[serde(default = "default_agent_style")]
    pub agent_style: String,
    #[serde(default = "default_open_style")]
    pub open_style: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_display_enabled(),
            default_style: default_style(),
            agent_style: default_agent_style(),
            open_style: default_open_style(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_graph_name() -> String {
    DEFAULT_GRAPH_NAME.to_string()
}

fn default_display_enabled() -> bool {
    true
}

fn default_style() -> String {
    Stylesheet::default().default_style
}

fn default_agent_style() -> String {
    Stylesheet::default().agent_style
}

fn default_open_style() -> String {
    Stylesheet::default().open_style
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in AGENTMAP_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Like [`Config::load`], but falls back to defaults when no config file
    /// is named by the environment and ./config.toml does not exist.
    pub fn load_or_default() -> Result<Self> {
        let _ = dotenv::dotenv();

        if std::env::var(CONFIG_ENV).is_err() && !PathBuf::from("config.toml").exists() {
            return Ok(Self::default());
        }
        Self::load()
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.map.name.trim().is_empty() {
            anyhow::bail!("map.name must not be empty");
        }

        let level = self.logging.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            anyhow::bail!(
                "logging.log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.log_level
            );
        }

        Ok(())
    }

    /// Fresh, empty map titled from `[map].name`
    pub fn new_map(&self) -> MapGraph {
        MapGraph::with_name(self.map.name.as_str())
    }

    /// Give an untitled snapshot the configured map name before it is thawed
    pub fn name_snapshot(&self, snapshot: &mut MapSnapshot) {
        if snapshot.graph_name.trim().is_empty() {
            snapshot.graph_name = self.map.name.clone();
        }
    }

    /// Stylesheet handed to displays on creation
    pub fn stylesheet(&self) -> Stylesheet {
        Stylesheet {
            default_style: self.display.default_style.clone(),
            agent_style: self.display.agent_style.clone(),
            open_style: self.display.open_style.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_config_env(config_path: &std::path::Path, f: impl FnOnce()) {
        let original = std::env::var(CONFIG_ENV).ok();
        std::env::set_var(CONFIG_ENV, config_path.to_str().unwrap());
        f();
        std::env::remove_var(CONFIG_ENV);
        if let Some(val) = original {
            std::env::set_var(CONFIG_ENV, val);
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[map]
name = "Level 3"

[display]
enabled = false
open_style = "node.open {fill-color: red;}"

[logging]
log_level = "debug"
"#,
        )
        .unwrap();

        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.map.name, "Level 3");
            assert!(!config.display.enabled);
            assert_eq!(config.logging.log_level, "debug");
            let css = config.stylesheet().to_css();
            assert!(css.contains("fill-color: red"));
            assert!(css.contains("node.agent {fill-color: forestgreen;}"));
        });
    }

    #[test]
    fn test_config_defaults_from_empty_file() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.map.name, "My world vision");
        assert!(config.display.enabled);
        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.stylesheet(), Stylesheet::default());
    }

    #[test]
    fn test_config_rejects_empty_name() {
        let err = Config::from_toml_str("[map]\nname = \"  \"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("map.name"));
    }

    #[test]
    fn test_config_rejects_bad_log_level() {
        let err = Config::from_toml_str("[logging]\nlog_level = \"loud\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("log_level"));
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(std::path::Path::new("nonexistent.toml"), || {
            assert!(Config::load().is_err());
            assert!(Config::load_or_default().is_err());
        });
    }

    #[test]
    fn test_config_load_or_default_without_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let _cwd = CwdGuard(std::env::current_dir().unwrap());
        std::env::set_current_dir(temp_dir.path()).unwrap();

        let original = std::env::var(CONFIG_ENV).ok();
        std::env::remove_var(CONFIG_ENV);
        let config = Config::load_or_default();
        if let Some(val) = original {
            std::env::set_var(CONFIG_ENV, val);
        }

        let config = config.unwrap();
        let default = Config::default();
        assert_eq!(config.map.name, default.map.name);
        assert_eq!(config.display.enabled, default.display.enabled);
        assert_eq!(config.logging.log_level, default.logging.log_level);
        assert_eq!(config.stylesheet(), default.stylesheet());
    }

    #[test]
    fn test_configured_name_reaches_map() {
        let config = Config::from_toml_str("[map]\nname = \"Level 3\"\n").unwrap();
        let map = config.new_map();
        assert_eq!(map.name(), "Level 3");
        assert!(map.is_empty());

        let mut untitled = crate::migration::freeze(MapGraph::with_name(""));
        config.name_snapshot(&mut untitled);
        let thawed = crate::migration::thaw(untitled, None).unwrap();
        assert_eq!(thawed.name(), "Level 3");

        let mut titled = crate::migration::freeze(MapGraph::with_name("cave"));
        config.name_snapshot(&mut titled);
        assert_eq!(titled.graph_name, "cave");
    }
}
