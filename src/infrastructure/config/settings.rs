use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::services::RegistryMode;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    /// Directory scanned for agent configuration YAML files
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Domain used when a lookup falls through to the default
    #[serde(default = "default_domain")]
    pub default_domain: String,

    /// Where configurations come from: file, database, or hybrid
    #[serde(default)]
    pub mode: RegistryMode,

    /// Tenant identifier for database-backed loads
    #[serde(default)]
    pub org_id: Option<String>,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogSettings,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("configs/agents")
}

fn default_domain() -> String {
    "generic".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            default_domain: default_domain(),
            mode: RegistryMode::default(),
            org_id: None,
            database: DatabaseSettings::default(),
            logging: LogSettings::default(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseSettings {
    /// `SQLite` database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite://switchboard.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogSettings {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for log files; stdout only when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON lines.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.config_dir, PathBuf::from("configs/agents"));
        assert_eq!(settings.default_domain, "generic");
        assert_eq!(settings.mode, RegistryMode::File);
        assert!(settings.org_id.is_none());
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
config_dir: /etc/switchboard/agents
default_domain: travel
mode: hybrid
org_id: org-123
database:
  url: sqlite:///var/lib/switchboard.db
  max_connections: 8
logging:
  level: debug
  format: pretty
";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.config_dir, PathBuf::from("/etc/switchboard/agents"));
        assert_eq!(settings.default_domain, "travel");
        assert_eq!(settings.mode, RegistryMode::Hybrid);
        assert_eq!(settings.org_id.as_deref(), Some("org-123"));
        assert_eq!(settings.database.max_connections, 8);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let settings: Settings = serde_yaml::from_str("mode: database\norg_id: acme").unwrap();
        assert_eq!(settings.mode, RegistryMode::Database);
        assert_eq!(settings.default_domain, "generic");
        assert_eq!(settings.database.url, "sqlite://switchboard.db");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<Settings, _> = serde_yaml::from_str("mode: carrier-pigeon");
        assert!(result.is_err());
    }
}
