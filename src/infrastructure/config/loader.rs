use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use super::settings::Settings;
use crate::domain::models::is_valid_identifier;
use crate::services::RegistryMode;

/// Configuration error types
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Config directory cannot be empty in file mode")]
    EmptyConfigDir,

    #[error("Invalid default domain: {0}. Must be lowercase alphanumeric with hyphens or underscores")]
    InvalidDefaultDomain(String),

    #[error("Database URL cannot be empty in {0} mode")]
    EmptyDatabaseUrl(RegistryMode),

    #[error("Organization ID must be set in {0} mode")]
    MissingOrgId(RegistryMode),

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. switchboard.yaml in the working directory
    /// 3. Environment variables (`SWITCHBOARD_*` prefix, highest priority)
    pub fn load() -> Result<Settings> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file("switchboard.yaml"))
            .merge(Env::prefixed("SWITCHBOARD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Settings> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Validate configuration after loading
    pub fn validate(settings: &Settings) -> Result<(), SettingsError> {
        if settings.mode == RegistryMode::File && settings.config_dir.as_os_str().is_empty() {
            return Err(SettingsError::EmptyConfigDir);
        }

        if !is_valid_identifier(&settings.default_domain) {
            return Err(SettingsError::InvalidDefaultDomain(
                settings.default_domain.clone(),
            ));
        }

        // Database and hybrid modes need a reachable database and a tenant.
        if settings.mode != RegistryMode::File {
            if settings.database.url.is_empty() {
                return Err(SettingsError::EmptyDatabaseUrl(settings.mode));
            }
            if settings.org_id.as_deref().is_none_or(str::is_empty) {
                return Err(SettingsError::MissingOrgId(settings.mode));
            }
        }

        if settings.database.max_connections == 0 {
            return Err(SettingsError::InvalidMaxConnections(
                settings.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&settings.logging.level.as_str()) {
            return Err(SettingsError::InvalidLogLevel(
                settings.logging.level.clone(),
            ));
        }

        Ok(())
    }
}
