//! Service setup and initialization
//!
//! Wires a registry from settings:
//! - Default configuration file creation
//! - Database pool and schema setup
//! - Initial configuration load per registry mode

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::adapters::sqlite::{create_pool, SqliteAgentSource};
use crate::infrastructure::config::Settings;
use crate::services::{AgentRegistry, RegistryMode};

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Switchboard Configuration
# Override settings by editing this file or setting environment variables
# with SWITCHBOARD_ prefix
#
# Example environment variables:
#   export SWITCHBOARD_CONFIG_DIR=/etc/switchboard/agents
#   export SWITCHBOARD_MODE=hybrid
#   export SWITCHBOARD_DATABASE__URL=sqlite:///var/lib/switchboard.db
#   export SWITCHBOARD_LOGGING__LEVEL=debug

# Directory scanned for agent configuration YAML files
config_dir: "configs/agents"

# Domain used when a lookup falls through to the default
default_domain: "generic"

# Where configurations come from: file, database, hybrid
mode: "file"

# Tenant identifier, required for database and hybrid modes
# org_id: "org-123"

# Database configuration
database:
  # SQLite database URL
  url: "sqlite://switchboard.db"

  # Maximum number of connections in the pool
  max_connections: 5

# Logging configuration
logging:
  # Log level: trace, debug, info, warn, error
  level: "info"

  # Log format: json, pretty
  format: "json"
"#;

/// Write the default configuration file if missing.
///
/// With `force` set, an existing file is overwritten.
pub fn write_default_config(path: impl AsRef<Path>, force: bool) -> Result<()> {
    let path = path.as_ref();
    if path.exists() && !force {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
    }

    fs::write(path, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(())
}

/// Build a registry from settings and run the initial load.
///
/// File mode loads from `config_dir` only. Database and hybrid modes open
/// the configured pool, create the schema if missing, and attach a
/// [`SqliteAgentSource`] before loading.
pub async fn init_registry(settings: &Settings) -> Result<Arc<AgentRegistry>> {
    let registry = Arc::new(AgentRegistry::new());
    registry.set_default_domain(&settings.default_domain).await;

    let cancel = CancellationToken::new();

    match settings.mode {
        RegistryMode::File => {
            registry
                .load_from_directory(&settings.config_dir)
                .await
                .context("Failed to load agent configurations from directory")?;
        }
        RegistryMode::Database | RegistryMode::Hybrid => {
            let org_id = settings.org_id.clone().unwrap_or_default();

            let pool = create_pool(&settings.database.url, settings.database.max_connections)
                .await
                .context("Failed to open registry database")?;

            let source = SqliteAgentSource::new(pool);
            source
                .init_schema()
                .await
                .context("Failed to initialize registry schema")?;

            registry.set_database_source(Arc::new(source), org_id).await;
            registry.set_mode(settings.mode).await;

            if settings.mode == RegistryMode::Database {
                registry
                    .load_from_database(&cancel)
                    .await
                    .context("Failed to load agent configurations from database")?;
            } else {
                registry
                    .load_hybrid(&settings.config_dir, &cancel)
                    .await
                    .context("Failed to load agent configurations")?;
            }
        }
    }

    Ok(registry)
}
