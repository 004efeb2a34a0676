//! SQLite-backed agent configuration source.
//!
//! Stores one row per tenant-scoped agent configuration. The `spec` column
//! holds the full [`AgentConfigSpec`] as JSON; the envelope fields
//! (`api_version`, metadata) live in dedicated columns so listings can
//! filter without decoding the document.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use crate::domain::errors::RegistryResult;
use crate::domain::models::{AgentConfigFile, AgentConfigSpec, AgentMetadata, CONFIG_KIND};
use crate::domain::ports::DatabaseAgentSource;

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS agent_configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    org_id TEXT NOT NULL,
    name TEXT NOT NULL,
    domain TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    api_version TEXT NOT NULL,
    spec TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (org_id, name)
)";

const CREATE_INDEX: &str = "
CREATE INDEX IF NOT EXISTS idx_agent_configs_org_active
    ON agent_configs (org_id, is_active)";

/// SQLite implementation of [`DatabaseAgentSource`].
#[derive(Clone)]
pub struct SqliteAgentSource {
    pool: SqlitePool,
}

impl SqliteAgentSource {
    /// Create a new source backed by the given connection pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `agent_configs` table and its indexes if missing.
    pub async fn init_schema(&self) -> RegistryResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a configuration for a tenant, or replace the existing row
    /// with the same metadata name. The config is validated before any
    /// write so the table never holds documents a load would reject.
    pub async fn upsert_config(
        &self,
        org_id: &str,
        config: &AgentConfigFile,
    ) -> RegistryResult<()> {
        config.validate()?;
        let spec_json = serde_json::to_string(&config.spec)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"INSERT INTO agent_configs
                  (org_id, name, domain, description, api_version, spec,
                   is_active, created_at, updated_at)
              VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
              ON CONFLICT (org_id, name) DO UPDATE SET
                  domain = excluded.domain,
                  description = excluded.description,
                  api_version = excluded.api_version,
                  spec = excluded.spec,
                  is_active = 1,
                  updated_at = excluded.updated_at",
        )
        .bind(org_id)
        .bind(&config.metadata.name)
        .bind(&config.metadata.domain)
        .bind(&config.metadata.description)
        .bind(&config.api_version)
        .bind(&spec_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a tenant's configuration inactive so subsequent loads skip it.
    /// Deactivating a name that does not exist is a no-op.
    pub async fn deactivate(&self, org_id: &str, name: &str) -> RegistryResult<()> {
        sqlx::query(
            "UPDATE agent_configs SET is_active = 0, updated_at = ?
             WHERE org_id = ? AND name = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(org_id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DatabaseAgentSource for SqliteAgentSource {
    async fn list_active_agents(&self, org_id: &str) -> RegistryResult<Vec<AgentConfigFile>> {
        let rows: Vec<ConfigRow> = sqlx::query_as(
            "SELECT name, domain, description, api_version, spec
             FROM agent_configs
             WHERE org_id = ? AND is_active = 1
             ORDER BY name",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        let mut configs = Vec::with_capacity(rows.len());
        for row in rows {
            let name = row.name.clone();
            match AgentConfigFile::try_from(row) {
                Ok(config) => configs.push(config),
                Err(err) => {
                    warn!(config = %name, error = %err, "skipping undecodable agent config row");
                }
            }
        }

        Ok(configs)
    }

    async fn get_agent_by_name(
        &self,
        org_id: &str,
        name: &str,
    ) -> RegistryResult<Option<AgentConfigFile>> {
        let row: Option<ConfigRow> = sqlx::query_as(
            "SELECT name, domain, description, api_version, spec
             FROM agent_configs
             WHERE org_id = ? AND name = ? AND is_active = 1",
        )
        .bind(org_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AgentConfigFile::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct ConfigRow {
    name: String,
    domain: String,
    description: String,
    api_version: String,
    spec: String,
}

impl TryFrom<ConfigRow> for AgentConfigFile {
    type Error = crate::domain::errors::RegistryError;

    fn try_from(row: ConfigRow) -> Result<Self, Self::Error> {
        let spec: AgentConfigSpec = serde_json::from_str(&row.spec)?;
        Ok(Self {
            api_version: row.api_version,
            kind: CONFIG_KIND.to_string(),
            metadata: AgentMetadata {
                name: row.name,
                domain: row.domain,
                description: row.description,
            },
            spec,
        })
    }
}
