//! Database-backed and hybrid loading for the agent registry.
//!
//! In hybrid mode the registry merges two sources: YAML files loaded from a
//! directory and live configs fetched from a database. The database wins per
//! domain. Database snapshots are only partially trusted, so invalid entries
//! are skipped with a warning instead of failing the batch; file loads stay
//! fail-fast.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::models::routing;
use crate::domain::models::{AgentConfigFile, CompiledRoutingRule};
use crate::domain::ports::DatabaseAgentSource;

use super::{index_agents, remove_agents, AgentRegistry, RegistryStats};

/// How the registry sources agent configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    /// YAML files only.
    #[default]
    File,
    /// Database only.
    Database,
    /// Both sources, with database configs taking priority per domain.
    Hybrid,
}

impl fmt::Display for RegistryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryMode::File => write!(f, "file"),
            RegistryMode::Database => write!(f, "database"),
            RegistryMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for RegistryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(RegistryMode::File),
            "database" => Ok(RegistryMode::Database),
            "hybrid" => Ok(RegistryMode::Hybrid),
            _ => Err(format!("invalid registry mode: {s}")),
        }
    }
}

/// Provenance of a domain's live configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Loaded from a YAML file.
    File,
    /// Loaded from the database.
    Database,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Database => write!(f, "database"),
        }
    }
}

/// Registry counters extended with a source breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct HybridStats {
    /// The base registry counters.
    #[serde(flatten)]
    pub registry: RegistryStats,
    /// Domains whose live config came from the database.
    pub db_sourced_domains: usize,
    /// Domains whose live config came from YAML files.
    pub file_sourced_domains: usize,
    /// Current operating mode.
    pub mode: RegistryMode,
    /// Organization used for database queries, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

impl AgentRegistry {
    /// Attach a database source and tenant, switching to hybrid mode.
    pub async fn set_database_source(
        &self,
        source: Arc<dyn DatabaseAgentSource>,
        org_id: impl Into<String>,
    ) {
        let mut state = self.state.write().await;
        state.db_source = Some(source);
        state.org_id = Some(org_id.into());
        state.mode = RegistryMode::Hybrid;
    }

    /// Set the registry operating mode.
    pub async fn set_mode(&self, mode: RegistryMode) {
        self.state.write().await.mode = mode;
    }

    /// The current registry operating mode.
    pub async fn mode(&self) -> RegistryMode {
        self.state.read().await.mode
    }

    /// Replace all database-sourced configs with the source's current
    /// snapshot, preserving file-sourced domains the snapshot doesn't claim.
    ///
    /// Every previously DB-sourced domain is dropped first, so a domain
    /// deleted from the database disappears locally even when the snapshot
    /// is empty. Snapshot entries that fail validation are skipped with a
    /// warning. The routing list is recompiled from all surviving configs
    /// and the new state is installed in one swap.
    #[instrument(skip(self, cancel))]
    pub async fn load_from_database(&self, cancel: &CancellationToken) -> RegistryResult<()> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        let (source, org_id) = {
            let state = self.state.read().await;
            (state.db_source.clone(), state.org_id.clone())
        };

        let Some(source) = source else {
            return Err(RegistryError::SourceNotConfigured);
        };

        let org_id = org_id
            .filter(|id| !id.is_empty())
            .ok_or(RegistryError::OrgIdNotSet)?;

        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        // Fetch outside the lock; readers keep routing off the old state.
        let snapshot = source
            .list_active_agents(&org_id)
            .await
            .map_err(|err| RegistryError::DatabaseSource(err.to_string()))?;

        if snapshot.is_empty() {
            info!(org_id = %org_id, "no database configs found");
        }

        let mut state = self.state.write().await;

        // Build the next generation on scratch copies so a failure cannot
        // leave half-updated state.
        let mut configs = state.configs.clone();
        let mut agents = state.agents.clone();
        let mut db_sourced: HashSet<String> = HashSet::new();

        for domain in &state.db_sourced {
            if let Some(config) = configs.remove(domain) {
                remove_agents(&mut agents, &config);
            }
        }

        let mut loaded = 0usize;
        for config in snapshot {
            if let Err(err) = config.validate() {
                warn!(
                    config = %config.metadata.name,
                    error = %err,
                    "skipping invalid database config"
                );
                continue;
            }

            let domain = config.metadata.domain.clone();

            // Database wins per domain: whatever currently occupies the
            // domain is fully evicted before the replacement is indexed.
            if let Some(previous) = configs.remove(&domain) {
                remove_agents(&mut agents, &previous);
            }

            index_agents(&mut agents, &config);
            configs.insert(domain.clone(), Arc::new(config));
            db_sourced.insert(domain);
            loaded += 1;
        }

        let routing = recompile_routing(&configs)?;

        state.configs = configs;
        state.agents = agents;
        state.db_sourced = db_sourced;
        state.routing = routing;
        state.last_reload = Some(Utc::now());
        state.reload_count += 1;

        info!(loaded, org_id = %org_id, "database configs loaded");
        Ok(())
    }

    /// Load file configs, then overlay database configs.
    ///
    /// Either phase failing is logged and non-fatal; the other source may
    /// still be viable. An empty `config_dir` skips the file phase.
    /// Cancellation aborts immediately instead of being treated as a
    /// source failure.
    pub async fn load_hybrid(
        &self,
        config_dir: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> RegistryResult<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.as_os_str().is_empty() {
            match self
                .load_from_directory_with_cancel(config_dir, cancel)
                .await
            {
                Ok(()) => {}
                Err(RegistryError::Cancelled) => return Err(RegistryError::Cancelled),
                Err(err) => warn!(
                    dir = %config_dir.display(),
                    error = %err,
                    "failed to load file configs; database configs may still apply"
                ),
            }
        }

        let has_source = self.state.read().await.db_source.is_some();
        if has_source {
            match self.load_from_database(cancel).await {
                Ok(()) => {}
                Err(RegistryError::Cancelled) => return Err(RegistryError::Cancelled),
                Err(err) => warn!(
                    error = %err,
                    "failed to load database configs; continuing with file configs"
                ),
            }
        }

        Ok(())
    }

    /// Refresh database-sourced configs according to the current mode.
    ///
    /// File mode is a no-op success; database mode reloads from the
    /// source; hybrid mode replays the full file-then-database overlay.
    pub async fn reload_from_database(&self, cancel: &CancellationToken) -> RegistryResult<()> {
        match self.mode().await {
            RegistryMode::Database => self.load_from_database(cancel).await,
            RegistryMode::Hybrid => {
                let config_dir = self.state.read().await.config_dir.clone();
                self.load_hybrid(config_dir.unwrap_or_default(), cancel)
                    .await
            }
            RegistryMode::File => Ok(()),
        }
    }

    /// Whether a domain's live config came from the database.
    pub async fn is_db_sourced(&self, domain: &str) -> bool {
        self.state.read().await.db_sourced.contains(domain)
    }

    /// Provenance of a domain's live config, if the domain is registered.
    pub async fn config_source(&self, domain: &str) -> Option<ConfigSource> {
        let state = self.state.read().await;

        if !state.configs.contains_key(domain) {
            None
        } else if state.db_sourced.contains(domain) {
            Some(ConfigSource::Database)
        } else {
            Some(ConfigSource::File)
        }
    }

    /// Registry counters with the per-source domain breakdown.
    pub async fn hybrid_stats(&self) -> HybridStats {
        let state = self.state.read().await;
        let db_count = state.db_sourced.len();

        HybridStats {
            registry: RegistryStats {
                domain_count: state.configs.len(),
                agent_count: state.agents.len(),
                routing_rules: state.routing.len(),
                config_dir: state.config_dir.clone(),
                last_reload: state.last_reload,
                reload_count: state.reload_count,
                default_domain: state.default_domain.clone(),
            },
            db_sourced_domains: db_count,
            file_sourced_domains: state.configs.len().saturating_sub(db_count),
            mode: state.mode,
            org_id: state.org_id.clone(),
        }
    }
}

/// Recompile the global routing list from every live config.
///
/// Domains are visited in sorted order so equal-priority rules from
/// different domains land in a deterministic order.
fn recompile_routing(
    configs: &HashMap<String, Arc<AgentConfigFile>>,
) -> RegistryResult<Vec<CompiledRoutingRule>> {
    let mut domains: Vec<&String> = configs.keys().collect();
    domains.sort();

    let mut all_rules = Vec::new();
    for domain in domains {
        all_rules.extend(routing::compile_rules(&configs[domain])?);
    }

    routing::sort_by_priority(&mut all_rules);
    Ok(all_rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticSource {
        configs: Vec<AgentConfigFile>,
    }

    #[async_trait]
    impl DatabaseAgentSource for StaticSource {
        async fn list_active_agents(&self, _org_id: &str) -> RegistryResult<Vec<AgentConfigFile>> {
            Ok(self.configs.clone())
        }

        async fn get_agent_by_name(
            &self,
            _org_id: &str,
            name: &str,
        ) -> RegistryResult<Option<AgentConfigFile>> {
            Ok(self
                .configs
                .iter()
                .find(|config| config.metadata.name == name)
                .cloned())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl DatabaseAgentSource for FailingSource {
        async fn list_active_agents(&self, _org_id: &str) -> RegistryResult<Vec<AgentConfigFile>> {
            Err(RegistryError::Database("connection refused".to_string()))
        }

        async fn get_agent_by_name(
            &self,
            _org_id: &str,
            _name: &str,
        ) -> RegistryResult<Option<AgentConfigFile>> {
            Err(RegistryError::Database("connection refused".to_string()))
        }
    }

    fn db_config(domain: &str, agent: &str) -> AgentConfigFile {
        let yaml = format!(
            r#"
apiVersion: switchboard.dev/v1
kind: AgentConfig
metadata:
  name: {domain}-db
  domain: {domain}
spec:
  agents:
    - name: {agent}
      type: llm-call
      prompt_template: "Handle: {{task}}"
  routing:
    - pattern: "{domain}"
      agent: {agent}
      priority: 10
"#
        );
        AgentConfigFile::from_yaml(&yaml).unwrap()
    }

    #[tokio::test]
    async fn set_database_source_switches_to_hybrid() {
        let registry = AgentRegistry::new();
        assert_eq!(registry.mode().await, RegistryMode::File);

        registry
            .set_database_source(Arc::new(StaticSource { configs: vec![] }), "org-1")
            .await;

        assert_eq!(registry.mode().await, RegistryMode::Hybrid);
    }

    #[tokio::test]
    async fn load_without_source_is_an_error() {
        let registry = AgentRegistry::new();

        let err = registry
            .load_from_database(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::SourceNotConfigured));
        assert_eq!(err.to_string(), "database source not configured");
    }

    #[tokio::test]
    async fn load_without_org_is_an_error() {
        let registry = AgentRegistry::new();
        registry
            .set_database_source(Arc::new(StaticSource { configs: vec![] }), "")
            .await;

        let err = registry
            .load_from_database(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::OrgIdNotSet));
        assert_eq!(err.to_string(), "organization ID not set");
    }

    #[tokio::test]
    async fn fetch_failure_is_wrapped() {
        let registry = AgentRegistry::new();
        registry
            .set_database_source(Arc::new(FailingSource), "org-1")
            .await;

        let err = registry
            .load_from_database(&CancellationToken::new())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("failed to load agents from database:"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_fetch() {
        let registry = AgentRegistry::new();
        registry
            .set_database_source(
                Arc::new(StaticSource {
                    configs: vec![db_config("travel", "flight-search")],
                }),
                "org-1",
            )
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = registry.load_from_database(&cancel).await.unwrap_err();
        assert!(matches!(err, RegistryError::Cancelled));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn mode_round_trips_through_strings() {
        for mode in [
            RegistryMode::File,
            RegistryMode::Database,
            RegistryMode::Hybrid,
        ] {
            assert_eq!(mode.to_string().parse::<RegistryMode>().unwrap(), mode);
        }
        assert!("clipboard".parse::<RegistryMode>().is_err());
    }

    #[tokio::test]
    async fn config_source_reports_provenance() {
        let registry = AgentRegistry::new();
        registry
            .set_database_source(
                Arc::new(StaticSource {
                    configs: vec![db_config("travel", "flight-search")],
                }),
                "org-1",
            )
            .await;
        registry
            .load_from_database(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            registry.config_source("travel").await,
            Some(ConfigSource::Database)
        );
        assert_eq!(registry.config_source("unknown").await, None);
        assert!(registry.is_db_sourced("travel").await);
        assert!(!registry.is_db_sourced("unknown").await);
    }
}
