//! Agent registry - the central lookup service for agent configurations.
//!
//! The registry owns every loaded configuration and answers three questions:
//! which config serves a domain, which agent answers to a name, and which
//! agent should handle a given task description. All state lives behind a
//! single `RwLock`; loads prepare everything outside the lock and install
//! the new state in one swap, so readers never observe a partial update.
//!
//! - **mod**: registry state, directory loading, lookups, task routing
//! - **hybrid**: registry modes, database-backed loading, provenance

mod hybrid;

pub use hybrid::{ConfigSource, HybridStats, RegistryMode};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::models::routing;
use crate::domain::models::{
    AgentConfigFile, AgentDef, CompiledRoutingRule, DomainTemplate, ExecutionConfig, RouteMatch,
};
use crate::domain::ports::DatabaseAgentSource;

/// Domain used for fallback routing when none is configured.
pub const DEFAULT_DOMAIN: &str = "generic";

/// Registry over agent configurations with priority-ranked task routing.
///
/// Cheap to share as `Arc<AgentRegistry>`; every method takes `&self`.
pub struct AgentRegistry {
    state: RwLock<RegistryState>,
}

/// All mutable registry state, guarded as one unit.
struct RegistryState {
    /// Domain -> configuration document.
    configs: HashMap<String, Arc<AgentConfigFile>>,
    /// Flattened agent index. Qualified keys (`domain/agent`) are
    /// authoritative; unqualified keys are first-wins aliases.
    agents: HashMap<String, AgentDef>,
    /// Every live config's rules, sorted by priority descending.
    routing: Vec<CompiledRoutingRule>,
    config_dir: Option<PathBuf>,
    default_domain: String,
    mode: RegistryMode,
    db_source: Option<Arc<dyn DatabaseAgentSource>>,
    org_id: Option<String>,
    /// Domains whose live config came from the database.
    db_sourced: HashSet<String>,
    last_reload: Option<DateTime<Utc>>,
    reload_count: u64,
}

/// Point-in-time registry counters.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    /// Number of registered domains.
    pub domain_count: usize,
    /// Number of agent index entries (qualified names plus aliases).
    pub agent_count: usize,
    /// Number of compiled routing rules.
    pub routing_rules: usize,
    /// Directory of the last file load, if any.
    pub config_dir: Option<PathBuf>,
    /// Completion time of the last successful load.
    pub last_reload: Option<DateTime<Utc>>,
    /// Number of successful load batches.
    pub reload_count: u64,
    /// Current fallback domain.
    pub default_domain: String,
}

impl AgentRegistry {
    /// Create an empty registry in file mode.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                configs: HashMap::new(),
                agents: HashMap::new(),
                routing: Vec::new(),
                config_dir: None,
                default_domain: DEFAULT_DOMAIN.to_string(),
                mode: RegistryMode::File,
                db_source: None,
                org_id: None,
                db_sourced: HashSet::new(),
                last_reload: None,
                reload_count: 0,
            }),
        }
    }

    /// Load every YAML config from a directory, replacing current state.
    ///
    /// Only top-level `.yaml`/`.yml` files are considered; subdirectories
    /// are skipped. Any unreadable or invalid file fails the whole load and
    /// leaves the registry untouched. An empty directory is valid and
    /// yields an empty registry.
    pub async fn load_from_directory(&self, dir: impl AsRef<Path>) -> RegistryResult<()> {
        self.load_from_directory_with_cancel(dir, &CancellationToken::new())
            .await
    }

    /// Cancellable variant of [`load_from_directory`](Self::load_from_directory).
    ///
    /// The token is checked before starting and between files; once the
    /// write lock is taken the swap always completes.
    pub async fn load_from_directory_with_cancel(
        &self,
        dir: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> RegistryResult<()> {
        let dir = dir.as_ref();

        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        if dir.as_os_str().is_empty() {
            return Err(RegistryError::EmptyConfigDir);
        }

        let metadata = std::fs::metadata(dir).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RegistryError::ConfigDirNotFound(dir.to_path_buf())
            } else {
                RegistryError::Io {
                    path: dir.to_path_buf(),
                    source,
                }
            }
        })?;

        if !metadata.is_dir() {
            return Err(RegistryError::NotADirectory(dir.to_path_buf()));
        }

        let files = find_config_files(dir)?;
        debug!(dir = %dir.display(), files = files.len(), "scanning config directory");

        // Parse, validate, and compile everything before touching state.
        let mut new_configs: HashMap<String, Arc<AgentConfigFile>> = HashMap::new();
        let mut new_agents: HashMap<String, AgentDef> = HashMap::new();
        let mut all_rules: Vec<CompiledRoutingRule> = Vec::new();

        for file in &files {
            if cancel.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }

            let config = AgentConfigFile::load(file)?;
            let domain = config.metadata.domain.clone();

            if new_configs.contains_key(&domain) {
                return Err(RegistryError::DuplicateDomain {
                    domain,
                    path: file.clone(),
                });
            }

            index_agents(&mut new_agents, &config);

            let rules = routing::compile_rules(&config).map_err(|source| {
                RegistryError::InvalidConfigFile {
                    path: file.clone(),
                    source,
                }
            })?;
            all_rules.extend(rules);

            new_configs.insert(domain, Arc::new(config));
        }

        routing::sort_by_priority(&mut all_rules);

        let mut state = self.state.write().await;
        state.configs = new_configs;
        state.agents = new_agents;
        state.routing = all_rules;
        state.config_dir = Some(dir.to_path_buf());
        state.last_reload = Some(Utc::now());
        state.reload_count += 1;

        info!(
            dir = %dir.display(),
            domains = state.configs.len(),
            agents = state.agents.len(),
            rules = state.routing.len(),
            "agent configs loaded"
        );

        Ok(())
    }

    /// Reload from the directory of the last successful file load.
    pub async fn reload(&self) -> RegistryResult<()> {
        self.reload_with_cancel(&CancellationToken::new()).await
    }

    /// Cancellable variant of [`reload`](Self::reload).
    pub async fn reload_with_cancel(&self, cancel: &CancellationToken) -> RegistryResult<()> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        let config_dir = self.state.read().await.config_dir.clone();
        let Some(dir) = config_dir else {
            return Err(RegistryError::NoConfigDir);
        };

        self.load_from_directory_with_cancel(dir, cancel).await
    }

    /// Validate and install a single configuration.
    ///
    /// If the domain is already registered the previous config is fully
    /// evicted first; an update is always a whole-config replacement,
    /// never a merge.
    pub async fn register_config(&self, config: AgentConfigFile) -> RegistryResult<()> {
        config.validate()?;
        let mut rules = routing::compile_rules(&config)?;
        let domain = config.metadata.domain.clone();

        let mut state = self.state.write().await;

        if let Some(previous) = state.configs.remove(&domain) {
            remove_agents(&mut state.agents, &previous);
            state.routing.retain(|rule| rule.domain != domain);
            state.db_sourced.remove(&domain);
        }

        index_agents(&mut state.agents, &config);
        state.configs.insert(domain.clone(), Arc::new(config));
        state.routing.append(&mut rules);
        routing::sort_by_priority(&mut state.routing);
        state.last_reload = Some(Utc::now());
        state.reload_count += 1;

        info!(domain = %domain, "config registered");
        Ok(())
    }

    /// Remove a domain's config, its agents, and its routing rules.
    pub async fn unregister_domain(&self, domain: &str) -> RegistryResult<()> {
        let mut state = self.state.write().await;

        let Some(config) = state.configs.remove(domain) else {
            return Err(RegistryError::DomainNotFound(domain.to_string()));
        };

        remove_agents(&mut state.agents, &config);
        state.routing.retain(|rule| rule.domain != domain);
        state.db_sourced.remove(domain);

        info!(domain = %domain, "domain unregistered");
        Ok(())
    }

    /// Remove all configurations, keeping mode, source, and counters.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.configs.clear();
        state.agents.clear();
        state.routing.clear();
        state.db_sourced.clear();
        state.config_dir = None;
    }

    /// Whether no configurations are loaded.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.configs.is_empty()
    }

    /// The configuration serving a domain.
    pub async fn get_config(&self, domain: &str) -> RegistryResult<Arc<AgentConfigFile>> {
        self.state
            .read()
            .await
            .configs
            .get(domain)
            .cloned()
            .ok_or_else(|| RegistryError::DomainNotFound(domain.to_string()))
    }

    /// The configuration for a domain, falling back to the default domain.
    pub async fn get_config_or_default(&self, domain: &str) -> Option<Arc<AgentConfigFile>> {
        let state = self.state.read().await;
        state
            .configs
            .get(domain)
            .or_else(|| state.configs.get(&state.default_domain))
            .cloned()
    }

    /// Look up an agent by simple or qualified (`domain/agent`) name.
    pub async fn get_agent(&self, name: &str) -> RegistryResult<AgentDef> {
        self.state
            .read()
            .await
            .agents
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::AgentNotFound(name.to_string()))
    }

    /// Look up an agent within a specific domain.
    pub async fn get_agent_in_domain(
        &self,
        domain: &str,
        agent_name: &str,
    ) -> RegistryResult<AgentDef> {
        let state = self.state.read().await;

        let config = state
            .configs
            .get(domain)
            .ok_or_else(|| RegistryError::DomainNotFound(domain.to_string()))?;

        config
            .agent(agent_name)
            .cloned()
            .ok_or_else(|| RegistryError::AgentNotInDomain {
                domain: domain.to_string(),
                agent: agent_name.to_string(),
            })
    }

    /// Match a task description against the routing rules.
    ///
    /// The description is lowercased and tested against every rule in
    /// global priority order; the first match whose agent resolves wins.
    /// Rules whose agent cannot be resolved are skipped, not errors.
    #[instrument(skip(self))]
    pub async fn route_task(&self, description: &str) -> RegistryResult<RouteMatch> {
        let state = self.state.read().await;
        let task = description.to_lowercase();

        for rule in &state.routing {
            if !rule.matches(&task) {
                continue;
            }

            let agent = state
                .agents
                .get(&rule.qualified_agent())
                .or_else(|| state.agents.get(&rule.rule.agent));

            if let Some(agent) = agent {
                debug!(agent = %agent.name, domain = %rule.domain, "task routed");
                return Ok(RouteMatch {
                    agent: agent.clone(),
                    domain: rule.domain.clone(),
                });
            }
        }

        Err(RegistryError::NoRouteMatch(description.to_string()))
    }

    /// Route a task, falling back to the first agent of `fallback_domain`
    /// (or the default domain) when no rule matches.
    #[instrument(skip(self))]
    pub async fn route_task_with_fallback(
        &self,
        description: &str,
        fallback_domain: &str,
    ) -> RegistryResult<RouteMatch> {
        match self.route_task(description).await {
            Ok(matched) => Ok(matched),
            Err(RegistryError::NoRouteMatch(_)) => {
                let state = self.state.read().await;

                let config = state
                    .configs
                    .get(fallback_domain)
                    .or_else(|| state.configs.get(&state.default_domain));

                match config {
                    Some(config) if !config.spec.agents.is_empty() => {
                        let agent = config.spec.agents[0].clone();
                        debug!(
                            agent = %agent.name,
                            domain = %config.metadata.domain,
                            "fallback agent selected"
                        );
                        Ok(RouteMatch {
                            agent,
                            domain: config.metadata.domain.clone(),
                        })
                    }
                    _ => Err(RegistryError::NoFallbackAgent(description.to_string())),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// All registered domains, sorted.
    pub async fn list_domains(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut domains: Vec<String> = state.configs.keys().cloned().collect();
        domains.sort();
        domains
    }

    /// All agent index keys (qualified names and aliases), sorted.
    pub async fn list_agents(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut agents: Vec<String> = state.agents.keys().cloned().collect();
        agents.sort();
        agents
    }

    /// Agent names of one domain, in declaration order.
    pub async fn list_agents_in_domain(&self, domain: &str) -> RegistryResult<Vec<String>> {
        let state = self.state.read().await;

        let config = state
            .configs
            .get(domain)
            .ok_or_else(|| RegistryError::DomainNotFound(domain.to_string()))?;

        Ok(config
            .spec
            .agents
            .iter()
            .map(|agent| agent.name.clone())
            .collect())
    }

    /// Whether a domain is registered.
    pub async fn has_domain(&self, domain: &str) -> bool {
        self.state.read().await.configs.contains_key(domain)
    }

    /// Whether an agent name (simple or qualified) is indexed.
    pub async fn has_agent(&self, name: &str) -> bool {
        self.state.read().await.agents.contains_key(name)
    }

    /// Set the fallback domain used for routing and default lookups.
    pub async fn set_default_domain(&self, domain: impl Into<String>) {
        self.state.write().await.default_domain = domain.into();
    }

    /// The current fallback domain.
    pub async fn default_domain(&self) -> String {
        self.state.read().await.default_domain.clone()
    }

    /// Planner-facing template for a domain.
    pub async fn get_domain_template(&self, domain: &str) -> RegistryResult<DomainTemplate> {
        Ok(self.get_config(domain).await?.to_domain_template())
    }

    /// Planner-facing template for a domain, with a generic final fallback
    /// when neither the domain nor the default domain is registered.
    pub async fn get_domain_template_or_default(&self, domain: &str) -> DomainTemplate {
        match self.get_config_or_default(domain).await {
            Some(config) => config.to_domain_template(),
            None => DomainTemplate {
                domain: DEFAULT_DOMAIN.to_string(),
                common_tasks: vec![
                    "task-1".to_string(),
                    "task-2".to_string(),
                    "task-3".to_string(),
                ],
                hints: "Analyze the query to determine logical task breakdown and dependencies."
                    .to_string(),
            },
        }
    }

    /// Synthesis prompt for a domain, if enabled and non-empty.
    pub async fn get_synthesis_prompt(&self, domain: &str) -> Option<String> {
        self.get_config_or_default(domain)
            .await
            .and_then(|config| config.synthesis_prompt().map(str::to_string))
    }

    /// Execution settings for a domain, with built-in defaults as the
    /// final fallback.
    pub async fn get_execution_config(&self, domain: &str) -> ExecutionConfig {
        match self.get_config_or_default(domain).await {
            Some(config) => config.spec.execution.clone(),
            None => ExecutionConfig::default(),
        }
    }

    /// Current registry counters.
    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.read().await;

        RegistryStats {
            domain_count: state.configs.len(),
            agent_count: state.agents.len(),
            routing_rules: state.routing.len(),
            config_dir: state.config_dir.clone(),
            last_reload: state.last_reload,
            reload_count: state.reload_count,
            default_domain: state.default_domain.clone(),
        }
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Index a config's agents under their qualified names, plus unqualified
/// aliases for names not already taken.
fn index_agents(agents: &mut HashMap<String, AgentDef>, config: &AgentConfigFile) {
    let domain = &config.metadata.domain;

    for agent in &config.spec.agents {
        agents.insert(format!("{domain}/{}", agent.name), agent.clone());

        if !agents.contains_key(&agent.name) {
            agents.insert(agent.name.clone(), agent.clone());
        }
    }
}

/// Remove a config's agents from the index. Qualified keys always go;
/// an unqualified alias goes only if it still points at this config's
/// agent, so aliases held by other domains survive.
fn remove_agents(agents: &mut HashMap<String, AgentDef>, config: &AgentConfigFile) {
    let domain = &config.metadata.domain;

    for agent in &config.spec.agents {
        agents.remove(&format!("{domain}/{}", agent.name));

        if agents
            .get(&agent.name)
            .is_some_and(|entry| entry.id == agent.id)
        {
            agents.remove(&agent.name);
        }
    }
}

/// Top-level `.yaml`/`.yml` files of a directory, sorted by path.
fn find_config_files(dir: &Path) -> RegistryResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| RegistryError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
