//! Agent configuration documents.
//!
//! One YAML document declares everything the orchestrator needs to know about
//! a single business domain: the agents that can handle its tasks, the
//! routing rules that pick an agent for a task description, execution hints
//! for the planner, and an optional synthesis prompt. Documents use a
//! Kubernetes-style `apiVersion`/`kind` envelope so config directories stay
//! self-describing.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{RegistryError, RegistryResult, ValidationError};
use crate::domain::models::validation;

/// Required prefix of the `apiVersion` field.
pub const API_VERSION_PREFIX: &str = "switchboard.dev/";

/// Required value of the `kind` field.
pub const CONFIG_KIND: &str = "AgentConfig";

/// Default number of concurrent tasks per domain.
pub const DEFAULT_MAX_PARALLEL_TASKS: u32 = 5;

/// Default timeout for agent operations, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 300;

/// Default execution strategy.
pub const DEFAULT_EXECUTION_MODE: &str = "auto";

/// Allowed values for `ExecutionConfig::default_mode`.
pub const VALID_EXECUTION_MODES: &[&str] = &["sequential", "parallel", "auto"];

const DEFAULT_PLANNER_HINTS: &str =
    "Analyze the query to determine logical task breakdown and dependencies.";

/// A complete agent configuration document for one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfigFile {
    /// Schema version, e.g. `switchboard.dev/v1`.
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    /// Document kind; always `AgentConfig`.
    #[serde(default)]
    pub kind: String,
    /// Identity of the document.
    pub metadata: AgentMetadata,
    /// The domain's agents, routing, and execution settings.
    pub spec: AgentConfigSpec,
}

/// Identity block of a configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Config name, unique per organization.
    #[serde(default)]
    pub name: String,
    /// Business domain this config serves, e.g. `travel`.
    #[serde(default)]
    pub domain: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Body of a configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfigSpec {
    /// Hints for how the planner should execute this domain's tasks.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Agent definitions; at least one is required.
    #[serde(default)]
    pub agents: Vec<AgentDef>,
    /// Routing rules mapping task descriptions to agents.
    #[serde(default)]
    pub routing: Vec<RoutingRule>,
    /// Optional result-synthesis settings.
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

/// Planner execution hints for a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// One of `sequential`, `parallel`, `auto`. Empty falls back to auto.
    pub default_mode: String,
    /// Cap on concurrently running tasks.
    pub max_parallel_tasks: u32,
    /// Default timeout for agent operations.
    pub timeout_seconds: u32,
    /// Natural-language hints passed to the planner.
    pub hints: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_mode: DEFAULT_EXECUTION_MODE.to_string(),
            max_parallel_tasks: DEFAULT_MAX_PARALLEL_TASKS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            hints: DEFAULT_PLANNER_HINTS.to_string(),
        }
    }
}

impl ExecutionConfig {
    /// Configured timeout as a `Duration`, falling back to five minutes.
    pub fn default_timeout(&self) -> Duration {
        if self.timeout_seconds == 0 {
            Duration::from_secs(u64::from(DEFAULT_TIMEOUT_SECONDS))
        } else {
            Duration::from_secs(u64::from(self.timeout_seconds))
        }
    }

    /// Whether tasks in this domain default to parallel execution.
    pub fn is_parallel(&self) -> bool {
        self.default_mode == "parallel"
    }

    /// Whether tasks in this domain default to sequential execution.
    pub fn is_sequential(&self) -> bool {
        self.default_mode == "sequential"
    }
}

/// How an agent performs its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Invokes a language model with a prompt.
    #[serde(rename = "llm-call")]
    LlmCall,
    /// Invokes an external connector operation.
    #[serde(rename = "connector-call")]
    ConnectorCall,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::LlmCall => write!(f, "llm-call"),
            AgentKind::ConnectorCall => write!(f, "connector-call"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "llm-call" => Ok(AgentKind::LlmCall),
            "connector-call" => Ok(AgentKind::ConnectorCall),
            _ => Err(format!("invalid agent type: {s}")),
        }
    }
}

/// A single agent definition within a configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDef {
    /// Stable identity for index bookkeeping. Generated at parse time,
    /// never read from or written to YAML. Clones keep the same id, so
    /// index entries can be matched back to the config they came from.
    #[serde(skip, default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Agent name, unique within the config.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// How this agent performs its work.
    #[serde(rename = "type")]
    pub kind: AgentKind,
    /// LLM settings; required for `llm-call` unless a prompt template is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmSettings>,
    /// Connector reference; required for `connector-call`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<ConnectorRef>,
    /// Prompt template for LLM invocation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prompt_template: String,
    /// Free-form agent parameters.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, serde_json::Value>,
}

/// LLM invocation settings for an `llm-call` agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider identifier, e.g. `anthropic`, `openai`, `bedrock`.
    #[serde(default)]
    pub provider: String,
    /// Model identifier.
    #[serde(default)]
    pub model: String,
    /// Sampling temperature in [0, 2].
    #[serde(default)]
    pub temperature: f64,
    /// Maximum response tokens; 0 means provider default.
    #[serde(default)]
    pub max_tokens: u32,
}

/// Connector operation reference for a `connector-call` agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorRef {
    /// Connector name, e.g. `postgres`, `amadeus-travel`.
    #[serde(default)]
    pub name: String,
    /// Operation to invoke, e.g. `query`.
    #[serde(default)]
    pub operation: String,
}

/// Maps task descriptions to an agent via a regex pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Regex matched against lowercased task descriptions.
    #[serde(default)]
    pub pattern: String,
    /// Target agent name within the same config.
    #[serde(default)]
    pub agent: String,
    /// Optional connector override for connector-call agents.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connector: String,
    /// Higher priority rules are tried first.
    #[serde(default)]
    pub priority: i32,
}

/// Result-synthesis settings for a domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Whether synthesis is enabled for this domain.
    pub enabled: bool,
    /// Prompt template used to synthesize task results.
    pub prompt_template: String,
}

/// Planner-facing summary of a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainTemplate {
    /// The domain this template describes.
    pub domain: String,
    /// Task names commonly produced for this domain.
    pub common_tasks: Vec<String>,
    /// Natural-language hints for the planner.
    pub hints: String,
}

impl AgentConfigFile {
    /// Load and validate a configuration document from a file.
    pub fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&data).map_err(|err| match err {
            RegistryError::Validation(source) => RegistryError::InvalidConfigFile {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate a configuration document from YAML text.
    pub fn from_yaml(data: &str) -> RegistryResult<Self> {
        let config: Self = serde_yaml::from_str(data).map_err(ValidationError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the document against the schema rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_config(self)
    }

    /// The domain this config serves.
    pub fn domain(&self) -> &str {
        &self.metadata.domain
    }

    /// Look up an agent definition by name.
    pub fn agent(&self, name: &str) -> Option<&AgentDef> {
        self.spec.agents.iter().find(|agent| agent.name == name)
    }

    /// The synthesis prompt, if synthesis is enabled and a template is set.
    pub fn synthesis_prompt(&self) -> Option<&str> {
        if self.spec.synthesis.enabled && !self.spec.synthesis.prompt_template.is_empty() {
            Some(&self.spec.synthesis.prompt_template)
        } else {
            None
        }
    }

    /// Summarize this config as a planner-facing domain template.
    pub fn to_domain_template(&self) -> DomainTemplate {
        DomainTemplate {
            domain: self.metadata.domain.clone(),
            common_tasks: self
                .spec
                .agents
                .iter()
                .map(|agent| agent.name.clone())
                .collect(),
            hints: self.spec.execution.hints.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TRAVEL_YAML: &str = r#"
apiVersion: switchboard.dev/v1
kind: AgentConfig
metadata:
  name: travel-agents
  domain: travel
  description: Travel domain agents
spec:
  execution:
    default_mode: parallel
    max_parallel_tasks: 3
    timeout_seconds: 120
    hints: Search flights and hotels in parallel.
  agents:
    - name: flight-search
      description: Searches for flights
      type: llm-call
      llm:
        provider: anthropic
        model: claude-3-sonnet
        temperature: 0.7
        max_tokens: 4096
    - name: booking-connector
      type: connector-call
      connector:
        name: amadeus-travel
        operation: book
  routing:
    - pattern: "(flight|fly|airline)"
      agent: flight-search
      priority: 10
    - pattern: "book"
      agent: booking-connector
      priority: 5
  synthesis:
    enabled: true
    prompt_template: "Combine the travel results: {results}"
"#;

    #[test]
    fn parses_complete_document() {
        let config = AgentConfigFile::from_yaml(TRAVEL_YAML).unwrap();

        assert_eq!(config.api_version, "switchboard.dev/v1");
        assert_eq!(config.kind, "AgentConfig");
        assert_eq!(config.metadata.name, "travel-agents");
        assert_eq!(config.domain(), "travel");
        assert_eq!(config.spec.agents.len(), 2);
        assert_eq!(config.spec.routing.len(), 2);

        let flight = &config.spec.agents[0];
        assert_eq!(flight.kind, AgentKind::LlmCall);
        let llm = flight.llm.as_ref().unwrap();
        assert_eq!(llm.provider, "anthropic");
        assert!((llm.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(llm.max_tokens, 4096);

        let booking = &config.spec.agents[1];
        assert_eq!(booking.kind, AgentKind::ConnectorCall);
        assert_eq!(booking.connector.as_ref().unwrap().operation, "book");
    }

    #[test]
    fn agent_ids_are_generated_per_parse() {
        let first = AgentConfigFile::from_yaml(TRAVEL_YAML).unwrap();
        let second = AgentConfigFile::from_yaml(TRAVEL_YAML).unwrap();

        assert_ne!(first.spec.agents[0].id, second.spec.agents[0].id);
        // Clones share identity with their source.
        assert_eq!(first.clone().spec.agents[0].id, first.spec.agents[0].id);
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(TRAVEL_YAML.as_bytes()).unwrap();

        let config = AgentConfigFile::load(file.path()).unwrap();
        assert_eq!(config.domain(), "travel");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AgentConfigFile::load("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }

    #[test]
    fn invalid_yaml_is_a_validation_error() {
        let err = AgentConfigFile::from_yaml("not: [valid").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::Yaml(_))
        ));
    }

    #[test]
    fn execution_defaults_fill_missing_fields() {
        let yaml = r#"
apiVersion: switchboard.dev/v1
kind: AgentConfig
metadata:
  name: minimal
  domain: minimal
spec:
  agents:
    - name: helper
      type: llm-call
      prompt_template: "Help with: {task}"
"#;
        let config = AgentConfigFile::from_yaml(yaml).unwrap();
        let exec = &config.spec.execution;

        assert_eq!(exec.default_mode, DEFAULT_EXECUTION_MODE);
        assert_eq!(exec.max_parallel_tasks, DEFAULT_MAX_PARALLEL_TASKS);
        assert_eq!(exec.default_timeout(), Duration::from_secs(300));
        assert!(!exec.is_parallel());
        assert!(!exec.is_sequential());
    }

    #[test]
    fn timeout_of_zero_falls_back_to_five_minutes() {
        let exec = ExecutionConfig {
            timeout_seconds: 0,
            ..ExecutionConfig::default()
        };
        assert_eq!(exec.default_timeout(), Duration::from_secs(300));

        let exec = ExecutionConfig {
            timeout_seconds: 42,
            ..ExecutionConfig::default()
        };
        assert_eq!(exec.default_timeout(), Duration::from_secs(42));
    }

    #[test]
    fn agent_lookup_by_name() {
        let config = AgentConfigFile::from_yaml(TRAVEL_YAML).unwrap();

        assert!(config.agent("flight-search").is_some());
        assert!(config.agent("nonexistent").is_none());
    }

    #[test]
    fn synthesis_prompt_requires_enabled_and_nonempty() {
        let mut config = AgentConfigFile::from_yaml(TRAVEL_YAML).unwrap();
        assert_eq!(
            config.synthesis_prompt(),
            Some("Combine the travel results: {results}")
        );

        config.spec.synthesis.enabled = false;
        assert_eq!(config.synthesis_prompt(), None);

        config.spec.synthesis.enabled = true;
        config.spec.synthesis.prompt_template.clear();
        assert_eq!(config.synthesis_prompt(), None);
    }

    #[test]
    fn domain_template_lists_agent_names() {
        let config = AgentConfigFile::from_yaml(TRAVEL_YAML).unwrap();
        let template = config.to_domain_template();

        assert_eq!(template.domain, "travel");
        assert_eq!(template.common_tasks, vec!["flight-search", "booking-connector"]);
        assert_eq!(template.hints, "Search flights and hotels in parallel.");
    }

    #[test]
    fn agent_kind_round_trips_through_strings() {
        assert_eq!(AgentKind::LlmCall.to_string(), "llm-call");
        assert_eq!(
            "connector-call".parse::<AgentKind>().unwrap(),
            AgentKind::ConnectorCall
        );
        assert!("webhook".parse::<AgentKind>().is_err());
    }
}
