//! Domain errors for the switchboard registry.

use std::path::PathBuf;

use thiserror::Error;

/// Ways an agent configuration document can be rejected.
///
/// Validation is all-or-nothing: the first violation found rejects the whole
/// document. Messages carry enough context (agent index and name, rule index)
/// to locate the offending block without the source file at hand.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid apiVersion '{0}': must start with 'switchboard.dev/'")]
    ApiVersion(String),

    #[error("invalid kind '{0}': expected 'AgentConfig'")]
    Kind(String),

    #[error("metadata: {0} is required")]
    MissingMetadata(&'static str),

    #[error("invalid {field} '{value}': must be lowercase alphanumeric with hyphens or underscores, not starting with either")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("invalid default_mode '{0}': must be one of sequential, parallel, auto")]
    InvalidExecutionMode(String),

    #[error("at least one agent is required")]
    NoAgents,

    #[error("duplicate agent name: {0}")]
    DuplicateAgentName(String),

    #[error("agent {index}: name is required")]
    MissingAgentName { index: usize },

    #[error("agent {index} ({name}): llm-call requires an llm block or a prompt_template")]
    MissingLlmOrPrompt { index: usize, name: String },

    #[error("agent {index} ({name}): llm {field} is required")]
    MissingLlmField {
        index: usize,
        name: String,
        field: &'static str,
    },

    #[error("agent {index} ({name}): temperature {value} must be between 0 and 2")]
    TemperatureOutOfRange {
        index: usize,
        name: String,
        value: f64,
    },

    #[error("agent {index} ({name}): connector-call requires a connector block")]
    MissingConnector { index: usize, name: String },

    #[error("agent {index} ({name}): connector {field} is required")]
    MissingConnectorField {
        index: usize,
        name: String,
        field: &'static str,
    },

    #[error("routing rule {index}: pattern is required")]
    MissingPattern { index: usize },

    #[error("routing rule {index}: agent is required")]
    MissingRuleAgent { index: usize },

    #[error("routing rule {index}: pattern exceeds {max} characters ({len})")]
    PatternTooLong { index: usize, len: usize, max: usize },

    #[error("routing rule {index}: pattern contains potentially dangerous nested quantifiers")]
    DangerousPattern { index: usize },

    #[error("routing rule {index}: failed to compile pattern: {source}")]
    InvalidPattern {
        index: usize,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("routing rule {index}: agent '{agent}' not found in agents list")]
    UnknownRuleAgent { index: usize, agent: String },
}

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid agent config: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid config {}: {source}", path.display())]
    InvalidConfigFile {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration directory path cannot be empty")]
    EmptyConfigDir,

    #[error("configuration directory does not exist: {}", .0.display())]
    ConfigDirNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("duplicate domain '{domain}' in {}", path.display())]
    DuplicateDomain { domain: String, path: PathBuf },

    #[error("domain not found: {0}")]
    DomainNotFound(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("agent '{agent}' not found in domain '{domain}'")]
    AgentNotInDomain { domain: String, agent: String },

    #[error("no routing rule matches task: {0}")]
    NoRouteMatch(String),

    #[error("no fallback agent available for task: {0}")]
    NoFallbackAgent(String),

    #[error("no configuration directory set - load from a directory first")]
    NoConfigDir,

    #[error("database source not configured")]
    SourceNotConfigured,

    #[error("organization ID not set")]
    OrgIdNotSet,

    #[error("failed to load agents from database: {0}")]
    DatabaseSource(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl From<sqlx::Error> for RegistryError {
    fn from(err: sqlx::Error) -> Self {
        RegistryError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Database(err.to_string())
    }
}
