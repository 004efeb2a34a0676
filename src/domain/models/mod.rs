//! Domain models: configuration documents, validation, and routing.

pub mod agent_config;
pub mod routing;
pub mod validation;

pub use agent_config::{
    AgentConfigFile, AgentConfigSpec, AgentDef, AgentKind, AgentMetadata, ConnectorRef,
    DomainTemplate, ExecutionConfig, LlmSettings, RoutingRule, SynthesisConfig,
    API_VERSION_PREFIX, CONFIG_KIND, DEFAULT_EXECUTION_MODE, DEFAULT_MAX_PARALLEL_TASKS,
    DEFAULT_TIMEOUT_SECONDS, VALID_EXECUTION_MODES,
};
pub use routing::{compile_rules, sort_by_priority, CompiledRoutingRule, RouteMatch};
pub use validation::{is_valid_identifier, MAX_LLM_TEMPERATURE, MAX_PATTERN_LENGTH};
