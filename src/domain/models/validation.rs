//! Semantic validation of agent configuration documents.
//!
//! Validation runs after YAML parsing and before a document may enter the
//! registry. A document is accepted or rejected as a whole; the first
//! violation found is returned.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::errors::ValidationError;
use crate::domain::models::agent_config::{
    AgentConfigFile, AgentConfigSpec, AgentDef, AgentKind, AgentMetadata, ExecutionConfig,
    RoutingRule, API_VERSION_PREFIX, CONFIG_KIND, VALID_EXECUTION_MODES,
};

/// Maximum allowed LLM sampling temperature.
pub const MAX_LLM_TEMPERATURE: f64 = 2.0;

/// Maximum allowed routing pattern length.
pub const MAX_PATTERN_LENGTH: usize = 1000;

// Nested quantifiers like (a+)+ or (ab*)* invite catastrophic backtracking.
// Matching against this blacklist is a best-effort guard, not a proof that
// the pattern is safe.
const NESTED_QUANTIFIER_PATTERN: &str = r"\([^)]*[+*][^)]*\)[+*]";

fn nested_quantifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(NESTED_QUANTIFIER_PATTERN).expect("nested quantifier pattern compiles")
    })
}

/// Validate a full configuration document.
pub fn validate_config(config: &AgentConfigFile) -> Result<(), ValidationError> {
    if !config.api_version.starts_with(API_VERSION_PREFIX) {
        return Err(ValidationError::ApiVersion(config.api_version.clone()));
    }

    if config.kind != CONFIG_KIND {
        return Err(ValidationError::Kind(config.kind.clone()));
    }

    validate_metadata(&config.metadata)?;
    validate_spec(&config.spec)
}

fn validate_metadata(metadata: &AgentMetadata) -> Result<(), ValidationError> {
    if metadata.name.is_empty() {
        return Err(ValidationError::MissingMetadata("name"));
    }

    if metadata.domain.is_empty() {
        return Err(ValidationError::MissingMetadata("domain"));
    }

    if !is_valid_identifier(&metadata.name) {
        return Err(ValidationError::InvalidIdentifier {
            field: "name",
            value: metadata.name.clone(),
        });
    }

    if !is_valid_identifier(&metadata.domain) {
        return Err(ValidationError::InvalidIdentifier {
            field: "domain",
            value: metadata.domain.clone(),
        });
    }

    Ok(())
}

fn validate_spec(spec: &AgentConfigSpec) -> Result<(), ValidationError> {
    validate_execution(&spec.execution)?;

    if spec.agents.is_empty() {
        return Err(ValidationError::NoAgents);
    }

    let mut names: HashSet<&str> = HashSet::with_capacity(spec.agents.len());
    for (index, agent) in spec.agents.iter().enumerate() {
        validate_agent(agent, index)?;

        if !names.insert(agent.name.as_str()) {
            return Err(ValidationError::DuplicateAgentName(agent.name.clone()));
        }
    }

    for (index, rule) in spec.routing.iter().enumerate() {
        validate_rule(rule, index, &names)?;
    }

    Ok(())
}

fn validate_execution(execution: &ExecutionConfig) -> Result<(), ValidationError> {
    // Empty means "use the default"; anything else must be a known mode.
    if !execution.default_mode.is_empty()
        && !VALID_EXECUTION_MODES.contains(&execution.default_mode.as_str())
    {
        return Err(ValidationError::InvalidExecutionMode(
            execution.default_mode.clone(),
        ));
    }

    Ok(())
}

fn validate_agent(agent: &AgentDef, index: usize) -> Result<(), ValidationError> {
    if agent.name.is_empty() {
        return Err(ValidationError::MissingAgentName { index });
    }

    if !is_valid_identifier(&agent.name) {
        return Err(ValidationError::InvalidIdentifier {
            field: "agent name",
            value: agent.name.clone(),
        });
    }

    match agent.kind {
        AgentKind::LlmCall => {
            if agent.llm.is_none() && agent.prompt_template.is_empty() {
                return Err(ValidationError::MissingLlmOrPrompt {
                    index,
                    name: agent.name.clone(),
                });
            }

            if let Some(llm) = &agent.llm {
                if llm.provider.is_empty() {
                    return Err(ValidationError::MissingLlmField {
                        index,
                        name: agent.name.clone(),
                        field: "provider",
                    });
                }

                if llm.model.is_empty() {
                    return Err(ValidationError::MissingLlmField {
                        index,
                        name: agent.name.clone(),
                        field: "model",
                    });
                }

                if !(0.0..=MAX_LLM_TEMPERATURE).contains(&llm.temperature) {
                    return Err(ValidationError::TemperatureOutOfRange {
                        index,
                        name: agent.name.clone(),
                        value: llm.temperature,
                    });
                }
            }
        }
        AgentKind::ConnectorCall => {
            let Some(connector) = &agent.connector else {
                return Err(ValidationError::MissingConnector {
                    index,
                    name: agent.name.clone(),
                });
            };

            if connector.name.is_empty() {
                return Err(ValidationError::MissingConnectorField {
                    index,
                    name: agent.name.clone(),
                    field: "name",
                });
            }

            if connector.operation.is_empty() {
                return Err(ValidationError::MissingConnectorField {
                    index,
                    name: agent.name.clone(),
                    field: "operation",
                });
            }
        }
    }

    Ok(())
}

fn validate_rule(
    rule: &RoutingRule,
    index: usize,
    agents: &HashSet<&str>,
) -> Result<(), ValidationError> {
    if rule.pattern.is_empty() {
        return Err(ValidationError::MissingPattern { index });
    }

    validate_pattern(&rule.pattern, index)?;

    if rule.agent.is_empty() {
        return Err(ValidationError::MissingRuleAgent { index });
    }

    if !agents.contains(rule.agent.as_str()) {
        return Err(ValidationError::UnknownRuleAgent {
            index,
            agent: rule.agent.clone(),
        });
    }

    Ok(())
}

fn validate_pattern(pattern: &str, index: usize) -> Result<(), ValidationError> {
    if nested_quantifier_re().is_match(pattern) {
        return Err(ValidationError::DangerousPattern { index });
    }

    if let Err(err) = Regex::new(pattern) {
        return Err(ValidationError::InvalidPattern {
            index,
            source: Box::new(err),
        });
    }

    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(ValidationError::PatternTooLong {
            index,
            len: pattern.len(),
            max: MAX_PATTERN_LENGTH,
        });
    }

    Ok(())
}

/// Whether a string is a valid config identifier: lowercase alphanumeric
/// with hyphens and underscores, not starting with either.
pub fn is_valid_identifier(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    s.chars().enumerate().all(|(i, c)| match c {
        'a'..='z' | '0'..='9' => true,
        '-' | '_' => i > 0,
        _ => false,
    })
}
