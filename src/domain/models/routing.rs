//! Compiled routing rules and priority ordering.
//!
//! Routing patterns are compiled exactly once, when a config enters the
//! registry. The match path only ever runs precompiled regexes over a
//! lowercased task description.

use regex::Regex;

use crate::domain::errors::ValidationError;
use crate::domain::models::agent_config::{AgentConfigFile, AgentDef, RoutingRule};

/// A routing rule compiled for matching, tagged with its owning domain.
#[derive(Debug, Clone)]
pub struct CompiledRoutingRule {
    /// The rule as declared in its config.
    pub rule: RoutingRule,
    /// Precompiled pattern.
    pub regex: Regex,
    /// Domain the rule belongs to.
    pub domain: String,
}

impl CompiledRoutingRule {
    /// Whether this rule matches an already-lowercased task description.
    pub fn matches(&self, task: &str) -> bool {
        self.regex.is_match(task)
    }

    /// The rule's target agent qualified with its domain, `domain/agent`.
    pub fn qualified_agent(&self) -> String {
        format!("{}/{}", self.domain, self.rule.agent)
    }
}

/// Outcome of routing a task: the selected agent and its owning domain.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The agent selected to handle the task.
    pub agent: AgentDef,
    /// Domain that owns the matching rule.
    pub domain: String,
}

/// Compile a config's routing rules, sorted by priority descending.
///
/// Declaration order is preserved among rules of equal priority.
pub fn compile_rules(
    config: &AgentConfigFile,
) -> Result<Vec<CompiledRoutingRule>, ValidationError> {
    let mut rules = Vec::with_capacity(config.spec.routing.len());

    for (index, rule) in config.spec.routing.iter().enumerate() {
        let regex = Regex::new(&rule.pattern).map_err(|err| ValidationError::InvalidPattern {
            index,
            source: Box::new(err),
        })?;

        rules.push(CompiledRoutingRule {
            rule: rule.clone(),
            regex,
            domain: config.metadata.domain.clone(),
        });
    }

    sort_by_priority(&mut rules);
    Ok(rules)
}

/// Stable priority-descending sort; equal priorities keep their order.
pub fn sort_by_priority(rules: &mut [CompiledRoutingRule]) {
    rules.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
}
