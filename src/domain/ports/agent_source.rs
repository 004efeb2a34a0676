//! Database-backed agent configuration source port.

use async_trait::async_trait;

use crate::domain::errors::RegistryResult;
use crate::domain::models::AgentConfigFile;

/// Source of agent configurations held in an external store.
///
/// Implementations are tenant-scoped: every query carries an organization
/// id. Returned documents are only partially trusted: the registry
/// re-validates each one and skips invalid entries instead of failing the
/// whole load.
#[async_trait]
pub trait DatabaseAgentSource: Send + Sync {
    /// All active agent configurations for an organization.
    async fn list_active_agents(&self, org_id: &str) -> RegistryResult<Vec<AgentConfigFile>>;

    /// Look up one active configuration by its metadata name.
    async fn get_agent_by_name(
        &self,
        org_id: &str,
        name: &str,
    ) -> RegistryResult<Option<AgentConfigFile>>;
}
