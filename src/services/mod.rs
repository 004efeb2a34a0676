//! Service layer: the agent registry and its hybrid-mode extensions.

pub mod registry;

pub use registry::{
    AgentRegistry, ConfigSource, HybridStats, RegistryMode, RegistryStats, DEFAULT_DOMAIN,
};
