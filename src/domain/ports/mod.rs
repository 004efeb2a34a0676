//! Port trait definitions (hexagonal architecture).
//!
//! Adapters implement these contracts so the registry stays independent of
//! any concrete persistence layer.

pub mod agent_source;

pub use agent_source::DatabaseAgentSource;
