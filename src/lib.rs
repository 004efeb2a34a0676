//! Switchboard - Agent Configuration Registry
//!
//! Switchboard is the control plane of an AI-request orchestration service:
//! it loads declarative agent configurations, indexes them by domain, and
//! routes incoming tasks to agents through priority-ranked pattern rules.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Configuration schema, validation, and routing models
//! - **Service Layer** (`services`): The registry and its load/route operations
//! - **Adapters** (`adapters`): SQLite-backed configuration source
//! - **Infrastructure Layer** (`infrastructure`): Settings, logging, and wiring
//!
//! # Example
//!
//! ```ignore
//! use switchboard::services::AgentRegistry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = AgentRegistry::new();
//!     registry.load_from_directory("configs/agents").await?;
//!     let matched = registry.route_task("book a flight to Lisbon").await?;
//!     println!("routed to {}", matched.agent.name);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{RegistryError, RegistryResult, ValidationError};
pub use domain::models::{
    AgentConfigFile, AgentConfigSpec, AgentDef, AgentKind, AgentMetadata, DomainTemplate,
    ExecutionConfig, RouteMatch, RoutingRule, SynthesisConfig,
};
pub use domain::ports::DatabaseAgentSource;
pub use infrastructure::config::{Settings, SettingsError, SettingsLoader};
pub use services::{AgentRegistry, ConfigSource, HybridStats, RegistryMode, RegistryStats};
