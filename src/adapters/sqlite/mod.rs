//! SQLite adapters for the agent configuration registry.

pub mod agent_source;
pub mod connection;

pub use agent_source::SqliteAgentSource;
pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError};
