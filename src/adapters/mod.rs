//! Adapters binding domain ports to external systems.

pub mod sqlite;

pub use sqlite::SqliteAgentSource;
