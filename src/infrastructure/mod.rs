//! Infrastructure layer module
//!
//! Cross-cutting concerns that sit outside the domain:
//! - Configuration management (figment)
//! - Logging (tracing)
//! - Service setup and wiring

pub mod config;
pub mod logging;
pub mod setup;

pub use config::{Settings, SettingsError, SettingsLoader};
pub use logging::Logger;
