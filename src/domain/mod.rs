//! Domain layer for the switchboard registry.
//!
//! Pure business logic: configuration documents, validation rules, routing,
//! and the ports adapters must implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{RegistryError, RegistryResult, ValidationError};
