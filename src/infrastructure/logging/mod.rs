//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON log formatting
//! - Optional daily-rotated file output
//! - Environment variable filter overrides

pub mod logger;

pub use logger::Logger;
