//! ThreatFox ETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the ThreatFox ETL workspace.
//!
//! - **Error Handling**: one error family per pipeline stage, wrapped by [`EtlError`]
//! - **Logging**: `tracing` subscriber configuration driven by the environment

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ConfigError, EtlError, FetchError, LoadError, Result, Stage, TransformError};
