//! ThreatFox ETL Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Fetches the ThreatFox JSON export, turns every listed record into a
//! MongoDB-safe document and bulk-inserts the batch.
//!
//! # Stages
//!
//! - **Extract** ([`extract`]): one HTTP GET with a timeout and status check
//! - **Transform** ([`transform`]): key sanitization, flattening, stamping
//! - **Load** ([`load`]): a single bulk insert into the configured collection
//!
//! # Example
//!
//! ```no_run
//! use threatfox_etl::{config::EtlConfig, pipeline::Pipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EtlConfig::from_env()?;
//!     let outcome = Pipeline::new(config).run().await;
//!     if let Some(report) = outcome.report() {
//!         tracing::info!(inserted = report.inserted, "done");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod document;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod sanitize;
pub mod transform;

pub use document::{Document, RawFeed};
pub use pipeline::{Pipeline, PipelineError, RunOutcome, RunReport};
