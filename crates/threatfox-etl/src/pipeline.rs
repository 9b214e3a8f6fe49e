//! Extract → Transform → Load runner
//!
//! Stages run strictly one after another. [`Pipeline::execute`] returns the
//! first failure; [`Pipeline::run`] logs it and returns a [`RunOutcome`]
//! instead, which is what a scheduled invocation wants.

use std::time::{Duration, Instant};
use thiserror::Error;
use threatfox_common::{EtlError, Stage};
use tracing::{error, info, instrument};

use crate::config::EtlConfig;
use crate::document::Document;
use crate::extract::FeedClient;
use crate::load::{self, DocumentSink};
use crate::transform::transform;

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Documents produced by the transform stage
    pub documents: usize,
    /// Documents the store acknowledged
    pub inserted: usize,
    pub elapsed: Duration,
}

/// A failed run, tagged with the stage that failed
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: EtlError,
}

impl From<EtlError> for PipelineError {
    fn from(source: EtlError) -> Self {
        Self {
            stage: source.stage(),
            source,
        }
    }
}

/// Result of [`Pipeline::run`]; never propagated as an error
#[derive(Debug)]
pub enum RunOutcome {
    Succeeded(RunReport),
    Failed(PipelineError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Succeeded(report) => Some(report),
            RunOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            RunOutcome::Succeeded(_) => None,
            RunOutcome::Failed(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<RunReport, PipelineError> {
        match self {
            RunOutcome::Succeeded(report) => Ok(report),
            RunOutcome::Failed(err) => Err(err),
        }
    }
}

/// One configured ETL job
pub struct Pipeline {
    config: EtlConfig,
}

impl Pipeline {
    pub fn new(config: EtlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Run once against the configured MongoDB collection
    #[instrument(name = "etl_run", skip(self))]
    pub async fn execute(&self) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        self.config.validate().map_err(EtlError::from)?;

        let documents = self.extract_and_transform().await?;
        let count = documents.len();
        let inserted = load::load(&self.config.store, documents).await?;

        Ok(RunReport {
            documents: count,
            inserted,
            elapsed: started.elapsed(),
        })
    }

    /// Run once, loading into `sink` instead of the configured store
    #[instrument(name = "etl_run", skip(self, sink), fields(sink = %sink.target()))]
    pub async fn execute_with<S>(&self, sink: &S) -> Result<RunReport, PipelineError>
    where
        S: DocumentSink + ?Sized,
    {
        let started = Instant::now();
        self.config.feed.require_url().map_err(EtlError::from)?;

        let documents = self.extract_and_transform().await?;
        let count = documents.len();
        let inserted = load::load_into(sink, documents).await?;

        Ok(RunReport {
            documents: count,
            inserted,
            elapsed: started.elapsed(),
        })
    }

    /// Run once and log the result instead of returning an error
    pub async fn run(&self) -> RunOutcome {
        Self::finish(self.execute().await)
    }

    /// [`Pipeline::run`] with a caller-supplied sink
    pub async fn run_with<S>(&self, sink: &S) -> RunOutcome
    where
        S: DocumentSink + ?Sized,
    {
        Self::finish(self.execute_with(sink).await)
    }

    async fn extract_and_transform(&self) -> Result<Vec<Document>, EtlError> {
        let url = self.config.feed.require_url()?;
        let client = FeedClient::from_config(&self.config.feed)?;
        let raw = client.extract(url).await?;
        Ok(transform(raw)?)
    }

    fn finish(result: Result<RunReport, PipelineError>) -> RunOutcome {
        match result {
            Ok(report) => {
                info!(
                    documents = report.documents,
                    inserted = report.inserted,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "ETL process completed successfully"
                );
                RunOutcome::Succeeded(report)
            },
            Err(err) => {
                error!(stage = %err.stage, error = ?err.source, "ETL process failed: {}", err);
                RunOutcome::Failed(err)
            },
        }
    }
}
