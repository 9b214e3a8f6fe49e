//! ThreatFox ETL - scheduled feed ingestion job

use anyhow::Result;
use clap::Parser;
use threatfox_common::logging::{init_logging, LogConfig, LogLevel};
use threatfox_common::EtlError;
use threatfox_etl::config::{EnvSource, EtlConfig, FEED_URL_ENV, STORE_URI_ENV};
use threatfox_etl::{Pipeline, PipelineError, RunOutcome};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "threatfox-etl")]
#[command(author, version, about = "Load the ThreatFox JSON feed into MongoDB")]
struct Cli {
    /// Feed URL
    #[arg(long, env = FEED_URL_ENV)]
    url: Option<String>,

    /// MongoDB connection string
    #[arg(long, env = STORE_URI_ENV)]
    mongo_uri: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Exit with a non-zero status when the run fails
    #[arg(long)]
    strict: bool,
}

impl Cli {
    /// Apply command-line values on top of the loaded configuration
    fn apply(&self, config: &mut EtlConfig) {
        if let Some(url) = self.url.as_ref().filter(|u| !u.trim().is_empty()) {
            config.feed.url = Some(url.clone());
        }
        if let Some(uri) = self.mongo_uri.as_ref().filter(|u| !u.trim().is_empty()) {
            config.store.uri = Some(uri.clone());
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Read `.env` before any settings so logging sees it too
    let env = EnvSource::load();

    let (log_config, rejected) = match LogConfig::from_lookup(|key| env.get(key)) {
        Ok(config) => (config, None),
        Err(err) => (LogConfig::default(), Some(err)),
    };
    let log_config = if cli.verbose {
        LogConfig {
            level: LogLevel::Debug,
            ..log_config
        }
    } else {
        log_config
    };

    let guard = init_logging(&log_config)?;

    if let Some(err) = rejected {
        warn!("{:#}; using default logging settings", err);
    }

    info!("Starting ThreatFox ETL");

    let outcome = match EtlConfig::from_source(&env) {
        Ok(mut config) => {
            cli.apply(&mut config);
            Pipeline::new(config).run().await
        },
        Err(err) => {
            let err = PipelineError::from(EtlError::from(err));
            error!("ETL process failed: {}", err);
            RunOutcome::Failed(err)
        },
    };

    // Flush file logs before a possible early exit
    drop(guard);

    if cli.strict && !outcome.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
