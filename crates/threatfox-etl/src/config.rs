//! Configuration management
//!
//! Settings are read once at startup (environment, optionally seeded from a
//! `.env` file, see [`EnvSource`]) into an [`EtlConfig`] that is passed by reference to every
//! stage. Required settings stay optional here and are checked with
//! [`EtlConfig::validate`] so that a missing value surfaces as a
//! [`ConfigError`] from the run rather than a panic at startup.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use threatfox_common::ConfigError;

// ============================================================================
// Environment Keys
// ============================================================================

pub const FEED_URL_ENV: &str = "THREATFOX_JSON_URL";
pub const FEED_TIMEOUT_ENV: &str = "THREATFOX_TIMEOUT_SECS";
pub const STORE_URI_ENV: &str = "MONGO_URI";
pub const STORE_DATABASE_ENV: &str = "MONGO_DB";
pub const STORE_COLLECTION_ENV: &str = "MONGO_COLLECTION";

// ============================================================================
// Defaults
// ============================================================================

/// Default timeout for the feed request in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_DATABASE: &str = "etl_db";

pub const DEFAULT_COLLECTION: &str = "threatfox_recent";

/// Process environment layered over the entries of a `.env` file
///
/// Both the logging and the job settings are read through one source, so a
/// key set only in `.env` is seen by both. Variables already present in the
/// process environment win over the file.
#[derive(Debug, Clone)]
pub struct EnvSource {
    file: HashMap<String, String>,
    process: bool,
}

impl EnvSource {
    /// Environment plus the `.env` file found from the working directory, if any
    pub fn load() -> Self {
        let file = dotenvy::dotenv_iter()
            .map(|entries| entries.filter_map(|entry| entry.ok()).collect())
            .unwrap_or_default();
        Self {
            file,
            process: true,
        }
    }

    /// Environment plus the `.env`-formatted file at `path`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path).map_err(|e| env_file_error(path, e))?;
        let file = entries
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|e| env_file_error(path, e))?;
        Ok(Self {
            file,
            process: true,
        })
    }

    /// Ignore the process environment and read only the file entries
    pub fn file_only(self) -> Self {
        Self {
            process: false,
            ..self
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.process
            .then(|| std::env::var(key).ok())
            .flatten()
            .or_else(|| self.file.get(key).cloned())
    }
}

fn env_file_error(path: &Path, err: dotenvy::Error) -> ConfigError {
    ConfigError::Invalid {
        key: "ENV_FILE",
        reason: format!("{}: {}", path.display(), err),
    }
}

/// Complete job configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    pub feed: FeedConfig,
    pub store: StoreConfig,
}

/// Where and how the feed is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: Option<String>,
    pub timeout: Duration,
}

/// Target document store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`
    pub uri: Option<String>,
    pub database: String,
    pub collection: String,
}

impl EtlConfig {
    /// Load configuration from the process environment and `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&EnvSource::load())
    }

    pub fn from_source(source: &EnvSource) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| source.get(key))
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match non_empty(FEED_TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        Ok(Self {
            feed: FeedConfig {
                url: non_empty(FEED_URL_ENV),
                timeout: Duration::from_secs(timeout_secs),
            },
            store: StoreConfig {
                uri: non_empty(STORE_URI_ENV),
                database: non_empty(STORE_DATABASE_ENV)
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                collection: non_empty(STORE_COLLECTION_ENV)
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            },
        })
    }

    /// Check that every required setting is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed.require_url()?;
        self.store.require_uri()?;
        Ok(())
    }
}

impl FeedConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Feed URL, or a configuration error when it is unset
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        require(self.url.as_deref(), FEED_URL_ENV)
    }
}

impl StoreConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// Connection string, or a configuration error when it is unset
    pub fn require_uri(&self) -> Result<&str, ConfigError> {
        require(self.uri.as_deref(), STORE_URI_ENV)
    }

    /// `database.collection`, as used in log lines
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                url: None,
                timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            },
            store: StoreConfig {
                uri: None,
                database: DEFAULT_DATABASE.to_string(),
                collection: DEFAULT_COLLECTION.to_string(),
            },
        }
    }
}

fn require<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { key }),
    }
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
        key: FEED_TIMEOUT_ENV,
        reason: format!("{e}"),
    })?;

    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: FEED_TIMEOUT_ENV,
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(secs)
}
