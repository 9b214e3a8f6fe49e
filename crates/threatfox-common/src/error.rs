//! Error types for the ThreatFox ETL job
//!
//! Every stage fails fast with its own error family. The runner is the only
//! place that inspects them, so each variant carries enough context (URL,
//! record position, target collection) to be useful in a single log line.

use thiserror::Error;

/// Result type alias for ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Extract,
    Transform,
    Load,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Config => write!(f, "config"),
            Stage::Extract => write!(f, "extract"),
            Stage::Transform => write!(f, "transform"),
            Stage::Load => write!(f, "load"),
        }
    }
}

/// Main error type for the ETL job
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

impl EtlError {
    /// Stage this error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            EtlError::Config(_) => Stage::Config,
            EtlError::Fetch(_) => Stage::Extract,
            EtlError::Transform(_) => Stage::Transform,
            EtlError::Load(_) => Stage::Load,
        }
    }
}

/// Missing or unusable setting
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not set")]
    Missing { key: &'static str },

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failure while retrieving the feed
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} is not valid JSON: {message}")]
    Decode { url: String, message: String },
}

/// Feed content does not have the expected shape
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    #[error("feed root must be a JSON object, found {found}")]
    NotAMapping { found: &'static str },

    #[error("record {index} under identifier {id} must be a JSON object, found {found}")]
    RecordNotAMapping {
        id: String,
        index: usize,
        found: &'static str,
    },
}

/// Failure while writing documents to the store
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to connect to document store: {0}")]
    Connect(String),

    #[error("document {index} cannot be encoded for storage: {message}")]
    Encode { index: usize, message: String },

    #[error("bulk insert into {target} failed: {message}")]
    Insert { target: String, message: String },

    #[error("bulk insert into {target} stored {inserted} of {expected} documents")]
    Incomplete {
        target: String,
        expected: usize,
        inserted: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_of_each_family() {
        let config: EtlError = ConfigError::Missing {
            key: "MONGO_URI",
        }
        .into();
        assert_eq!(config.stage(), Stage::Config);

        let fetch: EtlError = FetchError::Status {
            url: "http://feed".to_string(),
            status: 500,
        }
        .into();
        assert_eq!(fetch.stage(), Stage::Extract);

        let transform: EtlError = TransformError::NotAMapping { found: "array" }.into();
        assert_eq!(transform.stage(), Stage::Transform);

        let load: EtlError = LoadError::Connect("refused".to_string()).into();
        assert_eq!(load.stage(), Stage::Load);
    }

    #[test]
    fn test_messages_carry_context() {
        let err = EtlError::from(FetchError::Status {
            url: "http://feed/recent.json".to_string(),
            status: 503,
        });
        assert_eq!(err.to_string(), "Fetch error: http://feed/recent.json returned HTTP 503");

        let err = EtlError::from(ConfigError::Missing {
            key: "THREATFOX_JSON_URL",
        });
        assert_eq!(err.to_string(), "Configuration error: THREATFOX_JSON_URL is not set");
    }
}
