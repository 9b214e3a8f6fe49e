//! Shared helpers for threatfox-etl integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;
use threatfox_common::LoadError;
use threatfox_etl::Document;

/// Sink that keeps every batch it receives
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<Document>>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<Vec<Document>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl threatfox_etl::load::DocumentSink for RecordingSink {
    fn target(&self) -> String {
        "etl_db.threatfox_recent".to_string()
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<usize, LoadError> {
        let count = docs.len();
        self.batches.lock().unwrap().push(docs);
        Ok(count)
    }
}

/// Sink whose bulk insert always fails
pub struct FailingSink;

#[async_trait]
impl threatfox_etl::load::DocumentSink for FailingSink {
    fn target(&self) -> String {
        "etl_db.threatfox_recent".to_string()
    }

    async fn insert_many(&self, _docs: Vec<Document>) -> Result<usize, LoadError> {
        Err(LoadError::Insert {
            target: self.target(),
            message: "E11000 duplicate key error".to_string(),
        })
    }
}

/// Trimmed-down ThreatFox "recent" export
pub fn sample_feed() -> Value {
    json!({
        "1290413": [{
            "ioc_value": "194.26.29.110:443",
            "ioc_type": "ip:port",
            "threat_type": "botnet_cc",
            "malware": "win.cobalt_strike",
            "malware_printable": "Cobalt Strike",
            "confidence_level": 100,
            "tags": ["c2", "CobaltStrike"],
            "meta.source": {"$ref": "abuse.ch", "reporter.handle": "abuse_ch"}
        }],
        "1290414": [
            {"ioc_value": "bad.example.com", "ioc_type": "domain", "tags": null},
            {"ioc_value": "http://bad.example.com/a.exe", "ioc_type": "url", "tags": ["exe"]}
        ]
    })
}
