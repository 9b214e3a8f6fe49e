//! Feed to document transformation
//!
//! Flattens `{ id: [record, ...] }` into one [`Document`] per record, in feed
//! order. Each record has its keys sanitized and is stamped with the
//! identifier it was listed under and the time of the transform pass.
//! Identifiers whose value is not an array are skipped. A feed root or a
//! record that is not an object fails the whole pass.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use threatfox_common::TransformError;
use tracing::{debug, info};

use crate::document::{kind_of, Document, RawFeed, INGESTED_AT_FIELD, THREATFOX_ID_FIELD};
use crate::sanitize::sanitize_map;

/// Transform a feed, stamping documents with the current UTC time
pub fn transform(raw: RawFeed) -> Result<Vec<Document>, TransformError> {
    transform_at(raw, Utc::now())
}

/// Transform a feed, stamping documents with `now`
pub fn transform_at(raw: RawFeed, now: DateTime<Utc>) -> Result<Vec<Document>, TransformError> {
    info!("Transforming data");

    let feed = match raw.into_value() {
        Value::Object(map) => map,
        other => {
            return Err(TransformError::NotAMapping {
                found: kind_of(&other),
            })
        },
    };

    let ingested_at = format_timestamp(now);
    let mut docs = Vec::new();

    for (id, entry) in feed {
        let records = match entry {
            Value::Array(records) => records,
            other => {
                debug!(threatfox_id = %id, kind = kind_of(&other), "Skipping non-list entry");
                continue;
            },
        };

        for (index, record) in records.into_iter().enumerate() {
            let fields = match record {
                Value::Object(fields) => fields,
                other => {
                    return Err(TransformError::RecordNotAMapping {
                        id,
                        index,
                        found: kind_of(&other),
                    })
                },
            };

            let mut fields = sanitize_map(fields);
            fields.insert(THREATFOX_ID_FIELD.to_string(), Value::String(id.clone()));
            fields.insert(INGESTED_AT_FIELD.to_string(), Value::String(ingested_at.clone()));
            docs.push(Document::from_fields(fields));
        }
    }

    debug!(documents = docs.len(), "Transform finished");
    Ok(docs)
}

/// ISO-8601 with microseconds and an explicit `+00:00` offset
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}
