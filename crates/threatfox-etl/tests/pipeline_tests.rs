//! End-to-end runs: mock feed, in-memory sink

use serde_json::json;
use threatfox_common::{ConfigError, EtlError, LoadError, Stage};
use threatfox_etl::config::{EtlConfig, FeedConfig, StoreConfig};
use threatfox_etl::sanitize::is_store_safe;
use threatfox_etl::{Pipeline, RunOutcome};
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

mod common;
use common::{FailingSink, RecordingSink};

async fn feed_server(status: u16, body: serde_json::Value) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&mock_server)
        .await;
    mock_server
}

fn pipeline_for(url: String) -> Pipeline {
    Pipeline::new(EtlConfig {
        feed: FeedConfig::new(url),
        // Never dialled: these tests load through an in-memory sink
        store: StoreConfig::new("mongodb://127.0.0.1:1"),
    })
}

#[tokio::test]
async fn test_run_loads_every_record() {
    let server = feed_server(200, common::sample_feed()).await;
    let sink = RecordingSink::default();

    let report = pipeline_for(server.uri()).execute_with(&sink).await.unwrap();

    assert_eq!(report.documents, 3);
    assert_eq!(report.inserted, 3);
    assert_eq!(sink.call_count(), 1);

    let batch = &sink.batches()[0];
    let ids: Vec<&str> = batch.iter().map(|d| d.threatfox_id().unwrap()).collect();
    assert_eq!(ids, vec!["1290413", "1290414", "1290414"]);

    let first = serde_json::to_value(&batch[0]).unwrap();
    assert!(is_store_safe(&first));
    assert_eq!(
        first["meta_source"],
        json!({"_ref": "abuse.ch", "reporter_handle": "abuse_ch"})
    );
    assert_eq!(first["tags"], json!(["c2", "CobaltStrike"]));
}

#[tokio::test]
async fn test_scenario_single_record() {
    let server = feed_server(200, json!({"123": [{"ioc": "1.2.3.4", "tags.x": "y"}]})).await;
    let sink = RecordingSink::default();

    let outcome = pipeline_for(server.uri()).run_with(&sink).await;
    assert!(outcome.is_success());

    let doc = &sink.batches()[0][0];
    assert_eq!(doc.get("ioc"), Some(&json!("1.2.3.4")));
    assert_eq!(doc.get("tags_x"), Some(&json!("y")));
    assert_eq!(doc.threatfox_id(), Some("123"));
    assert!(doc.ingested_at().is_some());
    assert_eq!(doc.len(), 4);
}

#[tokio::test]
async fn test_empty_feed_inserts_nothing() {
    let server = feed_server(200, json!({})).await;
    let sink = RecordingSink::default();

    let outcome = pipeline_for(server.uri()).run_with(&sink).await;

    let report = outcome.report().unwrap();
    assert_eq!(report.documents, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn test_http_500_is_logged_not_raised() {
    let server = feed_server(500, json!({"error": "upstream"})).await;
    let sink = RecordingSink::default();

    let outcome = pipeline_for(server.uri()).run_with(&sink).await;

    let err = outcome.error().unwrap();
    assert_eq!(err.stage, Stage::Extract);
    assert_eq!(sink.call_count(), 0);
    assert!(matches!(outcome, RunOutcome::Failed(_)));
}

#[tokio::test]
async fn test_malformed_feed_fails_transform_stage() {
    let server = feed_server(200, json!({"1": [{"ok": true}, 42]})).await;
    let sink = RecordingSink::default();

    let err = pipeline_for(server.uri())
        .execute_with(&sink)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Transform);
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn test_insert_failure_is_load_stage() {
    let server = feed_server(200, common::sample_feed()).await;

    let err = pipeline_for(server.uri())
        .execute_with(&FailingSink)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Load);
    assert!(matches!(err.source, EtlError::Load(LoadError::Insert { .. })));
}

#[tokio::test]
async fn test_unreachable_store_fails_load_stage() {
    let server = feed_server(200, common::sample_feed()).await;

    // TEST-NET address: server selection gives up after 100ms
    let pipeline = Pipeline::new(EtlConfig {
        feed: FeedConfig::new(server.uri()),
        store: StoreConfig::new("mongodb://203.0.113.1:1/?serverSelectionTimeoutMS=100"),
    });
    let outcome = pipeline.run().await;

    assert!(!outcome.is_success());
    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.stage, Stage::Load);
    assert!(matches!(err.source, EtlError::Load(LoadError::Insert { .. })));
}

#[tokio::test]
async fn test_missing_url_fails_before_any_request() {
    let pipeline = Pipeline::new(EtlConfig {
        store: StoreConfig::new("mongodb://127.0.0.1:1"),
        ..EtlConfig::default()
    });
    let outcome = pipeline.run().await;

    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.stage, Stage::Config);
    assert!(matches!(
        err.source,
        EtlError::Config(ConfigError::Missing {
            key: "THREATFOX_JSON_URL"
        })
    ));
}

#[tokio::test]
async fn test_missing_store_uri_fails_before_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::sample_feed()))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(EtlConfig {
        feed: FeedConfig::new(server.uri()),
        ..EtlConfig::default()
    });

    let err = pipeline.execute().await.unwrap_err();
    assert_eq!(err.stage, Stage::Config);
    assert!(matches!(
        err.source,
        EtlError::Config(ConfigError::Missing { key: "MONGO_URI" })
    ));
}
