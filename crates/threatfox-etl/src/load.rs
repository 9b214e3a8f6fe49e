//! Document store loading
//!
//! Documents are written with a single ordered bulk insert. There is no
//! upsert or deduplication; running the job twice stores every record twice.

use async_trait::async_trait;
use mongodb::{
    bson::{self, Document as BsonDocument},
    Client, Collection,
};
use threatfox_common::{LoadError, Result};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::document::Document;

/// Destination for a batch of documents
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Human-readable destination, e.g. `etl_db.threatfox_recent`
    fn target(&self) -> String;

    /// Insert all documents in one operation, returning how many were stored
    async fn insert_many(&self, docs: Vec<Document>) -> std::result::Result<usize, LoadError>;
}

/// MongoDB collection sink
pub struct MongoSink {
    client: Client,
    collection: Collection<BsonDocument>,
    namespace: String,
}

impl MongoSink {
    /// Open a client for the configured database and collection
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let uri = config.require_uri()?;

        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| LoadError::Connect(e.to_string()))?;
        let collection = client
            .database(&config.database)
            .collection::<BsonDocument>(&config.collection);

        debug!(namespace = %config.namespace(), "Document store client ready");

        Ok(Self {
            client,
            collection,
            namespace: config.namespace(),
        })
    }

    /// Close the client and its connection pool
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[async_trait]
impl DocumentSink for MongoSink {
    fn target(&self) -> String {
        self.namespace.clone()
    }

    async fn insert_many(&self, docs: Vec<Document>) -> std::result::Result<usize, LoadError> {
        let batch = to_bson_batch(&docs)?;

        let result = self
            .collection
            .insert_many(batch)
            .await
            .map_err(|e| LoadError::Insert {
                target: self.namespace.clone(),
                message: e.to_string(),
            })?;

        Ok(result.inserted_ids.len())
    }
}

/// Convert documents to BSON, keeping their order
pub fn to_bson_batch(docs: &[Document]) -> std::result::Result<Vec<BsonDocument>, LoadError> {
    docs.iter()
        .enumerate()
        .map(|(index, doc)| {
            bson::to_document(doc).map_err(|e| LoadError::Encode {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Insert `docs` through `sink`
///
/// An empty batch is reported as zero without touching the sink.
pub async fn load_into<S>(sink: &S, docs: Vec<Document>) -> Result<usize>
where
    S: DocumentSink + ?Sized,
{
    if docs.is_empty() {
        warn!("No documents to insert");
        return Ok(0);
    }

    let expected = docs.len();
    let inserted = sink.insert_many(docs).await?;

    if inserted != expected {
        return Err(LoadError::Incomplete {
            target: sink.target(),
            expected,
            inserted,
        }
        .into());
    }

    info!("Inserted {} documents into {}", inserted, sink.target());
    Ok(inserted)
}

/// Insert `docs` into the configured MongoDB collection
///
/// The connection string is checked before anything else. Empty batches
/// never open a connection. The client is shut down whether or not the
/// insert succeeds.
pub async fn load(config: &StoreConfig, docs: Vec<Document>) -> Result<usize> {
    config.require_uri()?;

    if docs.is_empty() {
        warn!(namespace = %config.namespace(), "No documents to insert");
        return Ok(0);
    }

    let sink = MongoSink::connect(config).await?;
    let outcome = load_into(&sink, docs).await;
    sink.shutdown().await;
    outcome
}
