use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::db::couchbase::CouchbaseStore;
use crate::db::memory::MemoryStore;
use crate::db::postgres::PostgresStore;
use crate::db::{Keyspace, Row, Select};
use crate::error::StoreResult;

/// The capabilities the resolvers need from a document store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Inserts `document` under `key`. Fails if the key is already taken.
    async fn insert(&self, keyspace: &Keyspace, key: &str, document: Value) -> StoreResult<()>;

    async fn query(&self, select: &Select) -> StoreResult<Vec<Row>>;
}

/// The process-wide store handle, shared by every request.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn Store>,
    pub keyspace: Keyspace,
}

impl Database {
    pub fn new(store: impl Store + 'static, keyspace: Keyspace) -> Self {
        Self {
            store: Arc::new(store),
            keyspace,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

/// Opens the configured store and pings it once.
///
/// There is no retry; callers decide what an unreachable store means.
pub async fn connect(config: &StoreConfig, keyspace: Keyspace) -> StoreResult<Database> {
    let database = match config {
        StoreConfig::Couchbase(couchbase) => {
            Database::new(CouchbaseStore::new(couchbase)?, keyspace)
        }
        StoreConfig::Postgres { url } => Database::new(PostgresStore::connect(url).await?, keyspace),
        StoreConfig::Memory => {
            tracing::warn!("using the in-memory store; documents are lost on exit");
            Database::new(MemoryStore::default(), keyspace)
        }
    };

    database.store().ping().await?;
    tracing::info!(keyspace = %database.keyspace, "connected to store");

    Ok(database)
}
