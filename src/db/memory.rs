use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::db::{Keyspace, Row, Select, Store};
use crate::error::{StoreError, StoreResult};

/// Documents held in process memory, grouped by keyspace.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Keyspace, HashMap<String, Value>>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert(&self, keyspace: &Keyspace, key: &str, document: Value) -> StoreResult<()> {
        let mut documents = self.documents.write().unwrap_or_else(|err| err.into_inner());
        let collection = documents.entry(keyspace.clone()).or_default();
        if collection.contains_key(key) {
            return Err(StoreError::DuplicateKey(key.to_owned()));
        }

        collection.insert(key.to_owned(), document);
        Ok(())
    }

    async fn query(&self, select: &Select) -> StoreResult<Vec<Row>> {
        let documents = self.documents.read().unwrap_or_else(|err| err.into_inner());

        Ok(documents
            .get(&select.keyspace)
            .map(|collection| collection.values().map(|doc| select.project(doc)).collect())
            .unwrap_or_default())
    }
}
