//! Document store access.
//!
//! Movies live as JSON documents in a keyspace (`bucket.scope.collection`).
//! Resolvers only ever see the [`Store`] trait; the concrete backend is
//! picked from configuration at startup.

use std::fmt;

use serde_json::{Map, Value};

pub mod connection;
pub mod couchbase;
pub mod memory;
pub mod postgres;

pub use self::connection::{connect, Database, Store};

/// One result row of a projection query, keyed by field name.
pub type Row = Map<String, Value>;

/// A fully qualified collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyspace {
    pub bucket: String,
    pub scope: String,
    pub collection: String,
}

impl Keyspace {
    pub fn new(
        bucket: impl Into<String>,
        scope: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            scope: scope.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.bucket, self.scope, self.collection)
    }
}

/// A projection over every document in a keyspace.
///
/// No filtering and no ordering; backends return rows in whatever order
/// they come.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub fields: Vec<String>,
    pub keyspace: Keyspace,
}

impl Select {
    pub fn fields<I, S>(fields: I, keyspace: &Keyspace) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            keyspace: keyspace.clone(),
        }
    }

    /// Keeps only the selected fields of a document, with `null` for any
    /// that are missing.
    pub fn project(&self, document: &Value) -> Row {
        self.fields
            .iter()
            .map(|field| {
                let value = document.get(field).cloned().unwrap_or(Value::Null);
                (field.clone(), value)
            })
            .collect()
    }
}
