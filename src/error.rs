//! Error handling for the API.
//!
//! Store failures are kept structured up to the resolver boundary, where
//! they are turned into GraphQL field errors. When adding a variant, prefer
//! a specific one over stuffing the detail into `Status` or `Rejected`.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// A single error entry as reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

impl fmt::Display for StoreMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.msg)
    }
}

/// Everything that can go wrong while talking to a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered, but with a non-success status.
    ///
    /// The display form is the store's raw error list, which is what gets
    /// handed back to GraphQL callers on a failed write.
    #[error("{}", render_messages(.0))]
    Rejected(Vec<StoreMessage>),
    /// A document with this key already exists in the keyspace.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    /// The HTTP request to the store did not complete.
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The store replied with an unexpected HTTP status.
    #[error("store replied with status {0}: {1}")]
    Status(u16, String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed store payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

fn render_messages(messages: &[StoreMessage]) -> String {
    if messages.is_empty() {
        return "store reported failure without details".to_owned();
    }

    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A problem with the process configuration, found at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
