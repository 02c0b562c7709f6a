//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::db::Keyspace;
use crate::error::ConfigError;
use crate::models::movie::IdScheme;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BUCKET: &str = "bagnbrand";
pub const DEFAULT_SCOPE: &str = "graphql";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub store: StoreConfig,
    pub keyspace: Keyspace,
    pub id_scheme: IdScheme,
}

/// Which backend holds the movie documents, and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Couchbase(CouchbaseConfig),
    Postgres { url: String },
    Memory,
}

#[derive(Clone, PartialEq, Eq)]
pub struct CouchbaseConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Plaintext is opt-in; the query service is reached over https unless
    /// `DBTLS=false`.
    pub tls: bool,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for CouchbaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouchbaseConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tls", &self.tls)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Copies `.env` (if there is one) into the process environment.
///
/// Runs before logging is set up, so it reports what happened instead of
/// logging it.
pub fn load_dotenv() -> Result<PathBuf, dotenv::Error> {
    dotenv::dotenv()
}

impl Config {
    /// Reads the process environment; see [`load_dotenv`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| var(name).filter(|value| !value.is_empty());

        let port = match lookup("PORT") {
            Some(port) => port.parse().map_err(|err| ConfigError::Invalid {
                var: "PORT",
                value: port.clone(),
                reason: format!("{}", err),
            })?,
            None => DEFAULT_PORT,
        };

        let store = match lookup("STORE").as_deref() {
            None | Some("couchbase") => StoreConfig::Couchbase(CouchbaseConfig {
                host: lookup("HOST").ok_or(ConfigError::Missing("HOST"))?,
                username: lookup("DBUSER").ok_or(ConfigError::Missing("DBUSER"))?,
                password: lookup("DBPASS").ok_or(ConfigError::Missing("DBPASS"))?,
                tls: parse_bool("DBTLS", lookup("DBTLS"), true)?,
                connect_timeout: Duration::from_secs(parse_secs(
                    "DB_CONNECT_TIMEOUT_SECS",
                    lookup("DB_CONNECT_TIMEOUT_SECS"),
                )?),
            }),
            Some("postgres") => StoreConfig::Postgres {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some("memory") => StoreConfig::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "STORE",
                    value: other.to_owned(),
                    reason: "expected one of couchbase, postgres, memory".to_owned(),
                })
            }
        };

        let keyspace = Keyspace::new(
            lookup("BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_owned()),
            lookup("SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_owned()),
            crate::models::movie::COLLECTION,
        );

        let id_scheme = match lookup("ID_SCHEME") {
            Some(scheme) => scheme.parse().map_err(|reason| ConfigError::Invalid {
                var: "ID_SCHEME",
                value: scheme.clone(),
                reason,
            })?,
            None => IdScheme::default(),
        };

        Ok(Config {
            port,
            store,
            keyspace,
            id_scheme,
        })
    }
}

fn parse_bool(var: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected true or false".to_owned(),
        }),
    }
}

fn parse_secs(var: &'static str, value: Option<String>) -> Result<u64, ConfigError> {
    match value {
        None => Ok(DEFAULT_CONNECT_TIMEOUT_SECS),
        Some(value) => value.parse().map_err(|err| ConfigError::Invalid {
            var,
            value: value.clone(),
            reason: format!("{}", err),
        }),
    }
}
