//! # Movie API
//!
//! Serves the movie catalogue over GraphQL.

use anyhow::{Context, Result};

use movie_api::config::{load_dotenv, Config};
use movie_api::graphql::build_schema;
use movie_api::telemetry::init_tracing;
use movie_api::util::SystemClock;
use movie_api::{db, server};

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` may carry RUST_LOG, so it goes in before the subscriber.
    let dotenv = load_dotenv();
    init_tracing()?;
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!("no .env file loaded: {}", err),
    }

    let config = Config::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "loaded configuration");

    // There is nothing useful to serve without the store, so don't start.
    let database = db::connect(&config.store, config.keyspace.clone())
        .await
        .context("database is unreachable")?;

    let schema = build_schema(database, config.id_scheme, SystemClock);
    server::serve(schema, config.port).await
}
