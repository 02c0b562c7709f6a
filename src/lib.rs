//! A GraphQL API over a document store for a small movie catalogue.

pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod models;
pub mod server;
pub mod telemetry;
pub mod util;
