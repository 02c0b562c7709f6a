//! The HTTP surface: GraphQL at `/query` and the playground at `/`.

use std::net::SocketAddr;

use anyhow::Context as _;
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::{Request, Response};
use axum::extract::Extension;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::graphql::MovieSchema;

pub const QUERY_PATH: &str = "/query";

pub fn router(schema: MovieSchema) -> Router {
    Router::new()
        .route("/", get(playground))
        .route(QUERY_PATH, post(query))
        .layer(Extension(schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn query(Extension(schema): Extension<MovieSchema>, Json(request): Json<Request>) -> Json<Response> {
    Json(schema.execute(request).await)
}

async fn playground() -> Html<String> {
    Html(playground_source(GraphQLPlaygroundConfig::new(QUERY_PATH)))
}

/// Serves until Ctrl-C.
pub async fn serve(schema: MovieSchema, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("connect to http://localhost:{}/ for GraphQL playground", port);

    axum::Server::bind(&addr)
        .serve(router(schema).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
