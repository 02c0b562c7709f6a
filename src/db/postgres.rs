//! Documents kept as `jsonb` rows in a single Postgres table.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::{Keyspace, Row, Select, Store};
use crate::error::{StoreError, StoreResult};

const UNIQUE_VIOLATION: &str = "23505";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    keyspace TEXT NOT NULL,
    id TEXT NOT NULL,
    body JSONB NOT NULL,
    PRIMARY KEY (keyspace, id)
)";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, keyspace: &Keyspace, key: &str, document: Value) -> StoreResult<()> {
        let result = sqlx::query("INSERT INTO documents (keyspace, id, body) VALUES ($1, $2, $3)")
            .bind(keyspace.to_string())
            .bind(key)
            .bind(Json(document))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::DuplicateKey(key.to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn query(&self, select: &Select) -> StoreResult<Vec<Row>> {
        let statement = select_statement(select);
        tracing::debug!(%statement, "running projection");

        let mut query = sqlx::query_scalar::<_, Json<Row>>(&statement).bind(select.keyspace.to_string());
        for field in &select.fields {
            query = query.bind(field.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }
}

/// Field names are bound as parameters; `$1` is the keyspace.
fn select_statement(select: &Select) -> String {
    let pairs = (0..select.fields.len())
        .map(|index| {
            let param = index + 2;
            format!("${}::text, body -> ${}::text", param, param)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT jsonb_build_object({}) FROM documents WHERE keyspace = $1",
        pairs
    )
}
