use async_graphql::{Context, Object, Result};

use crate::db::Database;
use crate::graphql::LIST_FAILURE_MESSAGE;
use crate::models::movie::Movie;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every movie in the catalogue, in no particular order
    pub async fn movies(&self, ctx: &Context<'_>) -> Result<Option<Vec<Movie>>> {
        let db: &Database = ctx.data_unchecked();

        match Movie::all(db).await {
            Ok(movies) => Ok(Some(movies)),
            Err(err) => {
                tracing::error!(error = %err, keyspace = %db.keyspace, "failed to list movies");
                Err(LIST_FAILURE_MESSAGE.into())
            }
        }
    }
}
