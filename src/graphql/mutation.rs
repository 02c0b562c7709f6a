use std::sync::Arc;

use async_graphql::{Context, Error, Object, Result};

use crate::db::Database;
use crate::models::movie::{IdScheme, Movie, NewMovie};
use crate::util::Clock;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Adds a movie, assigning its id and release date
    pub async fn create_movie(&self, ctx: &Context<'_>, input: NewMovie) -> Result<Movie> {
        let db: &Database = ctx.data_unchecked();
        let id_scheme: &IdScheme = ctx.data_unchecked();
        let clock: &Arc<dyn Clock> = ctx.data_unchecked();

        Movie::create(input, db, *id_scheme, clock.now())
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "failed to create movie");
                Error::new(err.to_string())
            })
    }
}
