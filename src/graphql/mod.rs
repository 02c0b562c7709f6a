use std::sync::Arc;

use async_graphql::{EmptySubscription, Schema};

use crate::db::Database;
use crate::graphql::mutation::MutationRoot;
use crate::graphql::query::QueryRoot;
use crate::models::movie::IdScheme;
use crate::util::Clock;

pub mod mutation;
pub mod query;

/// What callers see when listing fails; the real cause is only logged.
pub const LIST_FAILURE_MESSAGE: &str = "something went wrong";

pub type MovieSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the schema with the store handle and id settings attached as data.
pub fn build_schema(db: Database, id_scheme: IdScheme, clock: impl Clock + 'static) -> MovieSchema {
    let clock: Arc<dyn Clock> = Arc::new(clock);

    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .data(id_scheme)
        .data(clock)
        .finish()
}
