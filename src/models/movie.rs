use std::str::FromStr;

use async_graphql::{InputObject, SimpleObject, ID};
use serde_json::{json, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{Database, Row, Select};
use crate::error::StoreResult;
use crate::util::format_date;

/// The collection movies are stored in, under the configured bucket and scope.
pub const COLLECTION: &str = "movie";

const FIELDS: [&str; 4] = ["id", "title", "url", "releaseDate"];

/// A movie in the catalogue.
#[derive(SimpleObject, Clone, Debug, PartialEq, Eq)]
pub struct Movie {
    /// Assigned by the server when the movie is created
    pub id: ID,
    /// The title of the movie
    pub title: String,
    /// Where the movie can be found
    pub url: String,
    /// The date the movie was added, as `YYYY-MM-DD`
    pub release_date: String,
}

#[derive(InputObject, Clone, Debug)]
pub struct NewMovie {
    pub title: String,
    pub url: String,
}

/// How movie ids are minted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdScheme {
    /// `id_<unix seconds>`. Two movies created in the same second get the
    /// same id, and the second insert fails as a duplicate key.
    Timestamp,
    /// `id_<uuid v4>`.
    #[default]
    Uuid,
}

impl IdScheme {
    pub fn generate(self, now: OffsetDateTime) -> String {
        match self {
            IdScheme::Timestamp => format!("id_{}", now.unix_timestamp()),
            IdScheme::Uuid => format!("id_{}", Uuid::new_v4().to_simple()),
        }
    }
}

impl FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(IdScheme::Timestamp),
            "uuid" => Ok(IdScheme::Uuid),
            other => Err(format!("unknown id scheme {}, expected uuid or timestamp", other)),
        }
    }
}

impl Movie {
    /// Stores a new movie and hands back what was stored, without reading it back.
    pub async fn create(
        new_movie: NewMovie,
        db: &Database,
        scheme: IdScheme,
        now: OffsetDateTime,
    ) -> StoreResult<Self> {
        let movie = Movie {
            id: ID(scheme.generate(now)),
            title: new_movie.title,
            url: new_movie.url,
            release_date: format_date(now),
        };

        db.store()
            .insert(&db.keyspace, &movie.id, movie.to_document())
            .await?;

        Ok(movie)
    }

    pub async fn all(db: &Database) -> StoreResult<Vec<Self>> {
        let select = Select::fields(FIELDS, &db.keyspace);
        let rows = db.store().query(&select).await?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    fn to_document(&self) -> Value {
        json!({
            "id": self.id.as_str(),
            "title": self.title,
            "url": self.url,
            "releaseDate": self.release_date,
        })
    }

    /// Every field is taken as text, whatever type the store kept it as.
    fn from_row(row: &Row) -> Self {
        let field = |name: &str| stringify(row.get(name));

        Movie {
            id: ID(field("id")),
            title: field("title"),
            url: field("url"),
            release_date: field("releaseDate"),
        }
    }
}

fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
