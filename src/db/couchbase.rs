//! Couchbase over its query service REST API.
//!
//! Every operation is a N1QL statement POSTed as JSON to
//! `/query/service`, with positional `args` for values.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::CouchbaseConfig;
use crate::db::{Keyspace, Row, Select, Store};
use crate::error::{StoreError, StoreMessage, StoreResult};

const PLAIN_PORT: u16 = 8093;
const TLS_PORT: u16 = 18093;
const SUCCESS_STATUS: &str = "success";

pub struct CouchbaseStore {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    results: Vec<Row>,
    #[serde(default)]
    errors: Vec<StoreMessage>,
}

impl CouchbaseStore {
    pub fn new(config: &CouchbaseConfig) -> StoreResult<Self> {
        if !config.tls {
            tracing::warn!(host = %config.host, "talking to couchbase over plaintext http");
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: query_service_url(&config.host, config.tls),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    async fn execute(&self, statement: &str, args: Vec<Value>) -> StoreResult<Vec<Row>> {
        tracing::debug!(statement, "running n1ql statement");

        let response = self
            .client
            .post(format!("{}/query/service", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({ "statement": statement, "args": args }))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        parse_response(status, &body)
    }
}

#[async_trait]
impl Store for CouchbaseStore {
    async fn ping(&self) -> StoreResult<()> {
        let response = self
            .client
            .get(format!("{}/admin/ping", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Status(status.as_u16(), body))
        }
    }

    async fn insert(&self, keyspace: &Keyspace, key: &str, document: Value) -> StoreResult<()> {
        self.execute(&insert_statement(keyspace), vec![json!(key), document])
            .await
            .map(|_| ())
    }

    async fn query(&self, select: &Select) -> StoreResult<Vec<Row>> {
        self.execute(&select_statement(select), Vec::new()).await
    }
}

/// Accepts `host`, `host:port`, or a full `http(s)://` URL.
fn query_service_url(host: &str, tls: bool) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        return host.to_owned();
    }

    let scheme = if tls { "https" } else { "http" };
    let has_port = host
        .rsplit_once(':')
        .map_or(false, |(_, port)| port.parse::<u16>().is_ok());

    if has_port {
        format!("{}://{}", scheme, host)
    } else {
        let port = if tls { TLS_PORT } else { PLAIN_PORT };
        format!("{}://{}:{}", scheme, host, port)
    }
}

fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn keyspace_path(keyspace: &Keyspace) -> String {
    [&keyspace.bucket, &keyspace.scope, &keyspace.collection]
        .iter()
        .map(|part| quote(part))
        .collect::<Vec<_>>()
        .join(".")
}

fn insert_statement(keyspace: &Keyspace) -> String {
    format!("INSERT INTO {} (KEY, VALUE) VALUES ($1, $2)", keyspace_path(keyspace))
}

fn select_statement(select: &Select) -> String {
    let fields = select
        .fields
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(", ");

    format!("SELECT {} FROM {}", fields, keyspace_path(&select.keyspace))
}

fn parse_response(status: u16, body: &[u8]) -> StoreResult<Vec<Row>> {
    let response: QueryResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(_) if !(200..300).contains(&status) => {
            return Err(StoreError::Status(
                status,
                String::from_utf8_lossy(body).into_owned(),
            ))
        }
        Err(err) => return Err(err.into()),
    };

    if response.status == SUCCESS_STATUS {
        Ok(response.results)
    } else {
        Err(StoreError::Rejected(response.errors))
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::http::StatusCode;
    use rstest::rstest;

    use super::*;
    use crate::tests::mock::{mock_keyspace, MockQueryService};

    const ADMIN_SECRET_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

    fn store_at(addr: SocketAddr) -> CouchbaseStore {
        CouchbaseStore::new(&CouchbaseConfig {
            host: addr.to_string(),
            username: "admin".to_owned(),
            password: "secret".to_owned(),
            tls: false,
            connect_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn insert_posts_statement_and_args_with_basic_auth() {
        let (addr, service) = MockQueryService::start(StatusCode::OK).await;
        let document = json!({ "id": "id_1", "title": "Up" });

        store_at(addr)
            .insert(&mock_keyspace(), "id_1", document.clone())
            .await
            .unwrap();

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_deref(), Some(ADMIN_SECRET_AUTH));
        assert_eq!(
            requests[0].body,
            json!({
                "statement": "INSERT INTO `bagnbrand`.`graphql`.`movie` (KEY, VALUE) VALUES ($1, $2)",
                "args": ["id_1", document],
            })
        );
    }

    #[tokio::test]
    async fn second_insert_of_a_key_is_rejected() {
        let (addr, _service) = MockQueryService::start(StatusCode::OK).await;
        let store = store_at(addr);

        store
            .insert(&mock_keyspace(), "id_1", json!({ "id": "id_1" }))
            .await
            .unwrap();
        let second = store
            .insert(&mock_keyspace(), "id_1", json!({ "id": "id_1", "title": "Other" }))
            .await;

        match second {
            Err(StoreError::Rejected(errors)) => {
                assert_eq!(errors[0].code, 12009);
                assert_eq!(errors[0].msg, "Duplicate Key: id_1");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn query_posts_the_projection_and_returns_results() {
        let (addr, service) = MockQueryService::start(StatusCode::OK).await;
        let store = store_at(addr);
        store
            .insert(&mock_keyspace(), "id_1", json!({ "id": "id_1", "title": "Up" }))
            .await
            .unwrap();

        let rows = store
            .query(&Select::fields(["id", "title"], &mock_keyspace()))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Up");

        let requests = service.requests();
        assert_eq!(requests[1].authorization.as_deref(), Some(ADMIN_SECRET_AUTH));
        assert_eq!(
            requests[1].body,
            json!({
                "statement": "SELECT `id`, `title` FROM `bagnbrand`.`graphql`.`movie`",
                "args": [],
            })
        );
    }

    #[tokio::test]
    async fn ping_succeeds_on_ok() {
        let (addr, _service) = MockQueryService::start(StatusCode::OK).await;
        store_at(addr).ping().await.unwrap();
    }

    #[tokio::test]
    async fn ping_reports_unhealthy_status() {
        let (addr, _service) = MockQueryService::start(StatusCode::SERVICE_UNAVAILABLE).await;

        match store_at(addr).ping().await {
            Err(StoreError::Status(503, body)) => assert_eq!(body, "query service warming up"),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[rstest]
    #[case("db.local", false, "http://db.local:8093")]
    #[case("db.local", true, "https://db.local:18093")]
    #[case("db.local:9000", false, "http://db.local:9000")]
    #[case("https://query.example.com/", false, "https://query.example.com")]
    fn builds_query_service_url(#[case] host: &str, #[case] tls: bool, #[case] expected: &str) {
        assert_eq!(query_service_url(host, tls), expected);
    }

    #[test]
    fn statements_quote_every_identifier() {
        let keyspace = Keyspace::new("bagnbrand", "graphql", "movie");
        let select = Select::fields(["id", "title", "url", "releaseDate"], &keyspace);

        assert_eq!(
            insert_statement(&keyspace),
            "INSERT INTO `bagnbrand`.`graphql`.`movie` (KEY, VALUE) VALUES ($1, $2)"
        );
        assert_eq!(
            select_statement(&select),
            "SELECT `id`, `title`, `url`, `releaseDate` FROM `bagnbrand`.`graphql`.`movie`"
        );
    }

    #[test]
    fn backticks_in_names_are_escaped() {
        assert_eq!(quote("we`ird"), "`we``ird`");
    }

    #[test]
    fn successful_response_yields_rows() {
        let body = br#"{
            "requestID": "abc",
            "results": [{ "id": "id_1", "title": "Up" }],
            "status": "success",
            "metrics": { "resultCount": 1 }
        }"#;

        let rows = parse_response(200, body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Up");
    }

    #[test]
    fn failed_response_carries_store_errors() {
        let body = br#"{
            "status": "errors",
            "errors": [{ "code": 12009, "msg": "Duplicate Key: id_1" }]
        }"#;

        match parse_response(200, body) {
            Err(StoreError::Rejected(errors)) => {
                assert_eq!(errors[0].code, 12009);
                assert_eq!(errors[0].msg, "Duplicate Key: id_1");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn non_json_error_keeps_http_status() {
        match parse_response(401, b"Unauthorized") {
            Err(StoreError::Status(401, body)) => assert_eq!(body, "Unauthorized"),
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
