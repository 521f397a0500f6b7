//! Read-only client for the session backend.
//!
//! The backend is a Supabase project; rows are fetched through its PostgREST
//! interface at `{url}/rest/v1/{table}`.

mod query;

pub use query::{Order, TableQuery};

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::config::BackendConfig;
use crate::types::SessionId;

/// Media type asking PostgREST for a single JSON object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Error types for backend operations.
#[derive(Debug, Clone)]
pub enum BackendError {
    /// The backend URL or key was not configured at start-up.
    NotConfigured,
    /// The request could not be sent or the connection failed.
    Request(String),
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body was not the JSON we expected.
    Decode(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotConfigured => write!(f, "backend client not initialized"),
            BackendError::Request(msg) => write!(f, "Backend request failed: {}", msg),
            BackendError::Status { status, body } => {
                write!(f, "Backend returned HTTP {}: {}", status, body)
            }
            BackendError::Decode(msg) => write!(f, "Failed to decode backend response: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Client for the session backend tables (`sessions`, `identities`, `events`).
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    rest_base: Url,
}

impl BackendClient {
    /// Build a client from resolved configuration.
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.key)?;
        api_key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.key))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        // `Url::join` replaces the last path segment unless the base ends in '/'.
        let mut base = config.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rest_base = base.join("rest/v1/")?;

        tracing::info!("Session backend client configured for {}", config.url);
        Ok(Self { http, rest_base })
    }

    /// Recent sessions, newest first.
    pub async fn list_sessions(&self, limit: u32) -> Result<Vec<Value>, BackendError> {
        let query = TableQuery::new("sessions")
            .order("created_at", Order::Desc)
            .limit(limit);
        self.fetch_rows(&query).await
    }

    /// A single session by primary key.
    pub async fn get_session(&self, session_id: &SessionId) -> Result<Value, BackendError> {
        let query = TableQuery::new("sessions").eq("id", session_id.as_str());
        self.fetch_single(&query).await
    }

    /// Known identities, in backend order.
    pub async fn list_identities(&self, limit: u32) -> Result<Vec<Value>, BackendError> {
        let query = TableQuery::new("identities").limit(limit);
        self.fetch_rows(&query).await
    }

    /// Events for one session, oldest first.
    pub async fn get_events(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<Value>, BackendError> {
        let query = TableQuery::new("events")
            .eq("session_id", session_id.as_str())
            .order("created_at", Order::Asc)
            .limit(limit);
        self.fetch_rows(&query).await
    }

    async fn fetch_rows(&self, query: &TableQuery) -> Result<Vec<Value>, BackendError> {
        let body = self.fetch(query, None).await?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(BackendError::Decode(format!(
                "expected a JSON array from `{}`, got {}",
                query.table(),
                type_name(&other)
            ))),
        }
    }

    async fn fetch_single(&self, query: &TableQuery) -> Result<Value, BackendError> {
        self.fetch(query, Some(SINGLE_OBJECT)).await
    }

    async fn fetch(&self, query: &TableQuery, accept: Option<&str>) -> Result<Value, BackendError> {
        let url = query.to_url(&self.rest_base)?;
        tracing::debug!(table = %query.table(), %url, "Querying session backend");

        let mut request = self.http.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                table = %query.table(),
                status = status.as_u16(),
                "Backend query failed"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> BackendClient {
        let config = BackendConfig::new(&server.uri(), "test-key").unwrap();
        BackendClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_list_sessions_query_and_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/sessions"))
            .and(query_param("select", "*"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "10"))
            .and(header("apikey", "test-key"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "s2", "created_at": "2025-01-02T00:00:00Z"},
                {"id": "s1", "created_at": "2025-01-01T00:00:00Z"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let rows = client.list_sessions(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "s2");
    }

    #[tokio::test]
    async fn test_get_session_requests_single_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/sessions"))
            .and(query_param("id", "eq.s1"))
            .and(header("accept", SINGLE_OBJECT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let row = client.get_session(&SessionId::new("s1")).await.unwrap();
        assert_eq!(row, json!({"id": "s1"}));
    }

    #[tokio::test]
    async fn test_get_events_filters_and_orders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/events"))
            .and(query_param("session_id", "eq.s1"))
            .and(query_param("order", "created_at.asc"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let rows = client.get_events(&SessionId::new("s1"), 50).await.unwrap();
        assert_eq!(rows, vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn test_list_identities_has_no_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/identities"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let rows = client.list_identities(5).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/sessions"))
            .respond_with(
                ResponseTemplate::new(406)
                    .set_body_string("JSON object requested, multiple (or no) rows returned"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_session(&SessionId::new("missing")).await.unwrap_err();
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 406);
                assert!(body.contains("no) rows"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rows_must_be_an_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/identities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.list_identities(10).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/proxy/rest/v1/identities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let config = BackendConfig::new(&format!("{}/proxy", server.uri()), "k").unwrap();
        let client = BackendClient::new(&config).unwrap();
        client.list_identities(1).await.unwrap();
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            BackendError::NotConfigured.to_string(),
            "backend client not initialized"
        );
        let err = BackendError::Status {
            status: 401,
            body: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned HTTP 401: nope");
    }
}
