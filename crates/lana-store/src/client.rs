//! Shared REST client: connection settings, headers, filter builder, and
//! the request helpers every table module goes through.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

/// Errors surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Credential or header construction failure.
    #[error("store auth error: {0}")]
    Auth(String),

    /// The service rejected the request.
    #[error("store rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The body's `message` when present, else the raw body.
        message: String,
    },

    /// Transport-level failure.
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be parsed.
    #[error("unexpected store response: {0}")]
    UnexpectedResponse(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Connection settings for the hosted service.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Service base URL (no trailing slash).
    pub base_url: String,
    /// Anon/public API key, sent as `apikey` on every request.
    pub anon_key: String,
}

/// PostgREST filter and shaping parameters for one request.
///
/// Values are passed to reqwest's query serializer, which percent-encodes
/// them; the `op.value` filter syntax survives encoding.
#[derive(Clone, Debug, Default)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// `select=*` starting point.
    #[must_use]
    pub fn select_all() -> Self {
        Self {
            params: vec![("select".into(), "*".into())],
        }
    }

    /// `column=eq.value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params.push((column.into(), format!("eq.{}", value.to_string())));
        self
    }

    /// `column=neq.value`.
    #[must_use]
    pub fn neq(mut self, column: &str, value: impl ToString) -> Self {
        self.params.push((column.into(), format!("neq.{}", value.to_string())));
        self
    }

    /// `column=gte.value`.
    #[must_use]
    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.params.push((column.into(), format!("gte.{}", value.to_string())));
        self
    }

    /// `column=lte.value`.
    #[must_use]
    pub fn lte(mut self, column: &str, value: impl ToString) -> Self {
        self.params.push((column.into(), format!("lte.{}", value.to_string())));
        self
    }

    /// `column=is.null`.
    #[must_use]
    pub fn is_null(mut self, column: &str) -> Self {
        self.params.push((column.into(), "is.null".into()));
        self
    }

    /// `or=(cond,cond,...)` with raw PostgREST conditions.
    #[must_use]
    pub fn or(mut self, conditions: &str) -> Self {
        self.params.push(("or".into(), format!("({conditions})")));
        self
    }

    /// `order=column.asc|desc`.
    #[must_use]
    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let dir = if descending { "desc" } else { "asc" };
        self.params.push(("order".into(), format!("{column}.{dir}")));
        self
    }

    /// `limit=n`.
    #[must_use]
    pub fn limit(mut self, n: u32) -> Self {
        self.params.push(("limit".into(), n.to_string()));
        self
    }

    /// `on_conflict=columns` (write requests only).
    #[must_use]
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params.push(("on_conflict".into(), columns.into()));
        self
    }

    /// The accumulated parameter pairs.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Client for the hosted Postgres REST service. Cheap to clone; built once
/// at startup and shared.
#[derive(Clone, Debug)]
pub struct StoreClient {
    config: StoreConfig,
    client: reqwest::Client,
}

impl StoreClient {
    /// Client with a fresh HTTP connection pool.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Client reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(config: StoreConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url)
    }

    pub(crate) fn auth_url(&self) -> String {
        format!("{}/auth/v1/user", self.config.base_url)
    }

    pub(crate) fn storage_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{name}", self.config.base_url)
    }

    /// Public URL for an uploaded storage object.
    #[must_use]
    pub fn public_object_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{name}",
            self.config.base_url
        )
    }

    /// `apikey` + bearer headers. The bearer is the user's access token
    /// when present, else the anon key.
    pub(crate) fn headers(&self, access_token: Option<&str>) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let apikey = HeaderValue::from_str(&self.config.anon_key)
            .map_err(|e| StoreError::Auth(format!("invalid anon key: {e}")))?;
        let _ = headers.insert("apikey", apikey);
        let bearer = access_token.unwrap_or(&self.config.anon_key);
        let auth = HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|e| StoreError::Auth(format!("invalid access token: {e}")))?;
        let _ = headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    pub(crate) async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message: extract_message(&body, status.as_u16()),
        })
    }

    /// `GET /rest/v1/{table}` with filters, decoded as rows.
    #[instrument(skip_all, fields(table = table))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        let response = self
            .client
            .get(self.rest_url(table))
            .headers(self.headers(access_token)?)
            .query(query.params())
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::UnexpectedResponse(format!("decoding {table} rows: {e}")))
    }

    /// `POST /rest/v1/{table}` insert returning the created rows.
    #[instrument(skip_all, fields(table = table))]
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &B,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        self.write(table, rows, &Query::default(), "return=representation", access_token)
            .await
    }

    /// Insert with `on_conflict` + ignore-duplicates; only newly created
    /// rows come back.
    #[instrument(skip_all, fields(table = table, on_conflict = conflict_columns))]
    pub async fn insert_ignore_duplicates<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &B,
        conflict_columns: &str,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        self.write(
            table,
            rows,
            &Query::default().on_conflict(conflict_columns),
            "resolution=ignore-duplicates,return=representation",
            access_token,
        )
        .await
    }

    /// Upsert with `on_conflict` + merge-duplicates.
    #[instrument(skip_all, fields(table = table, on_conflict = conflict_columns))]
    pub async fn upsert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &B,
        conflict_columns: &str,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        self.write(
            table,
            rows,
            &Query::default().on_conflict(conflict_columns),
            "resolution=merge-duplicates,return=representation",
            access_token,
        )
        .await
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &B,
        query: &Query,
        prefer: &'static str,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        let response = self
            .client
            .post(self.rest_url(table))
            .headers(self.headers(access_token)?)
            .header("Prefer", prefer)
            .header(CONTENT_TYPE, "application/json")
            .query(query.params())
            .json(rows)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::UnexpectedResponse(format!("decoding {table} rows: {e}")))
    }

    /// `PATCH /rest/v1/{table}` on the filtered rows.
    #[instrument(skip_all, fields(table = table))]
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        query: &Query,
        patch: &B,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let response = self
            .client
            .patch(self.rest_url(table))
            .headers(self.headers(access_token)?)
            .header(CONTENT_TYPE, "application/json")
            .query(query.params())
            .json(patch)
            .send()
            .await?;
        let _ = Self::check(response).await?;
        Ok(())
    }

    /// `DELETE /rest/v1/{table}` on the filtered rows.
    #[instrument(skip_all, fields(table = table))]
    pub async fn delete(
        &self,
        table: &str,
        query: &Query,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let response = self
            .client
            .delete(self.rest_url(table))
            .headers(self.headers(access_token)?)
            .query(query.params())
            .send()
            .await?;
        let _ = Self::check(response).await?;
        Ok(())
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }
}

fn extract_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_owned();
        }
    }
    if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        body.trim().to_owned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StoreClient {
        StoreClient::new(StoreConfig {
            base_url: server.uri(),
            anon_key: "anon-key".into(),
        })
    }

    #[derive(Debug, serde::Deserialize)]
    struct Row {
        id: u32,
    }

    // ── Query builder ────────────────────────────────────────────────────

    #[test]
    fn query_builds_postgrest_filters() {
        let q = Query::select_all()
            .eq("usuario_id", "u1")
            .gte("fecha", "2025-01-01")
            .order("fecha", true)
            .limit(500);
        assert_eq!(
            q.params(),
            &[
                ("select".into(), "*".into()),
                ("usuario_id".into(), "eq.u1".into()),
                ("fecha".into(), "gte.2025-01-01".into()),
                ("order".into(), "fecha.desc".into()),
                ("limit".into(), "500".into()),
            ]
        );
    }

    #[test]
    fn query_or_wraps_conditions() {
        let q = Query::default().or("usuario_id.eq.u1,usuario_id.is.null");
        assert_eq!(
            q.params(),
            &[("or".into(), "(usuario_id.eq.u1,usuario_id.is.null)".into())]
        );
    }

    // ── Headers / auth ───────────────────────────────────────────────────

    #[tokio::test]
    async fn select_sends_apikey_and_anon_bearer_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/transacciones"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let rows: Vec<Row> = client_for(&server)
            .select("transacciones", &Query::select_all(), None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn select_uses_user_token_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/objetivos_ahorro"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1}]"#))
            .mount(&server)
            .await;

        let rows: Vec<Row> = client_for(&server)
            .select("objetivos_ahorro", &Query::select_all(), Some("user-token"))
            .await
            .unwrap();
        assert_eq!(rows[0].id, 1);
    }

    // ── Writes ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn insert_sends_return_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/transacciones"))
            .and(header("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"[{"id":7}]"#))
            .mount(&server)
            .await;

        let rows: Vec<Row> = client_for(&server)
            .insert("transacciones", &serde_json::json!([{"monto": 10}]), None)
            .await
            .unwrap();
        assert_eq!(rows[0].id, 7);
    }

    #[tokio::test]
    async fn ignore_duplicates_sends_conflict_clause() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/transacciones"))
            .and(query_param("on_conflict", "cargo_id,fecha_cargo"))
            .and(header_regex("prefer", "resolution=ignore-duplicates"))
            .and(header_regex("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_string("[]"))
            .mount(&server)
            .await;

        let rows: Vec<Row> = client_for(&server)
            .insert_ignore_duplicates(
                "transacciones",
                &serde_json::json!([{"monto": 10}]),
                "cargo_id,fecha_cargo",
                None,
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn upsert_sends_merge_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/objetivos_ahorro"))
            .and(query_param("on_conflict", "id"))
            .and(header_regex("prefer", "resolution=merge-duplicates"))
            .and(header_regex("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"[{"id":3}]"#))
            .mount(&server)
            .await;

        let rows: Vec<Row> = client_for(&server)
            .upsert(
                "objetivos_ahorro",
                &serde_json::json!([{"id": 3}]),
                "id",
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows[0].id, 3);
    }

    // ── Errors ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn rejection_surfaces_body_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/transacciones"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"message":"permission denied for table"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .select::<Row>("transacciones", &Query::select_all(), None)
            .await
            .unwrap_err();
        match err {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "permission denied for table");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn extract_message_falls_back_to_raw_body_and_status() {
        assert_eq!(extract_message("plain failure", 500), "plain failure");
        assert_eq!(extract_message("", 502), "HTTP 502");
    }

    #[test]
    fn public_object_url_shape() {
        let client = StoreClient::new(StoreConfig {
            base_url: "https://db.example.com".into(),
            anon_key: "k".into(),
        });
        assert_eq!(
            client.public_object_url("facturas", "ticket_1_a.jpg"),
            "https://db.example.com/storage/v1/object/public/facturas/ticket_1_a.jpg"
        );
    }
}
