//! OpenRouter provider: request building, streaming and non-streaming
//! calls, API error parsing.

use std::pin::Pin;

use futures::Stream;
use lana_core::text::truncate_str;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio_stream::StreamExt;
use tracing::{debug, instrument, warn};

use crate::sse::{sse_payloads, SseDecoderOptions};
use crate::stream::{build_done_event, process_chunk, ChatStreamEvent, StreamState};
use crate::types::{ChatChunk, ChatCompletion, ChatRequest};

/// Default API base.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model slug for both chat and vision calls.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Errors surfaced by the provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Credential or header construction failure.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The API rejected the request.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the error body, or the raw body.
        message: String,
        /// Provider-specific error code, when present.
        code: Option<String>,
        /// Whether retrying the same request may succeed.
        retryable: bool,
    },

    /// Rate limited.
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited {
        /// Parsed `Retry-After` header, if the provider sent one.
        retry_after_secs: Option<u64>,
    },

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be parsed.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ProviderError {
    /// Whether retrying may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { retryable, .. } => *retryable,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Auth(_) | Self::UnexpectedResponse(_) => false,
        }
    }
}

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A boxed stream of chat events.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>>;

/// OpenRouter connection settings.
#[derive(Clone, Debug)]
pub struct OpenRouterConfig {
    /// API key (`Bearer`).
    pub api_key: String,
    /// API base; `None` uses [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,
    /// Sent as `HTTP-Referer` for OpenRouter attribution.
    pub site_url: String,
    /// Sent as `X-Title`.
    pub app_title: String,
    /// Model slug.
    pub model: String,
}

impl OpenRouterConfig {
    /// Config with default base URL and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            site_url: site_url.into(),
            app_title: "Lana".into(),
            model: DEFAULT_MODEL.into(),
        }
    }

    fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

/// OpenRouter chat-completions client.
#[derive(Clone, Debug)]
pub struct OpenRouterProvider {
    config: OpenRouterConfig,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    /// Provider with a fresh HTTP client.
    #[must_use]
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Provider reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(config: OpenRouterConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// The configured model slug.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_headers(&self) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|e| ProviderError::Auth(format!("invalid API key: {e}")))?;
        let _ = headers.insert(AUTHORIZATION, auth);
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let referer = HeaderValue::from_str(&self.config.site_url)
            .map_err(|e| ProviderError::Auth(format!("invalid site URL: {e}")))?;
        let _ = headers.insert("HTTP-Referer", referer);
        let title = HeaderValue::from_str(&self.config.app_title)
            .map_err(|e| ProviderError::Auth(format!("invalid app title: {e}")))?;
        let _ = headers.insert("X-Title", title);
        Ok(headers)
    }

    async fn send(&self, request: &ChatRequest) -> ProviderResult<reqwest::Response> {
        let url = format!("{}/chat/completions", self.config.base_url());
        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(ProviderError::RateLimited { retry_after_secs });
            }
            let body = response.text().await.unwrap_or_default();
            let (message, code, retryable) = parse_api_error(&body, status.as_u16());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
                code,
                retryable,
            });
        }

        Ok(response)
    }

    /// Open a streaming chat completion.
    ///
    /// The returned stream yields [`ChatStreamEvent::Start`] first and
    /// always ends with exactly one [`ChatStreamEvent::Done`]. Undecodable
    /// payloads are logged and skipped.
    #[instrument(skip_all, fields(model = %request.model))]
    pub async fn stream(&self, mut request: ChatRequest) -> ProviderResult<ChatEventStream> {
        request.stream = Some(true);
        let response = self.send(&request).await?;

        let stream = async_stream::stream! {
            yield ChatStreamEvent::Start;

            let options = SseDecoderOptions::default();
            let payloads = sse_payloads(response.bytes_stream(), &options);
            tokio::pin!(payloads);

            let mut state = StreamState::new();
            while let Some(payload) = payloads.next().await {
                let chunk: ChatChunk = match serde_json::from_str(&payload) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(
                            "skipping undecodable chunk: {e} ({})",
                            truncate_str(&payload, 120)
                        );
                        continue;
                    }
                };
                for event in process_chunk(&chunk, &mut state) {
                    yield event;
                }
            }

            debug!("chat stream ended");
            yield build_done_event(state);
        };

        Ok(Box::pin(stream))
    }

    /// A non-streaming chat completion, used by the synchronous chat
    /// endpoint and the receipt vision call.
    #[instrument(skip_all, fields(model = %request.model))]
    pub async fn complete(&self, mut request: ChatRequest) -> ProviderResult<ChatCompletion> {
        request.stream = None;
        let response = self.send(&request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::UnexpectedResponse(format!(
                "{e} ({})",
                truncate_str(&body, 200)
            ))
        })
    }
}

/// Parse an API error body into `(message, code, retryable)`.
///
/// Falls back to the raw body when it is not the standard
/// `{"error": {"message", "code"}}` envelope.
fn parse_api_error(body: &str, status: u16) -> (String, Option<String>, bool) {
    let retryable = status >= 500;

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let error = value.get("error").unwrap_or(&value);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(ToOwned::to_owned);
        let code = error
            .get("code")
            .map(|c| match c.as_str() {
                Some(s) => s.to_owned(),
                None => c.to_string(),
            });
        if let Some(message) = message {
            return (message, code, retryable);
        }
    }

    let fallback = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        truncate_str(body, 200).to_owned()
    };
    (fallback, None, retryable)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
