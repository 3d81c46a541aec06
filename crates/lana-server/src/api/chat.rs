//! POST /api/chat — non-streaming chat fallback.
//!
//! Single round trip: the whole reply comes back as `{"response": ...}`.
//! A completed tool call is executed before responding, and an insert
//! failure is reported inside the response text rather than as an HTTP
//! error so the conversation keeps going.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use lana_llm::types::ChatRequest;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::{actions, prompt};
use crate::error::ApiError;
use crate::server::AppState;

const FALLBACK_REPLY: &str = "No pude procesar tu mensaje. ¿Puedes reformular?";

/// Request body for the non-streaming chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    /// Current user message.
    #[serde(default)]
    pub message: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<prompt::HistoryMessage>,
    /// Receipt image URLs attached to this turn.
    #[serde(default)]
    pub images: Vec<String>,
}

fn outer_error(details: impl std::fmt::Display) -> ApiError {
    ApiError::InternalWithDetails {
        error: "Error al procesar tu mensaje".into(),
        details: details.to_string(),
    }
}

/// POST /api/chat
#[instrument(skip_all, fields(history = body.history.len(), images = body.images.len()))]
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.message.is_empty() && body.images.is_empty() {
        return Err(ApiError::bad_request("Message or images are required"));
    }

    let mut user_content = body.message.clone();
    if !body.images.is_empty() {
        user_content.push_str(&format!(
            "\n\n[El usuario subió {} imagen(es). Analiza las imágenes para extraer información del ticket.]",
            body.images.len()
        ));
    }

    let llm = &state.settings.llm;
    let request = ChatRequest {
        model: llm.model.clone(),
        messages: prompt::build_messages(
            prompt::CHAT_SYSTEM_PROMPT,
            &body.history,
            llm.history_turns,
            user_content,
        ),
        max_tokens: llm.chat_max_tokens,
        temperature: llm.temperature,
        stream: None,
        thinking_config: None,
        tools: Some(prompt::tool_definitions()),
        tool_choice: Some("auto".into()),
        response_format: None,
    };

    let completion = state
        .provider
        .complete(request)
        .await
        .map_err(outer_error)?;

    let usage = completion.usage;
    let model = completion.model;
    let Some(choice) = completion.choices.into_iter().next() else {
        return Ok(Json(
            json!({"response": FALLBACK_REPLY, "usage": usage, "model": model}),
        ));
    };

    if let Some(call) = choice
        .message
        .tool_calls
        .and_then(|calls| calls.into_iter().next())
    {
        let args = actions::parse_args(&call.function.arguments).map_err(outer_error)?;
        let kind = actions::kind_for_tool(&call.function.name);
        let row = actions::chat_row(kind, &args, Utc::now());

        return match state.store.insert_transactions(&[row], None).await {
            Ok(_) => {
                info!(kind = kind.as_str(), monto = args.monto, "transaction recorded");
                Ok(Json(json!({"response": actions::chat_confirmation(kind, &args)})))
            }
            Err(e) => {
                warn!("insert rejected: {e}");
                Ok(Json(json!({
                    "response": format!(
                        "❌ Error al registrar {}: {}\n\nPor favor, intenta de nuevo o usa el formulario manual.",
                        kind.as_str(),
                        actions::store_error_message(&e)
                    )
                })))
            }
        };
    }

    let reply = choice
        .message
        .content
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
    Ok(Json(json!({"response": reply, "usage": usage, "model": model})))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::server::{router, test_support};

    async fn post_chat(
        store_url: &str,
        llm_url: &str,
        payload: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let app = router(test_support::state_for(store_url, llm_url));
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn completion_with_content(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"content": content}, "finish_reason": "stop"}]
        })
    }

    #[tokio::test]
    async fn empty_message_without_images_is_rejected() {
        let (status, body) = post_chat(
            "http://store.invalid",
            "http://llm.invalid",
            serde_json::json!({"message": ""}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message or images are required");
    }

    #[tokio::test]
    async fn plain_reply_passes_through() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_with_content("¡Hola Mon!")),
            )
            .mount(&llm)
            .await;

        let (status, body) = post_chat(
            "http://store.invalid",
            &llm.uri(),
            serde_json::json!({"message": "hola"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "¡Hola Mon!");
    }

    #[tokio::test]
    async fn tool_call_inserts_and_confirms() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"tool_calls": [{"function": {
                    "name": "registrar_gasto",
                    "arguments": "{\"monto\":200,\"categoria\":\"Salud\",\"descripcion\":\"farmacia\"}"
                }}]}, "finish_reason": "tool_calls"}]
            })))
            .mount(&llm)
            .await;

        let store = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/transacciones"))
            .and(body_partial_json(serde_json::json!([{
                "tipo": "gasto",
                "monto": 200.0,
                "categoria": "Salud"
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_string("[]"))
            .expect(1)
            .mount(&store)
            .await;

        let (status, body) = post_chat(
            &store.uri(),
            &llm.uri(),
            serde_json::json!({"message": "gasté 200 en farmacia"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let response = body["response"].as_str().unwrap();
        assert!(response.starts_with("✅ Gasto registrado exitosamente!"));
        assert!(response.contains("📝 Descripción: farmacia"));
    }

    #[tokio::test]
    async fn insert_failure_reports_inside_response() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"tool_calls": [{"function": {
                    "name": "registrar_ingreso",
                    "arguments": "{\"monto\":100,\"categoria\":\"Ventas\"}"
                }}]}, "finish_reason": "tool_calls"}]
            })))
            .mount(&llm)
            .await;

        let store = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/transacciones"))
            .respond_with(
                ResponseTemplate::new(403).set_body_string(r#"{"message":"permission denied"}"#),
            )
            .mount(&store)
            .await;

        let (status, body) = post_chat(
            &store.uri(),
            &llm.uri(),
            serde_json::json!({"message": "ingresé 100"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["response"],
            "❌ Error al registrar ingreso: permission denied\n\nPor favor, intenta de nuevo o usa el formulario manual."
        );
    }

    #[tokio::test]
    async fn empty_completion_falls_back() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {}, "finish_reason": "stop"}]
            })))
            .mount(&llm)
            .await;

        let (_, body) = post_chat(
            "http://store.invalid",
            &llm.uri(),
            serde_json::json!({"message": "hola"}),
        )
        .await;
        assert_eq!(body["response"], "No pude procesar tu mensaje. ¿Puedes reformular?");
    }

    #[tokio::test]
    async fn upstream_failure_is_outer_500() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&llm)
            .await;

        let (status, body) = post_chat(
            "http://store.invalid",
            &llm.uri(),
            serde_json::json!({"message": "hola"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error al procesar tu mensaje");
        assert!(body["details"].is_string());
    }
}
