//! POST /api/chat/stream — SSE chat with live tool execution.
//!
//! Downstream frame protocol, in order: `{"thinking":true}` immediately,
//! `{"thinking":false}` once before the first visible chunk, `{"chunk":...}`
//! per content delta (plus the action progress/result chunks when the model
//! called a tool), and `{"done":true}` exactly once at the end. A total
//! upstream failure collapses into a single error chunk that still carries
//! `done`.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use lana_llm::types::{ChatRequest, ThinkingConfig};
use lana_llm::ChatStreamEvent;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, instrument};

use crate::api::{actions, prompt};
use crate::server::AppState;

/// Chunk sent when the upstream call fails outright.
const FAILURE_CHUNK: &str = "❌ Error al procesar. Intenta de nuevo.";

/// Request body for the streaming chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatStreamBody {
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

/// One downstream SSE frame.
fn frame(value: &serde_json::Value) -> Event {
    match serde_json::to_string(value) {
        Ok(data) => Event::default().data(data),
        Err(_) => Event::default().data("{}"),
    }
}

/// POST /api/chat/stream
#[instrument(skip_all, fields(history = body.history.len(), images = body.images.len()))]
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(body): Json<ChatStreamBody>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        yield Ok(frame(&json!({"thinking": true})));

        let llm = &state.settings.llm;
        let request = ChatRequest {
            model: llm.model.clone(),
            messages: prompt::build_messages(
                prompt::STREAM_SYSTEM_PROMPT,
                &body.history,
                llm.history_turns,
                prompt::with_image_note(&body.message, body.images.len()),
            ),
            max_tokens: llm.stream_max_tokens,
            temperature: llm.temperature,
            stream: Some(true),
            thinking_config: Some(ThinkingConfig {
                max_thinking_tokens: llm.max_thinking_tokens,
            }),
            tools: Some(prompt::tool_definitions()),
            tool_choice: Some("auto".into()),
            response_format: None,
        };

        let mut upstream = match state.provider.stream(request).await {
            Ok(upstream) => upstream,
            Err(e) => {
                error!("chat stream failed to start: {e}");
                yield Ok(frame(&json!({"chunk": FAILURE_CHUNK, "done": true})));
                return;
            }
        };

        let mut thinking = true;
        let mut reply = None;
        while let Some(event) = upstream.next().await {
            match event {
                ChatStreamEvent::ContentDelta { delta } => {
                    if thinking {
                        thinking = false;
                        yield Ok(frame(&json!({"thinking": false})));
                    }
                    yield Ok(frame(&json!({"chunk": delta})));
                }
                ChatStreamEvent::Done { reply: assembled, .. } => reply = Some(assembled),
                ChatStreamEvent::Start
                | ChatStreamEvent::ToolCallStart { .. }
                | ChatStreamEvent::ToolCallDelta { .. } => {}
            }
        }

        // A tool-call-only stream never flips the thinking latch: the
        // client stays in "thinking" until the action chunks arrive.
        let call = reply
            .and_then(|r| r.tool_call)
            .filter(lana_llm::ToolCallDraft::is_complete);
        if let Some(call) = call {
            yield Ok(frame(&json!({"chunk": actions::PROGRESS_CHUNK})));
            let outcome = actions::execute_streamed_call(&state.store, &call).await;
            yield Ok(frame(&json!({"chunk": outcome})));
        }

        yield Ok(frame(&json!({"done": true})));
    };

    Sse::new(stream)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
