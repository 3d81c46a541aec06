//! Wire types for the OpenRouter chat-completions API.
//!
//! Request types serialize exactly what the endpoint expects; response
//! types are permissive (`Option` + `default`) because the provider omits
//! fields freely between chunks.

use serde::{Deserialize, Serialize};

/// A chat-completions request body.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    /// Model slug, e.g. `google/gemini-2.5-flash`.
    pub model: String,
    /// System prompt + history + current user message.
    pub messages: Vec<ChatMessage>,
    /// Completion token cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// `Some(true)` for the streaming endpoint; omitted otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Gemini thinking budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    /// Function tools offered to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Tool selection policy (`"auto"` when tools are present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    /// Forced output format (`json_object` for the OCR call).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// One conversation message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Plain text or multimodal parts.
    pub content: MessageContent,
}

impl ChatMessage {
    /// A plain-text message.
    #[must_use]
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(content.into()),
        }
    }
}

/// Message content: a plain string or a list of typed parts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Multimodal parts (text + image URLs), used by the OCR call.
    Parts(Vec<ContentPart>),
}

/// A multimodal content part.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// A text part.
    Text {
        /// The text.
        text: String,
    },
    /// An image reference.
    ImageUrl {
        /// The image URL wrapper.
        image_url: ImageUrl,
    },
}

/// Image URL wrapper.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageUrl {
    /// Publicly reachable image URL.
    pub url: String,
}

/// Gemini thinking configuration.
#[derive(Clone, Debug, Serialize)]
pub struct ThinkingConfig {
    /// Tokens reserved for internal reasoning.
    pub max_thinking_tokens: u32,
}

/// A function tool definition.
#[derive(Clone, Debug, Serialize)]
pub struct ToolDefinition {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The function payload.
    pub function: FunctionDefinition,
}

/// Function name, description, and JSON-schema parameters.
#[derive(Clone, Debug, Serialize)]
pub struct FunctionDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description shown to the model.
    pub description: String,
    /// JSON schema for the arguments.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Build a function tool.
    #[must_use]
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            kind: "function".into(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Forced response format.
#[derive(Clone, Debug, Serialize)]
pub struct ResponseFormat {
    /// `"json_object"`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    /// The `json_object` format used by the OCR vision call.
    #[must_use]
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".into(),
        }
    }
}

// ── Streaming chunk types ────────────────────────────────────────────────────

/// One decoded streaming chunk.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatChunk {
    /// Chunk choices (the provider sends exactly one).
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Usage, sent on the final chunk when the provider includes it.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// A streaming choice.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkChoice {
    /// Incremental delta.
    #[serde(default)]
    pub delta: ChunkDelta,
    /// Set on the terminating chunk (`"stop"`, `"tool_calls"`, …).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental message delta.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkDelta {
    /// Assistant text fragment.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool call fragments.
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallChunk>>,
}

/// One fragmented tool call entry.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ToolCallChunk {
    /// Function name/arguments fragment.
    #[serde(default)]
    pub function: Option<FunctionChunk>,
}

/// Fragmented function name and arguments.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FunctionChunk {
    /// Function name (sent once, before argument fragments begin).
    #[serde(default)]
    pub name: Option<String>,
    /// Argument JSON fragment.
    #[serde(default)]
    pub arguments: Option<String>,
}

// ── Non-streaming completion types ───────────────────────────────────────────

/// A non-streaming chat completion.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatCompletion {
    /// Completion choices.
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Model that served the request.
    #[serde(default)]
    pub model: Option<String>,
}

/// One completion choice.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CompletionChoice {
    /// The full assistant message.
    #[serde(default)]
    pub message: CompletionMessage,
    /// Finish reason.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The complete assistant message of a non-streaming call.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CompletionMessage {
    /// Assistant text.
    #[serde(default)]
    pub content: Option<String>,
    /// Completed tool calls.
    #[serde(default)]
    pub tool_calls: Option<Vec<CompletedToolCall>>,
}

/// A completed (non-fragmented) tool call.
#[derive(Clone, Debug, Deserialize)]
pub struct CompletedToolCall {
    /// The called function.
    pub function: CompletedFunction,
}

/// Completed function name and argument JSON.
#[derive(Clone, Debug, Deserialize)]
pub struct CompletedFunction {
    /// Function name.
    pub name: String,
    /// Full argument JSON string.
    pub arguments: String,
}

/// Token usage as reported by the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
