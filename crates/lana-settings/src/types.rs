//! Settings tree and env-only secrets.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings tree.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanaSettings {
    /// Settings schema version.
    pub version: u32,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Model-call settings.
    pub llm: LlmSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Receipt upload settings.
    pub upload: UploadSettings,
}

/// Server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// HTTP port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Model-call parameters. The streaming chat, non-streaming chat, and
/// receipt vision calls carry different token caps and temperatures.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Model slug for every call.
    pub model: String,
    /// Completion cap for the streaming chat call.
    pub stream_max_tokens: u32,
    /// Completion cap for the non-streaming chat call.
    pub chat_max_tokens: u32,
    /// Sampling temperature for chat calls.
    pub temperature: f32,
    /// Tokens reserved for the model's internal reasoning (streaming only).
    pub max_thinking_tokens: u32,
    /// How many trailing history turns are forwarded upstream.
    pub history_turns: usize,
    /// Completion cap for the receipt vision call.
    pub vision_max_tokens: u32,
    /// Temperature for the receipt vision call.
    pub vision_temperature: f32,
    /// `X-Title` attribution header value.
    pub app_title: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "google/gemini-2.5-flash".to_string(),
            stream_max_tokens: 2000,
            chat_max_tokens: 1000,
            temperature: 0.7,
            max_thinking_tokens: 500,
            history_turns: 10,
            vision_max_tokens: 400,
            vision_temperature: 0.1,
            app_title: "Lana".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Receipt upload settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSettings {
    /// Storage bucket receipts land in.
    pub bucket: String,
    /// Maximum accepted image size in bytes.
    pub max_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            bucket: "facturas".to_string(),
            max_bytes: 10_485_760,
        }
    }
}

/// Credentials read only from the environment, never from the settings
/// file.
#[derive(Clone, Debug)]
pub struct Secrets {
    /// OpenRouter API key.
    pub openrouter_api_key: String,
    /// Hosted Postgres service base URL.
    pub supabase_url: String,
    /// Hosted Postgres anon key.
    pub supabase_anon_key: String,
    /// Public site URL, sent as `HTTP-Referer` upstream.
    pub site_url: String,
}

impl Secrets {
    /// Read all secrets from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            supabase_url: require_env("SUPABASE_URL")?,
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            site_url: std::env::var("SITE_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }
}

fn require_env(name: &'static str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(SettingsError::MissingEnv(name))
}
