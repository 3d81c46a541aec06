//! # lana-llm
//!
//! OpenRouter chat-completions client for the Lana assistant.
//!
//! Three layers, leaves first:
//!
//! - [`sse`]: byte stream → discrete `data:` payload strings, with line
//!   buffering across chunk boundaries
//! - [`stream`]: payload strings → typed [`stream::ChatStreamEvent`]s,
//!   accumulating fragmented tool calls and assistant text
//! - [`provider`]: HTTP request building, streaming and non-streaming
//!   calls, API error parsing

#![deny(unsafe_code)]

pub mod provider;
pub mod sse;
pub mod stream;
pub mod types;

pub use provider::{OpenRouterConfig, OpenRouterProvider, ProviderError, ProviderResult};
pub use stream::{AssembledReply, ChatStreamEvent, ToolCallDraft};
