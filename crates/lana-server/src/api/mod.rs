//! HTTP handlers.

pub mod actions;
pub mod chat;
pub mod chat_stream;
pub mod export;
pub mod goals;
pub mod import;
pub mod prompt;
pub mod recurring;
pub mod reset;
pub mod transactions;
pub mod upload;
