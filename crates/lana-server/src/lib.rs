//! # lana-server
//!
//! Axum HTTP server for the Lana assistant: the streaming chat pipeline,
//! the data endpoints (transactions, savings goals, recurring charges),
//! export/import/reset, and receipt upload + OCR.
//!
//! Handlers live under [`api`]; everything else is wiring. Request state
//! is a cloneable [`server::AppState`] holding shared handles to the
//! model provider, the store client, and settings.

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod server;
pub mod session;
pub mod shutdown;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{AppState, LanaServer};
pub use session::SessionContext;
pub use shutdown::ShutdownCoordinator;
