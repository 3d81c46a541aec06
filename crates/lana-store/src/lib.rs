//! # lana-store
//!
//! Data access against the hosted Postgres REST service. The service is
//! consumed as an opaque HTTP API: reads and writes go through
//! `/rest/v1/{table}` with PostgREST filter parameters, auth lookups
//! through `/auth/v1/user`, and receipt images through `/storage/v1`.
//!
//! All operations take the caller's access token explicitly; there is no
//! ambient session. Without a token the anon key is used as the bearer,
//! which the service scopes to whatever its policies allow.

#![deny(unsafe_code)]

pub mod auth;
pub mod client;
pub mod goals;
pub mod recurring;
pub mod storage;
pub mod transactions;

pub use auth::AuthUser;
pub use client::{Query, StoreClient, StoreConfig, StoreError, StoreResult};
pub use transactions::{window_for, DateWindow, Vista};
