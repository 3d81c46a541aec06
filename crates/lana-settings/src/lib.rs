//! # lana-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`LanaSettings::default()`]
//! 2. **User file** — `~/.lana/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `LANA_*` overrides (highest priority)
//!
//! Secrets (API keys, service URLs) are never read from the settings
//! file; [`Secrets::from_env`] is the only source.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{
    LanaSettings, LlmSettings, LoggingSettings, Secrets, ServerSettings, UploadSettings,
};
