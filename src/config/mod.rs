//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, TimeoutsConfig)
//! - [`listen`]: Network listener configuration (ListenConfig)
//! - [`limits`]: Resource limits (LimitsConfig)
//! - [`validation`]: Startup checks over a loaded Config

mod limits;
mod listen;
mod types;
pub mod validation;

pub use limits::LimitsConfig;
pub use types::{Config, TimeoutsConfig};
