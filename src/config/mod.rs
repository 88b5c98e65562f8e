//! # Configuration
//!
//! Process-wide settings, read once at startup.
//!
//! - `controller.rs` - Controller settings (requeue interval, backoff bounds, server port)
//! - `vault.rs` - Vault address, token and transport timeout

mod controller;
mod vault;

pub use controller::{ConfigError, ControllerConfig};
pub use vault::VaultConfig;
