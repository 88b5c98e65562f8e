//! Reverse Vault Secret Controller Library
//!
//! Mirrors Kubernetes Secrets into HashiCorp Vault KV v2. Each
//! `ReverseVaultSecret` binding names a Secret in its own namespace and the
//! Vault path it is copied to. Data only flows from the cluster into Vault.
//!
//! ## Quick Start
//!
//! ```rust
//! use reverse_vault_secret_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
