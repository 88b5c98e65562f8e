//! # Controller
//!
//! Core controller modules for the Reverse Vault Secret Controller.
//!
//! - `backoff`: Fibonacci backoff for failed reconciliations
//! - `reconciler`: Binding resolution, comparison and the reconciliation engine
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
