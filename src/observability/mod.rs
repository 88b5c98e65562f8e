//! # Observability
//!
//! - `metrics`: Prometheus metrics collection
//!
//! Logging goes through `tracing`; the subscriber is installed in
//! [`crate::runtime::initialization`].

pub mod metrics;
