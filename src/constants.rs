//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values are defaults; the tunable ones can be overridden via
//! environment variables (see [`crate::config::ControllerConfig`]).

/// Environment variable holding the Vault address
pub const VAULT_ADDR_ENV: &str = "VAULT_HOST";

/// Environment variable holding the Vault token
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";

/// Fixed timeout applied to every Vault request (seconds)
pub const DEFAULT_VAULT_TIMEOUT_SECS: u64 = 10;

/// Interval for the routine re-check after a successful reconciliation (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;

/// Fibonacci backoff lower bound for retryable errors (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Fibonacci backoff upper bound for retryable errors (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default HTTP server port for metrics and health checks
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// How long to wait for the HTTP server to bind at startup (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Poll interval while waiting for the HTTP server to bind (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Delay before restarting the watch stream after it ends or fails (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "reverse_vault_secret_controller=info";

/// Field manager / user agent name
pub const CONTROLLER_NAME: &str = "reverse-vault-secret-controller";

/// Path segment that KV v2 inserts between the mount and the secret path
pub const KV2_DATA_SEGMENT: &str = "data";
