//! # Store Errors
//!
//! Failure taxonomy for external store calls.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which store call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Read,
    Write,
}

impl StoreOperation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Read => "read",
            StoreOperation::Write => "write",
        }
    }
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Path has no `/` separator or an empty mount/secret part
    #[error("invalid Vault path '{path}': expected '<mount>/<path>'")]
    InvalidPath { path: String },

    /// The HTTP client could not be constructed
    #[error("failed to init connection to Vault at {address}: {source}")]
    ClientInit {
        address: String,
        #[source]
        source: BoxError,
    },

    /// Transport failure: unreachable host, TLS failure, timeout
    #[error("failed to reach Vault during {operation} of '{path}': {source}")]
    Connectivity {
        operation: StoreOperation,
        path: String,
        #[source]
        source: BoxError,
    },

    /// Vault rejected the token
    #[error("Vault rejected the token during {operation} of '{path}' (HTTP {status}): {message}")]
    Unauthorized {
        operation: StoreOperation,
        path: String,
        status: u16,
        message: String,
    },

    /// Vault refused the operation itself, e.g. permission denied on the path
    #[error("Vault {operation} of '{path}' failed (HTTP {status}): {message}")]
    Operation {
        operation: StoreOperation,
        path: String,
        status: u16,
        message: String,
    },

    /// Vault answered with a body we could not interpret
    #[error("unexpected Vault response during {operation} of '{path}': {reason}")]
    InvalidResponse {
        operation: StoreOperation,
        path: String,
        reason: String,
    },
}

impl StoreError {
    pub fn connectivity(
        operation: StoreOperation,
        path: &str,
        source: impl Into<BoxError>,
    ) -> Self {
        StoreError::Connectivity {
            operation,
            path: path.to_string(),
            source: source.into(),
        }
    }

    /// Errors only a change to the binding can fix
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, StoreError::InvalidPath { .. })
    }
}
