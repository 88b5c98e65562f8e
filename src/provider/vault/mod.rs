//! # Vault KV v2 Client
//!
//! REST client for the HashiCorp Vault KV version 2 secrets engine.
//! Uses reqwest (rustls) with a fixed per-request timeout.
//!
//! - `GET  /v1/{mount}/data/{path}` reads the latest version, 404 means absent
//! - `PUT  /v1/{mount}/data/{path}` replaces the whole field set and creates a new version
//!
//! The client does not retry; every failure is returned to the caller.

mod path;
mod types;

pub use path::KvPath;

use crate::config::VaultConfig;
use crate::observability::metrics;
use crate::provider::{KvData, KvSecretStore, StoreError, StoreOperation, WriteMetadata};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Instant;
use tracing::{debug, info_span, Instrument};
use types::{ReadSecretResponse, WriteSecretRequest, WriteSecretResponse};
use zeroize::Zeroizing;

const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Vault KV v2 client
pub struct VaultKvClient {
    http_client: Client,
    address: String,
    token: Zeroizing<String>,
}

impl std::fmt::Debug for VaultKvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKvClient")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl VaultKvClient {
    /// Build a client from the startup configuration
    ///
    /// The underlying HTTP client keeps a connection pool; the configured
    /// timeout applies to every request made through it.
    pub fn new(config: &VaultConfig) -> Result<Self, StoreError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .user_agent(crate::constants::CONTROLLER_NAME)
            .build()
            .map_err(|e| StoreError::ClientInit {
                address: config.address().to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            http_client,
            address: config.address().to_string(),
            token: Zeroizing::new(config.token().to_string()),
        })
    }

    async fn read_inner(
        &self,
        path: &str,
        kv_path: KvPath<'_>,
    ) -> Result<Option<KvData>, StoreError> {
        let url = kv_path.data_url(&self.address);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(VAULT_TOKEN_HEADER, self.token.as_str())
            .send()
            .await
            .map_err(|e| StoreError::connectivity(StoreOperation::Read, path, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, StoreOperation::Read, path).await?;

        let body: ReadSecretResponse =
            response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse {
                    operation: StoreOperation::Read,
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;

        // Soft-deleted or destroyed latest version reads back as 200 with null data
        Ok(body.data.and_then(|d| d.data))
    }

    async fn write_inner(
        &self,
        path: &str,
        kv_path: KvPath<'_>,
        data: &KvData,
    ) -> Result<WriteMetadata, StoreError> {
        let url = kv_path.data_url(&self.address);
        debug!("PUT {} ({} fields)", url, data.len());

        let response = self
            .http_client
            .put(&url)
            .header(VAULT_TOKEN_HEADER, self.token.as_str())
            .json(&WriteSecretRequest { data })
            .send()
            .await
            .map_err(|e| StoreError::connectivity(StoreOperation::Write, path, e))?;

        let response = check_status(response, StoreOperation::Write, path).await?;

        // 204 carries no body; anything else should describe the new version
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::connectivity(StoreOperation::Write, path, e))?;
        if bytes.is_empty() {
            return Ok(WriteMetadata::default());
        }
        let body: WriteSecretResponse =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::InvalidResponse {
                operation: StoreOperation::Write,
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(body.data.unwrap_or_default())
    }
}

#[async_trait]
impl KvSecretStore for VaultKvClient {
    async fn read(&self, path: &str) -> Result<Option<KvData>, StoreError> {
        let kv_path = KvPath::parse(path)?;
        let span = info_span!(
            "vault.read",
            mount = kv_path.mount(),
            path = kv_path.secret()
        );
        let start = Instant::now();

        let result = self.read_inner(path, kv_path).instrument(span).await;

        let outcome = match &result {
            Ok(Some(_)) => "ok",
            Ok(None) => "absent",
            Err(_) => "error",
        };
        metrics::record_vault_operation("read", outcome, start.elapsed().as_secs_f64());
        result
    }

    async fn write(&self, path: &str, data: &KvData) -> Result<WriteMetadata, StoreError> {
        let kv_path = KvPath::parse(path)?;
        let span = info_span!(
            "vault.write",
            mount = kv_path.mount(),
            path = kv_path.secret()
        );
        let start = Instant::now();

        let result = self.write_inner(path, kv_path, data).instrument(span).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::record_vault_operation("write", outcome, start.elapsed().as_secs_f64());
        result
    }
}

/// Map a non-success status to the matching [`StoreError`]
async fn check_status(
    response: Response,
    operation: StoreOperation,
    path: &str,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = types::error_message(&body);

    if status == StatusCode::UNAUTHORIZED {
        Err(StoreError::Unauthorized {
            operation,
            path: path.to_string(),
            status: status.as_u16(),
            message,
        })
    } else {
        Err(StoreError::Operation {
            operation,
            path: path.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}
