//! Vault KV v2 request/response payloads.
//!
//! API Reference: https://developer.hashicorp.com/vault/api-docs/secret/kv/kv-v2

use crate::provider::{KvData, WriteMetadata};
use serde::{Deserialize, Serialize};

/// Response of `GET /v1/{mount}/data/{path}`
#[derive(Debug, Deserialize)]
pub(super) struct ReadSecretResponse {
    #[serde(default)]
    pub data: Option<ReadSecretData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReadSecretData {
    /// `null` when the latest version is deleted or destroyed
    #[serde(default)]
    pub data: Option<KvData>,
}

/// Body of `PUT /v1/{mount}/data/{path}`
#[derive(Debug, Serialize)]
pub(super) struct WriteSecretRequest<'a> {
    pub data: &'a KvData,
}

/// Response of `PUT /v1/{mount}/data/{path}`
#[derive(Debug, Deserialize)]
pub(super) struct WriteSecretResponse {
    #[serde(default)]
    pub data: Option<WriteMetadata>,
}

/// Vault error body: `{"errors": ["permission denied"]}`
#[derive(Debug, Deserialize)]
pub(super) struct VaultErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Best-effort error message from a non-success response body
pub(super) fn error_message(body: &str) -> String {
    match serde_json::from_str::<VaultErrorResponse>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ if body.trim().is_empty() => "no error details returned".to_string(),
        _ => body.trim().chars().take(256).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_response_with_data() {
        let body = serde_json::json!({
            "data": {
                "data": {"user": "u1", "pass": "p1"},
                "metadata": {"version": 2, "destroyed": false}
            }
        });
        let parsed: ReadSecretResponse = serde_json::from_value(body).unwrap();
        let data = parsed.data.and_then(|d| d.data).unwrap();
        assert_eq!(data["user"], "u1");
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_read_response_deleted_version() {
        let body = serde_json::json!({
            "data": {
                "data": null,
                "metadata": {"version": 3, "deletion_time": "2024-01-01T00:00:00Z"}
            }
        });
        let parsed: ReadSecretResponse = serde_json::from_value(body).unwrap();
        assert!(parsed.data.and_then(|d| d.data).is_none());
    }

    #[test]
    fn test_error_message_from_errors_array() {
        assert_eq!(
            error_message(r#"{"errors":["permission denied"]}"#),
            "permission denied"
        );
        assert_eq!(error_message(""), "no error details returned");
        assert_eq!(error_message("upstream unavailable"), "upstream unavailable");
    }
}
