//! # Normalization and Comparison
//!
//! Cluster Secrets hold raw bytes, Vault holds JSON values. Before comparing,
//! every byte value is converted to a string; after that the two field sets
//! must match exactly.

use super::types::ClusterSecret;
use crate::provider::KvData;
use serde_json::Value;
use tracing::warn;

/// Convert each byte value of a cluster Secret to a JSON string
///
/// Invalid UTF-8 is converted lossily (U+FFFD). The lossy form is what gets
/// written, so it also compares equal on the next pass.
#[must_use]
pub fn normalize(secret: &ClusterSecret) -> KvData {
    secret
        .iter()
        .map(|(field, bytes)| {
            let value = match std::str::from_utf8(bytes) {
                Ok(s) => s.to_string(),
                Err(_) => {
                    warn!(
                        "Secret field '{}' is not valid UTF-8, storing lossy conversion",
                        field
                    );
                    String::from_utf8_lossy(bytes).into_owned()
                }
            };
            (field.clone(), Value::String(value))
        })
        .collect()
}

/// Whether the Vault copy equals the normalized cluster copy
///
/// Same key set and identical values; no type coercion, so the string `"1"`
/// does not match the number `1`. An absent Vault secret never matches, not
/// even an empty cluster Secret.
#[must_use]
pub fn secrets_match(normalized: &KvData, external: Option<&KvData>) -> bool {
    let Some(external) = external else {
        return false;
    };

    normalized.len() == external.len()
        && normalized
            .iter()
            .all(|(field, value)| external.get(field) == Some(value))
}
