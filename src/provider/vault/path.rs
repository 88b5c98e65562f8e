//! # KV v2 Paths
//!
//! Splits a binding's `vaultPath` into mount and secret path and builds the
//! KV v2 data endpoint for it.

use crate::constants::KV2_DATA_SEGMENT;
use crate::provider::StoreError;

/// A `<mount>/<path>` split on the first `/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KvPath<'a> {
    mount: &'a str,
    secret: &'a str,
}

impl<'a> KvPath<'a> {
    /// Split on the first separator only
    ///
    /// `"kv/team/app1"` becomes mount `kv` and secret `team/app1`. A path with
    /// no separator, or with an empty side, is rejected rather than defaulted.
    pub fn parse(path: &'a str) -> Result<Self, StoreError> {
        match path.split_once('/') {
            Some((mount, secret)) if !mount.is_empty() && !secret.is_empty() => {
                Ok(Self { mount, secret })
            }
            _ => Err(StoreError::InvalidPath {
                path: path.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn mount(&self) -> &'a str {
        self.mount
    }

    #[must_use]
    pub fn secret(&self) -> &'a str {
        self.secret
    }

    /// `{address}/v1/{mount}/data/{secret}`
    #[must_use]
    pub fn data_url(&self, address: &str) -> String {
        format!(
            "{address}/v1/{}/{KV2_DATA_SEGMENT}/{}",
            self.mount, self.secret
        )
    }
}
