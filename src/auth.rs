//! Key retrieval.
//!
//! The adapter never stores long-lived secrets itself; it asks a
//! [`KeyRepository`] for the key named by the host's `api_key` setting, the
//! first time a client is needed or after the cached client is invalidated.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{Error, Result};

/// External secret store resolving key names to key material.
#[async_trait]
pub trait KeyRepository: Send + Sync {
    /// Repository name for logging.
    fn name(&self) -> &str;

    /// Resolve the secret value stored under `key_name`.
    async fn key_value(&self, key_name: &str) -> Result<SecretString>;
}

/// In-memory key repository for tests and hosts that inject keys directly.
#[derive(Clone, Default)]
pub struct StaticKeys {
    keys: HashMap<String, SecretString>,
}

impl StaticKeys {
    pub fn new<K, V>(keys: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|(k, v)| (k.into(), SecretString::from(v.into())))
                .collect(),
        }
    }
}

impl fmt::Debug for StaticKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeys")
            .field("keys", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl KeyRepository for StaticKeys {
    fn name(&self) -> &str {
        "static"
    }

    async fn key_value(&self, key_name: &str) -> Result<SecretString> {
        self.keys
            .get(key_name)
            .cloned()
            .ok_or_else(|| Error::auth(format!("no key named {key_name:?}")))
    }
}

/// Key repository backed by environment variables; the key name is the
/// variable name.
#[derive(Debug, Clone, Default)]
pub struct EnvKeyRepository;

#[async_trait]
impl KeyRepository for EnvKeyRepository {
    fn name(&self) -> &str {
        "env"
    }

    async fn key_value(&self, key_name: &str) -> Result<SecretString> {
        let value = std::env::var(key_name)
            .map_err(|_| Error::auth(format!("environment variable {key_name} is not set")))?;
        if value.is_empty() {
            return Err(Error::auth(format!(
                "environment variable {key_name} is empty"
            )));
        }
        Ok(SecretString::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_static_keys_resolve() {
        let keys = StaticKeys::new([("gemini_key", "AI-secret")]);
        let value = keys.key_value("gemini_key").await.unwrap();
        assert_eq!(value.expose_secret(), "AI-secret");
    }

    #[tokio::test]
    async fn test_static_keys_missing_is_auth_error() {
        let keys = StaticKeys::new([("other", "x")]);
        let err = keys.key_value("gemini_key").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let keys = StaticKeys::new([("gemini_key", "AI-secret")]);
        let rendered = format!("{keys:?}");
        assert!(!rendered.contains("AI-secret"));
    }
}
