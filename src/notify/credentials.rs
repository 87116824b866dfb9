//! Channel credential retrieval with in-process caching
//!
//! A fetched credential stays cached until [`CredentialCache::invalidate`] is
//! called. Concurrent callers during an in-flight fetch share that fetch.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::SecretString;

/// Backend holding the channel credential
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch_secret(&self, reference: &str) -> Result<SecretString, CredentialError>;
}

/// Reads the credential from the environment variable named by the reference
#[derive(Debug, Clone, Default)]
pub struct EnvSecretSource;

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch_secret(&self, reference: &str) -> Result<SecretString, CredentialError> {
        std::env::var(reference)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| CredentialError::Missing(reference.to_string()))
    }
}

/// Cached accessor for the channel credential
pub struct CredentialCache {
    source: Option<Arc<dyn SecretSource>>,
    reference: Option<String>,
    cache: Cache<String, Arc<SecretString>>,
}

impl CredentialCache {
    pub fn new(source: Arc<dyn SecretSource>, reference: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            reference: Some(reference.into()),
            cache: Cache::new(16),
        }
    }

    /// Cache with no credential source; every `get` fails
    pub fn unconfigured() -> Self {
        Self {
            source: None,
            reference: None,
            cache: Cache::new(16),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some() && self.reference.is_some()
    }

    /// Return the cached credential, fetching it on first use
    pub async fn get(&self) -> Result<Arc<SecretString>, CredentialError> {
        let (Some(source), Some(reference)) = (&self.source, &self.reference) else {
            return Err(CredentialError::NotConfigured);
        };

        let source = Arc::clone(source);
        let lookup = reference.clone();
        self.cache
            .try_get_with(reference.clone(), async move {
                tracing::debug!(reference = %lookup, "Fetching channel credential");
                source.fetch_secret(&lookup).await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<CredentialError>| e.as_ref().clone())
    }

    /// Drop the cached credential so the next `get` fetches it again
    pub async fn invalidate(&self) {
        if let Some(reference) = &self.reference {
            self.cache.invalidate(reference).await;
        }
    }
}

/// Credential errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    #[error("No credential source configured")]
    NotConfigured,

    #[error("Credential {0} not found")]
    Missing(String),

    #[error("Failed to fetch credential: {0}")]
    Fetch(String),
}
