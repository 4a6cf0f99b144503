//! Per-call provider credentials.
//!
//! Keys are passed explicitly into every dispatch; nothing here reads from
//! process-wide state or persists a key.

use std::collections::HashMap;

use crate::provider::ApiProvider;

/// A provider API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key; blank keys are treated as absent.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Mapping from provider to the caller's key for it.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    keys: HashMap<ApiProvider, ApiKey>,
}

impl ProviderCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key for a provider. Blank keys clear any existing entry.
    pub fn set(&mut self, provider: ApiProvider, key: impl Into<String>) {
        match ApiKey::new(key) {
            Some(key) => {
                self.keys.insert(provider, key);
            }
            None => {
                self.keys.remove(&provider);
            }
        }
    }

    pub fn with(mut self, provider: ApiProvider, key: impl Into<String>) -> Self {
        self.set(provider, key);
        self
    }

    pub fn resolve(&self, provider: ApiProvider) -> Option<&ApiKey> {
        self.keys.get(&provider)
    }

    pub fn providers(&self) -> Vec<ApiProvider> {
        ApiProvider::ALL
            .into_iter()
            .filter(|p| self.keys.contains_key(p))
            .collect()
    }
}
