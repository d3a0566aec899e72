use std::time::SystemTime;

use dashmap::DashMap;
use tracing::debug;

use super::{AccessToken, TokenStore};

/// Concurrent in-process token store.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<String, AccessToken>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: AccessToken) {
        self.tokens.insert(token.value.clone(), token);
    }

    /// Remove a token; returns whether it existed.
    pub fn revoke(&self, value: &str) -> bool {
        self.tokens.remove(value).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get_by_valid_token(&self, value: &str) -> Option<AccessToken> {
        let token = self.tokens.get(value)?;
        if token.is_expired_at(SystemTime::now()) {
            debug!(user_id = %token.user_id, "Access token expired");
            return None;
        }
        Some(token.clone())
    }
}
