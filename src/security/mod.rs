//! # Security Module
//!
//! Access-token authentication for API requests.
//!
//! ## Overview
//!
//! A caller proves its identity with an opaque access token. The
//! [`AccessTokenVerifier`] looks for the token in, by priority:
//!
//! 1. a request header (`X-Access-Token` by default)
//! 2. a field of the request body (`accessToken` by default)
//! 3. a query parameter with the same name
//!
//! No token means the request proceeds anonymously. A token that the
//! [`TokenStore`] does not know (or that has expired) is rejected with
//! `401 Invalid access token`. A known token establishes the caller through
//! the [`IdentityService`] and is kept on the [`Caller`] for the rest of the
//! request so controller scope requirements can be checked against it.
//!
//! Token persistence lives outside this crate; [`InMemoryTokenStore`] is
//! provided for tests and demos.
//!
//! ```rust
//! use apirouter::security::{AccessToken, InMemoryTokenStore, TokenStore};
//!
//! let store = InMemoryTokenStore::new();
//! store.insert(AccessToken::new("abc123", "42").with_scope("widgets"));
//!
//! let token = store.get_by_valid_token("abc123").unwrap();
//! assert!(store.has_scope(&token, "widgets"));
//! assert!(store.get_by_valid_token("nope").is_none());
//! ```

use std::collections::BTreeSet;
use std::time::SystemTime;

use serde_json::Value;

use crate::dispatcher::HeaderVec;
use crate::route::ParamVec;

mod memory;
mod verifier;

pub use memory::InMemoryTokenStore;
pub use verifier::{AccessTokenVerifier, DEFAULT_TOKEN_HEADER, DEFAULT_TOKEN_PARAM};

/// An access token resolved by a [`TokenStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub user_id: String,
    pub scopes: BTreeSet<String>,
    /// `None` never expires
    pub expires_at: Option<SystemTime>,
}

impl AccessToken {
    #[must_use]
    pub fn new(value: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            user_id: user_id.into(),
            scopes: BTreeSet::new(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.insert(scope.into());
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Lookup of access tokens; implemented by the host's persistence layer.
pub trait TokenStore: Send + Sync {
    /// Token for `value` if it exists and has not expired.
    fn get_by_valid_token(&self, value: &str) -> Option<AccessToken>;

    /// Whether `token` carries `scope`.
    fn has_scope(&self, token: &AccessToken, scope: &str) -> bool {
        token.has_scope(scope)
    }
}

/// Host hook that establishes the caller for a request.
pub trait IdentityService: Send + Sync {
    /// Called once per request after a token has been accepted.
    fn set_caller_identity(&self, user_id: &str) {
        let _ = user_id;
    }

    /// Whether `user_id` may see exception detail on error envelopes.
    fn is_superuser(&self, user_id: &str) -> bool {
        let _ = user_id;
        false
    }
}

/// Identity service that records nothing and knows no superusers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityService for NoIdentity {}

/// Who is making the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    token: Option<AccessToken>,
    superuser: bool,
}

impl Caller {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(token: AccessToken, superuser: bool) -> Self {
        Self {
            token: Some(token),
            superuser,
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.user_id.as_str())
    }

    #[must_use]
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.superuser
    }
}

/// Credential sources of one request.
pub struct SecurityRequest<'a> {
    pub headers: &'a HeaderVec,
    pub query: &'a ParamVec,
    /// Parsed request body (JSON object or form fields)
    pub body: Option<&'a Value>,
}

impl<'a> SecurityRequest<'a> {
    /// Get a header by name (case-insensitive)
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&'a str> {
        self.query
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a string field of the request body
    #[inline]
    pub fn get_body_field(&self, name: &str) -> Option<&'a str> {
        self.body.and_then(|b| b.get(name)).and_then(Value::as_str)
    }
}
