use std::sync::Arc;

use anyhow::{Context, Result};
use http::Method;

use crate::config::CorsConfig;
use crate::dispatcher::HeaderVec;

/// Headers that stop clients and proxies caching API responses.
pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-store, no-cache, must-revalidate"),
    ("Expires", "Mon, 26 Jul 1997 05:00:00 GMT"),
    ("Pragma", "no-cache"),
];

/// Append [`NO_CACHE_HEADERS`].
pub fn apply_no_cache(headers: &mut HeaderVec) {
    for (name, value) in NO_CACHE_HEADERS {
        headers.push((Arc::from(name), value.to_string()));
    }
}

/// Static CORS policy applied to every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origin: String,
    allow_headers: Vec<String>,
    allow_methods: Vec<Method>,
    allow_credentials: bool,
    max_age: Option<u32>,
}

impl Default for CorsPolicy {
    /// Any origin, the access-token header, `GET, PUT, POST, DELETE, OPTIONS`,
    /// credentials allowed, one day preflight cache.
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_headers: CorsConfig::default().allow_headers,
            allow_methods: vec![
                Method::GET,
                Method::PUT,
                Method::POST,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allow_credentials: true,
            max_age: Some(86400),
        }
    }
}

impl CorsPolicy {
    /// Build from config.
    ///
    /// # Errors
    ///
    /// When a configured method is not a valid HTTP method token.
    pub fn from_config(config: &CorsConfig) -> Result<Self> {
        let allow_methods = config
            .allow_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                    .with_context(|| format!("invalid CORS method \"{m}\""))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            allow_origin: config.allow_origin.clone(),
            allow_headers: config.allow_headers.clone(),
            allow_methods,
            allow_credentials: config.allow_credentials,
            max_age: config.max_age,
        })
    }

    /// Append the `Access-Control-*` headers.
    pub fn apply(&self, headers: &mut HeaderVec) {
        let methods: Vec<&str> = self.allow_methods.iter().map(Method::as_str).collect();
        headers.push((
            Arc::from("Access-Control-Allow-Origin"),
            self.allow_origin.clone(),
        ));
        headers.push((
            Arc::from("Access-Control-Allow-Headers"),
            self.allow_headers.join(", "),
        ));
        headers.push((Arc::from("Access-Control-Allow-Methods"), methods.join(", ")));
        if self.allow_credentials {
            headers.push((
                Arc::from("Access-Control-Allow-Credentials"),
                "true".to_string(),
            ));
        }
        if let Some(max_age) = self.max_age {
            headers.push((Arc::from("Access-Control-Max-Age"), max_age.to_string()));
        }
    }

    #[must_use]
    pub fn headers(&self) -> HeaderVec {
        let mut headers = HeaderVec::new();
        self.apply(&mut headers);
        headers
    }
}
