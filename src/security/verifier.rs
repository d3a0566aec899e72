use std::sync::Arc;

use tracing::{debug, warn};

use super::{Caller, IdentityService, NoIdentity, SecurityRequest, TokenStore};
use crate::error::ApiError;

/// Default header carrying the access token.
pub const DEFAULT_TOKEN_HEADER: &str = "X-Access-Token";

/// Default body field and query parameter carrying the access token.
pub const DEFAULT_TOKEN_PARAM: &str = "accessToken";

/// Extracts and validates the access token of a request.
pub struct AccessTokenVerifier {
    header: String,
    param: String,
    store: Arc<dyn TokenStore>,
    identity: Arc<dyn IdentityService>,
}

impl AccessTokenVerifier {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            header: DEFAULT_TOKEN_HEADER.to_string(),
            param: DEFAULT_TOKEN_PARAM.to_string(),
            store,
            identity: Arc::new(NoIdentity),
        }
    }

    #[must_use]
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header = name.into();
        self
    }

    #[must_use]
    pub fn param_name(mut self, name: impl Into<String>) -> Self {
        self.param = name.into();
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: Arc<dyn IdentityService>) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Header first, then body field, then query parameter. Empty values
    /// count as absent.
    pub fn extract_token<'a>(&self, req: &SecurityRequest<'a>) -> Option<&'a str> {
        req.get_header(&self.header)
            .filter(|t| !t.is_empty())
            .or_else(|| req.get_body_field(&self.param).filter(|t| !t.is_empty()))
            .or_else(|| req.get_query(&self.param).filter(|t| !t.is_empty()))
    }

    /// Resolve the caller of a request.
    ///
    /// # Errors
    ///
    /// `401 Invalid access token` when a token is present but unknown or
    /// expired.
    pub fn verify(&self, req: &SecurityRequest) -> Result<Caller, ApiError> {
        let Some(value) = self.extract_token(req) else {
            debug!("No access token supplied, continuing anonymously");
            return Ok(Caller::anonymous());
        };
        let Some(token) = self.store.get_by_valid_token(value) else {
            warn!("Rejected invalid access token");
            return Err(ApiError::unauthorized("Invalid access token"));
        };
        self.identity.set_caller_identity(&token.user_id);
        let superuser = self.identity.is_superuser(&token.user_id);
        debug!(user_id = %token.user_id, superuser, "Access token verified");
        Ok(Caller::authenticated(token, superuser))
    }
}
