//! # Controller Module
//!
//! Controllers are plain Rust types grouped under an API namespace. Each one
//! implements [`Controller`], declaring its authentication requirements as
//! associated constants and registering its handler methods in a
//! [`MethodTable`] once at startup.
//!
//! ## Handler Naming
//!
//! A handler is registered for an HTTP verb (or for any verb) and either a
//! method name or as a *remap* catch-all:
//!
//! | Registration | Matches | Extra argument |
//! |--------------|---------|----------------|
//! | `table.remap(Method::PUT, ..)` | every `PUT` | requested method name |
//! | `table.get("list", ..)` | `GET .../list` | none |
//! | `table.any_remap(..)` | every verb | requested method name |
//! | `table.any("list", ..)` | any verb on `.../list` | none |
//!
//! The lookup order between these is described in [`crate::resolver`].
//! Method names match case-insensitively.
//!
//! ## Example
//!
//! ```rust
//! use apirouter::controller::{Controller, MethodTable};
//! use apirouter::dispatcher::RequestContext;
//! use apirouter::envelope::ApiResponse;
//! use apirouter::error::HandlerError;
//! use http::Method;
//! use serde_json::json;
//!
//! struct Widgets;
//!
//! impl Widgets {
//!     fn any_list(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
//!         Ok(ApiResponse::new().with_data(json!([{"id": 1}])))
//!     }
//!
//!     fn put_remap(&mut self, id: &str, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
//!         Ok(ApiResponse::new().with_data(json!({"updated": id})))
//!     }
//! }
//!
//! impl Controller for Widgets {
//!     const NAME: &'static str = "Widgets";
//!
//!     fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
//!         Ok(Widgets)
//!     }
//!
//!     fn register(table: &mut MethodTable<Self>) {
//!         table.any("list", Self::any_list);
//!         table.remap(Method::PUT, Self::put_remap);
//!     }
//! }
//! ```

use http::{Method, StatusCode};

use crate::dispatcher::RequestContext;
use crate::error::HandlerError;
use crate::security::Caller;

mod descriptor;
mod table;

pub use descriptor::ControllerDescriptor;
pub use table::{ExactHandler, HandlerResult, MethodTable, RemapHandler, Verb};

/// Outcome of a controller's authentication predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    /// 401, "You must be logged in to access this resource"
    Deny,
    /// Reject with a custom message and/or status. A missing status means
    /// 401; a missing message is the status' reason phrase.
    Custom {
        error: Option<String>,
        status: Option<u16>,
    },
}

impl AuthDecision {
    #[must_use]
    pub fn custom(error: impl Into<String>, status: u16) -> Self {
        AuthDecision::Custom {
            error: Some(error.into()),
            status: Some(status),
        }
    }

    /// Status and message for a rejected decision; `None` when allowed.
    #[must_use]
    pub fn rejection(&self) -> Option<(u16, String)> {
        match self {
            AuthDecision::Allow => None,
            AuthDecision::Deny => Some((
                StatusCode::UNAUTHORIZED.as_u16(),
                "You must be logged in to access this resource".to_string(),
            )),
            AuthDecision::Custom { error, status } => {
                let status = match *status {
                    None => StatusCode::UNAUTHORIZED.as_u16(),
                    Some(s) if (100..=599).contains(&s) => s,
                    Some(_) => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                };
                let error = error.clone().unwrap_or_else(|| {
                    StatusCode::from_u16(status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("Unauthorized")
                        .to_string()
                });
                Some((status, error))
            }
        }
    }
}

impl From<bool> for AuthDecision {
    fn from(allowed: bool) -> Self {
        if allowed {
            AuthDecision::Allow
        } else {
            AuthDecision::Deny
        }
    }
}

/// An API controller.
pub trait Controller: Sized + 'static {
    /// Name the controller is requested by (`/api/<ns>/<NAME>/...`),
    /// matched case-insensitively
    const NAME: &'static str;

    /// Require a logged-in caller (checked by the default
    /// [`Controller::is_authenticated`])
    const REQUIRE_AUTH: bool = false;

    /// Scope the caller's access token must carry
    const REQUIRE_SCOPE: Option<&'static str> = None;

    /// Decide whether `caller` may invoke `name` with `method`.
    ///
    /// Runs before the controller is constructed.
    fn is_authenticated(method: &Method, name: &str, caller: &Caller) -> AuthDecision {
        let _ = (method, name);
        AuthDecision::from(!(Self::REQUIRE_AUTH && !caller.is_logged_in()))
    }

    /// Build the controller for one request.
    fn construct(ctx: &mut RequestContext) -> Result<Self, HandlerError>;

    /// Register handler methods. Called once when the controller is added
    /// to a namespace.
    fn register(table: &mut MethodTable<Self>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(AuthDecision::Allow.rejection(), None);
        assert_eq!(
            AuthDecision::Deny.rejection(),
            Some((401, "You must be logged in to access this resource".to_string()))
        );
        assert_eq!(
            AuthDecision::custom("Admins only", 403).rejection(),
            Some((403, "Admins only".to_string()))
        );
        assert_eq!(
            AuthDecision::Custom { error: None, status: Some(403) }.rejection(),
            Some((403, "Forbidden".to_string()))
        );
        assert_eq!(
            AuthDecision::Custom { error: None, status: None }.rejection(),
            Some((401, "Unauthorized".to_string()))
        );
    }

    #[test]
    fn test_rejection_status_outside_http_range() {
        assert_eq!(
            AuthDecision::custom("nope", 42).rejection(),
            Some((500, "nope".to_string()))
        );
        assert_eq!(
            AuthDecision::Custom { error: None, status: Some(1000) }.rejection(),
            Some((500, "Internal Server Error".to_string()))
        );
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(AuthDecision::from(true), AuthDecision::Allow);
        assert_eq!(AuthDecision::from(false), AuthDecision::Deny);
    }
}
