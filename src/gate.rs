//! Controller-level authentication and scope checks.

use http::Method;
use tracing::{debug, warn};

use crate::controller::ControllerDescriptor;
use crate::error::ApiError;
use crate::security::{Caller, TokenStore};

/// Run the controller's authentication predicate, then its scope
/// requirement.
///
/// # Errors
///
/// The predicate's rejection (401 by default), or 401
/// `Access token with "<scope>" scope is required.` when the caller's token
/// lacks the controller's required scope. Anonymous callers never satisfy a
/// scope requirement.
pub fn check(
    controller: &ControllerDescriptor,
    method: &Method,
    name: &str,
    caller: &Caller,
    store: &dyn TokenStore,
) -> Result<(), ApiError> {
    if let Some((status, error)) = controller.is_authenticated(method, name, caller).rejection() {
        warn!(
            controller = controller.name(),
            method = %method,
            status,
            "Authentication required"
        );
        return Err(ApiError::new(status, error));
    }

    if let Some(scope) = controller.require_scope() {
        let granted = caller
            .token()
            .is_some_and(|token| store.has_scope(token, scope));
        if !granted {
            warn!(controller = controller.name(), scope, "Missing required scope");
            return Err(ApiError::unauthorized(format!(
                "Access token with \"{scope}\" scope is required."
            )));
        }
    }

    debug!(controller = controller.name(), "Access granted");
    Ok(())
}
