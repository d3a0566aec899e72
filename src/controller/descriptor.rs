use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::debug;

use super::{AuthDecision, Controller, MethodTable};
use crate::dispatcher::RequestContext;
use crate::envelope::ApiResponse;
use crate::error::HandlerError;
use crate::resolver;
use crate::security::Caller;

trait ErasedController: Send + Sync {
    fn name(&self) -> &'static str;
    fn require_auth(&self) -> bool;
    fn require_scope(&self) -> Option<&'static str>;
    fn is_authenticated(&self, method: &Method, name: &str, caller: &Caller) -> AuthDecision;
    fn dispatch(
        &self,
        method: &Method,
        name: &str,
        ctx: &mut RequestContext,
    ) -> Result<Option<ApiResponse>, HandlerError>;
    fn handler_count(&self) -> usize;
}

struct Typed<C> {
    table: MethodTable<C>,
}

impl<C: Controller> ErasedController for Typed<C> {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn require_auth(&self) -> bool {
        C::REQUIRE_AUTH
    }

    fn require_scope(&self) -> Option<&'static str> {
        C::REQUIRE_SCOPE.filter(|s| !s.is_empty())
    }

    fn is_authenticated(&self, method: &Method, name: &str, caller: &Caller) -> AuthDecision {
        C::is_authenticated(method, name, caller)
    }

    fn dispatch(
        &self,
        method: &Method,
        name: &str,
        ctx: &mut RequestContext,
    ) -> Result<Option<ApiResponse>, HandlerError> {
        let mut controller = C::construct(ctx)?;
        debug!(controller = C::NAME, "Controller constructed");
        match resolver::resolve(&self.table, method, name) {
            Some(resolution) => resolution.invoke(&mut controller, name, ctx).map(Some),
            None => Ok(None),
        }
    }

    fn handler_count(&self) -> usize {
        self.table.len()
    }
}

/// Type-erased controller with its handler table.
///
/// Built once per controller type at startup; cheap to clone.
#[derive(Clone)]
pub struct ControllerDescriptor {
    inner: Arc<dyn ErasedController>,
}

impl fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("name", &self.name())
            .field("require_auth", &self.require_auth())
            .field("require_scope", &self.require_scope())
            .field("handlers", &self.inner.handler_count())
            .finish()
    }
}

impl ControllerDescriptor {
    /// Describe controller `C`, running its [`Controller::register`].
    #[must_use]
    pub fn of<C: Controller>() -> Self {
        let mut table = MethodTable::new();
        C::register(&mut table);
        Self {
            inner: Arc::new(Typed { table }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    #[must_use]
    pub fn require_auth(&self) -> bool {
        self.inner.require_auth()
    }

    /// Required scope; empty scopes count as none.
    #[must_use]
    pub fn require_scope(&self) -> Option<&'static str> {
        self.inner.require_scope()
    }

    #[must_use]
    pub fn is_authenticated(&self, method: &Method, name: &str, caller: &Caller) -> AuthDecision {
        self.inner.is_authenticated(method, name, caller)
    }

    /// Construct the controller, then resolve and invoke the handler.
    ///
    /// `Ok(None)` means the controller has no handler for `method`/`name`.
    pub fn dispatch(
        &self,
        method: &Method,
        name: &str,
        ctx: &mut RequestContext,
    ) -> Result<Option<ApiResponse>, HandlerError> {
        self.inner.dispatch(method, name, ctx)
    }
}
