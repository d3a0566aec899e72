use crate::dispatcher::RequestContext;
use crate::route::RouteDescriptor;

/// Application hook into the request lifecycle.
///
/// Both methods default to doing nothing.
pub trait HostHook: Send + Sync {
    /// A non-preflight request has been parsed; nothing has been checked yet.
    fn on_startup(&self, _route: &RouteDescriptor) {}

    /// The caller passed the controller's auth gate; the controller is about
    /// to be constructed.
    fn on_ready(&self, _ctx: &RequestContext) {}
}

/// Hook used when the application supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl HostHook for NoopHook {}
