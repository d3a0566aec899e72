//! Handler method resolution.
//!
//! For a request with verb `V` and method name `name`, the candidates are
//! tried strictly in this order and the first registered one wins:
//!
//! 1. `{V}Remap`: catch-all for the verb, called with `name`
//! 2. `{V}{Name}`: exact match
//! 3. `anyRemap`: catch-all for every verb, called with `name`
//! 4. `any{Name}`: exact match under any verb
//!
//! A remap handler therefore shadows every exact handler registered for the
//! same verb, and a verb-specific handler shadows verb-agnostic ones.

use http::Method;
use tracing::debug;

use crate::controller::{ExactHandler, HandlerResult, MethodTable, RemapHandler, Verb};
use crate::dispatcher::RequestContext;

/// One of the four resolution candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    VerbRemap,
    VerbMethod,
    AnyRemap,
    AnyMethod,
}

/// Order in which candidates are tried.
pub const RESOLUTION_ORDER: [Candidate; 4] = [
    Candidate::VerbRemap,
    Candidate::VerbMethod,
    Candidate::AnyRemap,
    Candidate::AnyMethod,
];

impl Candidate {
    #[must_use]
    pub fn is_remap(self) -> bool {
        matches!(self, Candidate::VerbRemap | Candidate::AnyRemap)
    }

    /// Conventional handler name, e.g. `putRemap` or `anyList`.
    #[must_use]
    pub fn handler_name(self, method: &Method, name: &str) -> String {
        let verb = match self {
            Candidate::VerbRemap | Candidate::VerbMethod => Verb::Http(method.clone()),
            Candidate::AnyRemap | Candidate::AnyMethod => Verb::Any,
        };
        if self.is_remap() {
            format!("{}Remap", verb.prefix())
        } else {
            format!("{}{}", verb.prefix(), capitalize(name))
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

enum Bound<'t, C> {
    Exact(&'t ExactHandler<C>),
    Remap(&'t RemapHandler<C>),
}

/// A resolved handler, ready to invoke.
pub struct Resolution<'t, C> {
    pub candidate: Candidate,
    handler: Bound<'t, C>,
}

impl<C> Resolution<'_, C> {
    /// Call the handler. Remap handlers receive `name` first.
    pub fn invoke(&self, controller: &mut C, name: &str, ctx: &mut RequestContext) -> HandlerResult {
        match self.handler {
            Bound::Exact(h) => h(controller, ctx),
            Bound::Remap(h) => h(controller, name, ctx),
        }
    }
}

/// Find the handler for `method` and `name`.
#[must_use]
pub fn resolve<'t, C>(
    table: &'t MethodTable<C>,
    method: &Method,
    name: &str,
) -> Option<Resolution<'t, C>> {
    let verb = Verb::Http(method.clone());
    for candidate in RESOLUTION_ORDER {
        let handler = match candidate {
            Candidate::VerbRemap => table.remap_handler(&verb).map(Bound::Remap),
            Candidate::VerbMethod => table.exact_handler(&verb, name).map(Bound::Exact),
            Candidate::AnyRemap => table.remap_handler(&Verb::Any).map(Bound::Remap),
            Candidate::AnyMethod => table.exact_handler(&Verb::Any, name).map(Bound::Exact),
        };
        if let Some(handler) = handler {
            debug!(
                handler = %candidate.handler_name(method, name),
                remap = candidate.is_remap(),
                "Handler resolved"
            );
            return Some(Resolution { candidate, handler });
        }
    }
    None
}
