use std::collections::HashMap;
use std::fmt;

use http::Method;

use crate::dispatcher::RequestContext;
use crate::envelope::ApiResponse;
use crate::error::HandlerError;

/// Result of a handler method.
pub type HandlerResult = Result<ApiResponse, HandlerError>;

/// Handler bound to a verb and method name.
pub type ExactHandler<C> = Box<dyn Fn(&mut C, &mut RequestContext) -> HandlerResult + Send + Sync>;

/// Catch-all handler; receives the requested method name first.
pub type RemapHandler<C> =
    Box<dyn Fn(&mut C, &str, &mut RequestContext) -> HandlerResult + Send + Sync>;

/// HTTP verb a handler is registered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Http(Method),
    /// Any verb
    Any,
}

impl Verb {
    /// Lower-case prefix used in handler names (`get`, `any`).
    #[must_use]
    pub fn prefix(&self) -> String {
        match self {
            Verb::Http(m) => m.as_str().to_ascii_lowercase(),
            Verb::Any => "any".to_string(),
        }
    }
}

impl From<Method> for Verb {
    fn from(method: Method) -> Self {
        Verb::Http(method)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Http(m) => write!(f, "{m}"),
            Verb::Any => f.write_str("ANY"),
        }
    }
}

/// Handler methods of one controller type.
pub struct MethodTable<C> {
    exact: HashMap<(Verb, String), ExactHandler<C>>,
    remap: HashMap<Verb, RemapHandler<C>>,
}

impl<C> Default for MethodTable<C> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            remap: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for MethodTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exact: Vec<String> = self
            .exact
            .keys()
            .map(|(verb, name)| format!("{verb} {name}"))
            .collect();
        exact.sort();
        let mut remap: Vec<String> = self.remap.keys().map(ToString::to_string).collect();
        remap.sort();
        f.debug_struct("MethodTable")
            .field("exact", &exact)
            .field("remap", &remap)
            .finish()
    }
}

impl<C> MethodTable<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `verb` and method `name`. A later
    /// registration for the same pair replaces the earlier one.
    pub fn exact<F>(&mut self, verb: impl Into<Verb>, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.exact
            .insert((verb.into(), name.to_ascii_lowercase()), Box::new(handler));
        self
    }

    pub fn get<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.exact(Method::GET, name, handler)
    }

    pub fn post<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.exact(Method::POST, name, handler)
    }

    pub fn put<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.exact(Method::PUT, name, handler)
    }

    pub fn delete<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.exact(Method::DELETE, name, handler)
    }

    /// Handler for method `name` under any verb.
    pub fn any<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.exact(Verb::Any, name, handler)
    }

    /// Catch-all for `verb`.
    pub fn remap<F>(&mut self, verb: impl Into<Verb>, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &str, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.remap.insert(verb.into(), Box::new(handler));
        self
    }

    /// Catch-all for every verb.
    pub fn any_remap<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &str, &mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.remap(Verb::Any, handler)
    }

    #[must_use]
    pub fn exact_handler(&self, verb: &Verb, name: &str) -> Option<&ExactHandler<C>> {
        self.exact.get(&(verb.clone(), name.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn remap_handler(&self, verb: &Verb) -> Option<&RemapHandler<C>> {
        self.remap.get(verb)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len() + self.remap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
