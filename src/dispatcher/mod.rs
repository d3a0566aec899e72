//! # Dispatcher Module
//!
//! [`ApiRouter`] is the hub of the crate: it takes one [`ApiRequest`] from
//! the HTTP layer and turns it into one [`ApiOutput`], whatever happens in
//! between.
//!
//! ## Request Flow
//!
//! 1. `OPTIONS` requests are answered immediately with `204` and the CORS
//!    headers. Nothing else runs.
//! 2. The path is parsed into a [`RouteDescriptor`](crate::route::RouteDescriptor)
//!    and the output format is fixed, so every later error is rendered in
//!    the format the client asked for (or the default one if the requested
//!    format does not exist).
//! 3. The access token is verified and the caller established.
//! 4. An unregistered format is rejected with `400`.
//! 5. The namespace table resolves `{module}/{controller}`; unknown routes
//!    are `404`.
//! 6. The controller's auth predicate and required scope are checked.
//! 7. The [`HostHook`](crate::middleware::HostHook) is told the request is
//!    ready, the controller is constructed and the handler is resolved and
//!    invoked (see [`crate::resolver`]).
//! 8. The resulting envelope is rendered with no-cache and CORS headers.
//!
//! ## Error Handling
//!
//! | Failure | Development | Production |
//! |---------|-------------|------------|
//! | [`ApiError`](crate::error::ApiError) | error envelope | error envelope |
//! | internal error | 500 envelope with `exception` block | `Err(DispatchError)` |
//! | handler panic | 500 envelope, `exception.type = "panic"` | `Err(DispatchError)` |
//!
//! Recoverable errors carry the `exception` block according to the
//! configured [`ExceptionDetail`](crate::config::ExceptionDetail) policy.
//! Every error envelope is also written to the request log.
//!
//! ## Example
//!
//! ```rust
//! use apirouter::config::RouterConfig;
//! use apirouter::dispatcher::{ApiRequest, ApiRouter};
//! use http::Method;
//!
//! let router = ApiRouter::builder(RouterConfig::default()).build().unwrap();
//! let out = router
//!     .handle(ApiRequest::new(Method::GET, "/api/ghost"))
//!     .unwrap();
//! assert_eq!(out.status, 404);
//! assert_eq!(
//!     out.json().unwrap()["error"],
//!     "\"ghost/ghost/index\" is not a valid API route."
//! );
//! ```

mod context;
mod core;
mod request;

pub use context::RequestContext;
pub use core::{ApiRouter, ApiRouterBuilder};
pub use request::{ApiOutput, ApiRequest, HeaderVec, MAX_INLINE_HEADERS};
