//! # Middleware Module
//!
//! Cross-cutting behaviour wrapped around every dispatched request.
//!
//! - [`CorsPolicy`] produces the CORS headers sent on preflight responses
//!   and on every regular response, alongside the fixed no-cache headers.
//! - [`HostHook`] lets the embedding application observe the request
//!   lifecycle: `on_startup` when handling begins and `on_ready` once the
//!   caller has passed the controller's auth gate. [`NoopHook`] is used
//!   when the application supplies none.

mod cors;
mod hook;

pub use cors::{apply_no_cache, CorsPolicy, NO_CACHE_HEADERS};
pub use hook::{HostHook, NoopHook};
