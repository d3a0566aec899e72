//! # apirouter
//!
//! **apirouter** is a convention-based API dispatcher running on the `may`
//! coroutine runtime. Requests of the form
//! `/api/<module>/<controller>/<method>[.<format>]` are routed to controllers
//! registered by modules under their own namespace, gated by access tokens and
//! scopes, and rendered as uniform envelopes.
//!
//! ## Architecture
//!
//! - **[`route`]** - Path parsing into module/controller/method/format
//! - **[`registry`]** - Module manifests and the namespace table
//! - **[`controller`]** - The [`Controller`] trait and per-controller method tables
//! - **[`resolver`]** - Verb-aware method resolution (remaps before exact methods)
//! - **[`gate`]** - Controller-level authentication and scope checks
//! - **[`security`]** - Access-token stores and request-level verification
//! - **[`format`]** - Output formats and the format registry
//! - **[`envelope`]** - Handler responses and the rendered envelope
//! - **[`dispatcher`]** - [`ApiRouter`], which ties the above together
//! - **[`middleware`]** - CORS/no-cache headers and host lifecycle hooks
//! - **[`server`]** - `may_minihttp` binding
//! - **[`config`]**, **[`logging`]**, **[`request_log`]** - Ambient configuration and logs
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as ApiService<br/>(may_minihttp)
//!     participant Router as ApiRouter
//!     participant Verifier as AccessTokenVerifier
//!     participant Table as NamespaceTable
//!     participant Gate as gate::check
//!     participant Ctrl as Controller
//!
//!     Client->>Server: GET /api/app/widgets/list.json
//!     Server->>Router: ApiRequest
//!     alt OPTIONS
//!         Router-->>Client: 204 + CORS headers
//!     end
//!     Router->>Router: RouteDescriptor::parse
//!     Router->>Verifier: verify(header / body / query token)
//!     alt Invalid token
//!         Verifier-->>Client: 401 Invalid access token
//!     end
//!     Router->>Router: format registered?
//!     Router->>Table: resolve(module, controller)
//!     alt Unknown namespace or controller
//!         Table-->>Client: 404 not a valid API route
//!     end
//!     Router->>Gate: REQUIRE_AUTH / REQUIRE_SCOPE / is_authenticated
//!     Router->>Ctrl: construct, then getRemap > getList > anyRemap > anyList
//!     Ctrl-->>Router: ApiResponse
//!     Router-->>Server: ApiOutput (envelope + no-cache + CORS)
//!     Server-->>Client: HTTP Response
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use apirouter::{ApiRouter, Controller, ModuleManifest, RouterConfig};
//! use apirouter::controller::MethodTable;
//! use apirouter::dispatcher::RequestContext;
//! use apirouter::envelope::ApiResponse;
//! use apirouter::error::HandlerError;
//! use apirouter::registry::discover;
//! use serde_json::json;
//!
//! struct Ping;
//!
//! impl Controller for Ping {
//!     const NAME: &'static str = "ping";
//!
//!     fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
//!         Ok(Ping)
//!     }
//!
//!     fn register(table: &mut MethodTable<Self>) {
//!         table.get("index", |_, _| Ok(ApiResponse::new().with_data(json!("pong"))));
//!     }
//! }
//!
//! let app = ModuleManifest::app().controller::<Ping>();
//! let namespaces = discover(Some(app), Vec::new()).unwrap();
//! let router = ApiRouter::builder(RouterConfig::default())
//!     .namespaces(namespaces)
//!     .build()
//!     .unwrap();
//! let handle = apirouter::server::serve(Arc::new(router), "0.0.0.0:8080").unwrap();
//! handle.join().unwrap();
//! ```
//!
//! ## Runtime Considerations
//!
//! Handlers run synchronously inside `may` coroutines:
//!
//! - Coroutine stack size comes from `stack_size` in the router config or
//!   `APIROUTER_STACK_SIZE`
//! - Blocking operations should use `may`'s blocking facilities
//! - A panicking handler is caught and reported like an internal error

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod format;
pub mod gate;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod request_log;
pub mod resolver;
pub mod route;
pub mod security;
pub mod server;

pub use config::{Environment, RouterConfig};
pub use controller::{AuthDecision, Controller};
pub use dispatcher::{ApiOutput, ApiRequest, ApiRouter, RequestContext};
pub use envelope::{ApiResponse, Envelope};
pub use error::{ApiError, DispatchError, HandlerError};
pub use registry::{ModuleManifest, NamespaceTable};
pub use security::{AccessToken, AccessTokenVerifier, Caller, InMemoryTokenStore, TokenStore};
