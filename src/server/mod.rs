//! # Server Module
//!
//! Binds an [`ApiRouter`](crate::dispatcher::ApiRouter) to `may_minihttp`.
//!
//! - [`request`] turns a raw `may_minihttp::Request` into the dispatcher's
//!   [`ApiRequest`](crate::dispatcher::ApiRequest): lower-cased headers,
//!   query parameters, and a JSON or form-urlencoded body.
//! - [`response`] writes an [`ApiOutput`](crate::dispatcher::ApiOutput) back,
//!   and renders the generic 500 page for production dispatch failures.
//! - [`service`] is the `HttpService` implementation. Paths outside the
//!   configured URI prefix get a plain JSON 404.
//! - [`http_server`] starts the service and hands back a [`ServerHandle`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use apirouter::config::RouterConfig;
//! use apirouter::dispatcher::ApiRouter;
//! use apirouter::server::serve;
//!
//! let router = ApiRouter::builder(RouterConfig::default()).build().unwrap();
//! let handle = serve(Arc::new(router), "127.0.0.1:8080").unwrap();
//! handle.join().unwrap();
//! ```

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{serve, HttpServer, ServerHandle};
pub use request::{parse_request, ParsedRequest};
pub use service::{is_api_path, ApiService};
