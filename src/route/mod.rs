//! # Route Module
//!
//! Turns the path of an inbound API request into a [`RouteDescriptor`]: the
//! module (namespace), controller and method segments plus the requested
//! output format.
//!
//! ## Path Shape
//!
//! ```text
//! /api/{module}[/{controller}[/{method}[/{extra}...]]][.{format}]
//! ```
//!
//! - An optional trailing `.{format}` suffix is stripped first and upper-cased
//!   (`.json`, `.JSON` and `.Json` all select `JSON`).
//! - The fixed prefix (`api` by default) is removed.
//! - The controller segment defaults to the module segment and the method
//!   segment defaults to `index`.
//! - Segments after the third are kept as extra segments for remap handlers
//!   and sub-resources.
//!
//! Segments keep their case; only the format slug is normalised.

mod core;

pub use core::{
    format_from_path, strip_format_suffix, ParamVec, RouteDescriptor, DEFAULT_METHOD,
    MAX_INLINE_PARAMS,
};
