//! # Output Format Module
//!
//! Renders an [`Envelope`](crate::envelope::Envelope) to bytes plus a
//! content type. Formats are selected by the upper-cased slug taken from the
//! request path suffix (`/api/app/widgets/list.text`).
//!
//! ## Built-in Formats
//!
//! | Slug | Content-Type | Body |
//! |------|--------------|------|
//! | `JSON` | `application/json` | JSON envelope |
//! | `TEXT` (alias `TXT`) | `text/html` | the same JSON envelope |
//!
//! `TEXT` exists for browsers and tools that cannot set `Accept` headers;
//! the body is still JSON. Both formats pretty-print outside production.
//!
//! ## Registration Priority
//!
//! The [`FormatRegistry`] is built once at startup from the base set, then
//! formats contributed by modules, then formats contributed by the
//! application. A later layer replaces an earlier one with the same slug, so
//! application formats win over module formats.
//!
//! ```rust
//! use apirouter::format::{FormatRegistry, JsonFormat};
//! use std::sync::Arc;
//!
//! let registry = FormatRegistry::builder()
//!     .app_format(Arc::new(JsonFormat))
//!     .build()
//!     .unwrap();
//! assert!(registry.contains("json"));
//! ```

mod core;
mod registry;

pub use core::{render_envelope, JsonFormat, OutputFormat, Rendered, TextFormat};
pub use registry::{FormatRegistry, FormatRegistryBuilder, DEFAULT_FORMAT};
