//! # Registry Module
//!
//! Groups the controllers contributed by installed modules into API
//! namespaces and resolves the `{module}/{controller}` path segments of a
//! request to a [`ControllerDescriptor`](crate::controller::ControllerDescriptor).
//!
//! ## Discovery
//!
//! Each installed module describes itself with a [`ModuleManifest`]:
//! its slug, the API namespace it claims, its controllers and an optional
//! controller-name map. [`discover`] builds the process-wide
//! [`NamespaceTable`] once at startup:
//!
//! - the application's own controllers always live in the `app` namespace
//! - a module that ships controllers without declaring a namespace is a
//!   fatal [`DiscoveryError::MissingNamespace`](crate::error::DiscoveryError)
//! - two modules claiming the same namespace is a fatal
//!   [`DiscoveryError::NamespaceConflict`](crate::error::DiscoveryError)
//!   naming both modules
//!
//! ## Controller-Name Remapping
//!
//! A module may expose a controller under an alias, e.g. `{"Posts": "BlogPost"}`.
//! Keys and values match case-insensitively. The mapping is exclusive: a
//! request for `Posts` reaches `BlogPost`, while a request for `BlogPost`
//! directly does not resolve, so each controller has one public route.
//!
//! ```rust
//! use apirouter::controller::{Controller, MethodTable};
//! use apirouter::dispatcher::RequestContext;
//! use apirouter::error::HandlerError;
//! use apirouter::registry::{discover, ModuleManifest};
//!
//! struct BlogPost;
//! impl Controller for BlogPost {
//!     const NAME: &'static str = "BlogPost";
//!     fn construct(_: &mut RequestContext) -> Result<Self, HandlerError> { Ok(BlogPost) }
//!     fn register(_: &mut MethodTable<Self>) {}
//! }
//!
//! let blog = ModuleManifest::new("acme/module-blog")
//!     .namespace("blog")
//!     .controller::<BlogPost>()
//!     .remap("Posts", "BlogPost");
//!
//! let table = discover(None, vec![blog]).unwrap();
//! assert!(table.resolve("blog", "posts").is_some());
//! assert!(table.resolve("blog", "BlogPost").is_none());
//! ```

mod core;

pub use core::{build_formats, discover, ModuleManifest, Namespace, NamespaceTable, APP_NAMESPACE};
