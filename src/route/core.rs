use std::sync::Arc;

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use tracing::debug;

/// Method segment used when the path stops at the controller.
pub const DEFAULT_METHOD: &str = "index";

/// Maximum number of query/body parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for query strings and form bodies.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

#[allow(clippy::expect_used)]
static FORMAT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([A-Za-z]*)$").expect("format suffix pattern is valid"));

/// Returns the upper-cased format slug from a trailing `.ext`, if one is present.
///
/// An empty suffix (`/api/app/widgets.`) counts as absent.
#[must_use]
pub fn format_from_path(path: &str) -> Option<String> {
    FORMAT_SUFFIX
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_uppercase())
}

/// Removes exactly one trailing `.ext` suffix.
#[must_use]
pub fn strip_format_suffix(path: &str) -> &str {
    match FORMAT_SUFFIX.find(path) {
        Some(m) => &path[..m.start()],
        None => path,
    }
}

/// Parsed module/controller/method/format tuple for one request.
///
/// Built once when request handling starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// HTTP verb of the request
    pub http_method: Method,
    /// First segment; also the namespace key
    pub module: String,
    /// Second segment, or the module segment when absent
    pub controller: String,
    /// Third segment, or `index` when absent
    pub method: String,
    /// Upper-cased format slug (requested, or the default)
    pub format: String,
    /// Whether `format` came from the path rather than the default
    pub format_requested: bool,
    /// Segments after the method segment
    pub extra_segments: Vec<String>,
}

impl RouteDescriptor {
    /// Parse a request path.
    ///
    /// `prefix` is the fixed leading segment (without slashes) and
    /// `default_format` is used when the path carries no suffix.
    #[must_use]
    pub fn parse(http_method: Method, path: &str, prefix: &str, default_format: &str) -> Self {
        let requested = format_from_path(path);
        let format_requested = requested.is_some();
        let format = requested.unwrap_or_else(|| default_format.to_ascii_uppercase());

        let trimmed = strip_format_suffix(path).trim_start_matches('/');
        let rest = trimmed
            .strip_prefix(prefix)
            .filter(|r| r.is_empty() || r.starts_with('/'))
            .map(|r| r.trim_start_matches('/'))
            .unwrap_or(trimmed);

        let mut segments = rest.split('/');
        let module = segments.next().unwrap_or_default().to_string();
        let controller = segments
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| module.clone());
        let method = segments
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_METHOD)
            .to_string();
        let extra_segments: Vec<String> = segments.map(str::to_string).collect();

        debug!(
            module = %module,
            controller = %controller,
            method = %method,
            format = %format,
            extra = extra_segments.len(),
            "Route parsed"
        );

        Self {
            http_method,
            module,
            controller,
            method,
            format,
            format_requested,
            extra_segments,
        }
    }

    /// `module/controller/method`, lower-cased, as used in not-found messages.
    #[must_use]
    pub fn display_path(&self) -> String {
        format!("{}/{}/{}", self.module, self.controller, self.method).to_lowercase()
    }

    /// Tag used to prefix request-log lines: `[module->method]`.
    #[must_use]
    pub fn log_tag(&self) -> String {
        format!("[{}->{}]", self.module, self.method)
    }
}
