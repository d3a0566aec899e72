//! Response objects.
//!
//! [`ApiResponse`] is what a controller handler returns. [`Envelope`] is the
//! uniform wire shape the router renders: `{status, data, meta}` on success or
//! `{status, error, details}` on failure, optionally with an `exception`
//! debug block.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SourceLocation;

/// Value returned by a controller handler.
///
/// ```rust
/// use apirouter::envelope::ApiResponse;
/// use serde_json::json;
///
/// let res = ApiResponse::new()
///     .with_data(json!([{"id": 1}]))
///     .with_meta_entry("total", json!(1));
/// assert_eq!(res.code, 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status for the envelope
    pub code: u16,
    /// Payload rendered as `data`
    pub data: Value,
    /// Additional data rendered as `meta`
    pub meta: Map<String, Value>,
    /// Pre-rendered body; when set it is emitted verbatim
    pub body: Option<String>,
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiResponse {
    #[must_use]
    pub fn new() -> Self {
        Self {
            code: 200,
            data: Value::Null,
            meta: Map::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn with_meta_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Bypass the format renderer and emit `body` as-is.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Whether this response can be turned into an envelope.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        (100..=599).contains(&self.code)
    }
}

/// Debug block attached to error envelopes for privileged callers or
/// non-production environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl ExceptionInfo {
    #[must_use]
    pub fn new(kind: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            kind: kind.into(),
            file: location.map(|l| l.file),
            line: location.map(|l| l.line),
        }
    }
}

/// Uniform response object produced for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub status: u16,
    /// Pre-rendered body; never serialized
    #[serde(skip)]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
}

impl Envelope {
    /// Success envelope from a handler response.
    #[must_use]
    pub fn success(response: ApiResponse) -> Self {
        Self {
            status: response.code,
            body: response.body,
            data: Some(response.data),
            meta: Some(response.meta),
            error: None,
            details: None,
            exception: None,
        }
    }

    /// Error envelope; missing details render as an empty map.
    #[must_use]
    pub fn error(status: u16, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            status,
            body: None,
            data: None,
            meta: None,
            error: Some(message.into()),
            details: Some(details.unwrap_or_else(|| Value::Object(Map::new()))),
            exception: None,
        }
    }

    #[must_use]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
