//! # Error Module
//!
//! Two tiers of failure flow through a request:
//!
//! - [`ApiError`] is recoverable. Validation, authentication, not-found and
//!   format errors are raised as `ApiError` and always end up as a structured
//!   error envelope with a 4xx/5xx status.
//! - Internal errors ([`HandlerError::Internal`]) are misconfigurations or
//!   unexpected failures inside handler code. Outside production they are
//!   rendered with debug detail; in production they leave the dispatcher as a
//!   [`DispatchError`] so the process-wide handler can deal with them.
//!
//! Startup problems while discovering module namespaces are reported as
//! [`DiscoveryError`] and are fatal.

use std::fmt;
use std::panic::Location;

use serde::Serialize;
use serde_json::Value;

/// Status used when an error carries no usable status code.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Message used when an error carries an empty message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Where an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLocation {
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

/// Recoverable API error.
///
/// Raised by the router for routing/auth/format failures and by handlers for
/// business-level failures. `details` is rendered as the `details` map of the
/// error envelope (e.g. per-field validation messages).
#[derive(Debug, Clone)]
pub struct ApiError {
    status: u16,
    message: String,
    details: Option<Value>,
    location: SourceLocation,
}

impl ApiError {
    /// Create an error with an explicit status.
    ///
    /// A status of `0` means "unspecified" and is reported as 500.
    #[track_caller]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            location: SourceLocation::caller(),
        }
    }

    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// `"<route>" is not a valid API route.` with status 404.
    ///
    /// Controllers use this from remap handlers when the requested
    /// sub-method does not exist.
    #[track_caller]
    pub fn method_not_found(route: &str) -> Self {
        Self::not_found(format!("\"{route}\" is not a valid API route."))
    }

    /// Attach a details map to the error envelope.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Status to report; unspecified or out-of-range statuses become 500.
    #[must_use]
    pub fn status(&self) -> u16 {
        if (100..=599).contains(&self.status) {
            self.status
        } else {
            DEFAULT_ERROR_STATUS
        }
    }

    /// Message to report; empty messages become a generic one.
    #[must_use]
    pub fn message(&self) -> &str {
        if self.message.is_empty() {
            UNKNOWN_ERROR_MESSAGE
        } else {
            &self.message
        }
    }

    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.status())
    }
}

impl std::error::Error for ApiError {}

/// An unexpected failure raised from controller code.
#[derive(Debug)]
pub struct InternalError {
    pub error: anyhow::Error,
    /// Type name of the original error value
    pub type_name: &'static str,
    pub location: SourceLocation,
}

/// Error returned by controller constructors and handler methods.
///
/// Recoverable errors use [`ApiError`]; anything else travels as an
/// `anyhow::Error`, so `.context("...")?` inside a handler produces an
/// internal error.
#[derive(Debug)]
pub enum HandlerError {
    Api(ApiError),
    Internal(InternalError),
}

impl HandlerError {
    /// Wrap any error as an internal error, remembering its type name.
    #[track_caller]
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<anyhow::Error> + 'static,
    {
        HandlerError::Internal(InternalError {
            error: error.into(),
            type_name: std::any::type_name::<E>(),
            location: SourceLocation::caller(),
        })
    }
}

impl From<ApiError> for HandlerError {
    fn from(err: ApiError) -> Self {
        HandlerError::Api(err)
    }
}

impl From<anyhow::Error> for HandlerError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        HandlerError::internal(err)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Api(e) => write!(f, "{e}"),
            HandlerError::Internal(e) => write!(f, "{} ({})", e.error, e.type_name),
        }
    }
}

/// Fatal configuration error found while discovering module namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// A module ships API controllers but declares no namespace
    MissingNamespace { module: String },
    /// Two modules claim the same namespace
    NamespaceConflict {
        namespace: String,
        module: String,
        existing: String,
    },
    /// A namespace registers two controllers under the same name
    DuplicateController { namespace: String, controller: String },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::MissingNamespace { module } => write!(
                f,
                "Module \"{module}\" provides API controllers but does not declare an API namespace"
            ),
            DiscoveryError::NamespaceConflict {
                namespace,
                module,
                existing,
            } => write!(
                f,
                "Conflicting API namespace \"{namespace}\" in use by \"{module}\" and \"{existing}\""
            ),
            DiscoveryError::DuplicateController {
                namespace,
                controller,
            } => write!(
                f,
                "API controller \"{controller}\" is registered twice in namespace \"{namespace}\""
            ),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Failure that the dispatcher deliberately does not convert into an
/// envelope.
///
/// Only produced in production; the process-wide handler is expected to log
/// it and render a generic error page.
#[derive(Debug)]
pub enum DispatchError {
    /// Internal error raised by controller code
    Internal {
        /// `module/controller/method` of the failing request
        route: String,
        /// Output format selected for the request
        format: String,
        error: InternalError,
    },
    /// A handler panicked
    Panic {
        route: String,
        format: String,
        message: String,
    },
}

impl DispatchError {
    /// Output format the failing request asked for.
    #[must_use]
    pub fn format(&self) -> &str {
        match self {
            DispatchError::Internal { format, .. } | DispatchError::Panic { format, .. } => format,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Internal { route, error, .. } => write!(
                f,
                "unhandled {} in \"{route}\" at {}:{}: {}",
                error.type_name, error.location.file, error.location.line, error.error
            ),
            DispatchError::Panic { route, message, .. } => {
                write!(f, "handler for \"{route}\" panicked: {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}
