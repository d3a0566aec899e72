use std::io::Read;
use std::sync::Arc;

use http::Method;
use may_minihttp::Request;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::dispatcher::{ApiRequest, HeaderVec};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::route::ParamVec;

/// Request data extracted from a `may_minihttp::Request`.
#[derive(Debug, PartialEq)]
pub struct ParsedRequest {
    pub method: String,
    /// Path without the query string
    pub path: String,
    /// Lower-cased header names
    pub headers: HeaderVec,
    pub query_params: ParamVec,
    /// JSON body, or form fields as an object
    pub body: Option<Value>,
}

impl ParsedRequest {
    /// Convert for the dispatcher.
    ///
    /// # Errors
    ///
    /// When the request method is not a valid HTTP method token.
    pub fn into_api_request(self) -> Result<ApiRequest, http::method::InvalidMethod> {
        let method = Method::from_bytes(self.method.as_bytes())?;
        let request_id = RequestId::from_header_or_new(
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(REQUEST_ID_HEADER))
                .map(|(_, v)| v.as_str()),
        );
        Ok(ApiRequest {
            request_id,
            method,
            path: self.path,
            query_params: self.query_params,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// Parse query string parameters from a URL path
pub fn parse_query_params(path: &str) -> ParamVec {
    match path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Parse a request body.
///
/// Form bodies become a JSON object of string fields; anything else is
/// parsed as JSON. Unparseable bodies are dropped.
pub fn parse_body(content_type: Option<&str>, raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    let is_form = content_type
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"));
    if is_form {
        let fields: Map<String, Value> = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        return Some(Value::Object(fields));
    }
    match serde_json::from_str(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "Request body is not JSON");
            None
        }
    }
}

/// Extract method, path, headers, query and body.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase().as_str()),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let query_params = parse_query_params(&raw_path);

    let content_type = headers
        .iter()
        .find(|(k, _)| k.as_ref() == "content-type")
        .map(|(_, v)| v.clone());
    let mut raw_body = String::new();
    let body = match req.body().read_to_string(&mut raw_body) {
        Ok(size) if size > 0 => parse_body(content_type.as_deref(), &raw_body),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Failed to read request body");
            None
        }
    };

    info!(
        method = %method,
        path = %path,
        headers_count = headers.len(),
        query_count = query_params.len(),
        has_body = body.is_some(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        query_params,
        body,
    }
}
