use http::StatusCode;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::dispatcher::ApiOutput;
use crate::error::DispatchError;

/// Message sent when production errors reach the process-wide handler.
pub const GENERIC_ERROR_MESSAGE: &str = "Sorry, an error occurred from which we could not recover. \
The technical team have been informed. We apologise for the inconvenience.";

static HEADER_LINES: Lazy<dashmap::DashMap<String, &'static str>> = Lazy::new(dashmap::DashMap::new);

/// `may_minihttp` keeps header lines as `&'static str`; each distinct line is
/// leaked once and reused afterwards.
pub fn intern_header(line: String) -> &'static str {
    if let Some(existing) = HEADER_LINES.get(&line) {
        return *existing;
    }
    let key = line.clone();
    *HEADER_LINES
        .entry(key)
        .or_insert_with(|| Box::leak(line.into_boxed_str()))
}

pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Write a dispatcher output.
pub fn write_output(res: &mut Response, output: &ApiOutput) {
    res.status_code(usize::from(output.status), status_reason(output.status));
    for (name, value) in &output.headers {
        res.header(intern_header(format!("{name}: {value}")));
    }
    if let Some(content_type) = output.content_type {
        res.header(intern_header(format!("Content-Type: {content_type}")));
    }
    res.body_vec(output.body.clone());
}

pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(usize::from(status), status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

/// Generic 500 for a production [`DispatchError`]. JSON requests get
/// `application/json`; every other format gets `text/html`.
pub fn write_dispatch_failure(res: &mut Response, err: &DispatchError) {
    let body = json!({"status": 500, "error": GENERIC_ERROR_MESSAGE});
    res.status_code(500, status_reason(500));
    if err.format().eq_ignore_ascii_case("JSON") {
        res.header("Content-Type: application/json");
    } else {
        res.header("Content-Type: text/html");
    }
    res.body_vec(body.to_string().into_bytes());
}
