use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::{error, warn};

use super::request::parse_request;
use super::response::{write_dispatch_failure, write_json_error, write_output};
use crate::dispatcher::ApiRouter;
use crate::route::strip_format_suffix;

/// Whether `path` falls under the API prefix: `/<prefix>` or `/<prefix>/...`,
/// with or without a format suffix.
#[must_use]
pub fn is_api_path(path: &str, prefix: &str) -> bool {
    let trimmed = strip_format_suffix(path).trim_start_matches('/');
    match trimmed.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// `may_minihttp` service that feeds API requests to an [`ApiRouter`].
#[derive(Clone)]
pub struct ApiService {
    pub router: Arc<ApiRouter>,
}

impl ApiService {
    #[must_use]
    pub fn new(router: Arc<ApiRouter>) -> Self {
        Self { router }
    }
}

impl HttpService for ApiService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);

        if !is_api_path(&parsed.path, &self.router.config().uri_prefix) {
            write_json_error(res, 404, json!({"status": 404, "error": "Not Found", "path": parsed.path}));
            return Ok(());
        }

        let api_req = match parsed.into_api_request() {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Rejecting request with invalid method");
                write_json_error(res, 400, json!({"status": 400, "error": "Invalid HTTP method"}));
                return Ok(());
            }
        };

        let request_id = api_req.request_id;
        match self.router.handle(api_req) {
            Ok(output) => write_output(res, &output),
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Unhandled error in API request");
                write_dispatch_failure(res, &e);
            }
        }
        Ok(())
    }
}
