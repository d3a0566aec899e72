use std::fmt;
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use super::request::{find_header, ApiRequest, HeaderVec};
use crate::ids::RequestId;
use crate::request_log::{tagged_line, RequestLog};
use crate::route::{ParamVec, RouteDescriptor};
use crate::security::{AccessToken, Caller, SecurityRequest};

/// Per-request state handed to controllers.
///
/// Created when handling starts and dropped when the response is built.
pub struct RequestContext {
    request_id: RequestId,
    route: RouteDescriptor,
    caller: Caller,
    query_params: ParamVec,
    headers: HeaderVec,
    body: Option<Value>,
    log: Arc<dyn RequestLog>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("route", &self.route)
            .field("caller", &self.caller.user_id())
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    pub(crate) fn new(req: ApiRequest, route: RouteDescriptor, log: Arc<dyn RequestLog>) -> Self {
        Self {
            request_id: req.request_id,
            route,
            caller: Caller::anonymous(),
            query_params: req.query_params,
            headers: req.headers,
            body: req.body,
            log,
        }
    }

    pub(crate) fn security_request(&self) -> SecurityRequest<'_> {
        SecurityRequest {
            headers: &self.headers,
            query: &self.query_params,
            body: self.body.as_ref(),
        }
    }

    pub(crate) fn set_caller(&mut self, caller: Caller) {
        self.caller = caller;
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn route(&self) -> &RouteDescriptor {
        &self.route
    }

    #[must_use]
    pub fn http_method(&self) -> &Method {
        &self.route.http_method
    }

    /// Path segments after the method segment, e.g. `["7", "tags"]` for
    /// `/api/app/widgets/item/7/tags`.
    #[must_use]
    pub fn extra_segments(&self) -> &[String] {
        &self.route.extra_segments
    }

    #[must_use]
    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.caller.token()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.caller.user_id()
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Take ownership of the body, leaving `None`.
    pub fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }

    /// Append a line to the request log, tagged with the route.
    pub fn write_log(&self, line: impl AsRef<str>) {
        self.log.append_line(&tagged_line(&self.route, line.as_ref()));
    }
}
