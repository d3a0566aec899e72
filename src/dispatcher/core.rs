use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use arc_swap::ArcSwap;
use http::Method;
use tracing::{debug, error, info, info_span, warn};

use super::context::RequestContext;
use super::request::{ApiOutput, ApiRequest, HeaderVec};
use crate::config::RouterConfig;
use crate::envelope::{ApiResponse, Envelope, ExceptionInfo};
use crate::error::{ApiError, DispatchError, HandlerError, InternalError, UNKNOWN_ERROR_MESSAGE};
use crate::format::{render_envelope, FormatRegistry, OutputFormat, Rendered};
use crate::gate;
use crate::middleware::{apply_no_cache, CorsPolicy, HostHook, NoopHook};
use crate::registry::NamespaceTable;
use crate::request_log::{DailyFileLog, NullLog, RequestLog};
use crate::route::RouteDescriptor;
use crate::security::{AccessTokenVerifier, IdentityService, InMemoryTokenStore, NoIdentity, TokenStore};

/// Body used when an envelope cannot be rendered at all.
const RENDER_FAILURE_BODY: &[u8] = br#"{"status":500,"error":"Failed to render response"}"#;

/// The API request dispatcher.
///
/// Built once at startup; `handle` may be called concurrently.
pub struct ApiRouter {
    config: RouterConfig,
    formats: FormatRegistry,
    namespaces: ArcSwap<NamespaceTable>,
    verifier: AccessTokenVerifier,
    cors: CorsPolicy,
    hook: Arc<dyn HostHook>,
    log: Arc<dyn RequestLog>,
}

/// Builder for [`ApiRouter`].
pub struct ApiRouterBuilder {
    config: RouterConfig,
    formats: Option<FormatRegistry>,
    namespaces: NamespaceTable,
    token_store: Option<Arc<dyn TokenStore>>,
    identity: Arc<dyn IdentityService>,
    hook: Arc<dyn HostHook>,
    log: Option<Arc<dyn RequestLog>>,
}

impl ApiRouterBuilder {
    #[must_use]
    pub fn formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Some(formats);
        self
    }

    #[must_use]
    pub fn namespaces(mut self, namespaces: NamespaceTable) -> Self {
        self.namespaces = namespaces;
        self
    }

    #[must_use]
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: Arc<dyn IdentityService>) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn hook(mut self, hook: Arc<dyn HostHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Request log; defaults to a [`DailyFileLog`] when `log.dir` is
    /// configured, otherwise nothing is written.
    #[must_use]
    pub fn request_log(mut self, log: Arc<dyn RequestLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// # Errors
    ///
    /// When the configured default format is not registered, a CORS method
    /// is invalid, or the request log directory cannot be created.
    pub fn build(self) -> Result<ApiRouter> {
        let formats = match self.formats {
            Some(formats) => formats,
            None => FormatRegistry::builder()
                .default_slug(&self.config.default_format)
                .build()?,
        };
        if !formats.contains(&self.config.default_format) {
            return Err(anyhow!(
                "default output format \"{}\" is not registered",
                self.config.default_format
            ));
        }

        let store = self
            .token_store
            .unwrap_or_else(|| Arc::new(InMemoryTokenStore::new()));
        let verifier = AccessTokenVerifier::new(store)
            .header_name(self.config.access_token.header.clone())
            .param_name(self.config.access_token.param.clone())
            .identity(self.identity);

        let log: Arc<dyn RequestLog> = match (self.log, &self.config.log.dir) {
            (Some(log), _) => log,
            (None, Some(dir)) => Arc::new(DailyFileLog::new(dir, &self.config.log.prefix)?),
            (None, None) => Arc::new(NullLog),
        };

        let cors = CorsPolicy::from_config(&self.config.cors)?;

        info!(
            environment = %self.config.environment,
            uri_prefix = %self.config.uri_prefix,
            formats = ?formats.slugs(),
            namespaces = ?self.namespaces.names(),
            "API router ready"
        );

        Ok(ApiRouter {
            config: self.config,
            formats,
            namespaces: ArcSwap::from_pointee(self.namespaces),
            verifier,
            cors,
            hook: self.hook,
            log,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl ApiRouter {
    #[must_use]
    pub fn builder(config: RouterConfig) -> ApiRouterBuilder {
        ApiRouterBuilder {
            config,
            formats: None,
            namespaces: NamespaceTable::default(),
            token_store: None,
            identity: Arc::new(NoIdentity),
            hook: Arc::new(NoopHook),
            log: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    #[must_use]
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Current namespace table.
    #[must_use]
    pub fn namespaces(&self) -> Arc<NamespaceTable> {
        self.namespaces.load_full()
    }

    /// Swap in a freshly discovered namespace table. In-flight requests
    /// finish against the table they started with.
    pub fn replace_namespaces(&self, namespaces: NamespaceTable) {
        info!(namespaces = ?namespaces.names(), "API namespaces replaced");
        self.namespaces.store(Arc::new(namespaces));
    }

    /// Handle one request.
    ///
    /// Always produces a response, except in production where internal
    /// errors and handler panics are returned as [`DispatchError`] for the
    /// process-wide handler.
    pub fn handle(&self, req: ApiRequest) -> Result<ApiOutput, DispatchError> {
        if req.method == Method::OPTIONS {
            debug!(path = %req.path, "CORS preflight");
            return Ok(ApiOutput {
                status: 204,
                headers: self.cors.headers(),
                content_type: None,
                body: Vec::new(),
            });
        }

        let started = Instant::now();
        let route = RouteDescriptor::parse(
            req.method.clone(),
            &req.path,
            &self.config.uri_prefix,
            self.formats.default_slug(),
        );
        let span = info_span!(
            "api_request",
            request_id = %req.request_id,
            http_method = %route.http_method,
            module = %route.module,
            controller = %route.controller,
            method = %route.method
        );
        let _entered = span.enter();

        let format = self.formats.get(&route.format);
        let render_with = format
            .clone()
            .unwrap_or_else(|| self.formats.default_format());

        let mut ctx = RequestContext::new(req, route, Arc::clone(&self.log));
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.hook.on_startup(ctx.route());
            self.run(&mut ctx, format.is_some())
        }));

        let envelope = match outcome {
            Ok(Ok(response)) => Envelope::success(response),
            Ok(Err(HandlerError::Api(err))) => self.api_error_envelope(&ctx, &err),
            Ok(Err(HandlerError::Internal(err))) => self.internal_error_envelope(&ctx, err)?,
            Err(payload) => self.panic_envelope(&ctx, &panic_message(payload.as_ref()))?,
        };

        let output = self.output(&envelope, render_with.as_ref());
        info!(
            status = output.status,
            format = %render_with.slug(),
            duration_ms = started.elapsed().as_millis() as u64,
            "API request complete"
        );
        Ok(output)
    }

    fn run(&self, ctx: &mut RequestContext, format_known: bool) -> Result<ApiResponse, HandlerError> {
        let caller = self.verifier.verify(&ctx.security_request())?;
        ctx.set_caller(caller);

        if !format_known {
            return Err(ApiError::bad_request(format!(
                "\"{}\" is not a valid format.",
                ctx.route().format
            ))
            .into());
        }

        let http_method = ctx.route().http_method.clone();
        let method_name = ctx.route().method.clone();

        let controller = {
            let namespaces = self.namespaces.load();
            let route = ctx.route();
            match namespaces.resolve(&route.module, &route.controller) {
                Some(controller) => controller.clone(),
                None => {
                    return Err(ApiError::method_not_found(&route.display_path()).into());
                }
            }
        };
        debug!(controller = controller.name(), "Controller resolved");

        gate::check(
            &controller,
            &http_method,
            &method_name,
            ctx.caller(),
            self.verifier.store().as_ref(),
        )?;

        self.hook.on_ready(ctx);

        let Some(response) = controller.dispatch(&http_method, &method_name, ctx)? else {
            let route = format!("{}: {}", http_method, ctx.route().display_path());
            return Err(ApiError::method_not_found(&route).into());
        };

        if !response.is_well_formed() {
            return Err(HandlerError::internal(anyhow!(
                "Handler \"{}\" returned a malformed response (code {})",
                ctx.route().display_path(),
                response.code
            )));
        }
        Ok(response)
    }

    fn api_error_envelope(&self, ctx: &RequestContext, err: &ApiError) -> Envelope {
        let mut envelope = Envelope::error(err.status(), err.message(), err.details().cloned());
        if self
            .config
            .exception_detail
            .exposes(self.config.environment, ctx.caller().is_superuser())
        {
            envelope = envelope.with_exception(ExceptionInfo::new(
                std::any::type_name::<ApiError>(),
                Some(err.location()),
            ));
        }
        warn!(status = envelope.status, error = %err.message(), "API error");
        self.log_envelope(ctx, &envelope);
        envelope
    }

    fn internal_error_envelope(
        &self,
        ctx: &RequestContext,
        err: InternalError,
    ) -> Result<Envelope, DispatchError> {
        let route = ctx.route();
        if self.config.environment.is_production() {
            return Err(DispatchError::Internal {
                route: route.display_path(),
                format: route.format.clone(),
                error: err,
            });
        }
        error!(
            error = %err.error,
            kind = err.type_name,
            file = err.location.file,
            line = err.location.line,
            "Unhandled error in API handler"
        );
        let message = err.error.to_string();
        let message = if message.is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        let envelope = Envelope::error(500, message, None)
            .with_exception(ExceptionInfo::new(err.type_name, Some(err.location)));
        self.log_envelope(ctx, &envelope);
        Ok(envelope)
    }

    fn panic_envelope(&self, ctx: &RequestContext, message: &str) -> Result<Envelope, DispatchError> {
        let route = ctx.route();
        if self.config.environment.is_production() {
            return Err(DispatchError::Panic {
                route: route.display_path(),
                format: route.format.clone(),
                message: message.to_string(),
            });
        }
        error!(panic_message = %message, "API handler panicked");
        let envelope = Envelope::error(500, format!("Handler panicked: {message}"), None)
            .with_exception(ExceptionInfo::new("panic", None));
        self.log_envelope(ctx, &envelope);
        Ok(envelope)
    }

    fn log_envelope(&self, ctx: &RequestContext, envelope: &Envelope) {
        match serde_json::to_string(envelope) {
            Ok(line) => ctx.write_log(line),
            Err(e) => warn!(error = %e, "Failed to serialize envelope for request log"),
        }
    }

    fn output(&self, envelope: &Envelope, format: &dyn OutputFormat) -> ApiOutput {
        let rendered = render_envelope(format, envelope, self.config.pretty_print())
            .unwrap_or_else(|e| {
                error!(error = %e, format = %format.slug(), "Failed to render envelope");
                Rendered {
                    content_type: format.content_type(),
                    bytes: RENDER_FAILURE_BODY.to_vec(),
                }
            });

        let mut headers = HeaderVec::new();
        apply_no_cache(&mut headers);
        self.cors.apply(&mut headers);

        ApiOutput {
            status: envelope.status,
            headers,
            content_type: Some(rendered.content_type),
            body: rendered.bytes,
        }
    }
}
