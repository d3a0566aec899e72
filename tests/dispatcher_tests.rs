//! End-to-end tests of `ApiRouter::handle` without a network server.

use std::sync::Arc;
use std::thread;

use apirouter::config::{Environment, ExceptionDetail, RouterConfig};
use apirouter::dispatcher::{ApiRequest, ApiRouter};
use apirouter::envelope::Envelope;
use apirouter::error::DispatchError;
use apirouter::format::OutputFormat;
use apirouter::middleware::HostHook;
use apirouter::registry::{build_formats, discover, ModuleManifest};
use apirouter::route::RouteDescriptor;
use http::Method;
use serde_json::{json, Value};

mod common;
use common::{router, router_with, ADMIN_TOKEN, USER_TOKEN};

fn get(path: &str) -> ApiRequest {
    ApiRequest::new(Method::GET, path)
}

fn production() -> RouterConfig {
    RouterConfig {
        environment: Environment::Production,
        ..RouterConfig::default()
    }
}

fn body(output: &apirouter::ApiOutput) -> Value {
    output.json().expect("JSON body")
}

#[test]
fn test_list_returns_success_envelope() {
    common::init_tracing();
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/list")).unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(out.content_type, Some("application/json"));
    assert_eq!(
        body(&out),
        json!({"status": 200, "data": [{"id": 1}, {"id": 2}], "meta": {"total": 2}})
    );
}

#[test]
fn test_responses_carry_cache_and_cors_headers() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/list")).unwrap();
    assert_eq!(
        out.get_header("cache-control"),
        Some("no-store, no-cache, must-revalidate")
    );
    assert_eq!(out.get_header("Expires"), Some("Mon, 26 Jul 1997 05:00:00 GMT"));
    assert_eq!(out.get_header("Pragma"), Some("no-cache"));
    assert_eq!(out.get_header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(out.get_header("Access-Control-Allow-Credentials"), Some("true"));

    let err = t.router.handle(get("/api/ghost")).unwrap();
    assert_eq!(err.get_header("Pragma"), Some("no-cache"));
    assert_eq!(err.get_header("Access-Control-Allow-Origin"), Some("*"));
}

#[test]
fn test_any_method_accepts_every_verb() {
    let t = router();
    for method in [Method::GET, Method::POST, Method::DELETE] {
        let out = t
            .router
            .handle(ApiRequest::new(method.clone(), "/api/app/widgets/list"))
            .unwrap();
        assert_eq!(out.status, 200, "{method}");
    }
}

#[test]
fn test_names_are_case_insensitive() {
    let t = router();
    let out = t.router.handle(get("/api/app/WIDGETS/List")).unwrap();
    assert_eq!(out.status, 200);
}

#[test]
fn test_verb_remap_wins_over_methods() {
    let t = router();
    let out = t
        .router
        .handle(ApiRequest::new(Method::PUT, "/api/app/widgets/list"))
        .unwrap();
    assert_eq!(body(&out)["data"], json!({"updated": "list"}));

    let out = t
        .router
        .handle(ApiRequest::new(Method::PUT, "/api/app/widgets/42"))
        .unwrap();
    assert_eq!(body(&out)["data"], json!({"updated": "42"}));
}

#[test]
fn test_missing_handler_is_404_with_verb() {
    let t = router();
    let out = t
        .router
        .handle(ApiRequest::new(Method::DELETE, "/api/app/widgets/gone"))
        .unwrap();
    assert_eq!(out.status, 404);
    assert_eq!(
        body(&out),
        json!({
            "status": 404,
            "error": "\"DELETE: app/widgets/gone\" is not a valid API route.",
            "details": {}
        })
    );
}

#[test]
fn test_unknown_namespace_and_controller() {
    let t = router();
    let out = t.router.handle(get("/api/ghost")).unwrap();
    assert_eq!(out.status, 404);
    assert_eq!(
        body(&out)["error"],
        "\"ghost/ghost/index\" is not a valid API route."
    );

    let out = t.router.handle(get("/api/app/nothing")).unwrap();
    assert_eq!(out.status, 404);
    assert_eq!(
        body(&out)["error"],
        "\"app/nothing/index\" is not a valid API route."
    );
}

#[test]
fn test_unregistered_format_is_400_in_default_format() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/list.xml")).unwrap();
    assert_eq!(out.status, 400);
    assert_eq!(out.content_type, Some("application/json"));
    assert_eq!(body(&out)["error"], "\"XML\" is not a valid format.");
}

#[test]
fn test_text_format_is_served_as_html() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/list.text")).unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(out.content_type, Some("text/html"));
    assert_eq!(body(&out)["meta"]["total"], 2);

    let out = t.router.handle(get("/api/app/widgets/list.JSON")).unwrap();
    assert_eq!(out.content_type, Some("application/json"));
}

struct XmlFormat;

impl OutputFormat for XmlFormat {
    fn slug(&self) -> &str {
        "XML"
    }

    fn content_type(&self) -> &'static str {
        "application/xml"
    }

    fn render(&self, envelope: &Envelope, _pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
        Ok(format!("<status>{}</status>", envelope.status).into_bytes())
    }
}

#[test]
fn test_application_formats_are_used() {
    let app = common::app_manifest().format(Arc::new(XmlFormat));
    let formats = build_formats(Some(&app), &[], "JSON").unwrap();
    let router = ApiRouter::builder(RouterConfig::default())
        .formats(formats)
        .namespaces(discover(Some(app), Vec::new()).unwrap())
        .build()
        .unwrap();

    let out = router.handle(get("/api/app/widgets/list.xml")).unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(out.content_type, Some("application/xml"));
    assert_eq!(out.body, b"<status>200</status>".to_vec());
}

#[test]
fn test_invalid_token_is_rejected_before_routing() {
    let t = router();
    let out = t
        .router
        .handle(get("/api/ghost").with_header("X-Access-Token", "bogus"))
        .unwrap();
    assert_eq!(out.status, 401);
    assert_eq!(body(&out)["error"], "Invalid access token");

    let out = t
        .router
        .handle(get("/api/app/widgets/list").with_query("accessToken", "bogus"))
        .unwrap();
    assert_eq!(out.status, 401);
}

#[test]
fn test_require_auth_controller() {
    let t = router();
    let out = t.router.handle(get("/api/app/account")).unwrap();
    assert_eq!(out.status, 401);
    assert_eq!(
        body(&out)["error"],
        "You must be logged in to access this resource"
    );

    let out = t
        .router
        .handle(get("/api/app/account").with_header("X-Access-Token", USER_TOKEN))
        .unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(body(&out)["data"], json!({"user_id": "7"}));

    let out = t
        .router
        .handle(get("/api/app/account").with_query("accessToken", USER_TOKEN))
        .unwrap();
    assert_eq!(out.status, 200);
}

#[test]
fn test_token_in_body_is_accepted() {
    let t = router();
    let out = t
        .router
        .handle(
            ApiRequest::new(Method::POST, "/api/app/widgets/create")
                .with_body(json!({"accessToken": USER_TOKEN, "name": "cog"})),
        )
        .unwrap();
    assert_eq!(out.status, 201);
}

#[test]
fn test_scope_requirement() {
    let t = router();
    let expected = "Access token with \"admin\" scope is required.";

    let out = t.router.handle(get("/api/app/admin")).unwrap();
    assert_eq!(out.status, 401);
    assert_eq!(body(&out)["error"], expected);

    let out = t
        .router
        .handle(get("/api/app/admin").with_header("X-Access-Token", USER_TOKEN))
        .unwrap();
    assert_eq!(out.status, 401);
    assert_eq!(body(&out)["error"], expected);

    let out = t
        .router
        .handle(get("/api/app/admin").with_header("X-Access-Token", ADMIN_TOKEN))
        .unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(body(&out)["data"], "admin");
}

#[test]
fn test_custom_auth_decision() {
    let t = router();
    let out = t.router.handle(get("/api/app/kettle/brew")).unwrap();
    assert_eq!(out.status, 418);
    assert_eq!(body(&out)["error"], "I'm a teapot");

    let out = t.router.handle(get("/api/app/kettle/pour")).unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(body(&out)["data"], json!({"kettle": "pour"}));
}

#[test]
fn test_custom_auth_status_outside_http_range_is_500() {
    let t = router();
    let out = t
        .router
        .handle(ApiRequest::new(Method::DELETE, "/api/app/kettle/pour"))
        .unwrap();
    assert_eq!(out.status, 500);
    let v = body(&out);
    assert_eq!(v["status"], 500);
    assert_eq!(v["error"], "nope");
}

#[test]
fn test_api_error_status_outside_http_range_is_500() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/oversized")).unwrap();
    assert_eq!(out.status, 500);
    let v = body(&out);
    assert_eq!(v["status"], 500);
    assert_eq!(v["error"], "too big");
}

#[test]
fn test_namespace_controller_map() {
    let t = router();
    let out = t.router.handle(get("/api/blog/articles")).unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(body(&out)["data"], json!(["hello world"]));

    let out = t.router.handle(get("/api/blog/posts")).unwrap();
    assert_eq!(out.status, 404);
    assert_eq!(
        body(&out)["error"],
        "\"blog/posts/index\" is not a valid API route."
    );
}

#[test]
fn test_api_error_details_and_exception_policy() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/invalid")).unwrap();
    assert_eq!(out.status, 400);
    let v = body(&out);
    assert_eq!(v["error"], "Invalid widget");
    assert_eq!(v["details"], json!({"name": "required"}));
    assert!(v.get("exception").is_none());

    let out = t
        .router
        .handle(get("/api/app/widgets/invalid").with_header("X-Access-Token", ADMIN_TOKEN))
        .unwrap();
    let v = body(&out);
    assert!(v["exception"]["type"].as_str().unwrap().contains("ApiError"));
    assert!(v["exception"]["file"].is_string());
    assert!(v["exception"]["line"].is_number());
}

#[test]
fn test_exception_detail_config() {
    let t = router_with(RouterConfig {
        exception_detail: ExceptionDetail::Always,
        ..RouterConfig::default()
    });
    let out = t.router.handle(get("/api/ghost")).unwrap();
    assert!(body(&out).get("exception").is_some());

    let t = router_with(RouterConfig {
        exception_detail: ExceptionDetail::Never,
        ..RouterConfig::default()
    });
    let out = t
        .router
        .handle(get("/api/ghost").with_header("X-Access-Token", ADMIN_TOKEN))
        .unwrap();
    assert!(body(&out).get("exception").is_none());
}

#[test]
fn test_internal_error_outside_production() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/explode")).unwrap();
    assert_eq!(out.status, 500);
    let v = body(&out);
    assert_eq!(v["error"], "disk on fire");
    assert!(v["exception"]["type"].as_str().unwrap().contains("anyhow"));

    let lines = t.log.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(" [app->explode] "));
    assert!(lines[0].contains("disk on fire"));
}

#[test]
fn test_internal_error_propagates_in_production() {
    let t = router_with(production());
    match t.router.handle(get("/api/app/widgets/explode.text")) {
        Err(DispatchError::Internal { route, format, error }) => {
            assert_eq!(route, "app/widgets/explode");
            assert_eq!(format, "TEXT");
            assert_eq!(error.error.to_string(), "disk on fire");
        }
        other => panic!("expected internal dispatch error, got {other:?}"),
    }
}

#[test]
fn test_recoverable_errors_are_rendered_in_production() {
    let t = router_with(production());
    let out = t.router.handle(get("/api/ghost")).unwrap();
    assert_eq!(out.status, 404);
    assert!(!out.body.contains(&b'\n'));
}

#[test]
fn test_panic_is_caught() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/panic")).unwrap();
    assert_eq!(out.status, 500);
    let v = body(&out);
    assert_eq!(v["error"], "Handler panicked: widget gears jammed");
    assert_eq!(v["exception"]["type"], "panic");

    let t = router_with(production());
    match t.router.handle(get("/api/app/widgets/panic")) {
        Err(DispatchError::Panic { message, .. }) => assert_eq!(message, "widget gears jammed"),
        other => panic!("expected panic dispatch error, got {other:?}"),
    }
}

struct JammedHook;

impl HostHook for JammedHook {
    fn on_startup(&self, _route: &RouteDescriptor) {
        panic!("startup hook jammed");
    }
}

fn router_with_jammed_hook(config: RouterConfig) -> ApiRouter {
    ApiRouter::builder(config)
        .namespaces(common::namespaces())
        .hook(Arc::new(JammedHook))
        .build()
        .unwrap()
}

#[test]
fn test_startup_hook_panic_is_caught() {
    let router = router_with_jammed_hook(RouterConfig::default());
    let out = router.handle(get("/api/app/widgets/list")).unwrap();
    assert_eq!(out.status, 500);
    assert_eq!(body(&out)["error"], "Handler panicked: startup hook jammed");

    let router = router_with_jammed_hook(production());
    match router.handle(get("/api/app/widgets/list")) {
        Err(DispatchError::Panic { message, .. }) => assert_eq!(message, "startup hook jammed"),
        other => panic!("expected panic dispatch error, got {other:?}"),
    }
}

#[test]
fn test_malformed_response_is_internal() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/malformed")).unwrap();
    assert_eq!(out.status, 500);
    assert!(body(&out)["error"].as_str().unwrap().contains("malformed"));
}

#[test]
fn test_constructor_error_is_rendered() {
    let t = router();
    let out = t.router.handle(get("/api/app/broken/anything")).unwrap();
    assert_eq!(out.status, 503);
    assert_eq!(body(&out)["error"], "Maintenance");
}

#[test]
fn test_prerendered_body_passes_through() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/raw")).unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(out.body, b"<p>raw widget</p>".to_vec());
}

#[test]
fn test_options_preflight() {
    let t = router();
    let out = t
        .router
        .handle(
            ApiRequest::new(Method::OPTIONS, "/api/anything/at/all")
                .with_header("X-Access-Token", "bogus"),
        )
        .unwrap();
    assert_eq!(out.status, 204);
    assert!(out.body.is_empty());
    assert_eq!(out.content_type, None);
    assert_eq!(
        out.get_header("Access-Control-Allow-Methods"),
        Some("GET, PUT, POST, DELETE, OPTIONS")
    );
    assert_eq!(out.get_header("Cache-Control"), None);
    assert_eq!(t.hook.counts(), (0, 0));
}

#[test]
fn test_hooks_follow_the_gate() {
    let t = router();
    t.router.handle(get("/api/app/account")).unwrap();
    assert_eq!(t.hook.counts(), (1, 0));

    t.router.handle(get("/api/app/widgets/list")).unwrap();
    assert_eq!(t.hook.counts(), (2, 1));
}

#[test]
fn test_controller_log_lines_are_tagged() {
    let t = router();
    let out = t
        .router
        .handle(
            ApiRequest::new(Method::POST, "/api/app/widgets/create")
                .with_body(json!({"name": "sprocket"})),
        )
        .unwrap();
    assert_eq!(out.status, 201);
    assert_eq!(body(&out)["data"], json!({"name": "sprocket"}));
    assert_eq!(t.log.lines(), vec![" [app->create] created sprocket".to_string()]);
}

#[test]
fn test_error_envelopes_are_logged() {
    let t = router();
    t.router.handle(get("/api/ghost")).unwrap();
    let lines = t.log.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(" [ghost->index] "));
    assert!(lines[0].contains("\"status\":404"));
}

#[test]
fn test_extra_segments_and_caller() {
    let t = router();
    let out = t.router.handle(get("/api/app/widgets/segments/7/tags")).unwrap();
    assert_eq!(body(&out)["data"], json!(["7", "tags"]));

    let out = t
        .router
        .handle(get("/api/app/widgets/whoami").with_header("x-access-token", USER_TOKEN))
        .unwrap();
    assert_eq!(body(&out)["data"], json!({"user_id": "7"}));
}

#[test]
fn test_replace_namespaces() {
    let router = ApiRouter::builder(RouterConfig::default()).build().unwrap();
    let out = router.handle(get("/api/app/widgets/list")).unwrap();
    assert_eq!(out.status, 404);

    let app = ModuleManifest::app().controller::<common::Widgets>();
    router.replace_namespaces(discover(Some(app), Vec::new()).unwrap());
    let out = router.handle(get("/api/app/widgets/list")).unwrap();
    assert_eq!(out.status, 200);
    assert_eq!(router.namespaces().names(), vec!["app"]);
}

#[test]
fn test_unknown_default_format_fails_build() {
    let config = RouterConfig {
        default_format: "YAML".to_string(),
        ..RouterConfig::default()
    };
    assert!(ApiRouter::builder(config).build().is_err());
}

#[test]
fn test_concurrent_requests() {
    let t = router();
    let router = Arc::new(t.router);
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                let path = if i % 2 == 0 {
                    "/api/app/widgets/list"
                } else {
                    "/api/blog/articles"
                };
                router.handle(get(path)).unwrap().status
            })
        })
        .collect();
    for w in workers {
        assert_eq!(w.join().unwrap(), 200);
    }
}
