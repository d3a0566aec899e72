#![allow(dead_code)]

//! Shared fixtures: a small set of controllers, a token store with known
//! tokens, and a router wired to an in-memory request log.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use apirouter::config::RouterConfig;
use apirouter::controller::{AuthDecision, Controller, MethodTable};
use apirouter::dispatcher::{ApiRouter, RequestContext};
use apirouter::envelope::ApiResponse;
use apirouter::error::{ApiError, HandlerError};
use apirouter::middleware::HostHook;
use apirouter::registry::{discover, ModuleManifest, NamespaceTable};
use apirouter::request_log::MemoryLog;
use apirouter::route::RouteDescriptor;
use apirouter::security::{AccessToken, Caller, IdentityService, InMemoryTokenStore};
use http::Method;
use serde_json::json;

pub const USER_TOKEN: &str = "tok-user";
pub const ADMIN_TOKEN: &str = "tok-admin";

pub struct Widgets;

impl Widgets {
    fn any_list(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Ok(ApiResponse::new()
            .with_data(json!([{"id": 1}, {"id": 2}]))
            .with_meta_entry("total", json!(2)))
    }

    fn put_remap(&mut self, name: &str, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Ok(ApiResponse::new().with_data(json!({"updated": name})))
    }

    fn get_explode(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Err(anyhow::anyhow!("disk on fire").into())
    }

    fn get_oversized(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Err(ApiError::new(1000, "too big").into())
    }

    fn get_panic(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        panic!("widget gears jammed");
    }

    fn get_raw(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Ok(ApiResponse::new().with_body("<p>raw widget</p>"))
    }

    fn get_invalid(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Err(ApiError::bad_request("Invalid widget").with_details(json!({"name": "required"})).into())
    }

    fn get_malformed(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Ok(ApiResponse::new().with_code(0))
    }

    fn get_whoami(&mut self, ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Ok(ApiResponse::new().with_data(json!({"user_id": ctx.user_id()})))
    }

    fn get_segments(&mut self, ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        Ok(ApiResponse::new().with_data(json!(ctx.extra_segments())))
    }

    fn post_create(&mut self, ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        let body = ctx.take_body().unwrap_or_default();
        ctx.write_log(format!("created {}", body["name"].as_str().unwrap_or("?")));
        Ok(ApiResponse::new().with_code(201).with_data(body))
    }
}

impl Controller for Widgets {
    const NAME: &'static str = "Widgets";

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Ok(Widgets)
    }

    fn register(table: &mut MethodTable<Self>) {
        table
            .any("list", Self::any_list)
            .remap(Method::PUT, Self::put_remap)
            .get("explode", Self::get_explode)
            .get("oversized", Self::get_oversized)
            .get("panic", Self::get_panic)
            .get("raw", Self::get_raw)
            .get("invalid", Self::get_invalid)
            .get("malformed", Self::get_malformed)
            .get("whoami", Self::get_whoami)
            .get("segments", Self::get_segments)
            .post("create", Self::post_create);
    }
}

/// Requires a logged-in caller.
pub struct Account;

impl Controller for Account {
    const NAME: &'static str = "account";
    const REQUIRE_AUTH: bool = true;

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Ok(Account)
    }

    fn register(table: &mut MethodTable<Self>) {
        table.get("index", |_, ctx| {
            Ok(ApiResponse::new().with_data(json!({"user_id": ctx.user_id()})))
        });
    }
}

/// Requires the `admin` scope.
pub struct Admin;

impl Controller for Admin {
    const NAME: &'static str = "admin";
    const REQUIRE_SCOPE: Option<&'static str> = Some("admin");

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Ok(Admin)
    }

    fn register(table: &mut MethodTable<Self>) {
        table.get("index", |_, _| Ok(ApiResponse::new().with_data(json!("admin"))));
    }
}

/// Rejects `brew` with a custom status and every DELETE with a bogus one.
pub struct Kettle;

impl Controller for Kettle {
    const NAME: &'static str = "kettle";

    fn is_authenticated(method: &Method, name: &str, _caller: &Caller) -> AuthDecision {
        if *method == Method::DELETE {
            AuthDecision::custom("nope", 42)
        } else if name.eq_ignore_ascii_case("brew") {
            AuthDecision::custom("I'm a teapot", 418)
        } else {
            AuthDecision::Allow
        }
    }

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Ok(Kettle)
    }

    fn register(table: &mut MethodTable<Self>) {
        table.any_remap(|_, name, _| Ok(ApiResponse::new().with_data(json!({"kettle": name}))));
    }
}

/// Controller of the `blog` module, reachable as `articles`.
pub struct Posts;

impl Controller for Posts {
    const NAME: &'static str = "Posts";

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Ok(Posts)
    }

    fn register(table: &mut MethodTable<Self>) {
        table.get("index", |_, _| Ok(ApiResponse::new().with_data(json!(["hello world"]))));
    }
}

/// Construction always fails with an API error.
pub struct Broken;

impl Controller for Broken {
    const NAME: &'static str = "broken";

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Err(ApiError::new(503, "Maintenance").into())
    }

    fn register(table: &mut MethodTable<Self>) {
        table.any_remap(|_, _, _| Ok(ApiResponse::new()));
    }
}

pub fn app_manifest() -> ModuleManifest {
    ModuleManifest::app()
        .controller::<Widgets>()
        .controller::<Account>()
        .controller::<Admin>()
        .controller::<Kettle>()
        .controller::<Broken>()
}

pub fn blog_manifest() -> ModuleManifest {
    ModuleManifest::new("acme/module-blog")
        .namespace("blog")
        .controller::<Posts>()
        .remap("articles", "Posts")
}

pub fn namespaces() -> NamespaceTable {
    discover(Some(app_manifest()), vec![blog_manifest()]).unwrap()
}

pub fn token_store() -> Arc<InMemoryTokenStore> {
    let store = InMemoryTokenStore::new();
    store.insert(AccessToken::new(USER_TOKEN, "7").with_scope("read"));
    store.insert(AccessToken::new(ADMIN_TOKEN, "1").with_scope("admin"));
    Arc::new(store)
}

/// User `1` is a superuser.
pub struct StaticIdentity;

impl IdentityService for StaticIdentity {
    fn is_superuser(&self, user_id: &str) -> bool {
        user_id == "1"
    }
}

#[derive(Default)]
pub struct CountingHook {
    pub startup: AtomicUsize,
    pub ready: AtomicUsize,
}

impl CountingHook {
    pub fn counts(&self) -> (usize, usize) {
        (self.startup.load(Ordering::SeqCst), self.ready.load(Ordering::SeqCst))
    }
}

impl HostHook for CountingHook {
    fn on_startup(&self, _route: &RouteDescriptor) {
        self.startup.fetch_add(1, Ordering::SeqCst);
    }

    fn on_ready(&self, _ctx: &RequestContext) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestRouter {
    pub router: ApiRouter,
    pub log: Arc<MemoryLog>,
    pub hook: Arc<CountingHook>,
}

pub fn router_with(config: RouterConfig) -> TestRouter {
    let log = Arc::new(MemoryLog::new());
    let hook = Arc::new(CountingHook::default());
    let router = ApiRouter::builder(config)
        .namespaces(namespaces())
        .token_store(token_store())
        .identity(Arc::new(StaticIdentity))
        .hook(Arc::clone(&hook) as Arc<dyn HostHook>)
        .request_log(Arc::clone(&log) as Arc<dyn apirouter::request_log::RequestLog>)
        .build()
        .unwrap();
    TestRouter { router, log, hook }
}

pub fn router() -> TestRouter {
    router_with(RouterConfig::default())
}

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod client {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw HTTP/1.1 request and read until the connection goes quiet.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 4096];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&tmp[..n]);
                    if response_complete(&buf) {
                        break;
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn response_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    /// Status, header lines and body of a raw response.
    pub fn parse_response(resp: &str) -> (u16, Vec<String>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        (status, lines.map(str::to_string).collect(), body.to_string())
    }

    pub fn header<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
        headers.iter().find_map(|l| {
            let (n, v) = l.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then_some(v.trim())
        })
    }
}

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("apirouter=debug")
            .try_init();
    });
}
