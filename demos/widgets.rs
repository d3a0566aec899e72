//! Small widget API served with `apirouter`.
//!
//! ```text
//! cargo run --example widgets -- --addr 127.0.0.1:8080
//! curl http://127.0.0.1:8080/api/app/widgets/list
//! curl -X PUT -H 'X-Access-Token: demo-token' http://127.0.0.1:8080/api/app/widgets/3
//! curl http://127.0.0.1:8080/api/shop/catalogue.text
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use apirouter::config::RouterConfig;
use apirouter::controller::{Controller, MethodTable};
use apirouter::dispatcher::{ApiRouter, RequestContext};
use apirouter::envelope::ApiResponse;
use apirouter::error::{ApiError, HandlerError};
use apirouter::logging::{init_logging_with_config, LogConfig};
use apirouter::registry::{build_formats, discover, ModuleManifest};
use apirouter::security::{AccessToken, InMemoryTokenStore};
use clap::Parser;
use http::Method;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Widget API demo")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8080", env = "APIROUTER_ADDR")]
    addr: String,
    /// YAML router config
    #[arg(long)]
    config: Option<PathBuf>,
}

static WIDGETS: Lazy<Mutex<Vec<Value>>> = Lazy::new(|| {
    Mutex::new(vec![
        json!({"id": 1, "name": "sprocket"}),
        json!({"id": 2, "name": "cog"}),
    ])
});

struct Widgets {
    store: &'static Mutex<Vec<Value>>,
}

impl Widgets {
    fn any_list(&mut self, _ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        let widgets = self.store.lock().map_err(|_| anyhow::anyhow!("widget store poisoned"))?;
        Ok(ApiResponse::new()
            .with_data(Value::Array(widgets.clone()))
            .with_meta_entry("total", json!(widgets.len())))
    }

    fn post_create(&mut self, ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        let name = ctx
            .body()
            .and_then(|b| b.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::bad_request("Invalid widget").with_details(json!({"name": "required"})))?
            .to_string();
        let mut widgets = self.store.lock().map_err(|_| anyhow::anyhow!("widget store poisoned"))?;
        let widget = json!({"id": widgets.len() + 1, "name": name});
        widgets.push(widget.clone());
        ctx.write_log(format!("created widget {name}"));
        Ok(ApiResponse::new().with_code(201).with_data(widget))
    }

    /// `PUT /api/app/widgets/<id>` renames a widget.
    fn put_remap(&mut self, id: &str, ctx: &mut RequestContext) -> Result<ApiResponse, HandlerError> {
        if ctx.user_id().is_none() {
            return Err(ApiError::unauthorized("You must be logged in to access this resource").into());
        }
        let id: u64 = id
            .parse()
            .map_err(|_| ApiError::method_not_found(&format!("app/widgets/{id}")))?;
        let name = ctx
            .body()
            .and_then(|b| b.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("renamed")
            .to_string();
        let mut widgets = self.store.lock().map_err(|_| anyhow::anyhow!("widget store poisoned"))?;
        let widget = widgets
            .iter_mut()
            .find(|w| w["id"] == json!(id))
            .ok_or_else(|| ApiError::not_found(format!("Widget {id} does not exist")))?;
        widget["name"] = json!(name);
        Ok(ApiResponse::new().with_data(widget.clone()))
    }
}

impl Controller for Widgets {
    const NAME: &'static str = "widgets";

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Ok(Widgets { store: &WIDGETS })
    }

    fn register(table: &mut MethodTable<Self>) {
        table
            .any("list", Self::any_list)
            .post("create", Self::post_create)
            .remap(Method::PUT, Self::put_remap);
    }
}

/// Shop module controller, requested as `catalogue`.
struct ShopCatalogue;

impl Controller for ShopCatalogue {
    const NAME: &'static str = "ShopCatalogue";

    fn construct(_ctx: &mut RequestContext) -> Result<Self, HandlerError> {
        Ok(ShopCatalogue)
    }

    fn register(table: &mut MethodTable<Self>) {
        table.get("index", |_, _| {
            Ok(ApiResponse::new().with_data(json!([{"sku": "W-1", "price": 250}])))
        });
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RouterConfig::load(path)?,
        None => RouterConfig::default(),
    }
    .apply_env();

    let _guard = init_logging_with_config(&LogConfig::for_environment(config.environment))?;

    let app = ModuleManifest::app().controller::<Widgets>();
    let shop = ModuleManifest::new("demo/module-shop")
        .namespace("shop")
        .controller::<ShopCatalogue>()
        .remap("catalogue", "ShopCatalogue");

    let formats = build_formats(Some(&app), std::slice::from_ref(&shop), &config.default_format)?;
    let namespaces = discover(Some(app), vec![shop])?;

    let tokens = InMemoryTokenStore::new();
    tokens.insert(AccessToken::new("demo-token", "1").with_scope("widgets"));

    let router = ApiRouter::builder(config)
        .formats(formats)
        .namespaces(namespaces)
        .token_store(Arc::new(tokens))
        .build()?;

    let handle = apirouter::server::serve(Arc::new(router), args.addr.as_str())?;
    handle.wait_ready()?;
    info!(addr = %args.addr, "Widget demo ready");
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))?;
    Ok(())
}
