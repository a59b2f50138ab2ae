//! A small items service.
//!
//! Loads `portico.toml` (if present) and `PORTICO__*` environment variables,
//! then serves the same controller on whichever engine the configuration
//! names.
//!
//! ```text
//! PORTICO__SERVER__ENGINE=hapi cargo run -p portico --example items_service
//! curl localhost:3000/api/items/1
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use portico::prelude::*;
use portico::middleware::stages::DebugLog;
use serde_json::json;

// =============================================================================
// Store
// =============================================================================

#[derive(Default)]
struct ItemStore {
    items: RwLock<BTreeMap<u64, String>>,
    next_id: AtomicU64,
}

impl ItemStore {
    fn seeded() -> Self {
        let store = Self::default();
        store.insert("widget".to_string());
        store.insert("gadget".to_string());
        store
    }

    fn insert(&self, name: String) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.items.write().insert(id, name);
        id
    }
}

fn parse_id(request: &Request) -> Result<u64, RouteError> {
    request
        .param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| RouteError::with_status(StatusCode::BAD_REQUEST, json!({ "error": "invalid id" })))
}

// =============================================================================
// Controller
// =============================================================================

struct ItemsController {
    store: Arc<ItemStore>,
}

impl Controller for ItemsController {
    fn base_path(&self) -> &str {
        "/api/items"
    }

    fn middleware(&self) -> Vec<Arc<dyn Middleware>> {
        vec![Arc::new(middleware_fn("apiVersion", |request, response: Response| async move {
            Ok(Flow::Next(request, response.with_header("x-api-version", "1")))
        }))]
    }

    fn routes(&self) -> Vec<RouteDeclaration> {
        let list = Arc::clone(&self.store);
        let show = Arc::clone(&self.store);
        let create = Arc::clone(&self.store);

        vec![
            RouteDeclaration::get(
                "/",
                "listItems",
                handler_fn(move |_request, response: Response| {
                    let store = Arc::clone(&list);
                    async move {
                        let items: Vec<_> = store
                            .items
                            .read()
                            .iter()
                            .map(|(id, name)| json!({ "id": id, "name": name }))
                            .collect();
                        Ok(response.with_body(json!({ "items": items })))
                    }
                }),
            ),
            RouteDeclaration::get(
                "/:id",
                "getItem",
                handler_fn(move |request: Request, response: Response| {
                    let store = Arc::clone(&show);
                    async move {
                        let id = parse_id(&request)?;
                        let name = store.items.read().get(&id).cloned().ok_or_else(|| {
                            RouteError::with_status(StatusCode::NOT_FOUND, json!({ "error": "no such item" }))
                        })?;
                        Ok(response.with_body(json!({ "id": id, "name": name })))
                    }
                }),
            ),
            RouteDeclaration::post(
                "/",
                "createItem",
                handler_fn(move |request: Request, response: Response| {
                    let store = Arc::clone(&create);
                    async move {
                        let name = request
                            .body()
                            .as_json()
                            .and_then(|body| body.get("name"))
                            .and_then(|name| name.as_str())
                            .map(str::to_string)
                            .ok_or_else(|| {
                                RouteError::with_status(
                                    StatusCode::UNPROCESSABLE_ENTITY,
                                    json!({ "error": "name is required" }),
                                )
                            })?;
                        let id = store.insert(name.clone());
                        Ok(response
                            .with_status(StatusCode::CREATED)
                            .with_body(json!({ "id": id, "name": name })))
                    }
                }),
            ),
        ]
    }
}

// =============================================================================
// Main
// =============================================================================

async fn serve<E: Engine>(engine: E, config: &PorticoConfig) -> anyhow::Result<()> {
    let store = Arc::new(ItemStore::seeded());
    let mut server = Server::new(engine, config.server_config()).with_global_middleware(DebugLog::without_headers());
    server.register_controller(&ItemsController { store })?;

    for route in server.routes() {
        tracing::info!(method = %route.method(), path = route.path(), name = route.method_name(), "route");
    }

    server.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_optional_file("portico.toml")?
        .with_env_prefix("PORTICO")
        .load()?;

    init_logging(&config.log_config()?)?;

    match config.server.engine {
        EngineKind::Express => serve(ExpressEngine::new(), &config).await,
        EngineKind::Hapi => serve(HapiEngine::new(), &config).await,
    }
}
