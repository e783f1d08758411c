//! Small inventory service on top of `HttpHost`.
//!
//! ```text
//! FERROUS_HOST_BIND_ADDRESS=127.0.0.1:3000 cargo run --example inventory_host
//! curl localhost:3000/inventory/items
//! curl -X POST localhost:3000/inventory/items -d '{"name":"anvil","quantity":3}'
//! curl localhost:3000/inventory/items/1
//! ```
//!
//! Plugins are loaded from `FERROUS_HOST_PLUGIN_DIR` when it is set.

use ferrous_host::{
    init_tracing, Controller, ControllerBase, HostConfig, HttpError, HttpHost, PluginManager,
    RequestLoggingMiddleware, Resolver, ServiceCollection, StatusCode,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// ===== Domain Types =====

#[derive(Debug, Clone, Serialize)]
struct Item {
    id: u64,
    name: String,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
    quantity: u32,
}

// ===== Services =====

trait Inventory: Send + Sync {
    fn list(&self) -> Vec<Item>;
    fn find(&self, id: u64) -> Option<Item>;
    fn add(&self, item: NewItem) -> Item;
}

#[derive(Default)]
struct InMemoryInventory {
    items: Mutex<BTreeMap<u64, Item>>,
}

impl Inventory for InMemoryInventory {
    fn list(&self) -> Vec<Item> {
        self.items.lock().values().cloned().collect()
    }

    fn find(&self, id: u64) -> Option<Item> {
        self.items.lock().get(&id).cloned()
    }

    fn add(&self, item: NewItem) -> Item {
        let mut items = self.items.lock();
        let id = items.keys().next_back().map_or(1, |last| last + 1);
        let item = Item {
            id,
            name: item.name,
            quantity: item.quantity,
        };
        items.insert(id, item.clone());
        item
    }
}

// ===== Controllers =====

struct InventoryController;

impl Controller for InventoryController {
    fn prefix(&self) -> &str {
        "/inventory"
    }

    fn configure(&self, routes: &mut ControllerBase) {
        routes
            .get("/items", |ctx| {
                let inventory = ctx.services()?.get_trait::<dyn Inventory>()?;
                ctx.json(StatusCode::OK, &inventory.list())
            })
            .get("/items/{id:int}", |ctx| {
                let id: u64 = ctx.param_as("id")?;
                let inventory = ctx.services()?.get_trait::<dyn Inventory>()?;
                match inventory.find(id) {
                    Some(item) => ctx.json(StatusCode::OK, &item),
                    None => Err(HttpError::NotFound(format!("no item {id}")).into()),
                }
            })
            .post("/items", |ctx| {
                let new_item: NewItem = ctx.body_json()?;
                if new_item.name.trim().is_empty() {
                    return Err(HttpError::BadRequest("name must not be empty".into()).into());
                }
                let inventory = ctx.services()?.get_trait::<dyn Inventory>()?;
                let item = inventory.add(new_item);
                ctx.json(StatusCode::CREATED, &item)
            });
    }
}

fn main() -> anyhow::Result<()> {
    let config = HostConfig::from_env()?;
    init_tracing(&config.log_filter);

    let mut plugins = PluginManager::new();
    let mut services = ServiceCollection::new();
    services.add_singleton_trait::<dyn Inventory>(Arc::new(InMemoryInventory::default()))?;

    if let Some(dir) = &config.plugin_dir {
        for meta in plugins.load_directory(dir, &mut services)? {
            tracing::info!(plugin = %meta.name, version = %meta.version, "plugin ready");
        }
    }

    let mut host = HttpHost::new(services.build(), config);
    host.use_middleware(Arc::new(RequestLoggingMiddleware));
    host.add_controller(&InventoryController)?;
    host.attach_plugins(plugins)?;

    tracing::info!(address = %host.config().bind_address, routes = host.router().len(), "starting");
    host.run()?;
    Ok(())
}
