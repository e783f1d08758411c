//! Declarative route groups.

use std::sync::Arc;

use http::Method;

use crate::error::HostResult;
use crate::plugin::{pin_handler, ModuleHandle};
use crate::routing::{Route, RouteHandler, Router};
use crate::web::{Context, HandlerResult};

/// Collects (method, pattern, handler) triples under a common prefix.
///
/// ```
/// use ferrous_host::{ControllerBase, Router};
/// use http::Method;
///
/// let mut items = ControllerBase::new("/api/items");
/// items
///     .get("/", |_| Ok("[]".into()))
///     .get("/{id:int}", |ctx| Ok(format!("item {}", ctx.param("id").unwrap_or_default())))
///     .delete("/{id:int}", |_| Ok(String::new()));
///
/// let mut router = Router::new();
/// assert_eq!(items.register_routes(&mut router).unwrap(), 3);
/// assert!(router.find_route(&Method::GET, "/api/items/7").is_some());
/// assert!(router.find_route(&Method::GET, "/api/items").is_some());
/// ```
pub struct ControllerBase {
    prefix: String,
    routes: Vec<(Method, String, RouteHandler)>,
}

impl ControllerBase {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn route<F>(&mut self, method: Method, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        self.routes.push((method, pattern.to_string(), Arc::new(handler)));
        self
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        self.route(Method::GET, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        self.route(Method::DELETE, pattern, handler)
    }

    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn options<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        self.route(Method::OPTIONS, pattern, handler)
    }

    /// Prefix joined with `pattern`, with exactly one `/` between them.
    pub fn full_path(&self, pattern: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        let pattern = pattern.trim_start_matches('/');
        match (prefix.is_empty(), pattern.is_empty()) {
            (true, true) => "/".to_string(),
            (true, false) => format!("/{pattern}"),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{prefix}/{pattern}"),
        }
    }

    /// Compiles every route and adds it to `router`.
    ///
    /// All patterns are compiled and checked against the router before any
    /// is added, so a failure leaves the router unchanged.
    pub fn register_routes(&self, router: &mut Router) -> HostResult<usize> {
        let mut compiled = Vec::with_capacity(self.routes.len());
        for (method, pattern, handler) in &self.routes {
            compiled.push(Route::new(method.clone(), &self.full_path(pattern), handler.clone())?);
        }
        router.add_all(compiled)
    }

    /// Makes every handler keep `module` loaded.
    pub(crate) fn pin_module(&mut self, module: &ModuleHandle) {
        for (_, _, handler) in &mut self.routes {
            *handler = pin_handler(Arc::clone(handler), module);
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// A type that contributes routes through a [`ControllerBase`].
pub trait Controller: Send + Sync {
    fn prefix(&self) -> &str;

    fn configure(&self, routes: &mut ControllerBase);

    /// Builds the populated [`ControllerBase`].
    fn routes(&self) -> ControllerBase {
        let mut base = ControllerBase::new(self.prefix());
        self.configure(&mut base);
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_path_joins_with_single_slash() {
        assert_eq!(ControllerBase::new("/api/").full_path("/items"), "/api/items");
        assert_eq!(ControllerBase::new("/api").full_path("items"), "/api/items");
        assert_eq!(ControllerBase::new("/api").full_path("/"), "/api");
        assert_eq!(ControllerBase::new("").full_path(""), "/");
        assert_eq!(ControllerBase::new("").full_path("health"), "/health");
    }
}
