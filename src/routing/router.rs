//! Ordered route table.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;

use super::route::{Route, RouteHandler};
use crate::error::{HostError, HostResult};
use crate::web::{Context, HandlerResult};

/// Routes in insertion order, unique on (method, pattern).
///
/// Uniqueness is checked on the normalized pattern rather than the raw
/// text. Request paths get the same trailing-slash trimming, so `/x/{id}`
/// and `/x/{id}/` would match exactly the same requests; registering the
/// second is a [`HostError::DuplicateRoute`].
///
/// `find_route` returns the first route whose pattern and constraints match,
/// so more specific routes should be registered first.
///
/// ```
/// use ferrous_host::{HostError, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.add_route(Method::GET, "/items/{id:int}", |ctx| {
///     Ok(format!("item {}", ctx.param("id").unwrap_or_default()))
/// }).unwrap();
/// router.add_route(Method::POST, "/items/{id:int}", |_| Ok(String::new())).unwrap();
///
/// assert!(matches!(
///     router.add_route(Method::GET, "/items/{id:int}", |_| Ok(String::new())),
///     Err(HostError::DuplicateRoute { .. })
/// ));
///
/// let found = router.match_route(&Method::GET, "/items/42").unwrap();
/// assert_eq!(found.params["id"], "42");
/// assert!(router.find_route(&Method::GET, "/items/forty-two").is_none());
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
    keys: HashSet<(Method, String)>,
}

/// A matched route and its extracted parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: HashMap<String, String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and adds a route.
    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> HostResult<()>
    where
        F: Fn(&mut Context) -> HandlerResult<String> + Send + Sync + 'static,
    {
        let handler: RouteHandler = Arc::new(handler);
        self.add(Route::new(method, pattern, handler)?)
    }

    /// Adds an already compiled route.
    pub fn add(&mut self, route: Route) -> HostResult<()> {
        let key = (route.method().clone(), route.pattern().to_string());
        if self.keys.contains(&key) {
            return Err(HostError::DuplicateRoute {
                method: key.0,
                pattern: key.1,
            });
        }
        tracing::debug!(method = %route.method(), pattern = route.pattern(), "route registered");
        self.keys.insert(key);
        self.routes.push(Arc::new(route));
        Ok(())
    }

    /// Adds a batch of routes, or none of them if any is a duplicate.
    pub fn add_all(&mut self, routes: Vec<Route>) -> HostResult<usize> {
        let mut batch = HashSet::with_capacity(routes.len());
        for route in &routes {
            let key = (route.method().clone(), route.pattern().to_string());
            if self.keys.contains(&key) || !batch.insert(key.clone()) {
                return Err(HostError::DuplicateRoute {
                    method: key.0,
                    pattern: key.1,
                });
            }
        }
        let count = routes.len();
        for route in routes {
            self.add(route)?;
        }
        Ok(count)
    }

    pub fn find_route(&self, method: &Method, path: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|r| r.matches(method, path))
    }

    /// First matching route with its parameters extracted in one pass.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|r| r.method() == method)
            .find_map(|r| {
                r.match_path(path).map(|params| RouteMatch {
                    route: Arc::clone(r),
                    params,
                })
            })
    }

    /// Whether any route matches `path` under some method.
    pub fn matches_any_method(&self, path: &str) -> bool {
        self.routes.iter().any(|r| r.match_path(path).is_some())
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| format!("{} {}", r.method(), r.pattern())))
            .finish()
    }
}
