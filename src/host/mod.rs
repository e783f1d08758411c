//! The application host: pipeline, router and plugins behind one entry point.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::controller::{Controller, ControllerBase};
use crate::error::{HostError, HostResult};
use crate::filter::{not_found_response, ExceptionFilter, ExceptionFilterChain};
use crate::middleware::{ErrorHandlingMiddleware, Middleware, Pipeline, ServiceScopeMiddleware};
use crate::plugin::{pin_middleware, ModuleHandle, Plugin, PluginManager};
use crate::provider::ServiceProvider;
use crate::routing::Router;
use crate::web::response::TEXT_CONTENT_TYPE;
use crate::web::{Context, HandlerResult, Request, Response};

pub mod config;
mod server;

pub use config::{ConfigSource, EnvironmentSource, HostConfig};
pub use server::ServerHandle;

/// Routes requests through the middleware pipeline to controller handlers.
///
/// A new host has two middleware installed: [`ServiceScopeMiddleware`]
/// followed by [`ErrorHandlingMiddleware`]. Middleware added with
/// [`use_middleware`](Self::use_middleware) runs inside both, so every
/// request has a scope and every failure becomes exactly one response.
///
/// ```
/// use ferrous_host::{HostConfig, HttpHost, Request, ServiceCollection, StatusCode};
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(String::from("inventory")).unwrap();
///
/// let mut host = HttpHost::new(services.build(), HostConfig::default());
/// let mut api = ferrous_host::ControllerBase::new("/api");
/// api.get("/name", |ctx| Ok(ctx.resolve::<String>()?.to_string()));
/// host.add_routes(&api).unwrap();
///
/// let ok = host.handle(Request::get("/api/name"));
/// assert_eq!(ok.status(), StatusCode::OK);
/// assert_eq!(ok.body_text(), "inventory");
///
/// let missing = host.handle(Request::get("/api/other"));
/// assert_eq!(missing.status(), StatusCode::NOT_FOUND);
/// ```
///
/// Fields drop in declaration order, so handler and service code owned by
/// plugins is released before the plugin modules are unloaded.
pub struct HttpHost {
    pipeline: Pipeline,
    router: Router,
    filters: Arc<ArcSwap<ExceptionFilterChain>>,
    config: HostConfig,
    provider: ServiceProvider,
    plugins: PluginManager,
}

impl HttpHost {
    pub fn new(provider: ServiceProvider, config: HostConfig) -> Self {
        let filters = Arc::new(ArcSwap::from_pointee(ExceptionFilterChain::default_chain(
            config.expose_error_details,
        )));

        let mut pipeline = Pipeline::new();
        pipeline.push(Arc::new(ServiceScopeMiddleware::new(provider.clone())));
        pipeline.push(Arc::new(ErrorHandlingMiddleware::new(Arc::clone(&filters))));

        Self {
            pipeline,
            router: Router::new(),
            filters,
            config,
            provider,
            plugins: PluginManager::new(),
        }
    }

    /// Middleware names in execution order.
    pub fn installed_middleware(&self) -> Vec<String> {
        self.pipeline.names()
    }

    /// Appends `middleware` to the end of the pipeline.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        tracing::debug!(middleware = middleware.name(), "middleware installed");
        self.pipeline.push(middleware);
        self
    }

    /// Registers a controller's routes; returns how many were added.
    pub fn add_controller(&mut self, controller: &dyn Controller) -> HostResult<usize> {
        self.add_routes(&controller.routes())
    }

    pub fn add_routes(&mut self, routes: &ControllerBase) -> HostResult<usize> {
        let added = routes.register_routes(&mut self.router)?;
        tracing::debug!(prefix = routes.prefix(), routes = added, "controller registered");
        Ok(added)
    }

    /// Adds a plugin's controllers and middleware.
    pub fn use_plugin(&mut self, plugin: &dyn Plugin) -> HostResult<()> {
        self.wire_plugin(plugin, None)
    }

    // Routes and middleware from a loaded module keep that module mapped.
    fn wire_plugin(&mut self, plugin: &dyn Plugin, module: Option<&ModuleHandle>) -> HostResult<()> {
        let name = plugin.metadata().name;
        for controller in plugin.controllers() {
            let mut routes = controller.routes();
            if let Some(module) = module {
                routes.pin_module(module);
            }
            self.add_routes(&routes)?;
        }
        for middleware in plugin.middleware(&self.provider) {
            let middleware = match module {
                Some(module) => pin_middleware(middleware, module),
                None => middleware,
            };
            self.use_middleware(middleware);
        }
        tracing::debug!(plugin = %name, "plugin wired into host");
        Ok(())
    }

    /// Wires every plugin in `manager` and takes ownership of it, so the
    /// modules outlive the routes and middleware they contributed.
    ///
    /// A host holds one manager; attaching a second one while plugins are
    /// loaded is an error.
    pub fn attach_plugins(&mut self, manager: PluginManager) -> HostResult<()> {
        if !self.plugins.is_empty() {
            return Err(HostError::Config("a plugin manager is already attached".into()));
        }
        let wired = manager
            .modules()
            .try_for_each(|(plugin, module)| self.wire_plugin(plugin, Some(module)));
        // Kept even on failure: anything wired so far runs plugin code.
        self.plugins = manager;
        wired
    }

    /// Puts `filter` ahead of the current exception filters.
    pub fn add_exception_filter<F: ExceptionFilter + 'static>(&self, filter: F) {
        let chain = self.filters.load().as_ref().clone().prepend(filter);
        self.filters.store(Arc::new(chain));
    }

    pub fn set_exception_filters(&self, chain: ExceptionFilterChain) {
        self.filters.store(Arc::new(chain));
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    /// Runs one request through the pipeline.
    pub fn handle(&self, request: Request) -> Response {
        let mut ctx = Context::from_request(request);
        let router = &self.router;
        let terminal = |ctx: &mut Context| -> HandlerResult { dispatch(router, ctx) };

        if let Err(error) = self.pipeline.execute(&mut ctx, &terminal) {
            tracing::error!(
                method = %ctx.method(),
                path = ctx.path(),
                error = %format!("{error:#}"),
                "error escaped the pipeline"
            );
            let response = self.filters.load().handle(&error, &ctx);
            ctx.replace_response(response);
        }
        ctx.into_response()
    }

    /// Binds the configured address and serves on background workers.
    pub fn start(self) -> HostResult<ServerHandle> {
        server::start(self)
    }

    /// Serves until the process exits.
    pub fn run(self) -> HostResult<()> {
        self.start()?.wait();
        Ok(())
    }

    pub(crate) fn filters(&self) -> &Arc<ArcSwap<ExceptionFilterChain>> {
        &self.filters
    }
}

impl std::fmt::Debug for HttpHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHost")
            .field("middleware", &self.pipeline.names())
            .field("routes", &self.router)
            .field("config", &self.config)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

fn dispatch(router: &Router, ctx: &mut Context) -> HandlerResult {
    let Some(found) = router.match_route(ctx.method(), ctx.path()) else {
        let response = not_found_response(ctx);
        ctx.replace_response(response);
        return Ok(());
    };

    ctx.set_params(found.params);
    let body = (found.route.handler())(ctx)?;
    let response = ctx.response_mut();
    response.set_body(body);
    if !response.has_content_type() {
        response.set_content_type(TEXT_CONTENT_TYPE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;
    use http::StatusCode;

    fn host() -> HttpHost {
        HttpHost::new(crate::ServiceCollection::new().build(), HostConfig::default())
    }

    #[test]
    fn default_middleware_order() {
        assert_eq!(
            host().installed_middleware(),
            vec!["ServiceScopeMiddleware", "ErrorHandlingMiddleware"]
        );
    }

    #[test]
    fn user_middleware_runs_inside_defaults() {
        let mut host = host();
        host.use_middleware(middleware_fn("Tag", |ctx, next| {
            ctx.set_header("x-tag", "1")?;
            next.run(ctx)
        }));
        assert_eq!(host.installed_middleware().last().map(String::as_str), Some("Tag"));

        let response = host.handle(Request::get("/nowhere"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn handler_body_defaults_to_text() {
        let mut host = host();
        let mut base = ControllerBase::new("");
        base.get("/ping", |_| Ok("pong".into()));
        host.add_routes(&base).unwrap();

        let response = host.handle(Request::get("/ping"));
        assert_eq!(response.body_text(), "pong");
        assert_eq!(response.header("content-type"), Some(TEXT_CONTENT_TYPE));
    }
}
