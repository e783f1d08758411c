//! # ferrous-host
//!
//! A synchronous HTTP service host built around a namespaced dependency
//! injection container.
//!
//! ## Features
//!
//! - **Service lifetimes**: Singleton, Scoped (one per request) and Transient
//! - **Namespaces**: plugin services are isolated in `plugin:<name>` and only
//!   reachable from outside when registered as `Exported`
//! - **Routing**: `{name}` and `{name:constraint}` patterns, duplicates
//!   rejected at startup
//! - **Middleware**: onion-style pipeline with a request scope and error
//!   handling installed by default
//! - **Plugins**: `cdylib` modules loaded at startup with full rollback on
//!   failure
//! - **Circular dependency detection** with the resolution path in the error
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_host::{
//!     ControllerBase, DiResult, HostConfig, HttpHost, Request, Resolver, ServiceCollection,
//!     StatusCode,
//! };
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! struct Counter(AtomicU32);
//!
//! struct Greeter {
//!     counter: Arc<Counter>,
//! }
//!
//! impl Greeter {
//!     fn greet(&self, name: &str) -> String {
//!         let n = self.counter.0.fetch_add(1, Ordering::SeqCst) + 1;
//!         format!("hello {name} (#{n})")
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Counter(AtomicU32::new(0)))?;
//! services.add_scoped_factory::<Greeter, _>(|r| -> DiResult<Greeter> {
//!     Ok(Greeter { counter: r.get::<Counter>()? })
//! })?;
//!
//! let mut host = HttpHost::new(services.build(), HostConfig::default());
//! let mut hello = ControllerBase::new("/hello");
//! hello.get("/{name:alpha}", |ctx| {
//!     let name = ctx.param("name").unwrap_or_default().to_string();
//!     Ok(ctx.resolve::<Greeter>()?.greet(&name))
//! });
//! host.add_routes(&hello)?;
//!
//! let response = host.handle(Request::get("/hello/ada"));
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body_text(), "hello ada (#1)");
//!
//! // Constraint mismatch falls through to the structured 404.
//! let response = host.handle(Request::get("/hello/42"));
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! # Ok(())
//! # }
//! ```
//!
//! ## Namespaces
//!
//! ```rust
//! use ferrous_host::{DiError, Lifetime, Namespace, Resolver, ServiceCollection, Visibility};
//!
//! let audit = Namespace::plugin("audit");
//! let mut services = ServiceCollection::new();
//! services.add_service::<u32, _>(Lifetime::Singleton, audit.clone(), Visibility::Internal, |_| Ok(7)).unwrap();
//!
//! let provider = services.build();
//! // Visible from inside the namespace...
//! assert_eq!(*provider.as_namespace(audit.clone()).get_local::<u32>().unwrap(), 7);
//! // ...but not from the global namespace.
//! assert!(matches!(provider.get_in::<u32>(&audit), Err(DiError::NotExported { .. })));
//! ```

pub mod collection;
pub mod controller;
pub mod descriptors;
pub mod error;
pub mod filter;
pub mod host;
pub mod key;
pub mod lifetime;
pub mod middleware;
pub mod observer;
pub mod plugin;
pub mod provider;
pub mod routing;
pub mod telemetry;
pub mod traits;
pub mod web;

// Internal modules
mod internal;
mod registration;

pub use http::{Method, StatusCode};

pub use collection::{NamespacedCollection, ServiceCollection, ServiceCollectionExt, ServiceModule};
pub use controller::{Controller, ControllerBase};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult, HostError, HostResult, PluginError};
pub use filter::{error_response, not_found_response, DefaultExceptionFilter, ExceptionFilter, ExceptionFilterChain};
pub use host::{ConfigSource, EnvironmentSource, HostConfig, HttpHost, ServerHandle};
pub use key::{key_of_trait, key_of_type, Key, Namespace};
pub use lifetime::{Lifetime, Visibility};
pub use middleware::{
    middleware_fn, ErrorHandlingMiddleware, FnMiddleware, Middleware, Next, Pipeline, RequestLoggingMiddleware,
    ServiceScopeMiddleware,
};
pub use observer::{DiObserver, TracingObserver};
pub use plugin::{
    LibraryLoader, LoadedModule, ModuleLoader, Plugin, PluginEntryFn, PluginManager, PluginMetadata,
    PLUGIN_ENTRY_NAME, PLUGIN_ENTRY_SYMBOL,
};
pub use provider::{NamespaceView, ResolverContext, Scope, ServiceProvider};
pub use routing::{Constraint, Route, RouteHandler, RouteMatch, RouteParam, Router};
pub use telemetry::init_tracing;
pub use traits::{Resolver, ResolverCore};
pub use web::{Context, HandlerPanic, HandlerResult, HttpError, Request, Response};
