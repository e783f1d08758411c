//! Onion-style middleware pipeline.
//!
//! Each middleware receives the request [`Context`] and a [`Next`] handle.
//! Code before `next.run(ctx)` runs inbound in registration order; code
//! after it runs outbound in reverse order. Returning without calling `next`
//! short-circuits the rest of the chain and the terminal handler.

use std::sync::Arc;

use crate::web::{Context, HandlerResult};

mod error;
mod logging;
mod scope;

pub use error::ErrorHandlingMiddleware;
pub use logging::RequestLoggingMiddleware;
pub use scope::ServiceScopeMiddleware;

/// A request interceptor.
pub trait Middleware: Send + Sync {
    /// Name reported by [`Pipeline::names`].
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult;
}

/// Terminal step run after the last middleware.
pub type Terminal<'a> = &'a (dyn Fn(&mut Context) -> HandlerResult + 'a);

/// The remainder of the chain. Consumed by [`run`](Next::run), so the
/// downstream chain executes at most once.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    index: usize,
    terminal: Terminal<'a>,
}

impl<'a> Next<'a> {
    pub fn run(self, ctx: &mut Context) -> HandlerResult {
        match self.chain.get(self.index) {
            Some(middleware) => middleware.handle(
                ctx,
                Next {
                    chain: self.chain,
                    index: self.index + 1,
                    terminal: self.terminal,
                },
            ),
            None => (self.terminal)(ctx),
        }
    }
}

/// Ordered middleware chain, frozen into a shared slice.
///
/// ```
/// use ferrous_host::{middleware_fn, Context, HandlerResult, Pipeline, Request};
/// use std::sync::{Arc, Mutex};
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let mut pipeline = Pipeline::new();
/// for id in 1..=2 {
///     let log = log.clone();
///     pipeline.push(middleware_fn(format!("m{id}"), move |ctx, next| {
///         log.lock().unwrap().push(format!("in {id}"));
///         let result = next.run(ctx);
///         log.lock().unwrap().push(format!("out {id}"));
///         result
///     }));
/// }
///
/// let mut ctx = Context::from_request(Request::get("/"));
/// let terminal_log = log.clone();
/// pipeline
///     .execute(&mut ctx, &move |_ctx: &mut Context| -> HandlerResult {
///         terminal_log.lock().unwrap().push("handler".to_string());
///         Ok(())
///     })
///     .unwrap();
///
/// assert_eq!(pipeline.names(), ["m1", "m2"]);
/// assert_eq!(*log.lock().unwrap(), ["in 1", "in 2", "handler", "out 2", "out 1"]);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    middleware: Arc<[Arc<dyn Middleware>]>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            middleware: Arc::from(Vec::new()),
        }
    }

    /// Appends a middleware; it runs inbound after every existing one.
    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        let mut chain = self.middleware.to_vec();
        chain.push(middleware);
        self.middleware = Arc::from(chain);
    }

    pub fn names(&self) -> Vec<String> {
        self.middleware.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Runs the chain around `terminal`.
    pub fn execute(&self, ctx: &mut Context, terminal: Terminal<'_>) -> HandlerResult {
        Next {
            chain: &self.middleware,
            index: 0,
            terminal,
        }
        .run(ctx)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware backed by a closure.
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        (self.f)(ctx, next)
    }
}

/// Wraps a closure as a named middleware.
pub fn middleware_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(FnMiddleware {
        name: name.into(),
        f,
    })
}
