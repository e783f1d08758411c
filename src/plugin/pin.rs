//! Keeps a plugin module mapped for as long as its code is reachable.

use std::sync::Arc;

use super::loader::LoadedModule;
use crate::middleware::{Middleware, Next};
use crate::routing::RouteHandler;
use crate::web::{Context, HandlerResult};

/// Shared handle to an open module; the module is released with the last clone.
pub(crate) type ModuleHandle = Arc<dyn LoadedModule>;

/// A value whose code lives in `module`.
///
/// Fields drop in declaration order, so the value is gone before the
/// module handle is released.
pub(crate) struct Pinned<T> {
    value: T,
    _module: ModuleHandle,
}

impl<T> Pinned<T> {
    pub(crate) fn new(value: T, module: &ModuleHandle) -> Self {
        Self {
            value,
            _module: Arc::clone(module),
        }
    }
}

impl Middleware for Pinned<Arc<dyn Middleware>> {
    fn name(&self) -> &str {
        self.value.name()
    }

    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        self.value.handle(ctx, next)
    }
}

pub(crate) fn pin_middleware(middleware: Arc<dyn Middleware>, module: &ModuleHandle) -> Arc<dyn Middleware> {
    Arc::new(Pinned::new(middleware, module))
}

pub(crate) fn pin_handler(handler: RouteHandler, module: &ModuleHandle) -> RouteHandler {
    let pinned = Pinned::new(handler, module);
    Arc::new(move |ctx: &mut Context| (pinned.value)(ctx))
}
