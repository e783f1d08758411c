use std::sync::Arc;

use super::{Middleware, Next};
use crate::provider::ServiceProvider;
use crate::web::{Context, HandlerResult};

/// Opens a fresh [`Scope`](crate::Scope) for each request and drops it once
/// the downstream chain has returned.
pub struct ServiceScopeMiddleware {
    provider: ServiceProvider,
}

impl ServiceScopeMiddleware {
    pub fn new(provider: ServiceProvider) -> Self {
        Self { provider }
    }
}

impl Middleware for ServiceScopeMiddleware {
    fn name(&self) -> &str {
        "ServiceScopeMiddleware"
    }

    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        ctx.set_scope(Arc::new(self.provider.create_scope()));
        let result = next.run(ctx);
        ctx.take_scope();
        result
    }
}
