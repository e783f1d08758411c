use super::{Middleware, Next};
use crate::web::{Context, HandlerResult};

/// Logs one `info` event per request with status and latency.
///
/// Not installed by default; add it with
/// [`HttpHost::use_middleware`](crate::HttpHost::use_middleware).
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLoggingMiddleware;

impl Middleware for RequestLoggingMiddleware {
    fn name(&self) -> &str {
        "RequestLoggingMiddleware"
    }

    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let result = next.run(ctx);
        tracing::info!(
            method = %ctx.method(),
            path = ctx.path(),
            status = ctx.status().as_u16(),
            latency_ms = ctx.elapsed().as_millis() as u64,
            failed = result.is_err(),
            "request completed"
        );
        result
    }
}
