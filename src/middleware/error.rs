use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{Middleware, Next};
use crate::filter::ExceptionFilterChain;
use crate::web::{Context, HandlerPanic, HandlerResult};

/// Converts any error or panic escaping the downstream chain into a response.
///
/// The filter chain sits behind an [`ArcSwap`] so it can be replaced while
/// the host is serving; each request reads one consistent snapshot.
pub struct ErrorHandlingMiddleware {
    filters: Arc<ArcSwap<ExceptionFilterChain>>,
}

impl ErrorHandlingMiddleware {
    pub fn new(filters: Arc<ArcSwap<ExceptionFilterChain>>) -> Self {
        Self { filters }
    }
}

impl Middleware for ErrorHandlingMiddleware {
    fn name(&self) -> &str {
        "ErrorHandlingMiddleware"
    }

    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let error = match panic::catch_unwind(AssertUnwindSafe(|| next.run(ctx))) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(err)) => err,
            Err(payload) => anyhow::Error::new(HandlerPanic::from_payload(&*payload)),
        };

        tracing::error!(
            method = %ctx.method(),
            path = ctx.path(),
            error = %format!("{error:#}"),
            "request failed"
        );
        let response = self.filters.load().handle(&error, ctx);
        ctx.replace_response(response);
        Ok(())
    }
}
