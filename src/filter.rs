//! Exception filters: turning request errors into responses.
//!
//! When a handler or middleware fails, [`ErrorHandlingMiddleware`] asks an
//! ordered [`ExceptionFilterChain`] for a response. The first filter that
//! returns `Some` wins; if none claims the error a generic 500 is written.
//!
//! [`ErrorHandlingMiddleware`]: crate::middleware::ErrorHandlingMiddleware

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use http::StatusCode;
use serde_json::json;

use crate::web::{Context, HandlerPanic, HttpError, Response};

/// Maps an error to a response, or declines with `None`.
///
/// ```
/// use ferrous_host::{Context, ExceptionFilter, ExceptionFilterChain, Request, Response};
/// use http::StatusCode;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("quota exceeded")]
/// struct QuotaExceeded;
///
/// struct QuotaFilter;
/// impl ExceptionFilter for QuotaFilter {
///     fn catch(&self, error: &anyhow::Error, _ctx: &Context) -> Option<Response> {
///         error
///             .downcast_ref::<QuotaExceeded>()
///             .map(|_| Response::text(StatusCode::TOO_MANY_REQUESTS, "slow down"))
///     }
/// }
///
/// let chain = ExceptionFilterChain::default_chain(false).prepend(QuotaFilter);
/// let ctx = Context::from_request(Request::get("/upload"));
///
/// let limited = chain.handle(&anyhow::Error::new(QuotaExceeded), &ctx);
/// assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
///
/// let other = chain.handle(&anyhow::anyhow!("disk on fire"), &ctx);
/// assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
/// ```
pub trait ExceptionFilter: Send + Sync {
    fn catch(&self, error: &anyhow::Error, ctx: &Context) -> Option<Response>;
}

/// Ordered list of filters; first claim wins.
#[derive(Clone, Default)]
pub struct ExceptionFilterChain {
    filters: Vec<Arc<dyn ExceptionFilter>>,
    expose_details: bool,
}

impl ExceptionFilterChain {
    /// Empty chain; every error falls through to the generic 500.
    pub fn new(expose_details: bool) -> Self {
        Self {
            filters: Vec::new(),
            expose_details,
        }
    }

    /// Chain holding only [`DefaultExceptionFilter`].
    pub fn default_chain(expose_details: bool) -> Self {
        Self::new(expose_details).with(DefaultExceptionFilter::new(expose_details))
    }

    /// Appends a filter (lowest priority).
    pub fn with<F: ExceptionFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Inserts a filter ahead of all others.
    pub fn prepend<F: ExceptionFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.insert(0, Arc::new(filter));
        self
    }

    pub fn push(&mut self, filter: Arc<dyn ExceptionFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn expose_details(&self) -> bool {
        self.expose_details
    }

    /// Response for `error`; never fails.
    ///
    /// A filter that panics ends the search with the generic 500.
    pub fn handle(&self, error: &anyhow::Error, ctx: &Context) -> Response {
        let claimed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.filters.iter().find_map(|filter| filter.catch(error, ctx))
        }));
        match claimed {
            Ok(Some(response)) => response,
            Ok(None) => internal_error(error, ctx, self.expose_details),
            Err(payload) => {
                let panic = HandlerPanic::from_payload(&*payload);
                tracing::error!(path = ctx.path(), error = %panic, "exception filter panicked");
                internal_error(error, ctx, self.expose_details)
            }
        }
    }
}

/// Maps [`HttpError`] kinds to their status; everything else is a 500 with a
/// generic message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionFilter {
    expose_details: bool,
}

impl DefaultExceptionFilter {
    pub fn new(expose_details: bool) -> Self {
        Self { expose_details }
    }
}

impl ExceptionFilter for DefaultExceptionFilter {
    fn catch(&self, error: &anyhow::Error, ctx: &Context) -> Option<Response> {
        if let Some(http) = error.downcast_ref::<HttpError>() {
            let detail = self.expose_details.then(|| format!("{error:#}"));
            return Some(error_response(http.status(), http.message(), ctx.path(), detail));
        }
        Some(internal_error(error, ctx, self.expose_details))
    }
}

/// Structured JSON error body: `{"error", "message", "status", "path"[, "detail"]}`.
pub fn error_response(
    status: StatusCode,
    message: &str,
    path: &str,
    detail: Option<String>,
) -> Response {
    let mut body = json!({
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message,
        "status": status.as_u16(),
        "path": path,
    });
    if let Some(detail) = detail {
        body["detail"] = serde_json::Value::String(detail);
    }
    Response::json(status, &body)
}

/// 404 written when no route matches.
pub fn not_found_response(ctx: &Context) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("no route for {} {}", ctx.method(), ctx.path()),
        ctx.path(),
        None,
    )
}

fn internal_error(error: &anyhow::Error, ctx: &Context, expose_details: bool) -> Response {
    let message = if error.downcast_ref::<HandlerPanic>().is_some() {
        "The request handler terminated unexpectedly"
    } else {
        "An internal error occurred"
    };
    let detail = expose_details.then(|| format!("{error:#}"));
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message, ctx.path(), detail)
}
