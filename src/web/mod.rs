//! Request, response and per-request context types.

pub mod context;
pub mod error;
pub mod request;
pub mod response;

pub use context::Context;
pub use error::{HandlerPanic, HttpError};
pub use request::Request;
pub use response::Response;

/// Result returned by handlers and middleware.
///
/// Any error type converts with `?`; [`HttpError`] values select their
/// status code, everything else is reported as a 500.
pub type HandlerResult<T = ()> = anyhow::Result<T>;
