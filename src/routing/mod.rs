//! URL pattern compilation and route lookup.

pub mod route;
pub mod router;

pub use route::{Constraint, Route, RouteHandler, RouteParam};
pub use router::{RouteMatch, Router};
