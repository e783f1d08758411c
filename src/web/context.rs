use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::HttpError;
use super::request::Request;
use super::response::{Response, JSON_CONTENT_TYPE};
use super::HandlerResult;
use crate::error::{DiError, DiResult};
use crate::key::Namespace;
use crate::provider::{NamespaceView, Scope};
use crate::traits::Resolver;

/// Per-request state threaded through the middleware pipeline.
///
/// Holds the inbound request data, the route parameters filled in by the
/// router, typed request items, the response under construction and, once
/// the scope middleware ran, the request's service [`Scope`].
///
/// ```
/// use ferrous_host::{Context, Request};
/// use http::StatusCode;
///
/// let mut ctx = Context::from_request(
///     Request::get("/items?page=2&sort=name%20asc").with_header("x-tenant", "acme"),
/// );
/// assert_eq!(ctx.path(), "/items");
/// assert_eq!(ctx.query("page"), Some("2"));
/// assert_eq!(ctx.query("sort"), Some("name asc"));
/// assert_eq!(ctx.header("X-Tenant"), Some("acme"));
///
/// ctx.insert(42u32);
/// assert_eq!(ctx.get::<u32>(), Some(&42));
///
/// ctx.set_status(StatusCode::CREATED);
/// assert_eq!(ctx.status(), StatusCode::CREATED);
/// assert!(ctx.services().is_err());
/// ```
pub struct Context {
    method: Method,
    uri: String,
    path: String,
    headers: HeaderMap,
    body: Vec<u8>,
    query: HashMap<String, String>,
    params: HashMap<String, String>,
    items: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    response: Response,
    scope: Option<Arc<Scope>>,
    started: Instant,
}

impl Context {
    pub fn from_request(request: Request) -> Self {
        let method = request.method().clone();
        let uri = request.uri().to_string();
        let path = request.path().to_string();
        let headers = request.headers().clone();
        let query = request
            .query_string()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method,
            uri,
            path,
            headers,
            body: request.into_body(),
            query,
            params: HashMap::new(),
            items: HashMap::new(),
            response: Response::default(),
            scope: None,
            started: Instant::now(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Deserializes the body as JSON; malformed input is a 400.
    pub fn body_json<T: DeserializeOwned>(&self) -> HandlerResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|err| HttpError::BadRequest(format!("invalid JSON body: {err}")).into())
    }

    // ----- Route and query parameters -----

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Route parameter parsed into `T`; missing or unparsable is a 400.
    pub fn param_as<T: std::str::FromStr>(&self, name: &str) -> HandlerResult<T> {
        let raw = self
            .param(name)
            .ok_or_else(|| HttpError::BadRequest(format!("missing route parameter '{name}'")))?;
        raw.parse::<T>().map_err(|_| {
            HttpError::BadRequest(format!("route parameter '{name}' has invalid value '{raw}'")).into()
        })
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    // ----- Typed request items -----

    /// Stores a request-scoped value, replacing any previous value of `T`.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.items.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.items
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.items
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    // ----- Response -----

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> HandlerResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.response.insert_header(name, value);
        Ok(())
    }

    /// Serializes `value` as the JSON body text, setting status and content type.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> HandlerResult<String> {
        let body = serde_json::to_string(value)?;
        self.response.set_status(status);
        self.response.set_content_type(JSON_CONTENT_TYPE);
        Ok(body)
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Swaps the response under construction, returning the old one.
    pub fn replace_response(&mut self, response: Response) -> Response {
        std::mem::replace(&mut self.response, response)
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    // ----- Services -----

    pub fn scope(&self) -> Option<&Arc<Scope>> {
        self.scope.as_ref()
    }

    pub fn set_scope(&mut self, scope: Arc<Scope>) {
        self.scope = Some(scope);
    }

    pub fn take_scope(&mut self) -> Option<Arc<Scope>> {
        self.scope.take()
    }

    /// The request scope, resolving as the global namespace.
    pub fn services(&self) -> DiResult<&Scope> {
        self.scope
            .as_deref()
            .ok_or(DiError::NoActiveScope("request scope"))
    }

    /// The request scope, resolving as `namespace`.
    pub fn services_in(&self, namespace: &Namespace) -> DiResult<NamespaceView<'_, Scope>> {
        Ok(self.services()?.as_namespace(namespace.clone()))
    }

    /// Shorthand for `ctx.services()?.get::<T>()`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.services()?.get::<T>()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("status", &self.response.status())
            .field("scope", &self.scope.as_ref().map(|s| s.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_as_reports_bad_request() {
        let mut ctx = Context::from_request(Request::get("/items/abc"));
        ctx.set_params(HashMap::from([("id".to_string(), "abc".to_string())]));

        let err = ctx.param_as::<u32>("id").unwrap_err();
        let http = err.downcast_ref::<HttpError>().unwrap();
        assert!(matches!(http, HttpError::BadRequest(_)));

        let missing = ctx.param_as::<u32>("other").unwrap_err();
        assert!(missing.to_string().contains("missing route parameter"));
    }

    #[test]
    fn json_sets_status_and_content_type() {
        let mut ctx = Context::from_request(Request::get("/"));
        let body = ctx
            .json(StatusCode::CREATED, &serde_json::json!({"id": 7}))
            .unwrap();
        assert_eq!(body, r#"{"id":7}"#);
        assert_eq!(ctx.status(), StatusCode::CREATED);
        assert_eq!(ctx.response().header("content-type"), Some("application/json"));
    }

    #[test]
    fn body_json_rejects_malformed_input() {
        let ctx = Context::from_request(Request::post("/").with_body("{not json"));
        let err = ctx.body_json::<serde_json::Value>().unwrap_err();
        assert!(err.downcast_ref::<HttpError>().is_some());
    }

    #[test]
    fn typed_items_round_trip() {
        let mut ctx = Context::from_request(Request::get("/"));
        ctx.insert("user-1".to_string());
        assert_eq!(ctx.get::<String>().map(String::as_str), Some("user-1"));
        assert_eq!(ctx.remove::<String>(), Some("user-1".to_string()));
        assert!(ctx.get::<String>().is_none());
    }
}
