//! Compiled route patterns.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use http::Method;
use regex::Regex;

use crate::error::{HostError, HostResult};
use crate::web::{Context, HandlerResult};

/// Handler bound to a route. Returns the response body text; status and
/// headers are set on the [`Context`].
pub type RouteHandler = Arc<dyn Fn(&mut Context) -> HandlerResult<String> + Send + Sync>;

/// Syntactic restriction on a path parameter.
///
/// ```
/// use ferrous_host::Constraint;
///
/// assert_eq!(Constraint::parse("guid"), Some(Constraint::Uuid));
/// assert!(Constraint::Uuid.matches("550e8400-e29b-41d4-a716-446655440000"));
/// assert!(!Constraint::Uuid.matches("not-a-uuid"));
/// assert!(Constraint::Integer.matches("-12"));
/// assert!(!Constraint::Alphabetic.matches("abc1"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    None,
    Uuid,
    Integer,
    Alphabetic,
    Alphanumeric,
}

impl Constraint {
    /// Parses a constraint name as written in a pattern.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "uuid" | "guid" => Some(Constraint::Uuid),
            "int" | "integer" => Some(Constraint::Integer),
            "alpha" => Some(Constraint::Alphabetic),
            "alnum" | "alphanumeric" => Some(Constraint::Alphanumeric),
            _ => None,
        }
    }

    pub fn matches(self, value: &str) -> bool {
        match self {
            Constraint::None => !value.is_empty(),
            Constraint::Uuid => is_uuid(value),
            Constraint::Integer => {
                let digits = value.strip_prefix('-').unwrap_or(value);
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            }
            Constraint::Alphabetic => !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphabetic()),
            Constraint::Alphanumeric => {
                !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric())
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Constraint::None => "none",
            Constraint::Uuid => "uuid",
            Constraint::Integer => "int",
            Constraint::Alphabetic => "alpha",
            Constraint::Alphanumeric => "alnum",
        }
    }
}

// 8-4-4-4-12 hex groups
fn is_uuid(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 36
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

/// A named path parameter and its constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParam {
    pub name: String,
    pub constraint: Constraint,
}

/// One (method, pattern, handler) entry of a [`Router`](crate::Router).
///
/// Patterns are `/`-separated segments; a segment is either literal text or
/// a whole-segment parameter `{name}` / `{name:constraint}`. A trailing
/// slash is ignored on both patterns and request paths.
pub struct Route {
    method: Method,
    pattern: String,
    matcher: Regex,
    params: Vec<RouteParam>,
    handler: RouteHandler,
}

impl Route {
    pub fn new(method: Method, pattern: &str, handler: RouteHandler) -> HostResult<Self> {
        let pattern = normalize(pattern);
        let (matcher, params) = compile(&pattern)?;
        Ok(Self {
            method,
            pattern,
            matcher,
            params,
            handler,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Normalized pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn params(&self) -> &[RouteParam] {
        &self.params
    }

    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    /// Whether `method` and `path` match, constraints included.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.match_path(path).is_some()
    }

    /// Parameter values for `path`, or `None` if the path does not match.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path = normalize(path);
        let captures = self.matcher.captures(&path)?;
        let mut values = HashMap::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            let value = captures.get(i + 1)?.as_str();
            if !param.constraint.matches(value) {
                return None;
            }
            values.insert(param.name.clone(), value.to_string());
        }
        Some(values)
    }

    /// Parameter values for `path`; empty when it does not match.
    pub fn extract_parameters(&self, path: &str) -> HashMap<String, String> {
        self.match_path(path).unwrap_or_default()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish()
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn compile(pattern: &str) -> HostResult<(Regex, Vec<RouteParam>)> {
    let invalid = |reason: String| HostError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let mut regex = String::from("^");
    let mut params = Vec::new();
    let mut seen = HashSet::new();

    if pattern != "/" {
        for segment in pattern.split('/').skip(1) {
            regex.push('/');
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(inner) => {
                    let (name, constraint) = match inner.split_once(':') {
                        Some((name, constraint)) => {
                            let parsed = Constraint::parse(constraint).ok_or_else(|| {
                                invalid(format!("unknown constraint '{constraint}'"))
                            })?;
                            (name, parsed)
                        }
                        None => (inner, Constraint::None),
                    };
                    if name.is_empty() {
                        return Err(invalid("empty parameter name".into()));
                    }
                    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                        return Err(invalid(format!("invalid parameter name '{name}'")));
                    }
                    if !seen.insert(name.to_string()) {
                        return Err(invalid(format!("duplicate parameter '{name}'")));
                    }
                    params.push(RouteParam {
                        name: name.to_string(),
                        constraint,
                    });
                    regex.push_str("([^/]+)");
                }
                None => {
                    if segment.contains(['{', '}']) {
                        return Err(invalid(format!("unbalanced braces in segment '{segment}'")));
                    }
                    if segment.is_empty() {
                        return Err(invalid("empty path segment".into()));
                    }
                    regex.push_str(&regex::escape(segment));
                }
            }
        }
    } else {
        regex.push('/');
    }
    regex.push('$');

    let matcher = Regex::new(&regex).map_err(|err| invalid(err.to_string()))?;
    Ok((matcher, params))
}
