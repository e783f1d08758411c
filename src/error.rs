//! Error types for the container, the host and the plugin loader.

use std::path::PathBuf;

use http::Method;

use crate::key::Namespace;

/// Dependency injection errors
///
/// Registration errors (`Duplicate`) surface while the collection is being
/// built; every other variant is a resolution error at the call site.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{DiError, Namespace, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound { service, namespace }) => {
///         assert_eq!(service, "alloc::string::String");
///         assert_eq!(namespace, Namespace::global());
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// Service not registered under this namespace
    #[error("Service not found: {service} in namespace '{namespace}'")]
    NotFound {
        service: &'static str,
        namespace: Namespace,
    },
    /// A registration already exists for (interface, namespace)
    #[error("Duplicate registration: {service} in namespace '{namespace}'")]
    Duplicate {
        service: &'static str,
        namespace: Namespace,
    },
    /// Internal registration requested from a foreign namespace
    #[error("Service {service} in namespace '{namespace}' is internal and cannot be resolved from '{caller}'")]
    NotExported {
        service: &'static str,
        namespace: Namespace,
        caller: Namespace,
    },
    /// Scoped service requested without an active scope
    #[error("No active scope: scoped service {0} cannot be resolved from the root provider")]
    NoActiveScope(&'static str),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A factory reported its own failure
    #[error("Factory for {service} failed: {message}")]
    Factory {
        service: &'static str,
        message: String,
    },
}

impl DiError {
    /// Builds a [`DiError::Factory`] for `T`.
    pub fn factory<T: ?Sized + 'static>(message: impl Into<String>) -> Self {
        DiError::Factory {
            service: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;

/// Plugin loading and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("failed to open plugin module {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("plugin module {path} does not export `{symbol}`: {message}")]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
        message: String,
    },
    #[error("plugin entry in {path} returned no instance")]
    NullInstance { path: PathBuf },
    #[error("plugin name '{0}' is invalid")]
    InvalidName(String),
    #[error("plugin '{0}' is already loaded")]
    DuplicateName(String),
    #[error("plugin '{name}' failed to register services: {source}")]
    Registration {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("plugin '{0}' is not loaded")]
    NotLoaded(String),
    #[error("failed to read plugin directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Startup and hosting errors.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error(transparent)]
    Di(#[from] DiError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;
