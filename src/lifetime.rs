//! Service lifetime and visibility definitions.

/// Service lifetimes controlling instance caching behavior
///
/// Defines how service instances are created, cached, and shared within
/// the container. Each lifetime has different sharing characteristics.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// // Singleton: One instance for entire application
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// }).unwrap();
///
/// // Scoped: One instance per request/scope
/// services.add_scoped_factory::<Repository, _>(|r| {
///     let db = r.get::<Database>()?;
///     Ok(Repository { db_url: db.url.clone() })
/// }).unwrap();
///
/// // Transient: New instance every time
/// services.add_transient_factory::<RequestModel, _>(|_| Ok(RequestModel { id: 12345 })).unwrap();
///
/// let provider = services.build();
///
/// let db1 = provider.get::<Database>().unwrap();
/// let scope1 = provider.create_scope();
/// let db2 = scope1.get::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let repo1a = scope1.get::<Repository>().unwrap();
/// let repo1b = scope1.get::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get::<Repository>().unwrap();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
///
/// let model1 = scope1.get::<RequestModel>().unwrap();
/// let model2 = scope1.get::<RequestModel>().unwrap();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per root provider, cached forever
    ///
    /// Created on first request under a per-registration once guard, then
    /// shared across all scopes and threads.
    Singleton,
    /// Single instance per scope, cached for the scope lifetime
    ///
    /// Resolving a scoped service requires an active [`Scope`](crate::Scope);
    /// the root provider refuses with [`DiError::NoActiveScope`](crate::DiError::NoActiveScope).
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::Scoped => f.write_str("scoped"),
            Lifetime::Transient => f.write_str("transient"),
        }
    }
}

/// Whether a registration may be resolved from outside its own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Only resolvable by code operating in the registration's namespace.
    Internal,
    /// Resolvable from any namespace that names this one explicitly.
    Exported,
}

impl Visibility {
    pub fn is_exported(self) -> bool {
        matches!(self, Visibility::Exported)
    }
}
