//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, Key, Namespace};
use crate::registration::AnyArc;

/// Object-safe resolution core implemented by the provider, scopes and
/// factory contexts.
///
/// Every request carries the caller's namespace so the visibility rule can
/// be applied: an `Internal` registration only resolves for callers in its
/// own namespace.
pub trait ResolverCore: Send + Sync {
    /// Resolves `key` on behalf of `caller`.
    fn resolve_any(&self, key: &Key, caller: &Namespace) -> DiResult<AnyArc>;

    /// Namespace this resolver acts as.
    fn caller_namespace(&self) -> &Namespace;

    /// Whether a registration exists for `key`, regardless of visibility.
    fn contains_key(&self, key: &Key) -> bool;
}

/// Typed resolution methods.
///
/// `get` looks in the global namespace, `get_local` in the caller's own
/// namespace and `get_in` in an explicit one. Trait objects are stored as
/// `Arc<Arc<dyn Trait>>` and unwrapped once here.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{Namespace, Resolver, ServiceCollection, Visibility, Lifetime};
///
/// struct Clock;
/// struct AuditLog { entries: usize }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Clock).unwrap();
/// services.add_service::<AuditLog, _>(
///     Lifetime::Singleton,
///     Namespace::plugin("audit"),
///     Visibility::Exported,
///     |r| {
///         r.get::<Clock>()?; // global dependency
///         Ok(AuditLog { entries: 0 })
///     },
/// ).unwrap();
///
/// let provider = services.build();
/// let log = provider.get_in::<AuditLog>(&Namespace::plugin("audit")).unwrap();
/// assert_eq!(log.entries, 0);
/// assert!(provider.get::<AuditLog>().is_err());
/// ```
pub trait Resolver: ResolverCore {
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_in::<T>(&Namespace::global())
    }

    fn get_local<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let ns = self.caller_namespace().clone();
        self.get_in::<T>(&ns)
    }

    fn get_in<T: Send + Sync + 'static>(&self, namespace: &Namespace) -> DiResult<Arc<T>> {
        let key = key_of_type::<T>(namespace);
        let any = self.resolve_any(&key, self.caller_namespace())?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    fn get_optional<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.get_optional_in::<T>(&Namespace::global())
    }

    fn get_optional_in<T: Send + Sync + 'static>(
        &self,
        namespace: &Namespace,
    ) -> DiResult<Option<Arc<T>>> {
        if !self.contains_key(&key_of_type::<T>(namespace)) {
            return Ok(None);
        }
        self.get_in::<T>(namespace).map(Some)
    }

    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_trait_in::<T>(&Namespace::global())
    }

    fn get_trait_local<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let ns = self.caller_namespace().clone();
        self.get_trait_in::<T>(&ns)
    }

    fn get_trait_in<T: ?Sized + Send + Sync + 'static>(
        &self,
        namespace: &Namespace,
    ) -> DiResult<Arc<T>> {
        let key = key_of_trait::<T>(namespace);
        let any = self.resolve_any(&key, self.caller_namespace())?;
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    fn get_trait_optional<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        if !self.contains_key(&key_of_trait::<T>(&Namespace::global())) {
            return Ok(None);
        }
        self.get_trait::<T>().map(Some)
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
