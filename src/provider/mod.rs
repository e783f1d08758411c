//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::sync::Arc;
use std::time::Instant;

use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::StackGuard;
use crate::key::{global_namespace, key_of_type, Key, Namespace};
use crate::lifetime::Lifetime;
use crate::observer::Observers;
use crate::registration::{AnyArc, Registration, Registry};
use crate::traits::ResolverCore;

pub mod context;
pub mod scope;
pub mod view;

pub use context::ResolverContext;
pub use scope::Scope;
pub use view::NamespaceView;

/// Root resolver built from a [`ServiceCollection`](crate::ServiceCollection).
///
/// Owns the frozen registry and every realized singleton. Cloning shares the
/// same inner state, so a provider can be handed to worker threads freely.
///
/// The root acts as the global namespace. Scoped services cannot be resolved
/// here; create a [`Scope`] first.
///
/// # Examples
///
/// ```
/// use ferrous_host::{DiError, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
/// struct RequestId(u64);
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() }).unwrap();
/// collection.add_transient_factory::<UserService, _>(|r| {
///     Ok(UserService { db: r.get::<Database>()? })
/// }).unwrap();
/// collection.add_scoped_factory::<RequestId, _>(|_| Ok(RequestId(1))).unwrap();
///
/// let provider = collection.build();
/// let user_service = provider.get::<UserService>().unwrap();
/// assert_eq!(user_service.db.url, "postgres://localhost");
///
/// assert!(matches!(provider.get::<RequestId>(), Err(DiError::NoActiveScope(_))));
/// assert_eq!(provider.create_scope().get::<RequestId>().unwrap().0, 1);
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub(crate) registry: Registry,
    pub(crate) observers: Observers,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, observers: Observers) -> Self {
        Self {
            inner: Arc::new(ProviderInner { registry, observers }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Each scope keeps one slot per scoped registration; singletons are
    /// still served by this provider.
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Resolver view acting as `namespace` instead of global.
    pub fn as_namespace(&self, namespace: Namespace) -> NamespaceView<'_, Self> {
        NamespaceView::new(self, namespace)
    }

    /// Descriptors of every registration, in registration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner
            .registry
            .iter()
            .map(|(key, reg)| describe(key, reg))
            .collect()
    }

    /// Whether a concrete `T` is registered in `namespace`.
    pub fn contains<T: 'static>(&self, namespace: &Namespace) -> bool {
        self.inner.registry.contains_key(&key_of_type::<T>(namespace))
    }

    pub fn registration_count(&self) -> usize {
        self.inner.registry.len()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        for (k, r) in self.inner.registry.iter() {
            s.push_str(&format!(
                "  {} [{}] {:?}: {}\n",
                k.display_name(),
                k.namespace(),
                r.visibility,
                r.lifetime
            ));
        }
        s
    }

    /// Resolution shared by the root and every scope created from it.
    pub(crate) fn resolve_with(
        &self,
        key: &Key,
        caller: &Namespace,
        scope: Option<&Scope>,
    ) -> DiResult<AnyArc> {
        let observers = &self.inner.observers;
        if !observers.has_observers() {
            return self.resolve_registration(key, caller, scope);
        }

        let start = Instant::now();
        observers.resolving(key);
        let result = self.resolve_registration(key, caller, scope);
        match &result {
            Ok(_) => observers.resolved(key, start.elapsed()),
            Err(err) => observers.failed(key, err),
        }
        result
    }

    fn resolve_registration(
        &self,
        key: &Key,
        caller: &Namespace,
        scope: Option<&Scope>,
    ) -> DiResult<AnyArc> {
        let reg = self.inner.registry.get(key).ok_or_else(|| DiError::NotFound {
            service: key.display_name(),
            namespace: key.namespace().clone(),
        })?;

        if key.namespace() != caller && !reg.visibility.is_exported() {
            return Err(DiError::NotExported {
                service: key.display_name(),
                namespace: key.namespace().clone(),
                caller: caller.clone(),
            });
        }

        match reg.lifetime {
            Lifetime::Singleton => self.resolve_singleton(reg, key),
            Lifetime::Scoped => {
                let scope = scope.ok_or(DiError::NoActiveScope(key.display_name()))?;
                scope.resolve_scoped(reg, key)
            }
            Lifetime::Transient => {
                let _guard = StackGuard::enter(key)?;
                match scope {
                    Some(scope) => (reg.ctor)(&ResolverContext::new(scope, key.namespace())),
                    None => (reg.ctor)(&ResolverContext::new(self, key.namespace())),
                }
            }
        }
    }

    #[inline]
    fn resolve_singleton(&self, reg: &Registration, key: &Key) -> DiResult<AnyArc> {
        let cell = &reg.single_runtime;
        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }

        let _guard = StackGuard::enter(key)?;
        cell.get_or_try_init(|| (reg.ctor)(&ResolverContext::new(self, key.namespace())))
            .cloned()
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key, caller: &Namespace) -> DiResult<AnyArc> {
        self.resolve_with(key, caller, None)
    }

    fn caller_namespace(&self) -> &Namespace {
        global_namespace()
    }

    fn contains_key(&self, key: &Key) -> bool {
        self.inner.registry.contains_key(key)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.inner.registry.len())
            .field("scoped_slots", &self.inner.registry.scoped_count)
            .finish()
    }
}

pub(crate) fn describe(key: &Key, reg: &Registration) -> ServiceDescriptor {
    ServiceDescriptor {
        key: key.clone(),
        lifetime: reg.lifetime,
        visibility: reg.visibility,
        impl_type_name: reg.impl_name,
    }
}
