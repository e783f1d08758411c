//! Registration surface handed to plugins.

use std::sync::Arc;

use super::{register_trait, register_trait_value, register_type, register_value};
use crate::descriptors::ServiceDescriptor;
use crate::error::DiResult;
use crate::key::Namespace;
use crate::lifetime::{Lifetime, Visibility};
use crate::plugin::ModuleHandle;
use crate::provider::{describe, ResolverContext};
use crate::registration::Registry;

/// Collection that tags every registration with a fixed namespace.
///
/// There is no way to register outside the namespace through this type.
/// Convenience forms default to [`Visibility::Internal`]; use
/// [`add_service`](Self::add_service) or
/// [`add_trait_service`](Self::add_trait_service) to export a service to
/// other namespaces.
///
/// Registrations are staged here and merged with
/// [`ServiceCollection::absorb`](crate::ServiceCollection::absorb).
///
/// ```
/// use ferrous_host::{Lifetime, Namespace, NamespacedCollection, Visibility};
///
/// struct Cache;
/// struct Metrics;
///
/// let mut staged = NamespacedCollection::new(Namespace::plugin("stats"));
/// staged.add_singleton(Cache).unwrap();
/// staged
///     .add_service::<Metrics, _>(Lifetime::Singleton, Visibility::Exported, |_| Ok(Metrics))
///     .unwrap();
///
/// let exported: Vec<_> = staged
///     .descriptors()
///     .into_iter()
///     .filter(|d| d.is_exported())
///     .collect();
/// assert_eq!(exported.len(), 1);
/// assert!(exported[0].type_name().ends_with("Metrics"));
/// ```
pub struct NamespacedCollection {
    namespace: Namespace,
    registry: Registry,
}

impl NamespacedCollection {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            registry: Registry::new(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn add_service<T, F>(
        &mut self,
        lifetime: Lifetime,
        visibility: Visibility,
        factory: F,
    ) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        register_type(&mut self.registry, lifetime, &self.namespace, visibility, factory)?;
        Ok(self)
    }

    pub fn add_trait_service<Trait, F>(
        &mut self,
        lifetime: Lifetime,
        visibility: Visibility,
        factory: F,
    ) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        register_trait(&mut self.registry, lifetime, &self.namespace, visibility, factory)?;
        Ok(self)
    }

    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> DiResult<&mut Self> {
        register_value(&mut self.registry, self.namespace.clone(), Visibility::Internal, value)?;
        Ok(self)
    }

    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_service(Lifetime::Singleton, Visibility::Internal, factory)
    }

    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_service(Lifetime::Scoped, Visibility::Internal, factory)
    }

    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_service(Lifetime::Transient, Visibility::Internal, factory)
    }

    pub fn add_singleton_trait<Trait>(&mut self, value: Arc<Trait>) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
    {
        register_trait_value(&mut self.registry, self.namespace.clone(), Visibility::Internal, value)?;
        Ok(self)
    }

    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_service(Lifetime::Singleton, Visibility::Internal, factory)
    }

    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_service(Lifetime::Scoped, Visibility::Internal, factory)
    }

    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_service(Lifetime::Transient, Visibility::Internal, factory)
    }

    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry.iter().map(|(k, r)| describe(k, r)).collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    pub(crate) fn pin_module(&mut self, module: &ModuleHandle) {
        self.registry.pin_module(module);
    }

    pub(crate) fn into_registry(self) -> Registry {
        self.registry
    }
}
