//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::error::DiResult;
use crate::key::{key_of_trait, key_of_type, Namespace};
use crate::lifetime::{Lifetime, Visibility};
use crate::observer::{DiObserver, Observers};
use crate::provider::{describe, ResolverContext, ServiceProvider};
use crate::registration::{AnyArc, Ctor, Registration, Registry};

pub mod module_system;
pub mod namespaced;

pub use module_system::*;
pub use namespaced::NamespacedCollection;

/// Append-only registry of services, consumed once by [`build`](Self::build).
///
/// Each (interface, namespace) pair may be registered once; a second
/// registration fails immediately with
/// [`DiError::Duplicate`](crate::DiError::Duplicate). The convenience forms
/// register into the global namespace as `Exported`; use
/// [`add_service`](Self::add_service) for explicit namespace and visibility.
///
/// Factories are fallible: they return `DiResult<T>` so a missing dependency
/// propagates with `?` instead of panicking.
///
/// # Examples
///
/// ```
/// use ferrous_host::{DiError, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct Formal { title: Arc<String> }
/// impl Greeter for Formal {
///     fn greet(&self) -> String { format!("Good day, {}", self.title) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton("Dr.".to_string()).unwrap();
/// services.add_transient_trait_factory::<dyn Greeter, _>(|r| {
///     Ok(Arc::new(Formal { title: r.get::<String>()? }))
/// }).unwrap();
///
/// assert!(matches!(
///     services.add_singleton("again".to_string()),
///     Err(DiError::Duplicate { .. })
/// ));
///
/// let provider = services.build();
/// assert_eq!(provider.get_trait::<dyn Greeter>().unwrap().greet(), "Good day, Dr.");
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    registry: Registry,
    observers: Observers,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Namespace/visibility qualified registrations -----

    /// Registers a concrete type under an explicit namespace and visibility.
    pub fn add_service<T, F>(
        &mut self,
        lifetime: Lifetime,
        namespace: Namespace,
        visibility: Visibility,
        factory: F,
    ) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        register_type(&mut self.registry, lifetime, &namespace, visibility, factory)?;
        Ok(self)
    }

    /// Registers a trait object under an explicit namespace and visibility.
    pub fn add_trait_service<Trait, F>(
        &mut self,
        lifetime: Lifetime,
        namespace: Namespace,
        visibility: Visibility,
        factory: F,
    ) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        register_trait(&mut self.registry, lifetime, &namespace, visibility, factory)?;
        Ok(self)
    }

    // ----- Concrete Type Registrations -----

    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> DiResult<&mut Self> {
        register_value(&mut self.registry, Namespace::global(), Visibility::Exported, value)?;
        Ok(self)
    }

    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_global(Lifetime::Singleton, factory)
    }

    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_global(Lifetime::Scoped, factory)
    }

    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_global(Lifetime::Transient, factory)
    }

    fn add_global<T, F>(&mut self, lifetime: Lifetime, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_service(lifetime, Namespace::global(), Visibility::Exported, factory)
    }

    // ----- Trait Registrations -----

    pub fn add_singleton_trait<Trait>(&mut self, value: Arc<Trait>) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
    {
        register_trait_value(&mut self.registry, Namespace::global(), Visibility::Exported, value)?;
        Ok(self)
    }

    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_service(Lifetime::Singleton, Namespace::global(), Visibility::Exported, factory)
    }

    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_service(Lifetime::Scoped, Namespace::global(), Visibility::Exported, factory)
    }

    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_service(Lifetime::Transient, Namespace::global(), Visibility::Exported, factory)
    }

    // ----- Observers & introspection -----

    /// Adds an observer notified around every resolution.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    pub fn contains<T: 'static>(&self, namespace: &Namespace) -> bool {
        self.registry.contains_key(&key_of_type::<T>(namespace))
    }

    pub fn contains_trait<Trait: ?Sized + 'static>(&self, namespace: &Namespace) -> bool {
        self.registry.contains_key(&key_of_trait::<Trait>(namespace))
    }

    /// Descriptors for every registration made so far, in order.
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry.iter().map(|(k, r)| describe(k, r)).collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Merges a staged namespaced collection.
    ///
    /// Either every staged registration is added or, on the first key that
    /// already exists, none is and the collection is left unchanged.
    pub fn absorb(&mut self, staged: NamespacedCollection) -> DiResult<()> {
        let namespace = staged.namespace().clone();
        let registry = staged.into_registry();
        let count = registry.len();
        self.registry.absorb(registry)?;
        tracing::debug!(%namespace, count, "merged namespaced registrations");
        Ok(())
    }

    /// Freezes the collection into a [`ServiceProvider`].
    pub fn build(mut self) -> ServiceProvider {
        self.registry.finalize();
        tracing::debug!(
            registrations = self.registry.len(),
            scoped = self.registry.scoped_count,
            "service provider built"
        );
        ServiceProvider::new(self.registry, self.observers)
    }
}

pub(crate) fn register_type<T, F>(
    registry: &mut Registry,
    lifetime: Lifetime,
    namespace: &Namespace,
    visibility: Visibility,
    factory: F,
) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
{
    let ctor: Ctor = Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> {
        Ok(Arc::new(factory(r)?))
    });
    let registration = Registration::new(lifetime, visibility, ctor)
        .with_impl_name(std::any::type_name::<T>());
    registry.insert(key_of_type::<T>(namespace), registration)
}

pub(crate) fn register_value<T: Send + Sync + 'static>(
    registry: &mut Registry,
    namespace: Namespace,
    visibility: Visibility,
    value: T,
) -> DiResult<()> {
    let arc: AnyArc = Arc::new(value);
    let ctor: Ctor = Arc::new(move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(arc.clone()) });
    let registration = Registration::new(Lifetime::Singleton, visibility, ctor)
        .with_impl_name(std::any::type_name::<T>());
    registry.insert(key_of_type::<T>(&namespace), registration)
}

pub(crate) fn register_trait<Trait, F>(
    registry: &mut Registry,
    lifetime: Lifetime,
    namespace: &Namespace,
    visibility: Visibility,
    factory: F,
) -> DiResult<()>
where
    Trait: ?Sized + Send + Sync + 'static,
    F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
{
    // Stored as Arc<Arc<dyn Trait>> so it fits in Any
    let ctor: Ctor = Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> {
        Ok(Arc::new(factory(r)?))
    });
    registry.insert(
        key_of_trait::<Trait>(namespace),
        Registration::new(lifetime, visibility, ctor),
    )
}

pub(crate) fn register_trait_value<Trait>(
    registry: &mut Registry,
    namespace: Namespace,
    visibility: Visibility,
    value: Arc<Trait>,
) -> DiResult<()>
where
    Trait: ?Sized + Send + Sync + 'static,
{
    let any_arc: AnyArc = Arc::new(value);
    let ctor: Ctor = Arc::new(move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(any_arc.clone()) });
    registry.insert(
        key_of_trait::<Trait>(&namespace),
        Registration::new(Lifetime::Singleton, visibility, ctor),
    )
}
