//! Service descriptors for introspection and diagnostics.

use crate::key::{Key, Namespace};
use crate::lifetime::{Lifetime, Visibility};

/// Read-only view of one registration.
///
/// The factory stays private to the container; descriptors carry everything
/// else needed to inspect a configuration at startup or in health checks.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{Lifetime, Namespace, NamespacedCollection, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42u32).unwrap();
/// services.add_singleton_trait::<dyn Greeter>(Arc::new(English)).unwrap();
///
/// let mut plugin = NamespacedCollection::new(Namespace::plugin("metrics"));
/// plugin.add_scoped_factory::<String, _>(|_| Ok("per-request".to_string())).unwrap();
/// services.absorb(plugin).unwrap();
///
/// let descriptors = services.get_service_descriptors();
/// assert_eq!(descriptors.len(), 3);
///
/// let local = descriptors
///     .iter()
///     .find(|d| d.namespace() == &Namespace::plugin("metrics"))
///     .unwrap();
/// assert_eq!(local.lifetime, Lifetime::Scoped);
/// assert!(!local.is_exported());
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Interface identity and namespace
    pub key: Key,
    pub lifetime: Lifetime,
    pub visibility: Visibility,
    /// Concrete type backing a trait registration, when known
    pub impl_type_name: Option<&'static str>,
}

impl ServiceDescriptor {
    /// The type or trait name of the registered interface.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    pub fn namespace(&self) -> &Namespace {
        self.key.namespace()
    }

    pub fn is_exported(&self) -> bool {
        self.visibility.is_exported()
    }

    /// Whether this registration is a `dyn Trait` binding.
    pub fn is_trait(&self) -> bool {
        matches!(self.key, Key::Trait(..))
    }
}
