//! Resolver context handed to factories.

use crate::error::DiResult;
use crate::key::{Key, Namespace};
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

/// Context passed to factory functions for resolving dependencies.
///
/// The context acts as the namespace of the registration being built, so a
/// plugin factory can reach its own `Internal` services with
/// [`get_local`](crate::Resolver::get_local) while global dependencies stay
/// behind the visibility rule.
///
/// Singleton factories always receive a root-backed context: a singleton
/// that asks for a scoped service fails with
/// [`DiError::NoActiveScope`](crate::DiError::NoActiveScope) instead of
/// capturing one request's instance forever.
///
/// # Examples
///
/// ```
/// use ferrous_host::{Namespace, NamespacedCollection, Resolver, ServiceCollection};
///
/// struct Settings { retries: u32 }
/// struct Client { retries: u32 }
///
/// let mut plugin = NamespacedCollection::new(Namespace::plugin("sync"));
/// plugin.add_singleton(Settings { retries: 3 }).unwrap();
/// plugin.add_transient_factory::<Client, _>(|r| {
///     assert_eq!(r.namespace().as_str(), "plugin:sync");
///     let settings = r.get_local::<Settings>()?;
///     Ok(Client { retries: settings.retries })
/// }).unwrap();
///
/// let mut services = ServiceCollection::new();
/// services.absorb(plugin).unwrap();
/// let provider = services.build();
///
/// let view = provider.as_namespace(Namespace::plugin("sync"));
/// assert_eq!(view.get_local::<Client>().unwrap().retries, 3);
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
    namespace: Namespace,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new<R: ResolverCore>(resolver: &'a R, namespace: &Namespace) -> Self {
        Self {
            resolver,
            namespace: namespace.clone(),
        }
    }

    /// Namespace of the registration being constructed.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, key: &Key, caller: &Namespace) -> DiResult<AnyArc> {
        self.resolver.resolve_any(key, caller)
    }

    fn caller_namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn contains_key(&self, key: &Key) -> bool {
        self.resolver.contains_key(key)
    }
}
