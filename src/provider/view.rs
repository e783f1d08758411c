//! Resolver view acting as another namespace.

use crate::error::DiResult;
use crate::key::{Key, Namespace};
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

/// Borrowed resolver that resolves as if called from `namespace`.
///
/// Plugin handlers use this to reach their own `Internal` services through
/// the request scope: `ctx.services_in(&ns)?.get_local::<T>()`.
pub struct NamespaceView<'a, R: ResolverCore + ?Sized> {
    resolver: &'a R,
    namespace: Namespace,
}

impl<'a, R: ResolverCore + ?Sized> NamespaceView<'a, R> {
    pub(crate) fn new(resolver: &'a R, namespace: Namespace) -> Self {
        Self { resolver, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl<'a, R: ResolverCore + ?Sized> ResolverCore for NamespaceView<'a, R> {
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
