//! Scoped service resolution.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::OnceCell;

use super::{NamespaceView, ResolverContext, ServiceProvider};
use crate::error::{DiError, DiResult};
use crate::internal::StackGuard;
use crate::key::{global_namespace, Key, Namespace};
use crate::registration::{AnyArc, Registration};
use crate::traits::ResolverCore;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Short-lived child resolver, one per request.
///
/// Scoped services are cached in per-registration slots: the same scope
/// always returns the same instance, two scopes never share one. Singletons
/// are delegated to the root provider. Dropping the scope releases every
/// scoped instance it realized.
///
/// # Examples
///
/// ```
/// use ferrous_host::{ServiceCollection, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// struct RequestId(u32);
///
/// let counter = Arc::new(AtomicU32::new(0));
/// let c = counter.clone();
///
/// let mut collection = ServiceCollection::new();
/// collection.add_scoped_factory::<RequestId, _>(move |_| {
///     Ok(RequestId(c.fetch_add(1, Ordering::SeqCst) + 1))
/// }).unwrap();
///
/// let provider = collection.build();
/// let scope1 = provider.create_scope();
/// let scope2 = provider.create_scope();
///
/// let a = scope1.get::<RequestId>().unwrap();
/// let b = scope1.get::<RequestId>().unwrap();
/// let c = scope2.get::<RequestId>().unwrap();
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(!Arc::ptr_eq(&a, &c));
/// assert_eq!(counter.load(Ordering::SeqCst), 2);
/// ```
// Cached instances drop before the root, which may hold the last handle
// to the plugin module their types live in.
pub struct Scope {
    scoped_cells: Box<[OnceCell<AnyArc>]>,
    root: ServiceProvider,
    id: u64,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        let scoped_count = root.inner().registry.scoped_count;
        let scoped_cells = (0..scoped_count)
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(scope_id = id, "scope created");

        Self {
            scoped_cells,
            root,
            id,
        }
    }

    /// Process-unique scope identifier, useful for log correlation.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The root provider this scope was created from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.root
    }

    /// Resolver view over this scope acting as `namespace`.
    pub fn as_namespace(&self, namespace: Namespace) -> NamespaceView<'_, Self> {
        NamespaceView::new(self, namespace)
    }

    pub(crate) fn resolve_scoped(&self, reg: &Registration, key: &Key) -> DiResult<AnyArc> {
        let cell = reg
            .scoped_slot
            .and_then(|slot| self.scoped_cells.get(slot))
            .ok_or(DiError::NoActiveScope(key.display_name()))?;

        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }

        let _guard = StackGuard::enter(key)?;
        cell.get_or_try_init(|| (reg.ctor)(&ResolverContext::new(self, key.namespace())))
            .cloned()
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key, caller: &Namespace) -> DiResult<AnyArc> {
        self.root.resolve_with(key, caller, Some(self))
    }

    fn caller_namespace(&self) -> &Namespace {
        global_namespace()
    }

    fn contains_key(&self, key: &Key) -> bool {
        self.root.contains_key(key)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let realized = self.scoped_cells.iter().filter(|c| c.get().is_some()).count();
        tracing::trace!(scope_id = self.id, realized, "scope dropped");
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("slots", &self.scoped_cells.len())
            .finish()
    }
}
