//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::{Lifetime, Visibility};
use crate::plugin::ModuleHandle;

// ResolverContext is defined in provider module
pub(crate) use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Service registration with lifetime, visibility and constructor
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) visibility: Visibility,
    pub(crate) ctor: Ctor,
    /// Concrete type backing a trait registration, for diagnostics
    pub(crate) impl_name: Option<&'static str>,
    /// Singleton cache; initialised at most once per provider, unused otherwise
    pub(crate) single_runtime: OnceCell<AnyArc>,
    /// Scoped slot index for O(1) scoped service resolution
    pub(crate) scoped_slot: Option<usize>,
    /// Plugin module the constructor lives in. Declared last so it is
    /// released after the constructor and the cached singleton.
    pub(crate) module: Option<ModuleHandle>,
}

impl Registration {
    pub(crate) fn new(lifetime: Lifetime, visibility: Visibility, ctor: Ctor) -> Self {
        Self {
            lifetime,
            visibility,
            ctor,
            impl_name: None,
            single_runtime: OnceCell::new(),
            scoped_slot: None,
            module: None,
        }
    }

    pub(crate) fn with_impl_name(mut self, impl_name: &'static str) -> Self {
        self.impl_name = Some(impl_name);
        self
    }
}

/// Service registry holding all registrations in insertion order
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<(Key, Registration)>,
    index: HashMap<Key, usize>,
    /// Total count of scoped registrations for slot allocation
    pub(crate) scoped_count: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a registration, refusing a second one for the same key
    pub(crate) fn insert(&mut self, key: Key, registration: Registration) -> DiResult<()> {
        if self.index.contains_key(&key) {
            return Err(duplicate(&key));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, registration));
        Ok(())
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    #[inline]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.entries.iter().map(|(k, r)| (k, r))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Moves every registration of `staged` into `self`.
    ///
    /// All keys are checked first; on a collision nothing is moved.
    pub(crate) fn absorb(&mut self, staged: Registry) -> DiResult<()> {
        if let Some((key, _)) = staged
            .entries
            .iter()
            .find(|(key, _)| self.index.contains_key(key))
        {
            return Err(duplicate(key));
        }
        for (key, registration) in staged.entries {
            self.insert(key, registration)?;
        }
        Ok(())
    }

    /// Ties every registration to the module its code was loaded from.
    pub(crate) fn pin_module(&mut self, module: &ModuleHandle) {
        for (_, reg) in &mut self.entries {
            reg.module = Some(Arc::clone(module));
        }
    }

    /// Assigns scoped slot indices
    pub(crate) fn finalize(&mut self) {
        let mut next_scoped_slot = 0;
        for (_, reg) in &mut self.entries {
            if reg.lifetime == Lifetime::Scoped {
                reg.scoped_slot = Some(next_scoped_slot);
                next_scoped_slot += 1;
            }
        }
        self.scoped_count = next_scoped_slot;
    }
}

fn duplicate(key: &Key) -> DiError {
    DiError::Duplicate {
        service: key.display_name(),
        namespace: key.namespace().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{key_of_type, Namespace};

    fn reg(lifetime: Lifetime) -> Registration {
        Registration::new(lifetime, Visibility::Exported, Arc::new(|_| Ok(Arc::new(1u8) as AnyArc)))
    }

    #[test]
    fn insert_rejects_same_key() {
        let mut registry = Registry::new();
        let key = key_of_type::<u8>(&Namespace::global());
        registry.insert(key.clone(), reg(Lifetime::Singleton)).unwrap();

        let err = registry.insert(key, reg(Lifetime::Transient)).unwrap_err();
        assert!(matches!(err, DiError::Duplicate { service: "u8", .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn absorb_is_all_or_nothing() {
        let mut registry = Registry::new();
        registry
            .insert(key_of_type::<u8>(&Namespace::plugin("a")), reg(Lifetime::Singleton))
            .unwrap();

        let mut staged = Registry::new();
        staged
            .insert(key_of_type::<u16>(&Namespace::plugin("a")), reg(Lifetime::Scoped))
            .unwrap();
        staged
            .insert(key_of_type::<u8>(&Namespace::plugin("a")), reg(Lifetime::Scoped))
            .unwrap();

        assert!(registry.absorb(staged).is_err());
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains_key(&key_of_type::<u16>(&Namespace::plugin("a"))));
    }

    #[test]
    fn finalize_numbers_scoped_registrations() {
        let mut registry = Registry::new();
        let g = Namespace::global();
        registry.insert(key_of_type::<u8>(&g), reg(Lifetime::Scoped)).unwrap();
        registry.insert(key_of_type::<u16>(&g), reg(Lifetime::Singleton)).unwrap();
        registry.insert(key_of_type::<u32>(&g), reg(Lifetime::Scoped)).unwrap();
        registry.finalize();

        assert_eq!(registry.scoped_count, 2);
        assert_eq!(registry.get(&key_of_type::<u32>(&g)).unwrap().scoped_slot, Some(1));
        assert_eq!(registry.get(&key_of_type::<u16>(&g)).unwrap().scoped_slot, None);
    }
}
