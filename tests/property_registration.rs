/// Property-based tests for service registration
///
/// Registration order and namespace mix must never change what resolves:
/// every (interface, namespace) pair is registered at most once and resolves
/// to exactly the value registered for it.
use ferrous_host::{
    DiError, Lifetime, Namespace, NamespacedCollection, Resolver, ServiceCollection, Visibility,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn namespace_for(index: u8) -> Namespace {
    if index == 0 {
        Namespace::global()
    } else {
        Namespace::plugin(&format!("p{index}"))
    }
}

proptest! {
    #[test]
    fn each_namespace_resolves_its_own_value(namespaces in prop::collection::vec(0u8..6, 1..20)) {
        let mut services = ServiceCollection::new();
        let mut registered = HashSet::new();

        for index in &namespaces {
            let ns = namespace_for(*index);
            let value = u32::from(*index) * 10;
            let result = services.add_service::<u32, _>(
                Lifetime::Singleton,
                ns.clone(),
                Visibility::Exported,
                move |_| Ok(value),
            );
            if registered.insert(*index) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(DiError::Duplicate { .. })), "expected DiError::Duplicate");
            }
        }

        prop_assert_eq!(services.len(), registered.len());
        let provider = services.build();
        for index in registered {
            let resolved = provider.get_in::<u32>(&namespace_for(index)).unwrap();
            prop_assert_eq!(*resolved, u32::from(index) * 10);
        }
    }
}

proptest! {
    #[test]
    fn singleton_is_one_instance(resolutions in 1usize..50, seed in any::<u64>()) {
        let mut services = ServiceCollection::new();
        services.add_singleton_factory::<u64, _>(move |_| Ok(seed)).unwrap();
        let provider = services.build();

        let first = provider.get::<u64>().unwrap();
        for _ in 0..resolutions {
            let again = provider.get::<u64>().unwrap();
            prop_assert!(Arc::ptr_eq(&first, &again));
        }
        prop_assert_eq!(*first, seed);
    }
}

proptest! {
    #[test]
    fn internal_visibility_is_enforced(owner in 1u8..5, caller in 0u8..5) {
        let mut services = ServiceCollection::new();
        let mut staged = NamespacedCollection::new(namespace_for(owner));
        staged.add_singleton(String::from("hidden")).unwrap();
        services.absorb(staged).unwrap();
        let provider = services.build();

        let view = provider.as_namespace(namespace_for(caller));
        let result = view.get_in::<String>(&namespace_for(owner));
        if owner == caller {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(DiError::NotExported { .. })), "owner {} caller {}", owner, caller);
        }
    }
}

proptest! {
    #[test]
    fn transient_is_always_fresh(resolutions in 2usize..20) {
        let mut services = ServiceCollection::new();
        services.add_transient_factory::<Vec<u8>, _>(|_| Ok(Vec::new())).unwrap();
        let provider = services.build();

        let instances: Vec<_> = (0..resolutions).map(|_| provider.get::<Vec<u8>>().unwrap()).collect();
        for (i, a) in instances.iter().enumerate() {
            for b in &instances[i + 1..] {
                prop_assert!(!Arc::ptr_eq(a, b));
            }
        }
    }
}
