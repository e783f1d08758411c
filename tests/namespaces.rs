use ferrous_host::{
    DiError, Lifetime, Namespace, NamespacedCollection, Resolver, ServiceCollection, Visibility,
};
use std::sync::Arc;

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);
impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

struct Secret(&'static str);
struct Report(String);

fn billing() -> Namespace {
    Namespace::plugin("billing")
}

fn build() -> ferrous_host::ServiceProvider {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn Clock>(Arc::new(FixedClock(100))).unwrap();

    let mut staged = NamespacedCollection::new(billing());
    staged.add_singleton(Secret("s3cr3t")).unwrap();
    staged
        .add_trait_service::<dyn Clock, _>(Lifetime::Singleton, Visibility::Exported, |_| {
            Ok(Arc::new(FixedClock(7)) as Arc<dyn Clock>)
        })
        .unwrap();
    staged
        .add_service::<Report, _>(Lifetime::Transient, Visibility::Exported, |r| {
            // Plugin factories resolve as their own namespace.
            let secret = r.get_local::<Secret>()?;
            let clock = r.get_trait::<dyn Clock>()?;
            Ok(Report(format!("{}@{}", secret.0.len(), clock.now())))
        })
        .unwrap();
    sc.absorb(staged).unwrap();
    sc.build()
}

#[test]
fn test_namespace_tags() {
    assert!(Namespace::global().is_global());
    assert_eq!(billing().as_str(), "plugin:billing");
    assert_eq!(billing().plugin_name(), Some("billing"));
    assert_eq!(Namespace::new("global"), Namespace::global());
}

#[test]
fn test_internal_service_hidden_from_other_namespaces() {
    let sp = build();

    assert!(matches!(sp.get_in::<Secret>(&billing()), Err(DiError::NotExported { .. })));
    let other = sp.as_namespace(Namespace::plugin("other"));
    assert!(matches!(other.get_in::<Secret>(&billing()), Err(DiError::NotExported { .. })));

    let own = sp.as_namespace(billing());
    assert_eq!(own.get_local::<Secret>().unwrap().0, "s3cr3t");
}

#[test]
fn test_exported_service_visible_everywhere() {
    let sp = build();
    assert_eq!(sp.get_trait_in::<dyn Clock>(&billing()).unwrap().now(), 7);

    let other = sp.as_namespace(Namespace::plugin("other"));
    assert_eq!(other.get_trait_in::<dyn Clock>(&billing()).unwrap().now(), 7);
}

#[test]
fn test_same_interface_resolves_per_namespace() {
    let sp = build();
    assert_eq!(sp.get_trait::<dyn Clock>().unwrap().now(), 100);
    assert_eq!(sp.get_trait_in::<dyn Clock>(&billing()).unwrap().now(), 7);
}

#[test]
fn test_plugin_factory_resolves_in_own_namespace() {
    let sp = build();
    let report = sp.get_in::<Report>(&billing()).unwrap();
    // `get_trait` from inside a factory still means the global namespace.
    assert_eq!(report.0, "6@100");
}

#[test]
fn test_absorb_is_all_or_nothing() {
    let mut sc = ServiceCollection::new();
    sc.add_service::<u8, _>(Lifetime::Singleton, billing(), Visibility::Internal, |_| Ok(1))
        .unwrap();

    let mut staged = NamespacedCollection::new(billing());
    staged.add_singleton(2u16).unwrap();
    staged.add_singleton(3u8).unwrap();

    assert!(matches!(sc.absorb(staged), Err(DiError::Duplicate { .. })));
    assert_eq!(sc.len(), 1);
    assert!(!sc.contains::<u16>(&billing()));
}

#[test]
fn test_scoped_plugin_service_through_scope_view() {
    struct Session(u32);

    let mut sc = ServiceCollection::new();
    let mut staged = NamespacedCollection::new(billing());
    staged.add_scoped_factory::<Session, _>(|_| Ok(Session(9))).unwrap();
    sc.absorb(staged).unwrap();
    let sp = sc.build();

    let scope = sp.create_scope();
    let view = scope.as_namespace(billing());
    let a = view.get_local::<Session>().unwrap();
    let b = view.get_local::<Session>().unwrap();
    assert_eq!(a.0, 9);
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_optional_forms() {
    let sp = build();
    assert!(sp.get_optional_in::<Report>(&billing()).unwrap().is_some());
    assert!(sp.get_optional_in::<Report>(&Namespace::plugin("nobody")).unwrap().is_none());
    assert!(sp.get_trait_optional::<dyn Clock>().unwrap().is_some());
    // Present but not visible is still an error, not `None`.
    assert!(sp.get_optional_in::<Secret>(&billing()).is_err());
}
