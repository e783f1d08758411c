use ferrous_host::{DiError, DiResult, Lifetime, Namespace, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize).unwrap();
    sc.add_singleton("hello".to_string()).unwrap();

    let sp = sc.build();

    let num1 = sp.get::<usize>().unwrap();
    let num2 = sp.get::<usize>().unwrap();
    let str1 = sp.get::<String>().unwrap();
    let str2 = sp.get::<String>().unwrap();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
    assert!(Arc::ptr_eq(&str1, &str2));
}

#[test]
fn test_factory_with_dependencies() {
    struct Config {
        port: u16,
    }

    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { port: 8080 }).unwrap();
    sc.add_singleton_factory::<Server, _>(|r| {
        Ok(Server {
            config: r.get::<Config>()?,
            name: "MyServer".to_string(),
        })
    })
    .unwrap();

    let sp = sc.build();
    let server = sp.get::<Server>().unwrap();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_singleton_factory_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Vec<u8>, _>(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1, 2, 3])
    })
    .unwrap();

    let sp = sc.build();
    for _ in 0..10 {
        sp.get::<Vec<u8>>().unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_always_distinct() {
    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<String, _>(|_| Ok("fresh".to_string())).unwrap();

    let sp = sc.build();
    let a = sp.get::<String>().unwrap();
    let b = sp.get::<String>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_trait_resolution() {
    trait Logger: Send + Sync {
        fn prefix(&self) -> &str;
    }

    struct Console;
    impl Logger for Console {
        fn prefix(&self) -> &str {
            "[console]"
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn Logger>(Arc::new(Console)).unwrap();

    let sp = sc.build();
    let a = sp.get_trait::<dyn Logger>().unwrap();
    let b = sp.get_trait::<dyn Logger>().unwrap();
    assert_eq!(a.prefix(), "[console]");
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_duplicate_registration_fails_immediately() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u32).unwrap();

    let err = sc.add_transient_factory::<u32, _>(|_| Ok(2)).err().unwrap();
    assert!(matches!(err, DiError::Duplicate { .. }));

    // The first registration is untouched.
    assert_eq!(*sc.build().get::<u32>().unwrap(), 1);
}

#[test]
fn test_same_type_in_two_namespaces_is_not_a_duplicate() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u32).unwrap();
    sc.add_service::<u32, _>(
        Lifetime::Singleton,
        Namespace::plugin("a"),
        ferrous_host::Visibility::Exported,
        |_| Ok(2),
    )
    .unwrap();

    let sp = sc.build();
    assert_eq!(*sp.get::<u32>().unwrap(), 1);
    assert_eq!(*sp.get_in::<u32>(&Namespace::plugin("a")).unwrap(), 2);
}

#[test]
fn test_missing_service() {
    let sp = ServiceCollection::new().build();
    assert!(matches!(sp.get::<u64>(), Err(DiError::NotFound { .. })));
    assert!(sp.get_optional::<u64>().unwrap().is_none());
}

#[test]
fn test_factory_error_propagates() {
    struct NeedsConfig;

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<NeedsConfig, _>(|r| -> DiResult<NeedsConfig> {
        r.get::<std::time::Duration>()?;
        Ok(NeedsConfig)
    })
    .unwrap();

    let sp = sc.build();
    assert!(matches!(sp.get::<NeedsConfig>(), Err(DiError::NotFound { .. })));
}

#[test]
fn test_failed_singleton_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<String, _>(move |_| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(DiError::factory::<String>("first attempt fails"))
        } else {
            Ok("ready".to_string())
        }
    })
    .unwrap();

    let sp = sc.build();
    assert!(matches!(sp.get::<String>(), Err(DiError::Factory { .. })));
    assert_eq!(*sp.get::<String>().unwrap(), "ready");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_descriptors() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u8).unwrap();
    sc.add_scoped_factory::<u16, _>(|_| Ok(2)).unwrap();

    let descriptors = sc.get_service_descriptors();
    assert_eq!(descriptors.len(), 2);
    assert!(descriptors
        .iter()
        .any(|d| d.lifetime == Lifetime::Scoped && d.type_name().contains("u16")));

    let sp = sc.build();
    assert_eq!(sp.descriptors().len(), 2);
    assert!(sp.contains::<u8>(&Namespace::global()));
    assert!(!sp.contains::<u8>(&Namespace::plugin("x")));
}
