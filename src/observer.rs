//! Resolution observers.
//!
//! Observers receive an event before each resolution attempt and one after
//! it completes or fails. They are registered on the [`ServiceCollection`]
//! and frozen into the provider by `build()`.
//!
//! [`ServiceCollection`]: crate::ServiceCollection

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Hook invoked around every service resolution.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{DiObserver, Key, ServiceCollection, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Counting(AtomicUsize);
///
/// impl DiObserver for Counting {
///     fn resolving(&self, _key: &Key) {}
///     fn resolved(&self, _key: &Key, _elapsed: std::time::Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let observer = Arc::new(Counting::default());
/// let mut services = ServiceCollection::new();
/// services.add_singleton(7u32).unwrap();
/// services.add_observer(observer.clone());
///
/// let provider = services.build();
/// provider.get::<u32>().unwrap();
/// provider.get::<u32>().unwrap();
/// assert_eq!(observer.0.load(Ordering::Relaxed), 2);
/// ```
pub trait DiObserver: Send + Sync {
    fn resolving(&self, key: &Key);

    fn resolved(&self, key: &Key, elapsed: Duration);

    /// Called instead of `resolved` when the factory or a lookup failed.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, elapsed: Duration) {
        for observer in &self.observers {
            observer.resolved(key, elapsed);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }
}

/// Observer that forwards resolution events to `tracing` at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(service = key.display_name(), namespace = %key.namespace(), "resolving");
    }

    fn resolved(&self, key: &Key, elapsed: Duration) {
        tracing::trace!(
            service = key.display_name(),
            namespace = %key.namespace(),
            elapsed_us = elapsed.as_micros() as u64,
            "resolved"
        );
    }

    fn failed(&self, key: &Key, error: &DiError) {
        tracing::debug!(service = key.display_name(), namespace = %key.namespace(), %error, "resolution failed");
    }
}
