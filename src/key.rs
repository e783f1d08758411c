//! Service key and namespace types for the container.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

const GLOBAL_NAME: &str = "global";
const PLUGIN_PREFIX: &str = "plugin:";

static GLOBAL: Lazy<Namespace> = Lazy::new(|| Namespace(Arc::from(GLOBAL_NAME)));

/// A partition of the service registry.
///
/// Core application services live in `"global"`; each plugin gets
/// `"plugin:<name>"`. Cloning is a reference-count bump.
///
/// ```rust
/// use ferrous_host::Namespace;
///
/// let ns = Namespace::plugin("audit");
/// assert_eq!(ns.as_str(), "plugin:audit");
/// assert_eq!(ns.plugin_name(), Some("audit"));
/// assert!(Namespace::global().is_global());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(Arc<str>);

impl Namespace {
    /// The namespace core application services are registered in.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Namespace derived from a plugin name.
    pub fn plugin(name: &str) -> Self {
        Namespace(Arc::from(format!("{PLUGIN_PREFIX}{name}")))
    }

    /// Arbitrary namespace tag.
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if tag == GLOBAL_NAME {
            return Self::global();
        }
        Namespace(Arc::from(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_global(&self) -> bool {
        &*self.0 == GLOBAL_NAME
    }

    /// The plugin name for `plugin:<name>` namespaces.
    pub fn plugin_name(&self) -> Option<&str> {
        self.0.strip_prefix(PLUGIN_PREFIX)
    }
}

pub(crate) fn global_namespace() -> &'static Namespace {
    &GLOBAL
}

impl Default for Namespace {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.0)
    }
}

impl From<&str> for Namespace {
    fn from(tag: &str) -> Self {
        Namespace::new(tag)
    }
}

/// Key for service storage and lookup.
///
/// A key is the pair (interface identity, namespace). Concrete types are
/// identified by `TypeId`; trait objects by their `type_name`, since
/// `dyn Trait` registrations are stored as `Arc<dyn Trait>`.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{Key, Namespace, key_of_type};
///
/// let global = key_of_type::<u32>(&Namespace::global());
/// let plugin = key_of_type::<u32>(&Namespace::plugin("billing"));
///
/// assert_eq!(global.display_name(), "u32");
/// assert_ne!(global, plugin);
/// assert_eq!(plugin.namespace().as_str(), "plugin:billing");
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId, name for diagnostics, and namespace
    Type(TypeId, &'static str, Namespace),
    /// Trait object key with trait name and namespace
    Trait(&'static str, Namespace),
}

impl Key {
    /// Get the type or trait name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name, _) => name,
            Key::Trait(name, _) => name,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        match self {
            Key::Type(_, _, ns) => ns,
            Key::Trait(_, ns) => ns,
        }
    }

    /// `Type@namespace`, used in resolution paths.
    pub fn qualified_name(&self) -> String {
        format!("{}@{}", self.display_name(), self.namespace())
    }
}

// TypeId-only comparison for concrete types; the name is diagnostic
impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _, ns_a), Key::Type(b, _, ns_b)) => a == b && ns_a == ns_b,
            (Key::Trait(a, ns_a), Key::Trait(b, ns_b)) => a == b && ns_a == ns_b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _, ns) => {
                0u8.hash(state);
                id.hash(state);
                ns.hash(state);
            }
            Key::Trait(name, ns) => {
                1u8.hash(state);
                name.hash(state);
                ns.hash(state);
            }
        }
    }
}

#[inline]
pub fn key_of_type<T: 'static>(namespace: &Namespace) -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>(), namespace.clone())
}

#[inline]
pub fn key_of_trait<T: ?Sized + 'static>(namespace: &Namespace) -> Key {
    Key::Trait(std::any::type_name::<T>(), namespace.clone())
}
