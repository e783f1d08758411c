//! Dynamically loaded extensions.
//!
//! A plugin is a `cdylib` exporting [`PLUGIN_ENTRY_NAME`] with C linkage.
//! The entry returns an owned thin pointer to a `Box<dyn Plugin>`; the
//! [`declare_plugin!`](crate::declare_plugin) macro writes it. Plugins must
//! be compiled with the same compiler and `ferrous-host` version as the
//! host, since trait objects cross the boundary.
//!
//! Everything a plugin hands to the host (service factories, controllers,
//! middleware) runs code from the plugin's module. Each of those holds a
//! handle to the module, so it stays mapped until the last one is dropped,
//! even after [`PluginManager::unload_plugin`]. Values resolved from plugin
//! services are not tracked and must not outlive the provider.

use std::ffi::c_void;
use std::sync::Arc;

use serde::Serialize;

use crate::collection::NamespacedCollection;
use crate::controller::Controller;
use crate::middleware::Middleware;
use crate::provider::ServiceProvider;

mod loader;
mod manager;
mod pin;

pub use loader::{LibraryLoader, LoadedModule, ModuleLoader};
pub use manager::PluginManager;
pub(crate) use pin::{pin_handler, pin_middleware, ModuleHandle};

/// Exported symbol name looked up in every plugin module.
pub const PLUGIN_ENTRY_NAME: &str = "ferrous_host_plugin_entry";

/// [`PLUGIN_ENTRY_NAME`] with a trailing NUL, as passed to the loader.
pub const PLUGIN_ENTRY_SYMBOL: &[u8] = b"ferrous_host_plugin_entry\0";

/// Signature of the entry symbol: returns `Box::into_raw(Box::new(Box<dyn Plugin>))`.
pub type PluginEntryFn = unsafe extern "C" fn() -> *mut c_void;

/// Identity a plugin reports once instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            author: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

/// Extension contract implemented by plugin modules.
///
/// Services are registered into a [`NamespacedCollection`] bound to
/// `plugin:<name>`; they default to `Internal` so other plugins cannot
/// depend on them unless exported.
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    fn register_services(&self, services: &mut NamespacedCollection) -> anyhow::Result<()>;

    fn controllers(&self) -> Vec<Box<dyn Controller>> {
        Vec::new()
    }

    /// Middleware appended to the host pipeline, built once the provider exists.
    fn middleware(&self, provider: &ServiceProvider) -> Vec<Arc<dyn Middleware>> {
        let _ = provider;
        Vec::new()
    }

    /// Called before the module is released; failures are logged only.
    fn on_shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Exports the plugin entry symbol for a `cdylib`.
///
/// ```ignore
/// struct Audit;
/// impl ferrous_host::Plugin for Audit { /* ... */ }
///
/// ferrous_host::declare_plugin!(Audit);
/// ```
///
/// The constructor expression runs inside an `extern "C"` function; a panic
/// there aborts the process.
#[macro_export]
macro_rules! declare_plugin {
    ($constructor:expr) => {
        #[no_mangle]
        pub extern "C" fn ferrous_host_plugin_entry() -> *mut ::std::ffi::c_void {
            let plugin: ::std::boxed::Box<dyn $crate::Plugin> = ::std::boxed::Box::new($constructor);
            ::std::boxed::Box::into_raw(::std::boxed::Box::new(plugin)) as *mut ::std::ffi::c_void
        }
    };
}

pub(crate) fn is_valid_plugin_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}
