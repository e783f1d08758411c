use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use super::loader::{is_dynamic_library, LibraryLoader, ModuleLoader};
use super::pin::ModuleHandle;
use super::{is_valid_plugin_name, Plugin, PluginMetadata};
use crate::collection::{NamespacedCollection, ServiceCollection};
use crate::error::PluginError;
use crate::key::Namespace;
use crate::web::HandlerPanic;

// Field order is drop order: the plugin instance goes before its module.
struct PluginEntry {
    plugin: Box<dyn Plugin>,
    metadata: PluginMetadata,
    namespace: Namespace,
    module: ModuleHandle,
}

/// Loads plugin modules and tracks them by name.
///
/// A load either fully succeeds (module open, plugin instantiated, services
/// merged) or leaves the [`ServiceCollection`] untouched and the module
/// released, so the same path can be retried.
///
/// Plugins are unloaded in reverse load order when the manager is dropped.
/// Registrations, routes and middleware built from a plugin share its
/// module, so unloading runs the shutdown hook at once but the module is
/// only released when the last of them is dropped.
pub struct PluginManager {
    loader: Box<dyn ModuleLoader>,
    entries: Vec<PluginEntry>,
}

impl PluginManager {
    /// Manager backed by [`LibraryLoader`].
    pub fn new() -> Self {
        Self::with_loader(LibraryLoader)
    }

    pub fn with_loader(loader: impl ModuleLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            entries: Vec::new(),
        }
    }

    /// Opens `path`, instantiates the plugin and merges its services into
    /// `services` under `plugin:<name>`.
    pub fn load_plugin(
        &mut self,
        path: impl AsRef<Path>,
        services: &mut ServiceCollection,
    ) -> Result<PluginMetadata, PluginError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading plugin");

        match self.try_load(path, services) {
            Ok(metadata) => {
                tracing::info!(
                    plugin = %metadata.name,
                    version = %metadata.version,
                    path = %path.display(),
                    "plugin loaded"
                );
                Ok(metadata)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "plugin load rolled back");
                Err(err)
            }
        }
    }

    // Locals drop in reverse declaration order on every early return:
    // staged registrations, then the plugin, then the module.
    fn try_load(
        &mut self,
        path: &Path,
        services: &mut ServiceCollection,
    ) -> Result<PluginMetadata, PluginError> {
        let module: ModuleHandle = Arc::from(self.loader.open(path)?);
        let plugin = module.instantiate()?;
        let metadata = plugin.metadata();

        if !is_valid_plugin_name(&metadata.name) {
            return Err(PluginError::InvalidName(metadata.name));
        }
        if self.is_loaded(&metadata.name) {
            return Err(PluginError::DuplicateName(metadata.name));
        }

        let namespace = Namespace::plugin(&metadata.name);
        let mut staged = NamespacedCollection::new(namespace.clone());
        let registered = panic::catch_unwind(AssertUnwindSafe(|| plugin.register_services(&mut staged)));
        let registration_error = match registered {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(payload) => Some(anyhow::Error::new(HandlerPanic::from_payload(&*payload))),
        };
        if let Some(source) = registration_error {
            return Err(PluginError::Registration {
                name: metadata.name,
                source,
            });
        }

        staged.pin_module(&module);
        services
            .absorb(staged)
            .map_err(|err| PluginError::Registration {
                name: metadata.name.clone(),
                source: err.into(),
            })?;

        self.entries.push(PluginEntry {
            plugin,
            metadata: metadata.clone(),
            namespace,
            module,
        });
        Ok(metadata)
    }

    /// Loads every dynamic library in `dir`, in file name order.
    ///
    /// Stops at the first failure; plugins loaded before it stay loaded.
    pub fn load_directory(
        &mut self,
        dir: impl AsRef<Path>,
        services: &mut ServiceCollection,
    ) -> Result<Vec<PluginMetadata>, PluginError> {
        let dir = dir.as_ref();
        let read = std::fs::read_dir(dir).map_err(|source| PluginError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut candidates: Vec<_> = read
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_dynamic_library(path))
            .collect();
        candidates.sort();

        let mut loaded = Vec::with_capacity(candidates.len());
        for path in candidates {
            loaded.push(self.load_plugin(&path, services)?);
        }
        Ok(loaded)
    }

    /// Runs the plugin's shutdown hook and releases its module.
    pub fn unload_plugin(&mut self, name: &str) -> Result<(), PluginError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.metadata.name == name)
            .ok_or_else(|| PluginError::NotLoaded(name.to_string()))?;
        let entry = self.entries.remove(index);
        shutdown(entry);
        Ok(())
    }

    /// Unloads every plugin, most recently loaded first.
    pub fn unload_all(&mut self) {
        while let Some(entry) = self.entries.pop() {
            shutdown(entry);
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.metadata.name == name)
    }

    /// Metadata of loaded plugins, in load order.
    pub fn loaded(&self) -> Vec<PluginMetadata> {
        self.entries.iter().map(|e| e.metadata.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.entries
            .iter()
            .find(|e| e.metadata.name == name)
            .map(|e| e.plugin.as_ref())
    }

    /// Loaded plugins with their namespaces, in load order.
    pub fn plugins(&self) -> impl Iterator<Item = (&Namespace, &dyn Plugin)> {
        self.entries.iter().map(|e| (&e.namespace, e.plugin.as_ref()))
    }

    pub(crate) fn modules(&self) -> impl Iterator<Item = (&dyn Plugin, &ModuleHandle)> {
        self.entries.iter().map(|e| (e.plugin.as_ref(), &e.module))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.unload_all();
    }
}

fn shutdown(entry: PluginEntry) {
    let name = entry.metadata.name.clone();
    let path = entry.module.path().display().to_string();
    match panic::catch_unwind(AssertUnwindSafe(|| entry.plugin.on_shutdown())) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(plugin = %name, error = %format!("{err:#}"), "plugin shutdown hook failed"),
        Err(payload) => {
            let panic = HandlerPanic::from_payload(&*payload);
            tracing::warn!(plugin = %name, error = %panic, "plugin shutdown hook panicked");
        }
    }
    let users = Arc::strong_count(&entry.module) - 1;
    drop(entry);
    if users == 0 {
        tracing::info!(plugin = %name, path = %path, "plugin unloaded");
    } else {
        tracing::info!(plugin = %name, path = %path, users, "plugin unloaded; module released when its services drop");
    }
}
