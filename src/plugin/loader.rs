use std::path::{Path, PathBuf};

use libloading::Library;

use super::{Plugin, PluginEntryFn, PLUGIN_ENTRY_NAME, PLUGIN_ENTRY_SYMBOL};
use crate::error::PluginError;

/// Opens plugin modules. [`LibraryLoader`] is the production implementation;
/// tests substitute an in-process loader.
pub trait ModuleLoader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn LoadedModule>, PluginError>;
}

/// An open module. Dropping it releases the module.
///
/// The manager shares the module with every registration, route and
/// middleware built from its plugin, so it is dropped after all of them.
pub trait LoadedModule: Send + Sync {
    fn path(&self) -> &Path;

    /// Calls the entry symbol and takes ownership of the returned plugin.
    fn instantiate(&self) -> Result<Box<dyn Plugin>, PluginError>;
}

/// Loads platform dynamic libraries with `libloading`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryLoader;

impl ModuleLoader for LibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn LoadedModule>, PluginError> {
        // SAFETY: running a library's initialisers is inherent to loading a
        // plugin; the host only opens paths it was configured with.
        let library = unsafe { Library::new(path) }.map_err(|err| PluginError::Open {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(Box::new(LibraryModule {
            path: path.to_path_buf(),
            library,
        }))
    }
}

struct LibraryModule {
    path: PathBuf,
    library: Library,
}

impl LoadedModule for LibraryModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn instantiate(&self) -> Result<Box<dyn Plugin>, PluginError> {
        // SAFETY: the symbol is declared by `declare_plugin!` with exactly
        // the `PluginEntryFn` signature.
        let entry = unsafe { self.library.get::<PluginEntryFn>(PLUGIN_ENTRY_SYMBOL) }.map_err(|err| {
            PluginError::MissingSymbol {
                path: self.path.clone(),
                symbol: PLUGIN_ENTRY_NAME,
                message: err.to_string(),
            }
        })?;

        // SAFETY: see above; the call transfers ownership of the allocation.
        let raw = unsafe { entry() };
        if raw.is_null() {
            return Err(PluginError::NullInstance {
                path: self.path.clone(),
            });
        }
        // SAFETY: non-null pointers come from Box::into_raw(Box<Box<dyn Plugin>>).
        let plugin = unsafe { Box::from_raw(raw.cast::<Box<dyn Plugin>>()) };
        Ok(*plugin)
    }
}

/// Whether `path` has the platform's dynamic library extension.
pub(crate) fn is_dynamic_library(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_missing_library_fails_cleanly() {
        let err = LibraryLoader
            .open(Path::new("/definitely/not/here/libnothing.so"))
            .err()
            .unwrap();
        assert!(matches!(err, PluginError::Open { .. }));
    }

    #[test]
    fn only_platform_libraries_are_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join(format!("plugin.{}", std::env::consts::DLL_EXTENSION));
        let txt = dir.path().join("readme.txt");
        std::fs::write(&lib, b"").unwrap();
        std::fs::write(&txt, b"").unwrap();

        assert!(is_dynamic_library(&lib));
        assert!(!is_dynamic_library(&txt));
        assert!(!is_dynamic_library(dir.path()));
    }
}
