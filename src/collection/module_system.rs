//! Grouped registration.

use crate::{DiResult, ServiceCollection};

/// A bundle of registrations installed as one unit.
///
/// Hosts use modules to keep feature wiring (storage, caching, clients)
/// next to the feature instead of in `main`.
///
/// ```rust
/// use ferrous_host::{ServiceCollection, ServiceModule, ServiceCollectionExt, DiResult, Resolver};
/// use std::sync::Arc;
///
/// struct PageSize(usize);
/// struct Catalog { page: Arc<PageSize> }
///
/// struct CatalogModule;
///
/// impl ServiceModule for CatalogModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton(PageSize(25))?;
///         services.add_scoped_factory::<Catalog, _>(|r| Ok(Catalog { page: r.get()? }))?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let provider = ServiceCollection::new().add_module(CatalogModule)?.build();
/// let scope = provider.create_scope();
/// assert_eq!(scope.get::<Catalog>()?.page.0, 25);
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;

    /// Label used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// `add_module` for [`ServiceCollection`], consuming or in place.
pub trait ServiceCollectionExt: Sized {
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>;

    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        self.add_module_mut(module)?;
        Ok(self)
    }

    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        let name = module.name().to_string();
        let before = self.len();
        module.register_services(self)?;
        tracing::debug!(module = %name, added = self.len() - before, "service module installed");
        Ok(self)
    }
}
