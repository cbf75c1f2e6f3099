//! Modules: reusable bundles of registrations.

use crate::collection::Registrations;

/// A named bundle of registrations.
///
/// Modules only add registrations; conflicts between modules surface as
/// duplicate-binding errors when the container is built.
///
/// # Example
///
/// ```rust
/// use ferrous_wire::{location, Module, Provider, Registrations, RegistrationsExt};
/// use std::sync::Arc;
///
/// struct DbUrl(&'static str);
/// struct Pool { url: &'static str }
///
/// struct StorageModule;
///
/// impl Module for StorageModule {
///     fn register(self, regs: &mut Registrations) {
///         regs.supply(DbUrl("postgres://localhost"), location!("storage"));
///         regs.provide(Provider::from_fn(location!("storage"), |url: Arc<DbUrl>| Pool { url: url.0 }));
///     }
/// }
///
/// let container = Registrations::new().add_module(StorageModule).build().unwrap();
/// let pool = container.get_root::<Pool>(&location!()).unwrap();
/// assert_eq!(pool.url, "postgres://localhost");
/// ```
pub trait Module {
    fn register(self, regs: &mut Registrations);

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Module registration for [`Registrations`].
pub trait RegistrationsExt {
    /// Adds a module, by value, for chaining from `Registrations::new()`.
    fn add_module<M: Module>(self, module: M) -> Self
    where
        Self: Sized;

    fn add_module_mut<M: Module>(&mut self, module: M) -> &mut Self;
}

impl RegistrationsExt for Registrations {
    fn add_module<M: Module>(mut self, module: M) -> Self {
        self.add_module_mut(module);
        self
    }

    fn add_module_mut<M: Module>(&mut self, module: M) -> &mut Self {
        let name = module.name();
        let before = self.len();
        module.register(self);
        tracing::debug!(module = name, registrations = self.len() - before, "module registered");
        self
    }
}
