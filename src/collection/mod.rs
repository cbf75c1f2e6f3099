//! Registration sets.
//!
//! [`Registrations`] gathers providers, supplies and group members in
//! declaration order, then hands them to [`Container`] in one build step.
//! Nothing is checked until [`Registrations::build`], which reports every
//! problem at once.

use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::container::Container;
use crate::error::BuildError;
use crate::key::TypeKey;
use crate::location::Location;
use crate::observer::ResolutionObserver;
use crate::registration::{AnyValue, GroupMember, Provider, Registration, Supply};

pub mod module_system;
pub use module_system::*;

/// An ordered set of registrations plus build options.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, Provider, Registrations};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Client { url: String }
///
/// let mut regs = Registrations::new();
/// regs.supply(Config { url: "http://localhost".into() }, location!("config"))
///     .provide(Provider::from_fn(location!("client"), |cfg: Arc<Config>| Client {
///         url: cfg.url.clone(),
///     }));
///
/// let container = regs.build().unwrap();
/// let client = container.get_root::<Client>(&location!()).unwrap();
/// assert_eq!(client.url, "http://localhost");
/// ```
#[derive(Default)]
pub struct Registrations {
    entries: Vec<Registration>,
    observers: Vec<Arc<dyn ResolutionObserver>>,
    config: ContainerConfig,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a provider's output key exclusively.
    pub fn provide(&mut self, provider: Provider) -> &mut Self {
        self.add(provider)
    }

    /// Binds a precomputed value to its type.
    pub fn supply<T: Send + Sync + 'static>(&mut self, value: T, location: Location) -> &mut Self {
        self.add(Supply::new(value, location))
    }

    /// Binds a precomputed value under a name.
    pub fn supply_named<T: Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        value: T,
        location: Location,
    ) -> &mut Self {
        self.add(Supply::new(value, location).named(name))
    }

    /// Binds an already type-erased value to an explicit key.
    ///
    /// The value must be an `Arc<K>` for the `K` named by `key`, or typed
    /// lookups of the key fail with a type mismatch.
    pub fn supply_key(&mut self, key: TypeKey, value: AnyValue, location: Location) -> &mut Self {
        self.add(Supply::from_raw(key, value, location))
    }

    /// Adds the provider's output to the group for its key.
    pub fn group_provide(&mut self, provider: Provider) -> &mut Self {
        self.add(GroupMember::Provider(provider))
    }

    /// Adds a value to the group for its type.
    pub fn group_supply<T: Send + Sync + 'static>(&mut self, value: T, location: Location) -> &mut Self {
        self.add(GroupMember::Supply(Supply::new(value, location)))
    }

    pub fn add(&mut self, registration: impl Into<Registration>) -> &mut Self {
        self.entries.push(registration.into());
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ResolutionObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    pub fn with_config(&mut self, config: ContainerConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    /// Builds the container, or reports every duplicate and scope-capture
    /// problem found.
    pub fn build(self) -> Result<Container, BuildError> {
        Container::assemble(self.entries.into_iter(), self.observers, self.config)
    }
}

impl Extend<Registration> for Registrations {
    fn extend<I: IntoIterator<Item = Registration>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<Registration> for Registrations {
    fn from_iter<I: IntoIterator<Item = Registration>>(iter: I) -> Self {
        let mut regs = Self::new();
        regs.extend(iter);
        regs
    }
}

impl std::fmt::Debug for Registrations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrations")
            .field("entries", &self.entries)
            .field("observers", &self.observers.len())
            .field("config", &self.config)
            .finish()
    }
}
