//! # ferrous-wire
//!
//! Type-directed object-graph resolution: declare how each type is produced,
//! then ask for the types you need and let the container build everything
//! in between.
//!
//! ## Features
//!
//! - **Providers and supplies**: construction functions whose arguments are
//!   their dependencies, and precomputed values
//! - **Exactly one producer per type**: duplicate bindings are build errors
//!   that name both declaration sites
//! - **Groups**: several members under one key, collected in registration order
//! - **Named scopes**: one cached value per scope instance
//! - **Cycle detection**: cycles are reported as the exact chain of keys and
//!   declaration sites, never as a stack overflow or a deadlock
//! - **At-most-once construction**: concurrent first requests for a key run
//!   its constructor once
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_wire::{location, Provider, Registrations};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut regs = Registrations::new();
//! regs.supply(
//!     Database { connection_string: "postgres://localhost".to_string() },
//!     location!("database"),
//! );
//! regs.provide(Provider::from_fn(location!("users"), |db: Arc<Database>| UserService { db }));
//!
//! let container = regs.build().unwrap();
//! let users = container.get_root::<UserService>(&location!("main")).unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Trait objects
//!
//! Bind a capability by producing an `Arc<dyn Trait>`; consumers ask for
//! that type.
//!
//! ```rust
//! use ferrous_wire::{location, Provider, Registrations};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str) -> String;
//! }
//!
//! struct Console;
//! impl Logger for Console {
//!     fn log(&self, message: &str) -> String {
//!         format!("[log] {}", message)
//!     }
//! }
//!
//! let mut regs = Registrations::new();
//! regs.provide(Provider::from_fn(location!(), || Arc::new(Console) as Arc<dyn Logger>));
//!
//! let container = regs.build().unwrap();
//! let logger = container.get_root::<Arc<dyn Logger>>(&location!()).unwrap();
//! assert_eq!(logger.log("hi"), "[log] hi");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use ferrous_wire::{location, Provider, Registrations};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! struct RequestId(u32);
//!
//! static NEXT: AtomicU32 = AtomicU32::new(1);
//!
//! let mut regs = Registrations::new();
//! regs.provide(
//!     Provider::from_fn(location!(), || RequestId(NEXT.fetch_add(1, Ordering::SeqCst)))
//!         .scoped("request"),
//! );
//! let container = regs.build().unwrap();
//!
//! let first = container.create_scope("request");
//! let second = container.create_scope("request");
//! let a = container.get::<RequestId>(&first, &location!()).unwrap();
//! let b = container.get::<RequestId>(&second, &location!()).unwrap();
//! assert_ne!(a.0, b.0);
//! ```

pub mod collection;
pub mod config;
pub mod constructor;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod graph_export;
pub mod key;
pub mod lifetime;
pub mod location;
pub mod observer;
pub mod registration;
pub mod scope;

mod graph;
mod internal;
mod resolver;

// Re-exports
pub use collection::{Module, Registrations, RegistrationsExt};
pub use config::{ConfigError, ConfigSource, ContainerConfig, EnvironmentConfigSource, MapConfigSource, DEFAULT_MAX_DEPTH};
pub use constructor::{FromInput, Group, IntoConstructor, IntoInfallible};
pub use container::{Container, EntryPoint};
pub use descriptors::{BindingDescriptor, BindingKind};
pub use error::{BoxError, BuildError, CycleStep, DiError, DiResult, InvokeError, SharedError};
pub use graph_export::{DependencyGraph, GraphEdge, GraphMetadata, GraphNode, MissingInput, NodeState};
pub use key::{key_of_type, TypeKey};
pub use lifetime::Lifetime;
pub use location::Location;
pub use observer::{MetricsObserver, ResolutionEvent, ResolutionObserver, TracingObserver};
pub use registration::{AnyValue, Args, GroupMember, Input, InputKind, Provider, Registration, Supply};
pub use scope::{Scope, ScopeId, ScopeName};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_supplied_value_resolution() {
        let mut regs = Registrations::new();
        regs.supply(42usize, location!());

        let container = regs.build().unwrap();
        let a = container.get_root::<usize>(&location!()).unwrap();
        let b = container.get_root::<usize>(&location!()).unwrap();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_constructor_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut regs = Registrations::new();
        regs.provide(Provider::from_fn(location!(), move || {
            format!("instance-{}", counter.fetch_add(1, Ordering::SeqCst) + 1)
        }));

        let container = regs.build().unwrap();
        let a = container.get_root::<String>(&location!()).unwrap();
        let b = container.get_root::<String>(&location!()).unwrap();

        assert_eq!(a.as_str(), "instance-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_resolution() {
        let mut regs = Registrations::new();
        regs.provide(Provider::from_fn(location!(), || String::from("scoped")).scoped("request"));
        let container = regs.build().unwrap();

        let scope1 = container.create_scope("request");
        let s1a = container.get::<String>(&scope1, &location!()).unwrap();
        let s1b = container.get::<String>(&scope1, &location!()).unwrap();
        assert!(Arc::ptr_eq(&s1a, &s1b));

        let scope2 = container.create_scope("request");
        let s2 = container.get::<String>(&scope2, &location!()).unwrap();
        assert!(!Arc::ptr_eq(&s1a, &s2));
        assert_eq!(scope1.settled(), 1);
    }

    #[test]
    fn test_trait_object_binding() {
        trait TestTrait: Send + Sync {
            fn get_value(&self) -> i32;
        }

        struct TestImpl {
            value: i32,
        }

        impl TestTrait for TestImpl {
            fn get_value(&self) -> i32 {
                self.value
            }
        }

        let mut regs = Registrations::new();
        regs.supply(Arc::new(TestImpl { value: 42 }) as Arc<dyn TestTrait>, location!());

        let container = regs.build().unwrap();
        let service = container.get_root::<Arc<dyn TestTrait>>(&location!()).unwrap();
        assert_eq!(service.get_value(), 42);
    }

    #[test]
    fn test_named_bindings_coexist() {
        let mut regs = Registrations::new();
        regs.supply_named("primary", 5432u16, location!())
            .supply_named("replica", 5433u16, location!());

        let container = regs.build().unwrap();
        assert_eq!(*container.get_named_root::<u16>("primary", &location!()).unwrap(), 5432);
        assert_eq!(*container.get_named_root::<u16>("replica", &location!()).unwrap(), 5433);
        assert!(container.get_root::<u16>(&location!()).is_err());
    }

    #[test]
    fn test_type_mismatch_on_raw_supply() {
        let mut regs = Registrations::new();
        regs.supply_key(TypeKey::of::<u64>(), Arc::new("not a number"), location!());

        let container = regs.build().unwrap();
        let err = container.get_root::<u64>(&location!()).unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }
}
