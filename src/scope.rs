//! Scope instances and their memo cells.
//!
//! A scope is a named lifetime boundary. Each [`Scope`] value is one concrete
//! instance of that boundary and owns one memo cell per scoped slot of the
//! container that created it, so two instances never share a cached value
//! even when they carry the same name.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::Outcome;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Name of a lifetime boundary, e.g. `"request"` or a module name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeName(Arc<str>);

impl ScopeName {
    /// Name of the scope instance every container owns.
    pub const ROOT: &'static str = "root";

    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn root() -> Self {
        Self::new(Self::ROOT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScopeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ScopeName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-unique identity of a scope instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// One instance of a named scope.
///
/// Created by [`Container::create_scope`](crate::Container::create_scope);
/// values resolved for scoped bindings live as long as the instance.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, Provider, Registrations};
/// use std::sync::Arc;
///
/// struct Session(u32);
///
/// let mut regs = Registrations::new();
/// regs.provide(Provider::from_fn(location!(), || Session(1)).scoped("request"));
/// let container = regs.build().unwrap();
///
/// let first = container.create_scope("request");
/// let second = container.create_scope("request");
/// assert_ne!(first.id(), second.id());
///
/// let a = container.get::<Session>(&first, &location!()).unwrap();
/// let b = container.get::<Session>(&first, &location!()).unwrap();
/// let c = container.get::<Session>(&second, &location!()).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
pub struct Scope {
    id: ScopeId,
    name: ScopeName,
    pub(crate) container_id: u64,
    cells: Box<[OnceCell<Outcome>]>,
}

impl Scope {
    pub(crate) fn new(name: ScopeName, container_id: u64, slots: usize) -> Self {
        let cells = (0..slots)
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            id: ScopeId::next(),
            name,
            container_id,
            cells,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> &ScopeName {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.name.as_str() == ScopeName::ROOT
    }

    /// Number of scoped values this instance has settled so far.
    pub fn settled(&self) -> usize {
        self.cells.iter().filter(|cell| cell.get().is_some()).count()
    }

    #[inline]
    pub(crate) fn cell(&self, slot: usize) -> &OnceCell<Outcome> {
        &self.cells[slot]
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("slots", &self.cells.len())
            .field("settled", &self.settled())
            .finish()
    }
}
