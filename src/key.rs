//! Type keys identifying graph nodes.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a requested or produced type.
///
/// A key is the `TypeId` of a concrete type (or of a capability such as
/// `Arc<dyn Store>`), optionally qualified by a binding name so that several
/// bindings of one Rust type can coexist. Equality and hashing only look at
/// the `TypeId` and the binding name; the type name is carried for
/// diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::TypeKey;
///
/// let port = TypeKey::of::<u16>();
/// let admin_port = TypeKey::named::<u16>("admin");
///
/// assert_ne!(port, admin_port);
/// assert_eq!(port, TypeKey::of::<u16>());
/// assert_eq!(admin_port.to_string(), "u16#admin");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl TypeKey {
    /// Key for the unnamed binding of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Key for the binding of `T` registered under `name`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..Self::of::<T>()
        }
    }

    /// Same type, different binding name.
    pub fn with_name(self, name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..self
        }
    }

    /// The `std::any::type_name` of the keyed type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The binding name, if any.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// True when the key identifies `T` (ignoring the binding name).
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}

// Display order first so sorted diagnostics read naturally.
impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_name
            .cmp(other.type_name)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{}#{}", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}

/// Shorthand for [`TypeKey::of`].
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}
