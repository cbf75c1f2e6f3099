//! Binding lifetimes.

use crate::scope::ScopeName;

/// How long a resolved value is shared.
///
/// - **Container**: built at most once per container and shared by every
///   scope instance.
/// - **Scoped**: built at most once per scope instance carrying the given
///   scope name; other instances of the same scope get their own value.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, Lifetime, Provider};
///
/// let provider = Provider::from_fn(location!(), || 7u32).scoped("request");
/// assert_eq!(provider.lifetime(), &Lifetime::Scoped("request".into()));
/// assert!(provider.lifetime().is_scoped());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    #[default]
    Container,
    Scoped(ScopeName),
}

impl Lifetime {
    pub fn is_scoped(&self) -> bool {
        matches!(self, Lifetime::Scoped(_))
    }

    /// The scope name for scoped lifetimes.
    pub fn scope(&self) -> Option<&ScopeName> {
        match self {
            Lifetime::Container => None,
            Lifetime::Scoped(name) => Some(name),
        }
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifetime::Container => f.write_str("container"),
            Lifetime::Scoped(name) => write!(f, "scoped({})", name),
        }
    }
}
