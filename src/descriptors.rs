//! Binding descriptors for introspection and diagnostics.

use crate::graph::Node;
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::location::Location;
use crate::registration::Input;
use crate::resolver::{Resolver, Unit};

/// How a key is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Supplied,
    Constructor,
    Scoped,
    Group,
}

/// Read-only view of one binding of a built container.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, BindingKind, Lifetime, Provider, Registrations};
/// use std::sync::Arc;
///
/// struct Db;
/// struct Repo;
///
/// let mut regs = Registrations::new();
/// regs.supply(Db, location!("db"));
/// regs.provide(Provider::from_fn(location!("repo"), |_db: Arc<Db>| Repo).scoped("request"));
/// let container = regs.build().unwrap();
///
/// let descriptors = container.descriptors();
/// let repo = descriptors.iter().find(|d| d.type_name().ends_with("Repo")).unwrap();
/// assert_eq!(repo.kind, BindingKind::Scoped);
/// assert!(repo.lifetime.is_scoped());
/// assert_eq!(repo.inputs.len(), 1);
/// assert_eq!(repo.location.name(), "repo");
/// ```
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    pub key: TypeKey,
    pub kind: BindingKind,
    pub lifetime: Lifetime,
    /// Declaration site; the first member for groups.
    pub location: Location,
    pub inputs: Vec<Input>,
    /// Number of members for groups, 1 otherwise.
    pub members: usize,
    /// Whether the binding sits on a dependency cycle.
    pub on_cycle: bool,
}

impl BindingDescriptor {
    pub(crate) fn from_node(node: &Node) -> Self {
        let (kind, members) = match &node.resolver {
            Resolver::Single(Unit::Supplied(_)) => (BindingKind::Supplied, 1),
            Resolver::Single(Unit::Constructor(_)) => (BindingKind::Constructor, 1),
            Resolver::Single(Unit::Scoped(_)) => (BindingKind::Scoped, 1),
            Resolver::Group(group) => (BindingKind::Group, group.members.len()),
        };
        let lifetime = match node.resolver.scope() {
            Some(scope) => Lifetime::Scoped(scope.clone()),
            None => Lifetime::Container,
        };
        Self {
            key: node.key,
            kind,
            lifetime,
            location: node.resolver.location().clone(),
            inputs: node.resolver.inputs(),
            members,
            on_cycle: node.on_cycle,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.key.type_name()
    }

    pub fn binding_name(&self) -> Option<&'static str> {
        self.key.name()
    }

    pub fn is_named(&self) -> bool {
        self.key.name().is_some()
    }

    pub fn is_group(&self) -> bool {
        self.kind == BindingKind::Group
    }
}
