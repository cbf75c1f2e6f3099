//! Per-key resolution strategies.
//!
//! Every bound key owns exactly one [`Resolver`]: a single [`Unit`] or a
//! group of them. A unit is the piece that gets built in one go; the
//! container walks the graph, gathers each unit's inputs and then builds it.

use std::fmt::Write as _;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{DiError, DiResult, Outcome};
use crate::graph::NodeCache;
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::location::Location;
use crate::registration::{AnyValue, Args, GroupMember, Input, Provider, Registration};
use crate::scope::{Scope, ScopeName};

static EMPTY_GROUP: Lazy<Location> = Lazy::new(|| Location::named("<empty group>"));

pub(crate) enum Resolver {
    Single(Unit),
    Group(GroupNode),
}

/// A value source built in one step: a whole binding or one group member.
pub(crate) enum Unit {
    Supplied(SuppliedValue),
    Constructor(ConstructorNode),
    Scoped(ScopedNode),
}

pub(crate) struct SuppliedValue {
    pub(crate) value: AnyValue,
    pub(crate) location: Location,
}

pub(crate) struct ConstructorNode {
    pub(crate) provider: Provider,
}

pub(crate) struct ScopedNode {
    pub(crate) ctor: ConstructorNode,
    pub(crate) scope: ScopeName,
}

pub(crate) struct GroupNode {
    pub(crate) key: TypeKey,
    pub(crate) members: Vec<Member>,
}

pub(crate) struct Member {
    pub(crate) unit: Unit,
    /// Registration index; members resolve in ascending order.
    pub(crate) priority: usize,
    /// Where a constructed member is memoized. Supplied members need none.
    pub(crate) cache: Option<NodeCache>,
}

/// A registration on its way into the graph.
pub(crate) struct Candidate {
    pub(crate) key: TypeKey,
    pub(crate) unit: Unit,
    pub(crate) grouped: bool,
}

impl From<Registration> for Candidate {
    fn from(registration: Registration) -> Self {
        let key = registration.key();
        let (unit, grouped) = match registration {
            Registration::Provide(provider) => (Unit::from_provider(provider), false),
            Registration::Supply(supply) => (Unit::supplied(supply.value, supply.location), false),
            Registration::Group(GroupMember::Provider(provider)) => (Unit::from_provider(provider), true),
            Registration::Group(GroupMember::Supply(supply)) => (Unit::supplied(supply.value, supply.location), true),
        };
        Candidate { key, unit, grouped }
    }
}

impl Unit {
    fn supplied(value: AnyValue, location: Location) -> Self {
        Unit::Supplied(SuppliedValue { value, location })
    }

    fn from_provider(provider: Provider) -> Self {
        match provider.lifetime.clone() {
            Lifetime::Container => Unit::Constructor(ConstructorNode { provider }),
            Lifetime::Scoped(scope) => Unit::Scoped(ScopedNode {
                ctor: ConstructorNode { provider },
                scope,
            }),
        }
    }

    pub(crate) fn location(&self) -> &Location {
        match self {
            Unit::Supplied(supplied) => &supplied.location,
            Unit::Constructor(ctor) => &ctor.provider.location,
            Unit::Scoped(scoped) => &scoped.ctor.provider.location,
        }
    }

    fn describe_location(&self) -> String {
        match self {
            Unit::Supplied(supplied) => supplied.location.to_string(),
            Unit::Constructor(ctor) => ctor.provider.location.to_string(),
            Unit::Scoped(scoped) => format!("{} in scope '{}'", scoped.ctor.provider.location, scoped.scope),
        }
    }

    pub(crate) fn inputs(&self) -> &[Input] {
        match self {
            Unit::Supplied(_) => &[],
            Unit::Constructor(ctor) => &ctor.provider.inputs,
            Unit::Scoped(scoped) => &scoped.ctor.provider.inputs,
        }
    }

    pub(crate) fn scope(&self) -> Option<&ScopeName> {
        match self {
            Unit::Scoped(scoped) => Some(&scoped.scope),
            Unit::Supplied(_) | Unit::Constructor(_) => None,
        }
    }

    /// The provider of an unscoped constructor.
    pub(crate) fn container_provider(&self) -> Option<&Provider> {
        match self {
            Unit::Constructor(ctor) => Some(&ctor.provider),
            Unit::Supplied(_) | Unit::Scoped(_) => None,
        }
    }
}

impl Resolver {
    pub(crate) fn new(candidate: Candidate, priority: usize) -> Self {
        if candidate.grouped {
            Resolver::Group(GroupNode {
                key: candidate.key,
                members: vec![Member::new(candidate.unit, priority)],
            })
        } else {
            Resolver::Single(candidate.unit)
        }
    }

    /// Declaration site. For a group this is its first member.
    pub(crate) fn location(&self) -> &Location {
        match self {
            Resolver::Single(unit) => unit.location(),
            Resolver::Group(group) => group
                .members
                .first()
                .map(|member| member.unit.location())
                .unwrap_or(&*EMPTY_GROUP),
        }
    }

    /// Human-readable description of where the binding was declared.
    pub(crate) fn describe_location(&self) -> String {
        match self {
            Resolver::Single(unit) => unit.describe_location(),
            Resolver::Group(group) => {
                let mut out = String::from("group of");
                for (i, member) in group.members.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    let _ = write!(out, "{}{}", sep, member.unit.describe_location());
                }
                out
            }
        }
    }

    /// Declared inputs across the binding, in member order for groups.
    pub(crate) fn inputs(&self) -> Vec<Input> {
        match self {
            Resolver::Single(unit) => unit.inputs().to_vec(),
            Resolver::Group(group) => group
                .members
                .iter()
                .flat_map(|member| member.unit.inputs().iter().copied())
                .collect(),
        }
    }

    pub(crate) fn scope(&self) -> Option<&ScopeName> {
        match self {
            Resolver::Single(unit) => unit.scope(),
            Resolver::Group(group) => group.members.iter().find_map(|m| m.unit.scope()),
        }
    }

    /// Accepts another registration for the key this resolver is bound to.
    ///
    /// Groups accept further grouped candidates. Everything else is a
    /// duplicate, reported against the binding that was there first.
    pub(crate) fn add_node(&mut self, candidate: Candidate, priority: usize) -> DiResult<()> {
        match self {
            Resolver::Group(group) if candidate.grouped => {
                group.members.push(Member::new(candidate.unit, priority));
                group.members.sort_by_key(|member| member.priority);
                Ok(())
            }
            Resolver::Group(_) | Resolver::Single(_) => Err(DiError::DuplicateBinding {
                key: candidate.key,
                existing: self.location().clone(),
                duplicate: candidate.unit.location().clone(),
            }),
        }
    }
}

impl ConstructorNode {
    /// Runs the construction function over inputs already resolved.
    pub(crate) fn construct(&self, key: TypeKey, values: &[Option<AnyValue>], scope: &Scope) -> Outcome {
        let provider = &self.provider;
        let args = Args {
            inputs: &provider.inputs,
            values,
            scope,
        };
        (provider.construct)(&args).map_err(|source| DiError::Constructor {
            key,
            location: provider.location.clone(),
            source: Arc::from(source),
        })
    }
}

impl Member {
    fn new(unit: Unit, priority: usize) -> Self {
        Self {
            unit,
            priority,
            cache: None,
        }
    }
}
