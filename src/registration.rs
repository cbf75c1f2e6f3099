//! Binding declarations: providers, supplies and group members.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::constructor::IntoConstructor;
use crate::error::{BoxError, DiError, DiResult};
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::location::Location;
use crate::scope::{Scope, ScopeName};

/// Type-erased value stored in the graph.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Type-erased construction function.
pub type ConstructFn = Arc<dyn Fn(&Args<'_>) -> Result<AnyValue, BoxError> + Send + Sync>;

/// How an input is satisfied when its key has no binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize, serde::Deserialize))]
pub enum InputKind {
    /// Unbound is an `UnresolvedType` error.
    Required,
    /// Unbound resolves to `None`.
    Optional,
    /// Group collection; unbound resolves to an empty collection.
    Group,
}

/// One declared input of a provider or entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Input {
    pub key: TypeKey,
    pub kind: InputKind,
}

impl Input {
    pub fn required(key: TypeKey) -> Self {
        Self { key, kind: InputKind::Required }
    }

    pub fn optional(key: TypeKey) -> Self {
        Self { key, kind: InputKind::Optional }
    }

    pub fn group(key: TypeKey) -> Self {
        Self { key, kind: InputKind::Group }
    }
}

/// Resolved members of a group binding, in registration order.
#[derive(Clone, Default)]
pub(crate) struct GroupValues(pub(crate) Vec<AnyValue>);

/// Resolved inputs handed to a construction function.
///
/// Values sit at the same positions as the declared inputs. Unbound optional
/// and group inputs are absent.
pub struct Args<'a> {
    pub(crate) inputs: &'a [Input],
    pub(crate) values: &'a [Option<AnyValue>],
    pub(crate) scope: &'a Scope,
}

impl<'a> Args<'a> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name of the scope instance the resolution runs in.
    pub fn scope_name(&self) -> &ScopeName {
        self.scope.name()
    }

    /// The raw value at `index`, if bound.
    pub fn raw(&self, index: usize) -> Option<&AnyValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Required input at `index`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        match self.optional::<T>(index)? {
            Some(value) => Ok(value),
            None => Err(DiError::UnresolvedType {
                key: self.key_at(index),
                requested_by: Location::named("constructor arguments"),
            }),
        }
    }

    /// Optional input at `index`.
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Option<Arc<T>>> {
        match self.raw(index) {
            None => Ok(None),
            Some(value) => value
                .clone()
                .downcast::<T>()
                .map(Some)
                .map_err(|_| DiError::TypeMismatch {
                    key: self.key_at(index),
                    expected: std::any::type_name::<T>(),
                }),
        }
    }

    /// Group input at `index`, empty when the group has no members.
    pub fn group<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<T>>> {
        let Some(value) = self.raw(index) else {
            return Ok(Vec::new());
        };
        let key = self.key_at(index);
        downcast_group::<T>(value, key)
    }

    fn key_at(&self, index: usize) -> TypeKey {
        self.inputs
            .get(index)
            .map(|input| input.key)
            .unwrap_or_else(TypeKey::of::<()>)
    }
}

pub(crate) fn downcast_group<T: Send + Sync + 'static>(value: &AnyValue, key: TypeKey) -> DiResult<Vec<Arc<T>>> {
    let mismatch = || DiError::TypeMismatch {
        key,
        expected: std::any::type_name::<Vec<T>>(),
    };
    let group = value.downcast_ref::<GroupValues>().ok_or_else(mismatch)?;
    group
        .0
        .iter()
        .map(|member| member.clone().downcast::<T>().map_err(|_| mismatch()))
        .collect()
}

/// A construction function plus its declared signature and declaration site.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, Provider, TypeKey};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Pool { url: String }
///
/// let provider = Provider::new(location!("pool"), |cfg: Arc<Config>| {
///     Ok::<_, std::convert::Infallible>(Pool { url: cfg.url.clone() })
/// });
///
/// assert_eq!(provider.output(), TypeKey::of::<Pool>());
/// assert_eq!(provider.inputs().len(), 1);
/// assert_eq!(provider.inputs()[0].key, TypeKey::of::<Config>());
/// ```
#[derive(Clone)]
pub struct Provider {
    pub(crate) inputs: Vec<Input>,
    pub(crate) output: TypeKey,
    pub(crate) construct: ConstructFn,
    pub(crate) location: Location,
    pub(crate) lifetime: Lifetime,
}

impl Provider {
    /// Provider from a fallible function whose arguments name its inputs.
    pub fn new<P, F>(location: Location, f: F) -> Self
    where
        F: IntoConstructor<P>,
    {
        let inputs = F::inputs();
        let output = F::output();
        Self {
            inputs,
            output,
            construct: Arc::new(move |args: &Args<'_>| f.construct(args)),
            location,
            lifetime: Lifetime::Container,
        }
    }

    /// Provider from an infallible function.
    pub fn from_fn<P, F>(location: Location, f: F) -> Self
    where
        F: crate::constructor::IntoInfallible<P>,
    {
        let inputs = F::inputs();
        let output = F::output();
        Self {
            inputs,
            output,
            construct: Arc::new(move |args: &Args<'_>| f.construct(args)),
            location,
            lifetime: Lifetime::Container,
        }
    }

    /// Provider with an explicit signature and an untyped construction function.
    pub fn from_raw<F>(location: Location, inputs: Vec<Input>, output: TypeKey, construct: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<AnyValue, BoxError> + Send + Sync + 'static,
    {
        Self {
            inputs,
            output,
            construct: Arc::new(construct),
            location,
            lifetime: Lifetime::Container,
        }
    }

    /// Binds the output under a name.
    pub fn named(mut self, name: &'static str) -> Self {
        self.output = self.output.with_name(name);
        self
    }

    /// Shares the output per instance of the named scope.
    pub fn scoped(mut self, scope: impl Into<ScopeName>) -> Self {
        self.lifetime = Lifetime::Scoped(scope.into());
        self
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn output(&self) -> TypeKey {
        self.output
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("location", &self.location)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// A precomputed value bound to a key.
#[derive(Clone)]
pub struct Supply {
    pub(crate) key: TypeKey,
    pub(crate) value: AnyValue,
    pub(crate) location: Location,
}

impl Supply {
    pub fn new<T: Send + Sync + 'static>(value: T, location: Location) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: Arc::new(value),
            location,
        }
    }

    /// Supply of an already type-erased value under an explicit key.
    pub fn from_raw(key: TypeKey, value: AnyValue, location: Location) -> Self {
        Self { key, value, location }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.key = self.key.with_name(name);
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl fmt::Debug for Supply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supply")
            .field("key", &self.key)
            .field("location", &self.location)
            .finish()
    }
}

/// A binding that joins a group instead of claiming its key exclusively.
#[derive(Debug, Clone)]
pub enum GroupMember {
    Provider(Provider),
    Supply(Supply),
}

impl GroupMember {
    pub fn key(&self) -> TypeKey {
        match self {
            GroupMember::Provider(p) => p.output,
            GroupMember::Supply(s) => s.key,
        }
    }
}

/// One entry of a registration set.
#[derive(Debug, Clone)]
pub enum Registration {
    Provide(Provider),
    Supply(Supply),
    Group(GroupMember),
}

impl Registration {
    /// The key this registration binds.
    pub fn key(&self) -> TypeKey {
        match self {
            Registration::Provide(p) => p.output,
            Registration::Supply(s) => s.key,
            Registration::Group(m) => m.key(),
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Registration::Provide(p) | Registration::Group(GroupMember::Provider(p)) => &p.location,
            Registration::Supply(s) | Registration::Group(GroupMember::Supply(s)) => &s.location,
        }
    }
}

impl From<Provider> for Registration {
    fn from(provider: Provider) -> Self {
        Registration::Provide(provider)
    }
}

impl From<Supply> for Registration {
    fn from(supply: Supply) -> Self {
        Registration::Supply(supply)
    }
}

impl From<GroupMember> for Registration {
    fn from(member: GroupMember) -> Self {
        Registration::Group(member)
    }
}
