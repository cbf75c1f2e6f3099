//! Error types for graph construction, resolution and invocation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::key::TypeKey;
use crate::location::Location;
use crate::registration::AnyValue;
use crate::scope::ScopeName;

/// Boxed failure returned by construction functions and entry points.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared form of a construction failure, cloned into every memoized outcome.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal state of one resolution, stored in memo cells.
pub(crate) type Outcome = DiResult<AnyValue>;

/// One step of a reported dependency cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStep {
    pub key: TypeKey,
    /// Declaration site of the binding for `key`.
    pub location: Location,
}

impl fmt::Display for CycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.key, self.location)
    }
}

/// Dependency injection errors.
///
/// Every variant names the declaration sites involved so a failing
/// composition can be fixed without re-running it under a debugger.
/// `DiError` is `Clone`: a failed resolution is memoized and handed to every
/// caller that asks for the same key in the same scope instance.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, DiError, Location, Registrations};
///
/// let container = Registrations::new().build().unwrap();
/// let caller = Location::named("main");
///
/// match container.get_root::<String>(&caller) {
///     Err(DiError::UnresolvedType { key, requested_by }) => {
///         assert_eq!(key.type_name(), "alloc::string::String");
///         assert_eq!(requested_by, caller);
///     }
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Two exclusive bindings claim the same key.
    #[error("duplicate binding for {key}: declared at {existing} and again at {duplicate}")]
    DuplicateBinding {
        key: TypeKey,
        existing: Location,
        duplicate: Location,
    },

    /// A resolution path revisited a key it had not finished resolving.
    #[error("cyclic dependency: {}", join_cycle(.cycle))]
    CyclicDependency { cycle: Vec<CycleStep> },

    /// A required key has no binding.
    #[error("no binding for {key}, requested by {requested_by}")]
    UnresolvedType { key: TypeKey, requested_by: Location },

    /// A construction function returned an error.
    #[error("constructor for {key} declared at {location} failed: {source}")]
    Constructor {
        key: TypeKey,
        location: Location,
        #[source]
        source: SharedError,
    },

    /// A member of a group binding failed to resolve.
    #[error("group {key}: member #{index} declared at {location} failed: {source}")]
    GroupMember {
        key: TypeKey,
        index: usize,
        location: Location,
        #[source]
        source: Box<DiError>,
    },

    /// A scoped binding was requested from an instance of another scope.
    #[error("{key} is scoped to '{expected}' but was requested from scope '{actual}' by {requested_by}")]
    ScopeMismatch {
        key: TypeKey,
        expected: ScopeName,
        actual: ScopeName,
        requested_by: Location,
    },

    /// A scope created by a different container was passed in.
    #[error("scope '{scope}' belongs to a different container")]
    ForeignScope { scope: ScopeName },

    /// An unscoped constructor depends on a value that varies per scope instance.
    #[error("{key} declared at {location} outlives scope '{scope}' but depends on scoped {dependency}")]
    CaptiveDependency {
        key: TypeKey,
        location: Location,
        dependency: TypeKey,
        scope: ScopeName,
    },

    /// The resolved value is not of the requested Rust type.
    #[error("type mismatch for {key}: expected {expected}")]
    TypeMismatch { key: TypeKey, expected: &'static str },

    /// The resolution path grew past the configured maximum depth.
    #[error("resolution of {key} exceeded max depth {depth}")]
    DepthExceeded { key: TypeKey, depth: usize },
}

impl DiError {
    /// Keys of a cycle in path order, e.g. `[A, B, A]`.
    pub fn cycle_keys(&self) -> Option<Vec<TypeKey>> {
        match self {
            DiError::CyclicDependency { cycle } => Some(cycle.iter().map(|step| step.key).collect()),
            _ => None,
        }
    }

    /// The key the error is about, when it names one.
    pub fn key(&self) -> Option<&TypeKey> {
        match self {
            DiError::DuplicateBinding { key, .. }
            | DiError::UnresolvedType { key, .. }
            | DiError::Constructor { key, .. }
            | DiError::GroupMember { key, .. }
            | DiError::ScopeMismatch { key, .. }
            | DiError::CaptiveDependency { key, .. }
            | DiError::TypeMismatch { key, .. }
            | DiError::DepthExceeded { key, .. } => Some(key),
            DiError::CyclicDependency { cycle } => cycle.first().map(|step| &step.key),
            DiError::ForeignScope { .. } => None,
        }
    }
}

fn join_cycle(cycle: &[CycleStep]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn join_errors(errors: &[DiError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every binding problem found while building a container.
#[derive(Debug, Clone, Error)]
#[error("container build failed with {} error(s):\n{}", .errors.len(), join_errors(.errors))]
pub struct BuildError {
    pub errors: Vec<DiError>,
}

impl BuildError {
    pub fn errors(&self) -> &[DiError] {
        &self.errors
    }

    /// Duplicate-binding errors only.
    pub fn duplicates(&self) -> impl Iterator<Item = &DiError> {
        self.errors
            .iter()
            .filter(|e| matches!(e, DiError::DuplicateBinding { .. }))
    }
}

/// Failure of [`Container::invoke`](crate::Container::invoke).
#[derive(Debug, Error)]
pub enum InvokeError {
    /// One or more inputs of the entry point could not be resolved.
    #[error("entry point at {location} has {} unresolved input(s):\n{}", .errors.len(), join_errors(.errors))]
    Dependencies {
        location: Location,
        errors: Vec<DiError>,
    },

    /// The entry point itself returned an error.
    #[error(transparent)]
    Entry(BoxError),
}

impl InvokeError {
    /// The error returned by the entry point, if it ran.
    pub fn into_entry_error(self) -> Option<BoxError> {
        match self {
            InvokeError::Entry(e) => Some(e),
            InvokeError::Dependencies { .. } => None,
        }
    }

    pub fn dependency_errors(&self) -> &[DiError] {
        match self {
            InvokeError::Dependencies { errors, .. } => errors,
            InvokeError::Entry(_) => &[],
        }
    }
}

/// Result alias for resolution operations.
pub type DiResult<T> = Result<T, DiError>;
