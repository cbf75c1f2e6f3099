//! The built container: resolution, scopes and invocation.
//!
//! A [`Container`] is immutable once built. Every request walks the binding
//! graph from the requested key, carrying its own resolution path; values are
//! memoized per container (unscoped bindings) or per scope instance (scoped
//! bindings), failures included.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ContainerConfig;
use crate::descriptors::BindingDescriptor;
use crate::error::{BuildError, CycleStep, DiError, DiResult, Outcome};
use crate::graph::{Graph, Node, NodeId};
use crate::graph_export::DependencyGraph;
use crate::key::TypeKey;
use crate::location::Location;
use crate::observer::{Observers, ResolutionEvent, ResolutionObserver};
use crate::registration::{downcast_group, AnyValue, Registration};
use crate::resolver::Candidate;
use crate::scope::{Scope, ScopeName};

mod context;
mod invoke;

pub(crate) use context::ResolveContext;
pub use invoke::EntryPoint;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// A built, immutable binding graph.
///
/// Cloning is cheap and clones share all memoized values.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{location, Container, Provider, Registration, Supply};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// static CALLS: AtomicUsize = AtomicUsize::new(0);
///
/// let container = Container::build([
///     Registration::from(Supply::new(42i64, location!("answer"))),
///     Registration::from(Provider::from_fn(location!("render"), |n: Arc<i64>| {
///         CALLS.fetch_add(1, Ordering::SeqCst);
///         format!("value={}", n)
///     })),
/// ])
/// .unwrap();
///
/// let caller = location!("main");
/// let first = container.get_root::<String>(&caller).unwrap();
/// let again = container.get_root::<String>(&caller).unwrap();
/// assert_eq!(first.as_str(), "value=42");
/// assert!(Arc::ptr_eq(&first, &again));
/// assert_eq!(CALLS.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    id: u64,
    pub(crate) graph: Graph,
    observers: Observers,
    config: ContainerConfig,
    root: Scope,
}

impl Container {
    /// Builds a container from registrations with the default configuration.
    ///
    /// Every duplicate binding and scope-capture problem is collected into
    /// the returned [`BuildError`].
    pub fn build<I>(registrations: I) -> Result<Self, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Registration>,
    {
        Self::assemble(
            registrations.into_iter().map(Into::into),
            Vec::new(),
            ContainerConfig::default(),
        )
    }

    pub(crate) fn assemble(
        registrations: impl Iterator<Item = Registration>,
        observers: Vec<Arc<dyn ResolutionObserver>>,
        config: ContainerConfig,
    ) -> Result<Self, BuildError> {
        let mut graph = Graph::new();
        let mut errors = Vec::new();
        for (priority, registration) in registrations.enumerate() {
            if let Err(err) = graph.insert(Candidate::from(registration), priority) {
                errors.push(err);
            }
        }
        errors.extend(graph.finalize());

        if !errors.is_empty() {
            tracing::warn!(errors = errors.len(), "container build failed");
            if config.log_graph_on_error {
                let dot = DependencyGraph::from_graph(&graph, None).to_dot();
                tracing::debug!(graph = %dot, "dependency graph of failed build");
            }
            return Err(BuildError { errors });
        }

        let id = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);
        let root = Scope::new(ScopeName::root(), id, graph.scoped_slots());
        tracing::debug!(
            container = id,
            bindings = graph.len(),
            scoped_slots = graph.scoped_slots(),
            "container built"
        );
        Ok(Self {
            inner: Arc::new(ContainerInner {
                id,
                graph,
                observers: Observers::new(observers),
                config,
                root,
            }),
        })
    }

    /// The scope instance named `"root"` that this container owns.
    pub fn root_scope(&self) -> &Scope {
        &self.inner.root
    }

    /// A fresh instance of the named scope with empty memo cells.
    pub fn create_scope(&self, name: impl Into<ScopeName>) -> Scope {
        let scope = Scope::new(name.into(), self.inner.id, self.inner.graph.scoped_slots());
        tracing::trace!(container = self.inner.id, scope = %scope.name(), id = scope.id().as_u64(), "scope created");
        scope
    }

    /// Resolves `key` in `scope` on behalf of `caller`.
    ///
    /// Repeated requests for the same key in the same scope instance return
    /// the same value, or the same error, without re-running constructors.
    pub fn resolve(&self, key: &TypeKey, scope: &Scope, caller: &Location) -> DiResult<AnyValue> {
        self.inner.check_scope(scope)?;
        let mut ctx = ResolveContext::new(&self.inner, scope);
        match self.inner.graph.lookup(key) {
            Some(id) => ctx.resolve(id, caller),
            None => Err(DiError::UnresolvedType {
                key: *key,
                requested_by: caller.clone(),
            }),
        }
    }

    /// Typed [`resolve`](Self::resolve).
    pub fn get<T: Send + Sync + 'static>(&self, scope: &Scope, caller: &Location) -> DiResult<Arc<T>> {
        self.get_key(TypeKey::of::<T>(), scope, caller)
    }

    pub fn get_named<T: Send + Sync + 'static>(
        &self,
        name: &'static str,
        scope: &Scope,
        caller: &Location,
    ) -> DiResult<Arc<T>> {
        self.get_key(TypeKey::named::<T>(name), scope, caller)
    }

    /// Like [`get`](Self::get) but `Ok(None)` when `T` has no binding.
    pub fn get_optional<T: Send + Sync + 'static>(
        &self,
        scope: &Scope,
        caller: &Location,
    ) -> DiResult<Option<Arc<T>>> {
        if !self.contains(&TypeKey::of::<T>()) {
            return Ok(None);
        }
        self.get::<T>(scope, caller).map(Some)
    }

    /// All members of the group bound to `T`, empty when there is none.
    pub fn get_group<T: Send + Sync + 'static>(&self, scope: &Scope, caller: &Location) -> DiResult<Vec<Arc<T>>> {
        let key = TypeKey::of::<T>();
        if !self.contains(&key) {
            self.inner.check_scope(scope)?;
            return Ok(Vec::new());
        }
        let value = self.resolve(&key, scope, caller)?;
        downcast_group::<T>(&value, key)
    }

    /// [`get`](Self::get) in the root scope.
    pub fn get_root<T: Send + Sync + 'static>(&self, caller: &Location) -> DiResult<Arc<T>> {
        self.get::<T>(self.root_scope(), caller)
    }

    pub fn get_named_root<T: Send + Sync + 'static>(&self, name: &'static str, caller: &Location) -> DiResult<Arc<T>> {
        self.get_named::<T>(name, self.root_scope(), caller)
    }

    pub fn get_group_root<T: Send + Sync + 'static>(&self, caller: &Location) -> DiResult<Vec<Arc<T>>> {
        self.get_group::<T>(self.root_scope(), caller)
    }

    fn get_key<T: Send + Sync + 'static>(&self, key: TypeKey, scope: &Scope, caller: &Location) -> DiResult<Arc<T>> {
        self.resolve(&key, scope, caller)?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch {
                key,
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.inner.graph.lookup(key).is_some()
    }

    /// Bound keys in registration order of their first binding.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.inner.graph.nodes().map(|(_, node)| node.key)
    }

    pub fn len(&self) -> usize {
        self.inner.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.graph.len() == 0
    }

    /// One descriptor per bound key.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        self.inner
            .graph
            .nodes()
            .map(|(_, node)| BindingDescriptor::from_node(node))
            .collect()
    }

    /// Snapshot of the graph with each node's state in the root scope.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::from_graph(&self.inner.graph, Some(&self.inner.root))
    }

    pub fn add_observer(&self, observer: Arc<dyn ResolutionObserver>) {
        self.inner.observers.add(observer);
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("bindings", &self.inner.graph.len())
            .field("scoped_slots", &self.inner.graph.scoped_slots())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl ContainerInner {
    pub(crate) fn check_scope(&self, scope: &Scope) -> DiResult<()> {
        if scope.container_id == self.id {
            Ok(())
        } else {
            Err(DiError::ForeignScope {
                scope: scope.name().clone(),
            })
        }
    }

    /// Reports the start of a visit. Returns the start time when anyone
    /// is listening.
    fn observe_resolving(&self, node: &Node, scope: &Scope, requested_by: &Location) -> Option<Instant> {
        if !self.observers.has_observers() {
            return None;
        }
        self.observers.resolving(&Self::event(node, scope, requested_by));
        Some(Instant::now())
    }

    fn observe_settled(
        &self,
        node: &Node,
        scope: &Scope,
        requested_by: &Location,
        started: Option<Instant>,
        outcome: &Outcome,
        cached: bool,
    ) {
        let Some(started) = started else {
            return;
        };
        let event = Self::event(node, scope, requested_by);
        match outcome {
            Ok(_) => self.observers.resolved(&event, started.elapsed(), cached),
            Err(err) => self.observers.failed(&event, err),
        }
    }

    fn event<'e>(node: &'e Node, scope: &'e Scope, requested_by: &'e Location) -> ResolutionEvent<'e> {
        ResolutionEvent {
            key: &node.key,
            declared_at: node.resolver.location(),
            requested_by,
            scope: scope.name(),
        }
    }

    fn step(&self, id: NodeId) -> CycleStep {
        let node = self.graph.node(id);
        CycleStep {
            key: node.key,
            location: node.resolver.location().clone(),
        }
    }

    fn trace(&self, node: &Node, scope: &Scope, caller: &Location) {
        if self.config.trace_resolutions {
            tracing::debug!(
                key = %node.key,
                declared_at = %node.resolver.location(),
                requested_by = %caller,
                scope = %scope.name(),
                "resolve"
            );
        } else {
            tracing::trace!(
                key = %node.key,
                declared_at = %node.resolver.location(),
                requested_by = %caller,
                scope = %scope.name(),
                "resolve"
            );
        }
    }
}
