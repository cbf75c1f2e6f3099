//! State of one in-flight request, and the walk that serves it.
//!
//! Resolution does not recurse. Bindings waiting on an input sit on an
//! explicit task stack next to the resolution path, so a deep graph costs
//! heap rather than call stack. A construction function only runs once every
//! input of its unit is resolved, inside the unit's memo cell.

use std::time::Instant;

use once_cell::sync::OnceCell;

use crate::error::{CycleStep, DiError, DiResult, Outcome};
use crate::graph::{Node, NodeId};
use crate::internal::{memoize, ResolutionPath};
use crate::key::TypeKey;
use crate::location::Location;
use crate::registration::{AnyValue, GroupValues, Input, InputKind};
use crate::resolver::{Resolver, Unit};
use crate::scope::Scope;

use super::ContainerInner;

/// Carried through a single request: the container, the scope instance the
/// request runs in, and the resolution path so far.
pub(crate) struct ResolveContext<'a> {
    inner: &'a ContainerInner,
    scope: &'a Scope,
    path: ResolutionPath,
}

/// A binding whose value is being assembled.
struct Task {
    node: NodeId,
    requested_by: Location,
    /// Set when observers are registered.
    started: Option<Instant>,
    /// Current group member; always 0 for single bindings.
    member: usize,
    /// Resolved inputs of the current unit, in declaration order.
    args: Vec<Option<AnyValue>>,
    /// Values of the group members built so far.
    collected: Vec<AnyValue>,
}

/// What visiting a node produced.
enum Entry {
    /// Known without building: cached, a cycle, or the wrong scope.
    Settled(Outcome),
    /// The node must be built; its task goes on the stack.
    Descend(Task),
    /// The path is too deep. Nothing on it is memoized.
    Abort(DiError),
}

/// What advancing a task produced.
enum Step {
    /// The input bound to this node must be resolved first.
    Need(NodeId, Location),
    /// The task is finished. The flag is true for a memo hit.
    Done(Outcome, bool),
}

impl<'a> ResolveContext<'a> {
    pub(crate) fn new(inner: &'a ContainerInner, scope: &'a Scope) -> Self {
        Self {
            inner,
            scope,
            path: ResolutionPath::new(inner.config.max_depth),
        }
    }

    /// Resolves one declared input. Unbound optional and group inputs are
    /// `None`; an unbound required input is an error naming `requested_by`.
    pub(crate) fn resolve_input(&mut self, input: &Input, requested_by: &Location) -> DiResult<Option<AnyValue>> {
        match self.inner.graph.lookup(&input.key) {
            Some(id) => self.resolve(id, requested_by).map(Some),
            None => match input.kind {
                InputKind::Required => Err(DiError::UnresolvedType {
                    key: input.key,
                    requested_by: requested_by.clone(),
                }),
                InputKind::Optional | InputKind::Group => Ok(None),
            },
        }
    }

    /// Resolves node `id` on behalf of `requested_by`.
    pub(crate) fn resolve(&mut self, id: NodeId, requested_by: &Location) -> Outcome {
        let mut task = match self.enter(id, requested_by) {
            Entry::Settled(outcome) => return outcome,
            Entry::Abort(err) => return Err(err),
            Entry::Descend(task) => task,
        };
        let mut waiting: Vec<Task> = Vec::new();
        let mut returned = None;

        loop {
            match self.advance(&mut task, returned.take()) {
                Step::Need(input, by) => match self.enter(input, &by) {
                    Entry::Settled(outcome) => returned = Some(outcome),
                    Entry::Descend(child) => waiting.push(std::mem::replace(&mut task, child)),
                    Entry::Abort(err) => {
                        let failed = Err(err.clone());
                        self.leave(&task, &failed, false);
                        while let Some(parent) = waiting.pop() {
                            self.leave(&parent, &failed, false);
                        }
                        return Err(err);
                    }
                },
                Step::Done(outcome, cached) => {
                    self.leave(&task, &outcome, cached);
                    match waiting.pop() {
                        Some(parent) => {
                            task = parent;
                            returned = Some(outcome);
                        }
                        None => return outcome,
                    }
                }
            }
        }
    }

    /// Cache, then path, then depth. Only a miss on all three descends.
    fn enter(&mut self, id: NodeId, requested_by: &Location) -> Entry {
        let inner = self.inner;
        let node = inner.graph.node(id);
        inner.trace(node, self.scope, requested_by);
        let started = inner.observe_resolving(node, self.scope, requested_by);

        if let Some(outcome) = self.settled(node, requested_by) {
            inner.observe_settled(node, self.scope, requested_by, started, &outcome, true);
            return Entry::Settled(outcome);
        }
        if let Some(start) = self.path.position(id) {
            let mut cycle: Vec<CycleStep> = self.path.nodes_from(start).map(|n| inner.step(n)).collect();
            cycle.push(inner.step(id));
            let outcome = Err(DiError::CyclicDependency { cycle });
            inner.observe_settled(node, self.scope, requested_by, started, &outcome, false);
            return Entry::Settled(outcome);
        }
        if self.path.is_full() {
            let err = DiError::DepthExceeded {
                key: node.key,
                depth: self.path.max_depth(),
            };
            inner.observe_settled(node, self.scope, requested_by, started, &Err(err.clone()), false);
            return Entry::Abort(err);
        }

        self.path.push(id);
        Entry::Descend(Task {
            node: id,
            requested_by: requested_by.clone(),
            started,
            member: 0,
            args: Vec::new(),
            collected: Vec::new(),
        })
    }

    fn leave(&mut self, task: &Task, outcome: &Outcome, cached: bool) {
        self.path.pop();
        let node = self.inner.graph.node(task.node);
        self.inner
            .observe_settled(node, self.scope, &task.requested_by, task.started, outcome, cached);
    }

    /// The outcome a node already has in this scope instance. A scoped
    /// binding requested from another scope fails without touching any cell.
    fn settled(&self, node: &Node, requested_by: &Location) -> Option<Outcome> {
        if let Resolver::Single(unit) = &node.resolver {
            if let Err(err) = self.check_unit_scope(node.key, unit, requested_by) {
                return Some(Err(err));
            }
        }
        node.cache.cell(self.scope).get().cloned()
    }

    fn check_unit_scope(&self, key: TypeKey, unit: &Unit, requested_by: &Location) -> DiResult<()> {
        match unit.scope() {
            Some(expected) if expected != self.scope.name() => Err(DiError::ScopeMismatch {
                key,
                expected: expected.clone(),
                actual: self.scope.name().clone(),
                requested_by: requested_by.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Moves `task` forward until it needs an input or is finished.
    /// `returned` is the outcome of the input it asked for last.
    fn advance(&self, task: &mut Task, mut returned: Option<Outcome>) -> Step {
        let inner = self.inner;
        let node = inner.graph.node(task.node);
        let group = match &node.resolver {
            Resolver::Single(unit) => {
                let cell = node.cache.cell(self.scope);
                return self.build(node.key, unit, Some(cell), task, returned);
            }
            Resolver::Group(group) => group,
        };

        let group_cell = node.cache.cell(self.scope);
        while let Some(member) = group.members.get(task.member) {
            let cell = member.cache.as_ref().map(|cache| cache.cell(self.scope));
            match self.build(node.key, &member.unit, cell, task, returned.take()) {
                Step::Done(Ok(value), _) => {
                    task.collected.push(value);
                    task.args.clear();
                    task.member += 1;
                }
                Step::Done(Err(source), _) => {
                    let err = DiError::GroupMember {
                        key: node.key,
                        index: task.member,
                        location: member.unit.location().clone(),
                        source: Box::new(source),
                    };
                    let (outcome, cached) = memoize(group_cell, || Err(err));
                    return Step::Done(outcome, cached);
                }
                need @ Step::Need(..) => return need,
            }
        }
        let values = std::mem::take(&mut task.collected);
        let (outcome, cached) = memoize(group_cell, || {
            let value: AnyValue = std::sync::Arc::new(GroupValues(values));
            Ok(value)
        });
        Step::Done(outcome, cached)
    }

    /// Gathers the inputs of `unit` one at a time, then builds it into `cell`.
    fn build(
        &self,
        key: TypeKey,
        unit: &Unit,
        cell: Option<&OnceCell<Outcome>>,
        task: &mut Task,
        returned: Option<Outcome>,
    ) -> Step {
        if let Some(outcome) = cell.and_then(OnceCell::get) {
            return Step::Done(outcome.clone(), true);
        }
        if let Err(err) = self.check_unit_scope(key, unit, &task.requested_by) {
            return Step::Done(Err(err), false);
        }
        let ctor = match unit {
            Unit::Supplied(supplied) => {
                tracing::trace!(
                    key = %key,
                    declared_at = %supplied.location,
                    requested_by = %task.requested_by,
                    "supplying value"
                );
                let value = supplied.value.clone();
                return settle(cell, || Ok(value));
            }
            Unit::Constructor(ctor) => ctor,
            Unit::Scoped(scoped) => &scoped.ctor,
        };

        match returned {
            Some(Ok(value)) => task.args.push(Some(value)),
            Some(Err(err)) => return settle(cell, || Err(err)),
            None => {}
        }
        let provider = &ctor.provider;
        while let Some(input) = provider.inputs.get(task.args.len()) {
            match self.inner.graph.lookup(&input.key) {
                Some(id) => return Step::Need(id, provider.location.clone()),
                None => match input.kind {
                    InputKind::Required => {
                        let err = DiError::UnresolvedType {
                            key: input.key,
                            requested_by: provider.location.clone(),
                        };
                        return settle(cell, || Err(err));
                    }
                    InputKind::Optional | InputKind::Group => task.args.push(None),
                },
            }
        }

        let scope = self.scope;
        let args = &task.args;
        settle(cell, || ctor.construct(key, args, scope))
    }
}

/// Finishes a unit, memoizing it when it has a cell.
fn settle(cell: Option<&OnceCell<Outcome>>, init: impl FnOnce() -> Outcome) -> Step {
    match cell {
        Some(cell) => {
            let (outcome, cached) = memoize(cell, init);
            Step::Done(outcome, cached)
        }
        None => Step::Done(init(), false),
    }
}
