//! Arena-backed binding graph.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]; a key index
//! maps [`TypeKey`]s to nodes. The graph is mutable only while a container is
//! being built. [`Graph::finalize`] then derives edges, marks every node that
//! sits on a dependency cycle, checks scope capture and assigns scoped slots.

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult, Outcome};
use crate::key::TypeKey;
use crate::registration::Provider;
use crate::resolver::{Candidate, Resolver, Unit};
use crate::scope::Scope;

#[cfg(feature = "ahash")]
type KeyMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
type KeyMap<K, V> = std::collections::HashMap<K, V>;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where an outcome is memoized.
pub(crate) enum NodeCache {
    /// One cell for the whole container.
    Root(OnceCell<Outcome>),
    /// One cell per scope instance, at this slot.
    Scoped(usize),
}

impl NodeCache {
    pub(crate) fn cell<'s>(&'s self, scope: &'s Scope) -> &'s OnceCell<Outcome> {
        match self {
            NodeCache::Root(cell) => cell,
            NodeCache::Scoped(slot) => scope.cell(*slot),
        }
    }
}

pub(crate) struct Node {
    pub(crate) key: TypeKey,
    pub(crate) resolver: Resolver,
    pub(crate) edges: Vec<NodeId>,
    pub(crate) cache: NodeCache,
    pub(crate) on_cycle: bool,
}

#[derive(Default)]
pub(crate) struct Graph {
    nodes: Vec<Node>,
    index: KeyMap<TypeKey, NodeId>,
    scoped_slots: usize,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a registration, creating the node for its key on first sight.
    pub(crate) fn insert(&mut self, candidate: Candidate, priority: usize) -> DiResult<()> {
        if let Some(&id) = self.index.get(&candidate.key) {
            return self.nodes[id.index()].resolver.add_node(candidate, priority);
        }
        let key = candidate.key;
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            key,
            resolver: Resolver::new(candidate, priority),
            edges: Vec::new(),
            cache: NodeCache::Root(OnceCell::new()),
            on_cycle: false,
        });
        self.index.insert(key, id);
        Ok(())
    }

    /// Seals the graph. Returns scope-capture errors; the graph is usable
    /// either way.
    pub(crate) fn finalize(&mut self) -> Vec<DiError> {
        self.link();
        self.mark_cycles();
        let errors = self.check_captives();
        self.assign_caches();
        errors
    }

    #[inline]
    pub(crate) fn lookup(&self, key: &TypeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::from_index(i), node))
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Memo cells each scope instance needs.
    pub(crate) fn scoped_slots(&self) -> usize {
        self.scoped_slots
    }

    fn link(&mut self) {
        for i in 0..self.nodes.len() {
            let mut edges = Vec::new();
            for input in self.nodes[i].resolver.inputs() {
                if let Some(target) = self.lookup(&input.key) {
                    if !edges.contains(&target) {
                        edges.push(target);
                    }
                }
            }
            self.nodes[i].edges = edges;
        }
    }

    fn mark_cycles(&mut self) {
        for component in strongly_connected(&self.nodes) {
            let cyclic = component.len() > 1 || {
                let only = component[0];
                self.nodes[only.index()].edges.contains(&only)
            };
            if cyclic {
                for id in component {
                    self.nodes[id.index()].on_cycle = true;
                }
            }
        }
    }

    /// An unscoped constructor is built once per container, so it may not
    /// read anything that differs between scope instances.
    fn check_captives(&self) -> Vec<DiError> {
        let mut errors = Vec::new();
        for node in &self.nodes {
            let units: Vec<&Unit> = match &node.resolver {
                Resolver::Single(unit) => vec![unit],
                Resolver::Group(group) => group.members.iter().map(|member| &member.unit).collect(),
            };
            for provider in units.into_iter().filter_map(Unit::container_provider) {
                self.check_inputs(node.key, provider, &mut errors);
            }
        }
        errors
    }

    fn check_inputs(&self, key: TypeKey, provider: &Provider, errors: &mut Vec<DiError>) {
        for input in &provider.inputs {
            let Some(target) = self.lookup(&input.key) else {
                continue;
            };
            if let Some(scope) = self.node(target).resolver.scope() {
                errors.push(DiError::CaptiveDependency {
                    key,
                    location: provider.location.clone(),
                    dependency: input.key,
                    scope: scope.clone(),
                });
            }
        }
    }

    /// Unscoped values get a container cell, scoped ones a slot in every
    /// scope instance. A group is scoped as soon as one member is.
    fn assign_caches(&mut self) {
        let mut next_slot = 0;
        let mut slot = || {
            next_slot += 1;
            NodeCache::Scoped(next_slot - 1)
        };
        for node in &mut self.nodes {
            node.cache = match &mut node.resolver {
                Resolver::Single(Unit::Scoped(_)) => slot(),
                Resolver::Single(_) => NodeCache::Root(OnceCell::new()),
                Resolver::Group(group) => {
                    let mut scoped = false;
                    for member in &mut group.members {
                        member.cache = match member.unit {
                            Unit::Supplied(_) => None,
                            Unit::Constructor(_) => Some(NodeCache::Root(OnceCell::new())),
                            Unit::Scoped(_) => {
                                scoped = true;
                                Some(slot())
                            }
                        };
                    }
                    if scoped {
                        slot()
                    } else {
                        NodeCache::Root(OnceCell::new())
                    }
                }
            };
        }
        self.scoped_slots = next_slot;
    }
}

/// Tarjan's algorithm without recursion. Components come out sinks first.
fn strongly_connected(nodes: &[Node]) -> Vec<Vec<NodeId>> {
    const UNVISITED: usize = usize::MAX;

    let n = nodes.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0;
    // (node, next edge to follow)
    let mut work: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        work.push((root, 0));

        while let Some(&(v, edge)) = work.last() {
            if edge == 0 && index[v] == UNVISITED {
                index[v] = next_index;
                lowlink[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }

            if let Some(target) = nodes[v].edges.get(edge) {
                let w = target.index();
                if let Some(top) = work.last_mut() {
                    top.1 += 1;
                }
                if index[w] == UNVISITED {
                    work.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(NodeId::from_index(w));
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{GroupMember, Input, Registration, Supply};
    use crate::{location, Location};
    use std::sync::Arc;

    struct A;
    struct B;
    struct C;
    struct D;

    fn raw<Out: Send + Sync + 'static>(inputs: Vec<Input>) -> Registration {
        Provider::from_raw(
            Location::named(std::any::type_name::<Out>()),
            inputs,
            TypeKey::of::<Out>(),
            |_| Err("unused".into()),
        )
        .into()
    }

    fn build(regs: Vec<Registration>) -> (Graph, Vec<DiError>) {
        let mut graph = Graph::new();
        let mut errors = Vec::new();
        for (priority, reg) in regs.into_iter().enumerate() {
            if let Err(e) = graph.insert(Candidate::from(reg), priority) {
                errors.push(e);
            }
        }
        errors.extend(graph.finalize());
        (graph, errors)
    }

    fn on_cycle<T: 'static>(graph: &Graph) -> bool {
        let id = graph.lookup(&TypeKey::of::<T>()).unwrap();
        graph.node(id).on_cycle
    }

    #[test]
    fn marks_nodes_reached_through_cross_edges() {
        // A -> B -> C -> B, A -> C, D -> A
        let (graph, errors) = build(vec![
            raw::<A>(vec![Input::required(TypeKey::of::<B>()), Input::required(TypeKey::of::<C>())]),
            raw::<B>(vec![Input::required(TypeKey::of::<C>())]),
            raw::<C>(vec![Input::required(TypeKey::of::<B>())]),
            raw::<D>(vec![Input::required(TypeKey::of::<A>())]),
        ]);
        assert!(errors.is_empty());
        assert!(!on_cycle::<A>(&graph));
        assert!(on_cycle::<B>(&graph));
        assert!(on_cycle::<C>(&graph));
        assert!(!on_cycle::<D>(&graph));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let (graph, _) = build(vec![raw::<A>(vec![Input::required(TypeKey::of::<A>())])]);
        assert!(on_cycle::<A>(&graph));
    }

    #[test]
    fn duplicate_keeps_first_binding() {
        let (graph, errors) = build(vec![
            Supply::new(1u8, location!("first")).into(),
            Supply::new(2u8, location!("second")).into(),
        ]);
        assert_eq!(graph.len(), 1);
        match &errors[..] {
            [DiError::DuplicateBinding { existing, duplicate, .. }] => {
                assert_eq!(existing.name(), "first");
                assert_eq!(duplicate.name(), "second");
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[test]
    fn group_rejects_exclusive_binding() {
        let (_, errors) = build(vec![
            GroupMember::Supply(Supply::new(1u8, location!())).into(),
            Supply::new(2u8, location!()).into(),
        ]);
        assert!(matches!(errors[..], [DiError::DuplicateBinding { .. }]));
    }

    #[test]
    fn scoped_slots_cover_nodes_and_members() {
        let scoped = |name: &'static str| {
            Provider::from_raw(location!(), vec![], TypeKey::named::<u32>(name), |_| Ok(Arc::new(0u32)))
                .scoped("request")
        };
        let (graph, errors) = build(vec![
            scoped("a").into(),
            GroupMember::Provider(scoped("b").named("g")).into(),
            GroupMember::Provider(Provider::from_fn(location!(), || 1u32).named("g")).into(),
        ]);
        assert!(errors.is_empty());
        // "a", member "b" and the group holding it.
        assert_eq!(graph.scoped_slots(), 3);
    }

    #[test]
    fn unscoped_reader_of_scoped_value_is_captive() {
        let (_, errors) = build(vec![
            Provider::from_fn(location!(), || A).scoped("request").into(),
            raw::<B>(vec![Input::required(TypeKey::of::<A>())]),
        ]);
        match &errors[..] {
            [DiError::CaptiveDependency { key, dependency, scope, .. }] => {
                assert_eq!(*key, TypeKey::of::<B>());
                assert_eq!(*dependency, TypeKey::of::<A>());
                assert_eq!(scope.as_str(), "request");
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }
}
