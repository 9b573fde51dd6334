// src/dag/graph.rs

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::{Index, IndexMut};

use tracing::{debug, trace};

use crate::errors::GraphError;

/// Anything that can live in a [`Graph`]: the graph only needs a unique name.
pub trait Node {
    fn name(&self) -> &str;
}

impl Node for String {
    fn name(&self) -> &str {
        self
    }
}

impl Node for &str {
    fn name(&self) -> &str {
        self
    }
}

/// Stable handle assigned to a node when it is inserted.
///
/// Ids are never reused within one graph, even after the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Directed dependency `from -> to`: `to` cannot run until `from` is removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for Edge {
    fn from((from, to): (A, B)) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// State of the cached topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortState {
    /// No order has been computed yet.
    Unset,
    /// The cached order is a seed for the next (incremental) sort.
    Stale,
    /// The cached order is a valid topological order of the current graph.
    Valid,
}

#[derive(Debug, Clone)]
struct Slot<N> {
    node: N,
    preds: Vec<NodeId>,
    succs: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Arena<N> {
    slots: Vec<Option<Slot<N>>>,
}

impl<N> Arena<N> {
    fn push(&mut self, node: N) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot {
            node,
            preds: Vec::new(),
            succs: Vec::new(),
        }));
        id
    }

    fn get(&self, id: NodeId) -> Option<&Slot<N>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn take(&mut self, id: NodeId) -> Option<Slot<N>> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<N> Index<NodeId> for Arena<N> {
    type Output = Slot<N>;

    fn index(&self, id: NodeId) -> &Slot<N> {
        match self.slots.get(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("node id {} does not refer to a live node", id.0),
        }
    }
}

impl<N> IndexMut<NodeId> for Arena<N> {
    fn index_mut(&mut self, id: NodeId) -> &mut Slot<N> {
        match self.slots.get_mut(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("node id {} does not refer to a live node", id.0),
        }
    }
}

/// Directed acyclic graph of schedulable nodes with an incrementally
/// maintained topological order.
///
/// Predecessor and successor lists are derived from the edge list and kept
/// in sync by every mutation; they are never exposed mutably. The sorted
/// order is computed lazily and, once it exists, every later sort is seeded
/// from the previous order instead of starting from scratch.
///
/// Cycles are not rejected when edges are added; they are reported by the
/// next sort as [`GraphError::Cycle`].
#[derive(Debug, Clone)]
pub struct Graph<N> {
    arena: Arena<N>,
    index: HashMap<String, NodeId>,
    /// Node set in insertion order.
    members: Vec<NodeId>,
    edges: Vec<(NodeId, NodeId)>,
    sorted: VecDeque<NodeId>,
    state: SortState,
}

impl<N> Default for Graph<N> {
    fn default() -> Self {
        Self {
            arena: Arena { slots: Vec::new() },
            index: HashMap::new(),
            members: Vec::new(),
            edges: Vec::new(),
            sorted: VecDeque::new(),
            state: SortState::Unset,
        }
    }
}

impl<N: Node> Graph<N> {
    /// Build a graph from an initial node set and edge set.
    ///
    /// Fails if a node name repeats or an edge references a node that is not
    /// in `nodes`.
    pub fn new<I, E, T>(nodes: I, edges: E) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = N>,
        E: IntoIterator<Item = T>,
        T: Into<Edge>,
    {
        let mut graph = Self::default();
        graph.add_nodes(nodes)?;
        graph.add_edges(edges)?;
        Ok(graph)
    }

    /// Build a graph with nodes and no edges.
    pub fn from_nodes<I>(nodes: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = N>,
    {
        let mut graph = Self::default();
        graph.add_nodes(nodes)?;
        Ok(graph)
    }

    /// Add nodes to the graph.
    ///
    /// Names must be unique across the existing and the new nodes; on error
    /// nothing is added. If an order was already computed, the new nodes are
    /// appended to it and the next sort starts from there.
    pub fn add_nodes<I>(&mut self, nodes: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = N>,
    {
        let nodes: Vec<N> = nodes.into_iter().collect();

        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            let name = node.name();
            if self.index.contains_key(name) || !seen.insert(name) {
                return Err(GraphError::DuplicateNode(name.to_string()));
            }
        }

        if nodes.is_empty() {
            return Ok(());
        }

        for node in nodes {
            let name = node.name().to_string();
            let id = self.arena.push(node);
            debug!(node = %name, id = id.0, "added node");
            self.index.insert(name, id);
            self.members.push(id);
            if self.state != SortState::Unset {
                self.sorted.push_back(id);
            }
        }

        if self.state != SortState::Unset {
            self.state = SortState::Stale;
        }
        Ok(())
    }

    /// Add edges between nodes already in the graph.
    ///
    /// All endpoints are checked before anything is inserted.
    pub fn add_edges<I, T>(&mut self, edges: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Edge>,
    {
        let resolved = edges
            .into_iter()
            .map(|edge| {
                let edge: Edge = edge.into();
                match (self.index.get(&edge.from), self.index.get(&edge.to)) {
                    (Some(&from), Some(&to)) => Ok((from, to)),
                    _ => Err(GraphError::DanglingEdge {
                        from: edge.from,
                        to: edge.to,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if resolved.is_empty() {
            return Ok(());
        }

        for (from, to) in resolved {
            trace!(
                from = %self.arena[from].node.name(),
                to = %self.arena[to].node.name(),
                "added edge"
            );
            self.edges.push((from, to));
            self.arena[to].preds.push(from);
            self.arena[from].succs.push(to);
        }

        if self.state == SortState::Valid {
            self.state = SortState::Stale;
        }
        Ok(())
    }

    /// Sort the graph topologically and cache the result.
    ///
    /// With `presorted = None` the node set (in insertion order) is the
    /// input; otherwise `presorted` is used as the seed and must name every
    /// node exactly once. Nodes are emitted pass by pass: each pass takes,
    /// in input order, every node whose predecessors have all been emitted.
    ///
    /// On failure the cached order is left untouched.
    pub fn sorting(&mut self, presorted: Option<&[&str]>) -> Result<(), GraphError> {
        let seed = match presorted {
            Some(names) => self.resolve_presorted(names)?,
            None => self.members.clone(),
        };
        self.sort_from(seed)
    }

    /// Topologically sorted nodes, computing the order if needed.
    pub fn sorted_nodes(&mut self) -> Result<Vec<&N>, GraphError> {
        self.ensure_sorted()?;
        Ok(self.sorted.iter().map(|id| &self.arena[*id].node).collect())
    }

    /// Names of [`Graph::sorted_nodes`].
    pub fn sorted_node_names(&mut self) -> Result<Vec<&str>, GraphError> {
        self.ensure_sorted()?;
        Ok(self
            .sorted
            .iter()
            .map(|id| self.arena[*id].node.name())
            .collect())
    }

    /// Remove a node whose predecessors have all been removed, returning it.
    ///
    /// This is how a finished (or cached) node is retired: its outgoing
    /// edges disappear, so its successors lose one predecessor each.
    pub fn remove_node(&mut self, name: &str) -> Result<N, GraphError> {
        let id = *self
            .index
            .get(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;

        if !self.arena[id].preds.is_empty() {
            return Err(GraphError::NotReady {
                node: name.to_string(),
                waiting_on: self.names_of(&self.arena[id].preds),
            });
        }

        let Some(slot) = self.arena.take(id) else {
            return Err(GraphError::NodeNotFound(name.to_string()));
        };
        self.index.remove(name);
        self.members.retain(|member| *member != id);

        for succ in &slot.succs {
            let preds = &mut self.arena[*succ].preds;
            if let Some(pos) = preds.iter().position(|pred| *pred == id) {
                preds.remove(pos);
            }
        }
        // The node had no predecessors, so every edge touching it starts here.
        self.edges.retain(|(from, _)| *from != id);

        match self.state {
            SortState::Unset => {}
            SortState::Valid if self.sorted.front() == Some(&id) => {
                self.sorted.pop_front();
            }
            SortState::Valid | SortState::Stale => {
                self.sorted.retain(|member| *member != id);
                self.state = SortState::Stale;
            }
        }

        debug!(
            node = %name,
            successors = slot.succs.len(),
            sort_state = ?self.state,
            "removed node"
        );
        Ok(slot.node)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn sort_state(&self) -> SortState {
        self.state
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.arena.get(id).map(|slot| &slot.node)
    }

    pub fn get(&self, name: &str) -> Option<&N> {
        self.id_of(name).and_then(|id| self.node(id))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.members.iter().map(|id| &self.arena[*id].node)
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes().map(Node::name).collect()
    }

    /// Edges in insertion order, as `(predecessor, successor)`.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N)> {
        self.edges
            .iter()
            .map(|(from, to)| (&self.arena[*from].node, &self.arena[*to].node))
    }

    pub fn edge_names(&self) -> Vec<(&str, &str)> {
        self.edges().map(|(from, to)| (from.name(), to.name())).collect()
    }

    /// Unresolved predecessors of a node (empty for unknown nodes).
    pub fn predecessors_of(&self, name: &str) -> Vec<&str> {
        match self.id_of(name) {
            Some(id) => self.arena[id]
                .preds
                .iter()
                .map(|pred| self.arena[*pred].node.name())
                .collect(),
            None => Vec::new(),
        }
    }

    /// `true` if the node exists and has no unresolved predecessors.
    pub fn is_ready(&self, name: &str) -> bool {
        self.id_of(name)
            .is_some_and(|id| self.arena[id].preds.is_empty())
    }

    /// Successors of a node (empty for unknown nodes).
    pub fn successors_of(&self, name: &str) -> Vec<&str> {
        match self.id_of(name) {
            Some(id) => self.arena[id]
                .succs
                .iter()
                .map(|succ| self.arena[*succ].node.name())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Nodes with no remaining predecessors, in insertion order.
    pub fn ready_nodes(&self) -> Vec<&N> {
        self.members
            .iter()
            .filter(|id| self.arena[**id].preds.is_empty())
            .map(|id| &self.arena[*id].node)
            .collect()
    }

    fn ensure_sorted(&mut self) -> Result<(), GraphError> {
        match self.state {
            SortState::Valid => Ok(()),
            SortState::Stale => {
                let seed: Vec<NodeId> = self.sorted.iter().copied().collect();
                self.sort_from(seed)
            }
            SortState::Unset => self.sort_from(self.members.clone()),
        }
    }

    fn sort_from(&mut self, seed: Vec<NodeId>) -> Result<(), GraphError> {
        let order = self.partition_sort(seed)?;
        self.sorted = order.into();
        self.state = SortState::Valid;
        Ok(())
    }

    /// Layered partition sort over `seed`, which must hold every live node
    /// exactly once.
    fn partition_sort(&self, seed: Vec<NodeId>) -> Result<Vec<NodeId>, GraphError> {
        let mut remaining = vec![0usize; self.arena.capacity()];
        for id in &seed {
            remaining[id.0] = self.arena[*id].preds.len();
        }

        let mut sorted = Vec::with_capacity(seed.len());
        let mut pending = seed;
        let mut passes = 0usize;

        while !pending.is_empty() {
            passes += 1;
            let (ready, blocked): (Vec<NodeId>, Vec<NodeId>) =
                pending.into_iter().partition(|id| remaining[id.0] == 0);

            if ready.is_empty() {
                return Err(GraphError::Cycle(self.names_of(&blocked)));
            }

            for id in &ready {
                for succ in &self.arena[*id].succs {
                    remaining[succ.0] -= 1;
                }
            }
            sorted.extend(ready);
            pending = blocked;
        }

        trace!(nodes = sorted.len(), passes, "sorted graph");
        Ok(sorted)
    }

    fn resolve_presorted(&self, names: &[&str]) -> Result<Vec<NodeId>, GraphError> {
        if names.len() != self.members.len() {
            return Err(GraphError::InvalidPresort(format!(
                "expected {} nodes, got {}",
                self.members.len(),
                names.len()
            )));
        }

        let mut seen = HashSet::with_capacity(names.len());
        names
            .iter()
            .map(|name| {
                let id = self.id_of(name).ok_or_else(|| {
                    GraphError::InvalidPresort(format!("unknown node '{name}'"))
                })?;
                if !seen.insert(id) {
                    return Err(GraphError::InvalidPresort(format!(
                        "node '{name}' listed twice"
                    )));
                }
                Ok(id)
            })
            .collect()
    }

    fn names_of(&self, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| self.arena[*id].node.name().to_string())
            .collect()
    }
}
