//! The graph arena that percolation runs mutate.
//!
//! `NetworkGraph` keeps petgraph's `StableGraph` as the backing store so that
//! removing a node tombstones its slot instead of shifting every other
//! index, plus a HashMap from our `NodeId` to petgraph's index for O(1)
//! lookup. Every node also carries an insertion sequence number; `nodes()`
//! always reports nodes in that order, which is the "original order" that
//! every deterministic tie-break in the runtime refers to.
//!
//! Directed and undirected graphs share one representation. An undirected
//! graph stores each pair once and is always read through the undirected
//! view.

use crate::types::{EdgeData, NodeId};
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Node payload: the caller-visible id plus its insertion sequence.
#[derive(Debug, Clone, Copy)]
struct NodeSlot {
    id: NodeId,
    seq: u64,
}

/// Mutable graph with stable node order and O(1) node removal by id.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    graph: StableGraph<NodeSlot, EdgeData>,
    /// Map from our NodeId to petgraph's internal index.
    node_index: HashMap<NodeId, NodeIndex>,
    next_seq: u64,
    directed: bool,
}

/// Which edges count as adjacency when taking a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeView {
    /// Ignore direction; a pair joined in either direction is adjacent once.
    Undirected,
    /// Follow edge direction (identical to `Undirected` on undirected graphs).
    Outgoing,
}

impl NetworkGraph {
    pub fn new_undirected() -> Self {
        Self::with_direction(false)
    }

    pub fn new_directed() -> Self {
        Self::with_direction(true)
    }

    fn with_direction(directed: bool) -> Self {
        Self {
            graph: StableGraph::new(),
            node_index: HashMap::new(),
            next_seq: 0,
            directed,
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Add a node. Returns `false` if it was already present.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if self.node_index.contains_key(&id) {
            return false;
        }
        let idx = self.graph.add_node(NodeSlot {
            id,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.node_index.insert(id, idx);
        true
    }

    /// Add an edge of weight 1.0.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        self.add_weighted_edge(from, to, 1.0)
    }

    /// Add or re-weight an edge, creating missing endpoints.
    ///
    /// Self-loops are ignored. Returns `true` if a new edge was created.
    pub fn add_weighted_edge(&mut self, from: NodeId, to: NodeId, weight: f64) -> bool {
        if from == to {
            return false;
        }
        self.add_node(from);
        self.add_node(to);
        let a = self.node_index[&from];
        let b = self.node_index[&to];

        if let Some(edge) = self.find_edge(a, b) {
            self.graph[edge] = EdgeData::new(weight);
            return false;
        }
        self.graph.add_edge(a, b, EdgeData::new(weight));
        true
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<petgraph::stable_graph::EdgeIndex> {
        if self.directed {
            self.graph.find_edge(a, b)
        } else {
            self.graph.find_edge_undirected(a, b).map(|(edge, _)| edge)
        }
    }

    pub fn has_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        match (self.node_index.get(from), self.node_index.get(to)) {
            (Some(&a), Some(&b)) => self.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    pub fn edge_weight(&self, from: &NodeId, to: &NodeId) -> Option<f64> {
        let a = *self.node_index.get(from)?;
        let b = *self.node_index.get(to)?;
        self.find_edge(a, b).map(|edge| self.graph[edge].weight)
    }

    /// Remove an edge. Returns `true` if it existed.
    pub fn remove_edge(&mut self, from: &NodeId, to: &NodeId) -> bool {
        let (Some(&a), Some(&b)) = (self.node_index.get(from), self.node_index.get(to)) else {
            return false;
        };
        match self.find_edge(a, b) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    /// Remove a node and its incident edges. Returns `true` if it existed.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        match self.node_index.remove(id) {
            Some(idx) => self.graph.remove_node(idx).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All node ids in insertion order.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut slots: Vec<NodeSlot> = self
            .graph
            .node_indices()
            .map(|idx| self.graph[idx])
            .collect();
        // Freed slots are reused by petgraph, so index order can drift
        // from insertion order after a remove/add cycle.
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.id).collect()
    }

    /// All edges as `(from, to, weight)`.
    pub fn edges(&self) -> Vec<(NodeId, NodeId, f64)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| {
                let (a, b) = self.graph.edge_endpoints(edge)?;
                Some((self.graph[a].id, self.graph[b].id, self.graph[edge].weight))
            })
            .collect()
    }

    /// Neighbours ignoring direction, without duplicates.
    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.graph
            .neighbors_undirected(idx)
            .filter(|n| seen.insert(*n))
            .map(|n| self.graph[n].id)
            .collect()
    }

    /// Neighbours reachable by following edge direction.
    pub fn successors(&self, id: &NodeId) -> Vec<NodeId> {
        if !self.directed {
            return self.neighbors(id);
        }
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].id)
            .collect()
    }

    /// Number of incident edges (in + out for directed graphs).
    pub fn degree(&self, id: &NodeId) -> usize {
        let Some(&idx) = self.node_index.get(id) else {
            return 0;
        };
        self.graph.edges_directed(idx, Direction::Outgoing).count()
            + self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    /// Sum of incident edge weights (in + out for directed graphs).
    pub fn weighted_degree(&self, id: &NodeId) -> f64 {
        let Some(&idx) = self.node_index.get(id) else {
            return 0.0;
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|edge| edge.weight().weight)
            .sum()
    }

    /// Undirected copy. Where both `u→v` and `v→u` exist, the first edge
    /// added keeps its weight.
    pub fn to_undirected(&self) -> NetworkGraph {
        if !self.directed {
            return self.clone();
        }
        let mut out = NetworkGraph::new_undirected();
        for id in self.nodes() {
            out.add_node(id);
        }
        for (from, to, weight) in self.edges() {
            if !out.has_edge(&from, &to) {
                out.add_weighted_edge(from, to, weight);
            }
        }
        out
    }

    /// Subgraph induced by `members`, keeping this graph's relative node order.
    pub fn induced_subgraph(&self, members: &[NodeId]) -> NetworkGraph {
        let keep: HashSet<NodeId> = members.iter().copied().collect();
        let mut out = NetworkGraph::with_direction(self.directed);
        for id in self.nodes() {
            if keep.contains(&id) {
                out.add_node(id);
            }
        }
        for (from, to, weight) in self.edges() {
            if keep.contains(&from) && keep.contains(&to) {
                out.add_weighted_edge(from, to, weight);
            }
        }
        out
    }

    /// Index-addressed adjacency snapshot in node order.
    ///
    /// Node `i` of the snapshot is `self.nodes()[i]`. Neighbour lists are
    /// sorted by index so iteration order is reproducible.
    pub fn adjacency(&self, view: EdgeView) -> Adjacency {
        let nodes = self.nodes();
        let position: HashMap<NodeIndex, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (self.node_index[id], i))
            .collect();

        let follow_direction = self.directed && view == EdgeView::Outgoing;
        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nodes.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();

        for edge in self.graph.edge_indices() {
            let Some((a, b)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let (i, j) = (position[&a], position[&b]);
            let weight = self.graph[edge].weight;
            if follow_direction {
                neighbors[i].push((j, weight));
            } else if seen.insert((i.min(j), i.max(j))) {
                neighbors[i].push((j, weight));
                neighbors[j].push((i, weight));
            }
        }
        for list in &mut neighbors {
            list.sort_by_key(|&(j, _)| j);
        }

        Adjacency { nodes, neighbors }
    }
}

/// Compact adjacency lists over dense indices `0..n`.
#[derive(Debug, Clone)]
pub struct Adjacency {
    nodes: Vec<NodeId>,
    neighbors: Vec<Vec<(usize, f64)>>,
}

impl Adjacency {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, i: usize) -> NodeId {
        self.nodes[i]
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// `(neighbour index, edge weight)` pairs of node `i`.
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.neighbors[i]
    }

    pub fn degree(&self, i: usize) -> usize {
        self.neighbors[i].len()
    }

    pub fn weighted_degree(&self, i: usize) -> f64 {
        self.neighbors[i].iter().map(|&(_, w)| w).sum()
    }
}
