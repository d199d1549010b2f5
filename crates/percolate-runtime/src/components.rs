//! Connected components and giant-component robustness measures.
//!
//! Partitions are reported deterministically: members of a component are
//! listed in the graph's node order, and components are ordered by their
//! earliest member. The giant component is the first component of maximum
//! size in that order, so ties resolve to the component holding the
//! earliest-inserted node regardless of hashing or library iteration order.

use percolate_core::error::Result;
use percolate_core::graph::{Adjacency, EdgeView, NetworkGraph};
use percolate_core::types::{ComponentKind, NodeId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// Partition the graph's nodes into components of the given kind.
pub fn component_partition(graph: &NetworkGraph, kind: ComponentKind) -> Vec<Vec<NodeId>> {
    if graph.is_empty() {
        return Vec::new();
    }
    let strong = graph.is_directed() && kind == ComponentKind::Strong;
    let adj = if strong {
        graph.adjacency(EdgeView::Outgoing)
    } else {
        graph.adjacency(EdgeView::Undirected)
    };
    let groups = if strong { strong_groups(&adj) } else { weak_groups(&adj) };

    groups
        .into_iter()
        .map(|group| group.into_iter().map(|i| adj.node(i)).collect())
        .collect()
}

/// Like [`component_partition`], parsing the kind from its name.
pub fn component_partition_by_name(graph: &NetworkGraph, kind: &str) -> Result<Vec<Vec<NodeId>>> {
    let kind: ComponentKind = kind.parse()?;
    Ok(component_partition(graph, kind))
}

/// BFS over the undirected view. Groups come out ordered by first member.
fn weak_groups(adj: &Adjacency) -> Vec<Vec<usize>> {
    let n = adj.len();
    let mut visited = vec![false; n];
    let mut groups = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut group = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited[start] = true;
        while let Some(current) = queue.pop_front() {
            group.push(current);
            for &(next, _) in adj.neighbors(current) {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        group.sort_unstable();
        groups.push(group);
    }
    groups
}

/// Strongly connected components via petgraph's Tarjan.
fn strong_groups(adj: &Adjacency) -> Vec<Vec<usize>> {
    let n = adj.len();
    let mut digraph: DiGraph<(), ()> = DiGraph::with_capacity(n, 0);
    for _ in 0..n {
        digraph.add_node(());
    }
    for i in 0..n {
        for &(j, _) in adj.neighbors(i) {
            digraph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
        }
    }

    let mut groups: Vec<Vec<usize>> = tarjan_scc(&digraph)
        .into_iter()
        .map(|scc| {
            let mut group: Vec<usize> = scc.into_iter().map(|idx| idx.index()).collect();
            group.sort_unstable();
            group
        })
        .collect();
    groups.sort_by_key(|group| group[0]);
    groups
}

/// Component count plus the members of the giant component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSummary {
    pub count: usize,
    /// Giant component members in node order; empty for an empty graph.
    pub giant: Vec<NodeId>,
}

impl ComponentSummary {
    pub fn of(graph: &NetworkGraph, kind: ComponentKind) -> Self {
        let partition = component_partition(graph, kind);
        let count = partition.len();
        let giant = first_largest(partition);
        Self { count, giant }
    }

    pub fn giant_size(&self) -> usize {
        self.giant.len()
    }
}

fn first_largest(partition: Vec<Vec<NodeId>>) -> Vec<NodeId> {
    let mut best: Vec<NodeId> = Vec::new();
    for component in partition {
        if component.len() > best.len() {
            best = component;
        }
    }
    best
}

/// Size of the largest component; 0 for the empty graph.
pub fn largest_component_size(graph: &NetworkGraph, kind: ComponentKind) -> usize {
    component_partition(graph, kind)
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
}

/// Number of components; 0 for the empty graph.
pub fn number_of_components(graph: &NetworkGraph, kind: ComponentKind) -> usize {
    component_partition(graph, kind).len()
}

/// Induced subgraph on the giant component (empty for an empty graph).
pub fn giant_component_subgraph(graph: &NetworkGraph, kind: ComponentKind) -> NetworkGraph {
    let giant = first_largest(component_partition(graph, kind));
    graph.induced_subgraph(&giant)
}

/// Average shortest-path length of the giant component.
///
/// Directed input is read without direction for `Weak`/`Undirected`.
/// Returns 0.0 when the giant component has at most one node.
pub fn average_shortest_path_length_giant_component(
    graph: &NetworkGraph,
    kind: ComponentKind,
    weighted: bool,
) -> f64 {
    let mut giant = giant_component_subgraph(graph, kind);
    if giant.node_count() <= 1 {
        return 0.0;
    }
    if giant.is_directed() && kind.ignores_direction() {
        giant = giant.to_undirected();
    }
    average_shortest_path_length(&giant, weighted)
}

/// Mean distance over all ordered pairs of distinct nodes.
///
/// The graph is expected to be connected (strongly, if directed); pairs
/// with no path are skipped. Unweighted distances use BFS, weighted ones
/// Dijkstra over edge weights.
pub fn average_shortest_path_length(graph: &NetworkGraph, weighted: bool) -> f64 {
    let n = graph.node_count();
    if n <= 1 {
        return 0.0;
    }
    let adj = graph.adjacency(EdgeView::Outgoing);
    let mut total = 0.0;
    for source in 0..n {
        let distances = if weighted {
            dijkstra_distances(&adj, source)
        } else {
            bfs_distances(&adj, source)
        };
        total += distances.iter().flatten().sum::<f64>();
    }
    total / (n * (n - 1)) as f64
}

pub(crate) fn bfs_distances(adj: &Adjacency, source: usize) -> Vec<Option<f64>> {
    let mut dist: Vec<Option<f64>> = vec![None; adj.len()];
    let mut queue = VecDeque::new();
    dist[source] = Some(0.0);
    queue.push_back(source);
    while let Some(current) = queue.pop_front() {
        let here = dist[current].unwrap_or(0.0);
        for &(next, _) in adj.neighbors(current) {
            if dist[next].is_none() {
                dist[next] = Some(here + 1.0);
                queue.push_back(next);
            }
        }
    }
    dist
}

/// Min-heap entry for Dijkstra.
#[derive(PartialEq)]
pub(crate) struct State {
    pub cost: f64,
    pub node: usize,
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost) // min-heap
            .then_with(|| other.node.cmp(&self.node))
    }
}

pub(crate) fn dijkstra_distances(adj: &Adjacency, source: usize) -> Vec<Option<f64>> {
    let mut dist: Vec<Option<f64>> = vec![None; adj.len()];
    let mut heap = BinaryHeap::new();
    dist[source] = Some(0.0);
    heap.push(State { cost: 0.0, node: source });

    while let Some(State { cost, node }) = heap.pop() {
        if cost > dist[node].unwrap_or(f64::INFINITY) {
            continue;
        }
        for &(next, weight) in adj.neighbors(node) {
            let next_cost = cost + weight;
            if next_cost < dist[next].unwrap_or(f64::INFINITY) {
                dist[next] = Some(next_cost);
                heap.push(State { cost: next_cost, node: next });
            }
        }
    }
    dist
}
