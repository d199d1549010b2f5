//! Betweenness centrality (Brandes 2001).
//!
//! Exact all-sources accumulation: BFS for unweighted graphs, Dijkstra when
//! edge weights are used as lengths. Directed graphs follow edge direction.

use crate::components::State;
use percolate_core::graph::{Adjacency, EdgeView, NetworkGraph};
use percolate_core::types::NodeId;
use std::collections::{BinaryHeap, VecDeque};

/// Betweenness score of every node, in the graph's node order.
///
/// With `normalized` and more than two nodes, scores are divided by
/// `(n-1)(n-2)`; undirected pairs are counted from both ends before that.
/// Unnormalized undirected scores are halved so each pair counts once.
pub fn betweenness_centrality(
    graph: &NetworkGraph,
    weighted: bool,
    normalized: bool,
) -> Vec<(NodeId, f64)> {
    let adj = graph.adjacency(EdgeView::Outgoing);
    let n = adj.len();
    let mut centrality = vec![0.0; n];

    for source in 0..n {
        let pass = if weighted {
            weighted_pass(&adj, source)
        } else {
            unweighted_pass(&adj, source)
        };
        accumulate(&pass, source, &mut centrality);
    }

    let scale = if normalized {
        if n > 2 {
            Some(1.0 / ((n - 1) * (n - 2)) as f64)
        } else {
            None
        }
    } else if !graph.is_directed() {
        Some(0.5)
    } else {
        None
    };
    if let Some(scale) = scale {
        for value in &mut centrality {
            *value *= scale;
        }
    }

    adj.nodes().iter().copied().zip(centrality).collect()
}

/// Single-source shortest-path DAG.
struct SourcePass {
    /// Nodes in order of non-decreasing distance.
    order: Vec<usize>,
    predecessors: Vec<Vec<usize>>,
    /// Number of shortest paths from the source.
    sigma: Vec<f64>,
}

fn unweighted_pass(adj: &Adjacency, source: usize) -> SourcePass {
    let n = adj.len();
    let mut order = Vec::with_capacity(n);
    let mut predecessors = vec![Vec::new(); n];
    let mut sigma = vec![0.0; n];
    let mut dist: Vec<i64> = vec![-1; n];

    sigma[source] = 1.0;
    dist[source] = 0;
    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        order.push(v);
        for &(w, _) in adj.neighbors(v) {
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    SourcePass {
        order,
        predecessors,
        sigma,
    }
}

fn weighted_pass(adj: &Adjacency, source: usize) -> SourcePass {
    let n = adj.len();
    let mut order = Vec::with_capacity(n);
    let mut predecessors = vec![Vec::new(); n];
    let mut sigma = vec![0.0; n];
    let mut dist: Vec<f64> = vec![f64::INFINITY; n];
    let mut settled = vec![false; n];

    sigma[source] = 1.0;
    dist[source] = 0.0;
    let mut heap = BinaryHeap::new();
    heap.push(State { cost: 0.0, node: source });

    while let Some(State { cost, node: v }) = heap.pop() {
        if settled[v] || cost > dist[v] {
            continue;
        }
        settled[v] = true;
        order.push(v);
        for &(w, weight) in adj.neighbors(v) {
            let candidate = dist[v] + weight;
            if candidate < dist[w] {
                dist[w] = candidate;
                sigma[w] = sigma[v];
                predecessors[w].clear();
                predecessors[w].push(v);
                heap.push(State { cost: candidate, node: w });
            } else if candidate == dist[w] && !settled[w] {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    SourcePass {
        order,
        predecessors,
        sigma,
    }
}

fn accumulate(pass: &SourcePass, source: usize, centrality: &mut [f64]) {
    let mut delta = vec![0.0; centrality.len()];
    for &w in pass.order.iter().rev() {
        for &v in &pass.predecessors[w] {
            delta[v] += pass.sigma[v] / pass.sigma[w] * (1.0 + delta[w]);
        }
        if w != source {
            centrality[w] += delta[w];
        }
    }
}
