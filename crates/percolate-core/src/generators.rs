//! Graph constructors for robustness experiments.
//!
//! All random constructors take the random source explicitly so that a run
//! is reproducible from its seed. Node ids are `0..n` in insertion order.

use crate::error::{PercolateError, Result};
use crate::graph::NetworkGraph;
use crate::types::NodeId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

fn with_nodes(n: usize) -> NetworkGraph {
    let mut graph = NetworkGraph::new_undirected();
    for i in 0..n {
        graph.add_node(NodeId::from(i));
    }
    graph
}

/// Every pair of the `n` nodes joined.
pub fn complete_graph(n: usize) -> NetworkGraph {
    let mut graph = with_nodes(n);
    for i in 0..n {
        for j in (i + 1)..n {
            graph.add_edge(NodeId::from(i), NodeId::from(j));
        }
    }
    graph
}

/// `0 - 1 - ... - (n-1)`.
pub fn path_graph(n: usize) -> NetworkGraph {
    let mut graph = with_nodes(n);
    for i in 1..n {
        graph.add_edge(NodeId::from(i - 1), NodeId::from(i));
    }
    graph
}

/// Path closed into a ring. For `n < 3` this is the path graph.
pub fn cycle_graph(n: usize) -> NetworkGraph {
    let mut graph = path_graph(n);
    if n > 2 {
        graph.add_edge(NodeId::from(n - 1), NodeId(0));
    }
    graph
}

/// G(n, p): each pair joined independently with probability `p`.
pub fn erdos_renyi_graph<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Result<NetworkGraph> {
    if !(0.0..=1.0).contains(&p) {
        return Err(PercolateError::invalid_config("p", format!("{} is not in [0, 1]", p)));
    }
    let mut graph = with_nodes(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen::<f64>() < p {
                graph.add_edge(NodeId::from(i), NodeId::from(j));
            }
        }
    }
    Ok(graph)
}

/// Watts–Strogatz small world: a ring lattice where each node joins its
/// `k / 2` nearest neighbours on either side, then each lattice edge is
/// rewired to a uniformly chosen endpoint with probability `p`.
pub fn watts_strogatz_graph<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    p: f64,
    rng: &mut R,
) -> Result<NetworkGraph> {
    if k > n {
        return Err(PercolateError::invalid_config("k", format!("{} exceeds n = {}", k, n)));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(PercolateError::invalid_config("p", format!("{} is not in [0, 1]", p)));
    }
    if k == n {
        return Ok(complete_graph(n));
    }

    let mut graph = with_nodes(n);
    let half = k / 2;
    for offset in 1..=half {
        for u in 0..n {
            graph.add_edge(NodeId::from(u), NodeId::from((u + offset) % n));
        }
    }

    for offset in 1..=half {
        for u in 0..n {
            if rng.gen::<f64>() >= p {
                continue;
            }
            let source = NodeId::from(u);
            let target = NodeId::from((u + offset) % n);
            if !graph.has_edge(&source, &target) || graph.degree(&source) >= n - 1 {
                continue;
            }
            let mut w = NodeId::from(rng.gen_range(0..n));
            while w == source || graph.has_edge(&source, &w) {
                w = NodeId::from(rng.gen_range(0..n));
            }
            graph.remove_edge(&source, &target);
            graph.add_edge(source, w);
        }
    }
    Ok(graph)
}

/// Barabási–Albert preferential attachment: starting from a star on
/// `m + 1` nodes, each new node attaches to `m` distinct existing nodes
/// chosen with probability proportional to degree.
pub fn barabasi_albert_graph<R: Rng + ?Sized>(
    n: usize,
    m: usize,
    rng: &mut R,
) -> Result<NetworkGraph> {
    if m < 1 || m >= n {
        return Err(PercolateError::invalid_config(
            "m",
            format!("must satisfy 1 <= m < n, got m = {} and n = {}", m, n),
        ));
    }

    let mut graph = with_nodes(m + 1);
    for leaf in 1..=m {
        graph.add_edge(NodeId(0), NodeId::from(leaf));
    }

    // Each node appears once per incident edge.
    let mut repeated: Vec<usize> = Vec::with_capacity(2 * n * m);
    repeated.extend(std::iter::repeat(0).take(m));
    repeated.extend(1..=m);

    for source in (m + 1)..n {
        let mut targets: HashSet<usize> = HashSet::with_capacity(m);
        let mut chosen: Vec<usize> = Vec::with_capacity(m);
        while chosen.len() < m {
            let pick = repeated[rng.gen_range(0..repeated.len())];
            if targets.insert(pick) {
                chosen.push(pick);
            }
        }
        graph.add_node(NodeId::from(source));
        for &target in &chosen {
            graph.add_edge(NodeId::from(source), NodeId::from(target));
        }
        repeated.extend(chosen);
        repeated.extend(std::iter::repeat(source).take(m));
    }
    Ok(graph)
}

/// Graph families selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphFamily {
    Complete,
    #[default]
    ErdosRenyi,
    SmallWorld,
    ScaleFree,
}

impl FromStr for GraphFamily {
    type Err = PercolateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "complete" => Ok(GraphFamily::Complete),
            "erdos_renyi" => Ok(GraphFamily::ErdosRenyi),
            "small_world" => Ok(GraphFamily::SmallWorld),
            "scale_free" => Ok(GraphFamily::ScaleFree),
            other => Err(PercolateError::invalid_config(
                "graph",
                format!("unknown family '{}'", other),
            )),
        }
    }
}

impl fmt::Display for GraphFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphFamily::Complete => "complete",
            GraphFamily::ErdosRenyi => "erdos_renyi",
            GraphFamily::SmallWorld => "small_world",
            GraphFamily::ScaleFree => "scale_free",
        };
        f.write_str(name)
    }
}

/// A family plus the parameters its constructor needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub family: GraphFamily,
    pub n: usize,
    /// Edge probability (Erdős–Rényi) or rewiring probability (small world).
    pub p: f64,
    /// Lattice degree for the small-world ring.
    pub k: usize,
    /// Edges per new node for scale-free growth.
    pub m: usize,
}

impl Default for GraphSpec {
    fn default() -> Self {
        Self {
            family: GraphFamily::default(),
            n: 100,
            p: 0.05,
            k: 4,
            m: 3,
        }
    }
}

impl GraphSpec {
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<NetworkGraph> {
        match self.family {
            GraphFamily::Complete => Ok(complete_graph(self.n)),
            GraphFamily::ErdosRenyi => erdos_renyi_graph(self.n, self.p, rng),
            GraphFamily::SmallWorld => watts_strogatz_graph(self.n, self.k, self.p, rng),
            GraphFamily::ScaleFree => barabasi_albert_graph(self.n, self.m, rng),
        }
    }
}
