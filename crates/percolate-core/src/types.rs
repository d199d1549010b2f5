//! Shared types used across the percolate crates.

use crate::error::PercolateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier for a node in a [`NetworkGraph`](crate::graph::NetworkGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<usize> for NodeId {
    fn from(raw: usize) -> Self {
        Self(raw as u64)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Edge weight. Unweighted graphs use 1.0 everywhere.
    pub weight: f64,
}

impl EdgeData {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl Default for EdgeData {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

/// Which notion of connectivity partitions the graph into components.
///
/// On undirected graphs all three kinds coincide. On directed graphs
/// `Weak` and `Undirected` ignore edge direction while `Strong` respects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    #[default]
    Weak,
    Strong,
    Undirected,
}

impl ComponentKind {
    /// Whether this kind ignores edge direction.
    pub fn ignores_direction(&self) -> bool {
        matches!(self, ComponentKind::Weak | ComponentKind::Undirected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Weak => "weak",
            ComponentKind::Strong => "strong",
            ComponentKind::Undirected => "undirected",
        }
    }
}

impl FromStr for ComponentKind {
    type Err = PercolateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weak" => Ok(ComponentKind::Weak),
            "strong" => Ok(ComponentKind::Strong),
            "undirected" => Ok(ComponentKind::Undirected),
            _ => Err(PercolateError::InvalidKind(s.to_string())),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a percolation curve, taken at a single checkpoint.
///
/// Field names are the column names consumers see. Spectral indices are
/// `None` when the giant component is too small or the value is not
/// numerically defined; they are never reported as zero in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// removed_nodes / n (0.0 for the empty graph).
    pub removed_fraction: f64,
    /// Cumulative number of nodes removed at this checkpoint.
    pub removed_nodes: usize,
    /// gcc_size / n, relative to the original node count.
    pub gcc_fraction: f64,
    pub gcc_size: usize,
    pub num_components: usize,
    /// Average shortest-path length inside the giant component.
    pub avg_shortest_path_gcc: f64,
    pub algebraic_connectivity_gcc: Option<f64>,
    pub spectral_gap_ratio_gcc: Option<f64>,
    pub kirchhoff_index_gcc: Option<f64>,
}

impl MetricsRecord {
    /// Column names in output order.
    pub const FIELDS: [&'static str; 9] = [
        "removed_fraction",
        "removed_nodes",
        "gcc_fraction",
        "gcc_size",
        "num_components",
        "avg_shortest_path_gcc",
        "algebraic_connectivity_gcc",
        "spectral_gap_ratio_gcc",
        "kirchhoff_index_gcc",
    ];

    /// The single record emitted for a graph with no nodes.
    pub fn empty() -> Self {
        Self {
            removed_fraction: 0.0,
            removed_nodes: 0,
            gcc_fraction: 0.0,
            gcc_size: 0,
            num_components: 0,
            avg_shortest_path_gcc: 0.0,
            algebraic_connectivity_gcc: None,
            spectral_gap_ratio_gcc: None,
            kirchhoff_index_gcc: None,
        }
    }
}
