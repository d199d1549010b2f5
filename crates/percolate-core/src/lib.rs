//! # Percolate Core
//!
//! Core types for simulating network robustness under node removal.
//!
//! This crate holds everything the algorithms in `percolate-runtime` share:
//!
//! - **NetworkGraph** — a petgraph-backed arena with tombstoned node removal
//!   and a stable node order used for deterministic tie-breaking
//! - **Adjacency** — a compact, index-addressed snapshot of a graph that the
//!   numeric routines iterate over
//! - **Generators** — complete, path, cycle, Erdős–Rényi, Watts–Strogatz and
//!   Barabási–Albert constructors driven by an explicit random source
//! - **MetricsRecord** — one row of a percolation curve
//!
//! ## Quick Start
//!
//! ```rust
//! use percolate_core::prelude::*;
//!
//! let mut graph = NetworkGraph::new_undirected();
//! graph.add_edge(NodeId(0), NodeId(1));
//! graph.add_edge(NodeId(1), NodeId(2));
//!
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.degree(&NodeId(1)), 2);
//! ```

pub mod types;
pub mod error;
pub mod graph;
pub mod generators;
pub mod prelude;
