//! # Percolate
//!
//! Network robustness under targeted and random node removal.
//!
//! An attack strategy ranks the nodes of a graph; the percolation engine
//! removes them in that order from a private copy and measures, at each
//! checkpoint, how much of the giant component survives along with its
//! average path length and spectral robustness indices.
//!
//! ## Quick Start
//!
//! ```rust
//! use percolate::prelude::*;
//!
//! let graph = complete_graph(10);
//! let order = degree_attack(&graph, false);
//!
//! let records = run_percolation(&graph, &order, &PercolationConfig::default()).unwrap();
//! assert_eq!(records.len(), 11);
//! assert_eq!(records[0].gcc_fraction, 1.0);
//! assert_eq!(records[10].gcc_fraction, 0.0);
//! ```
//!
//! ## Architecture
//!
//! - [`percolate_core`] - Node ids, metrics records, errors, the graph arena
//!   and graph generators
//! - [`percolate_runtime`] - Components, centrality, spectral indices,
//!   attack strategies, the percolation engine and export
//!
//! ## Attack Strategies
//!
//! | Strategy | Score | Ties |
//! |----------|-------|------|
//! | `random` | seeded shuffle | n/a |
//! | `degree` | (weighted) degree | graph order |
//! | `betweenness` | Brandes betweenness | graph order |
//! | `fiedler` | \|Fiedler vector entry\| on the giant component | graph order |
//!
//! ## Writing Results
//!
//! ```rust
//! use percolate::prelude::*;
//!
//! let graph = cycle_graph(6);
//! let order = random_attack(&graph, Some(7));
//! let records = run_percolation(&graph, &order, &PercolationConfig::default()).unwrap();
//!
//! let mut csv = Vec::new();
//! write_csv(&records, &mut csv).unwrap();
//! ```

// Re-export all subcrates
pub use percolate_core as core;
pub use percolate_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use percolate::prelude::*;
/// ```
pub mod prelude {
    pub use percolate_runtime::prelude::*;
}
