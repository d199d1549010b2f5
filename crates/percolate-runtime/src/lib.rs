//! # Percolate Runtime
//!
//! Attack ordering and percolation tracking.
//!
//! The runtime is the experiment engine: it ranks nodes by structural
//! importance, removes them one checkpoint at a time from a private working
//! copy of the graph, and measures what is left of the giant component
//! after each step.
//!
//! - [`components`] — weak/strong partitions, giant component, path length
//! - [`centrality`] — Brandes betweenness
//! - [`spectral`] — Laplacians, algebraic connectivity, Fiedler vector,
//!   spectral gap ratio, Kirchhoff index
//! - [`attack`] — removal orders for every strategy
//! - [`percolation`] — the checkpointed removal engine
//! - [`export`] — CSV and JSON output of metrics records

pub mod components;
pub mod centrality;
pub mod spectral;
pub mod attack;
pub mod percolation;
pub mod export;
pub mod prelude;
