//! Percolate Core Prelude — convenient imports for common usage.
//!
//! ```rust
//! use percolate_core::prelude::*;
//! ```

pub use crate::types::{ComponentKind, EdgeData, MetricsRecord, NodeId};

pub use crate::graph::{Adjacency, EdgeView, NetworkGraph};

pub use crate::generators::{
    barabasi_albert_graph, complete_graph, cycle_graph, erdos_renyi_graph, path_graph,
    watts_strogatz_graph, GraphFamily, GraphSpec,
};

pub use crate::error::{OrderDefect, PercolateError, Result};
