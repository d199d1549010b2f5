//! Percolate Runtime Prelude — convenient imports for common usage.
//!
//! ```rust
//! use percolate_runtime::prelude::*;
//! ```

// Re-export components
pub use crate::components::{
    average_shortest_path_length, average_shortest_path_length_giant_component,
    component_partition, component_partition_by_name, giant_component_subgraph,
    largest_component_size, number_of_components, ComponentSummary,
};

// Re-export centrality
pub use crate::centrality::betweenness_centrality;

// Re-export spectral
pub use crate::spectral::{
    algebraic_connectivity, fiedler_vector, kirchhoff_index, laplacian_matrix,
    spectral_gap_ratio, LaplacianKind, SpectralAnalyzer, SpectralConfig, SpectralSummary,
};

// Re-export attacks
pub use crate::attack::{
    attack_order, betweenness_attack, degree_attack, fiedler_attack, random_attack,
    random_attack_with, AttackOptions, AttackOrder, AttackStrategy,
};

// Re-export percolation
pub use crate::percolation::{
    percolation_curve, run_percolation, Checkpoints, PercolationConfig, PercolationRun, RunState,
};

// Re-export export helpers
pub use crate::export::{read_csv, write_csv, write_csv_file, write_json};

// Re-export from core
pub use percolate_core::prelude::*;
