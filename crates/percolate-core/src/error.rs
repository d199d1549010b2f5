//! Error types for percolate operations.
//!
//! Two families share one enum. Configuration and ordering errors
//! (`InvalidKind`, `InconsistentOrder`, `InvalidConfig`) abort a run.
//! Numerical guards (`NotComputable`, `TooLarge`) are expected during a
//! percolation sweep and degrade to an absent metric.

use crate::types::NodeId;
use std::fmt;
use thiserror::Error;

/// Result type for percolate operations.
pub type Result<T> = std::result::Result<T, PercolateError>;

/// Errors that can occur while ordering, removing or measuring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PercolateError {
    /// Unrecognised connectivity kind.
    #[error("invalid component kind '{0}' (expected weak, strong or undirected)")]
    InvalidKind(String),

    /// A spectral quantity is undefined for this input.
    #[error("not computable: {0}")]
    NotComputable(String),

    /// Dense computation refused because the graph exceeds the size guard.
    #[error("graph has {nodes} nodes, above the dense computation limit of {max_nodes}")]
    TooLarge { nodes: usize, max_nodes: usize },

    /// An attack order is not a permutation of the graph's nodes.
    #[error("inconsistent attack order: {0}")]
    InconsistentOrder(OrderDefect),

    /// A parameter is outside its valid range.
    #[error("invalid value for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// I/O errors (wrapped).
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization errors.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// What is wrong with a rejected attack order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDefect {
    /// A node appears more than once.
    Duplicate(NodeId),
    /// A node is not part of the graph.
    Unknown(NodeId),
    /// The order covers fewer nodes than the graph has.
    Missing { expected: usize, found: usize },
}

impl fmt::Display for OrderDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDefect::Duplicate(id) => write!(f, "node {} appears more than once", id),
            OrderDefect::Unknown(id) => write!(f, "node {} is not in the graph", id),
            OrderDefect::Missing { expected, found } => {
                write!(f, "expected {} nodes, found {}", expected, found)
            }
        }
    }
}

impl From<std::io::Error> for PercolateError {
    fn from(e: std::io::Error) -> Self {
        PercolateError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PercolateError {
    fn from(e: serde_json::Error) -> Self {
        PercolateError::Serialization(e.to_string())
    }
}

// Convenience constructors
impl PercolateError {
    pub fn not_computable(reason: impl Into<String>) -> Self {
        PercolateError::NotComputable(reason.into())
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PercolateError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for the numerical guards a percolation sweep treats as "absent".
    pub fn is_numerical_guard(&self) -> bool {
        matches!(
            self,
            PercolateError::NotComputable(_) | PercolateError::TooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_are_distinguished_from_fatal_errors() {
        assert!(PercolateError::not_computable("n < 2").is_numerical_guard());
        assert!(PercolateError::TooLarge { nodes: 1001, max_nodes: 1000 }.is_numerical_guard());
        assert!(!PercolateError::InvalidKind("x".into()).is_numerical_guard());
        assert!(!PercolateError::InconsistentOrder(OrderDefect::Duplicate(NodeId(3)))
            .is_numerical_guard());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = PercolateError::InconsistentOrder(OrderDefect::Missing { expected: 5, found: 4 });
        assert_eq!(err.to_string(), "inconsistent attack order: expected 5 nodes, found 4");

        let err = PercolateError::TooLarge { nodes: 1001, max_nodes: 1000 };
        assert!(err.to_string().contains("1001"));
    }
}
