//! Attack strategies: node removal orders.
//!
//! Every strategy returns an [`AttackOrder`], a permutation of the graph's
//! nodes. Score-based strategies sort by `(-score, original position)`, so
//! the highest score goes first and equal scores keep the graph's node
//! order. Orders are therefore reproducible regardless of hashing or the
//! graph's internal slot layout.

use crate::centrality::betweenness_centrality;
use crate::components::giant_component_subgraph;
use crate::spectral::{SpectralAnalyzer, SpectralConfig};
use percolate_core::error::{OrderDefect, PercolateError, Result};
use percolate_core::graph::NetworkGraph;
use percolate_core::types::{ComponentKind, NodeId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// The available strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStrategy {
    /// Uniform random permutation; reproducible when seeded.
    Random { seed: Option<u64> },
    /// Highest (optionally weighted) degree first.
    Degree { weighted: bool },
    /// Highest betweenness centrality first.
    Betweenness { weighted: bool, normalized: bool },
    /// Largest |Fiedler vector entry| on the weak giant component first.
    FiedlerMagnitude,
}

impl AttackStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            AttackStrategy::Random { .. } => "random",
            AttackStrategy::Degree { .. } => "degree",
            AttackStrategy::Betweenness { .. } => "betweenness",
            AttackStrategy::FiedlerMagnitude => "fiedler",
        }
    }
}

impl FromStr for AttackStrategy {
    type Err = PercolateError;

    /// Parse a strategy name with default parameters.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(AttackStrategy::Random { seed: None }),
            "degree" => Ok(AttackStrategy::Degree { weighted: false }),
            "betweenness" => Ok(AttackStrategy::Betweenness {
                weighted: false,
                normalized: true,
            }),
            "fiedler" | "fiedler_magnitude" => Ok(AttackStrategy::FiedlerMagnitude),
            other => Err(PercolateError::invalid_config(
                "attack",
                format!("unknown strategy '{}'", other),
            )),
        }
    }
}

impl fmt::Display for AttackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options shared by all strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOptions {
    /// Score a directed graph through its undirected form.
    pub use_undirected: bool,
    /// Eigen solver settings for the Fiedler strategy.
    pub spectral: SpectralConfig,
}

impl Default for AttackOptions {
    fn default() -> Self {
        Self {
            use_undirected: true,
            spectral: SpectralConfig::default(),
        }
    }
}

/// A removal order that covers every node of its graph exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOrder(Vec<NodeId>);

impl AttackOrder {
    /// Accept `nodes` only if it is a permutation of the graph's nodes.
    pub fn validated(graph: &NetworkGraph, nodes: Vec<NodeId>) -> Result<Self> {
        check_members(graph, &nodes)?;
        if nodes.len() != graph.node_count() {
            return Err(PercolateError::InconsistentOrder(OrderDefect::Missing {
                expected: graph.node_count(),
                found: nodes.len(),
            }));
        }
        Ok(Self(nodes))
    }

    /// Complete a partial order by appending the missing nodes in graph
    /// order. Unknown and duplicate entries are still rejected.
    pub fn normalized(graph: &NetworkGraph, partial: Vec<NodeId>) -> Result<Self> {
        let seen = check_members(graph, &partial)?;
        let mut nodes = partial;
        nodes.extend(graph.nodes().into_iter().filter(|id| !seen.contains(id)));
        Ok(Self(nodes))
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.0
    }
}

impl AsRef<[NodeId]> for AttackOrder {
    fn as_ref(&self) -> &[NodeId] {
        &self.0
    }
}

fn check_members(graph: &NetworkGraph, nodes: &[NodeId]) -> Result<HashSet<NodeId>> {
    let mut seen = HashSet::with_capacity(nodes.len());
    for &id in nodes {
        if !graph.contains(&id) {
            return Err(PercolateError::InconsistentOrder(OrderDefect::Unknown(id)));
        }
        if !seen.insert(id) {
            return Err(PercolateError::InconsistentOrder(OrderDefect::Duplicate(id)));
        }
    }
    Ok(seen)
}

/// Compute the removal order for `strategy`.
pub fn attack_order(
    graph: &NetworkGraph,
    strategy: &AttackStrategy,
    options: &AttackOptions,
) -> AttackOrder {
    let undirected;
    let scored = if options.use_undirected && graph.is_directed() {
        undirected = graph.to_undirected();
        &undirected
    } else {
        graph
    };

    let nodes = match *strategy {
        AttackStrategy::Random { seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            shuffled(scored, &mut rng)
        }
        AttackStrategy::Degree { weighted } => {
            let nodes = scored.nodes();
            let scores: Vec<f64> = nodes
                .iter()
                .map(|id| {
                    if weighted {
                        scored.weighted_degree(id)
                    } else {
                        scored.degree(id) as f64
                    }
                })
                .collect();
            sort_by_score(nodes, &scores)
        }
        AttackStrategy::Betweenness {
            weighted,
            normalized,
        } => {
            let (nodes, scores): (Vec<NodeId>, Vec<f64>) =
                betweenness_centrality(scored, weighted, normalized)
                    .into_iter()
                    .unzip();
            sort_by_score(nodes, &scores)
        }
        AttackStrategy::FiedlerMagnitude => fiedler_order(scored, &options.spectral),
    };

    debug!(strategy = %strategy, nodes = nodes.len(), "attack order computed");
    AttackOrder(nodes)
}

/// Random order from an optional seed; no seed draws from OS entropy.
pub fn random_attack(graph: &NetworkGraph, seed: Option<u64>) -> AttackOrder {
    attack_order(graph, &AttackStrategy::Random { seed }, &AttackOptions::default())
}

/// Random order drawn from a caller-supplied generator.
pub fn random_attack_with<R: Rng + ?Sized>(graph: &NetworkGraph, rng: &mut R) -> AttackOrder {
    AttackOrder(shuffled(graph, rng))
}

pub fn degree_attack(graph: &NetworkGraph, weighted: bool) -> AttackOrder {
    attack_order(graph, &AttackStrategy::Degree { weighted }, &AttackOptions::default())
}

pub fn betweenness_attack(graph: &NetworkGraph, weighted: bool, normalized: bool) -> AttackOrder {
    attack_order(
        graph,
        &AttackStrategy::Betweenness {
            weighted,
            normalized,
        },
        &AttackOptions::default(),
    )
}

pub fn fiedler_attack(graph: &NetworkGraph) -> AttackOrder {
    attack_order(graph, &AttackStrategy::FiedlerMagnitude, &AttackOptions::default())
}

fn shuffled<R: Rng + ?Sized>(graph: &NetworkGraph, rng: &mut R) -> Vec<NodeId> {
    let mut nodes = graph.nodes();
    nodes.shuffle(rng);
    nodes
}

/// Sort descending by score, ties by position in `nodes`. NaN ranks last.
fn sort_by_score(nodes: Vec<NodeId>, scores: &[f64]) -> Vec<NodeId> {
    let key = |i: usize| {
        let s = scores[i];
        if s.is_nan() {
            f64::NEG_INFINITY
        } else {
            s
        }
    };
    let mut ranked: Vec<usize> = (0..nodes.len()).collect();
    ranked.sort_by(|&a, &b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    ranked.into_iter().map(|i| nodes[i]).collect()
}

/// Fiedler magnitudes on the weak giant component, then everything else in
/// graph order. Falls back to graph order when the giant component is
/// trivial.
fn fiedler_order(graph: &NetworkGraph, spectral: &SpectralConfig) -> Vec<NodeId> {
    let nodes = graph.nodes();
    if nodes.len() <= 1 {
        return nodes;
    }
    let giant = giant_component_subgraph(graph, ComponentKind::Weak);
    if giant.node_count() <= 1 {
        warn!(
            nodes = nodes.len(),
            "giant component is trivial; fiedler attack falls back to graph order"
        );
        return nodes;
    }

    let vector = match SpectralAnalyzer::new(spectral.clone()).fiedler_vector(&giant) {
        Ok(vector) => vector,
        Err(e) => {
            warn!(error = %e, "fiedler vector unavailable; falling back to graph order");
            return nodes;
        }
    };
    let (giant_nodes, magnitudes): (Vec<NodeId>, Vec<f64>) =
        vector.into_iter().map(|(id, v)| (id, v.abs())).unzip();

    let mut order = sort_by_score(giant_nodes, &magnitudes);
    let in_giant: HashSet<NodeId> = order.iter().copied().collect();
    order.extend(nodes.into_iter().filter(|id| !in_giant.contains(id)));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::number_of_components;
    use percolate_core::generators::{complete_graph, erdos_renyi_graph, path_graph};

    fn ids(raw: &[u64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    fn sorted(mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        nodes.sort();
        nodes
    }

    fn all_strategies() -> Vec<AttackStrategy> {
        vec![
            AttackStrategy::Random { seed: Some(3) },
            AttackStrategy::Degree { weighted: false },
            AttackStrategy::Degree { weighted: true },
            AttackStrategy::Betweenness {
                weighted: false,
                normalized: true,
            },
            AttackStrategy::FiedlerMagnitude,
        ]
    }

    #[test]
    fn every_strategy_yields_a_permutation() {
        let mut graph = erdos_renyi_graph(40, 0.08, &mut StdRng::seed_from_u64(9)).unwrap();
        graph.add_node(NodeId(100));
        let expected = sorted(graph.nodes());
        for strategy in all_strategies() {
            let order = attack_order(&graph, &strategy, &AttackOptions::default());
            assert_eq!(sorted(order.into_vec()), expected, "{}", strategy);
        }
    }

    #[test]
    fn score_strategies_are_deterministic() {
        let graph = erdos_renyi_graph(30, 0.15, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(degree_attack(&graph, false), degree_attack(&graph, false));
        assert_eq!(
            betweenness_attack(&graph, false, true),
            betweenness_attack(&graph, false, true)
        );
        assert_eq!(fiedler_attack(&graph), fiedler_attack(&graph));
    }

    #[test]
    fn random_attack_follows_its_seed() {
        let graph = path_graph(50);
        assert_eq!(random_attack(&graph, Some(1)), random_attack(&graph, Some(1)));
        assert_ne!(random_attack(&graph, Some(1)), random_attack(&graph, Some(2)));

        let threaded = random_attack_with(&graph, &mut StdRng::seed_from_u64(1));
        assert_eq!(threaded, random_attack(&graph, Some(1)));
    }

    #[test]
    fn complete_graph_degree_ties_keep_insertion_order() {
        let order = degree_attack(&complete_graph(10), false);
        assert_eq!(order.as_slice(), ids(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]).as_slice());
    }

    #[test]
    fn degree_attack_removes_hubs_first() {
        let mut star = NetworkGraph::new_undirected();
        for leaf in [1, 2, 3] {
            star.add_edge(NodeId(leaf), NodeId(0));
        }
        star.add_edge(NodeId(3), NodeId(4));
        // Insertion order: 1, 0, 2, 3, 4
        assert_eq!(degree_attack(&star, false).into_vec(), ids(&[0, 3, 1, 2, 4]));
    }

    #[test]
    fn weighted_degree_uses_edge_weights() {
        let mut graph = NetworkGraph::new_undirected();
        graph.add_weighted_edge(NodeId(0), NodeId(1), 1.0);
        graph.add_weighted_edge(NodeId(0), NodeId(2), 1.0);
        graph.add_weighted_edge(NodeId(3), NodeId(4), 5.0);
        assert_eq!(degree_attack(&graph, false).into_vec()[0], NodeId(0));
        assert_eq!(degree_attack(&graph, true).into_vec()[..2], ids(&[3, 4])[..]);
    }

    #[test]
    fn betweenness_attack_starts_at_path_center() {
        let order = betweenness_attack(&path_graph(5), false, true).into_vec();
        assert_eq!(order, ids(&[2, 1, 3, 0, 4]));
    }

    #[test]
    fn fiedler_attack_on_path_removes_endpoints_first() {
        let graph = path_graph(5);
        let order = fiedler_attack(&graph).into_vec();
        assert_eq!(sorted(order[..2].to_vec()), ids(&[0, 4]));
        assert_eq!(sorted(order[2..4].to_vec()), ids(&[1, 3]));
        assert_eq!(order[4], NodeId(2));

        // Dropping an endpoint leaves the path in one piece.
        let mut working = graph.clone();
        working.remove_node(&order[0]);
        assert_eq!(number_of_components(&working, ComponentKind::Weak), 1);
    }

    #[test]
    fn fiedler_attack_on_a_long_path_removes_endpoints_first() {
        // Above the dense cutover the Fiedler vector comes from the sparse solver.
        let n = 1200;
        let order = fiedler_attack(&path_graph(n)).into_vec();
        assert_eq!(order.len(), n);
        assert_eq!(sorted(order[..2].to_vec()), ids(&[0, n as u64 - 1]));
        assert_eq!(sorted(order[2..4].to_vec()), ids(&[1, n as u64 - 2]));
        assert_eq!(sorted(order[n - 2..].to_vec()), ids(&[599, 600]));
    }

    #[test]
    fn fiedler_attack_appends_nodes_outside_the_giant_component() {
        let mut graph = NetworkGraph::new_undirected();
        graph.add_edge(NodeId(10), NodeId(11));
        for i in 0..3 {
            graph.add_edge(NodeId(i), NodeId(i + 1));
        }
        let order = fiedler_attack(&graph).into_vec();
        assert_eq!(sorted(order[..4].to_vec()), ids(&[0, 1, 2, 3]));
        assert_eq!(order[4..], ids(&[10, 11])[..]);
    }

    #[test]
    fn fiedler_attack_falls_back_on_trivial_giant_component() {
        let mut graph = NetworkGraph::new_undirected();
        for id in [5, 3, 9] {
            graph.add_node(NodeId(id));
        }
        assert_eq!(fiedler_attack(&graph).into_vec(), ids(&[5, 3, 9]));
        assert!(fiedler_attack(&NetworkGraph::new_undirected()).is_empty());
    }

    #[test]
    fn directed_input_is_scored_undirected_by_default() {
        let mut graph = NetworkGraph::new_directed();
        for (a, b) in [(0, 1), (1, 0), (2, 3), (2, 4)] {
            graph.add_edge(NodeId(a), NodeId(b));
        }
        let strategy = AttackStrategy::Degree { weighted: false };

        let coerced = attack_order(&graph, &strategy, &AttackOptions::default());
        assert_eq!(coerced.into_vec(), ids(&[2, 0, 1, 3, 4]));

        let raw = AttackOptions {
            use_undirected: false,
            ..AttackOptions::default()
        };
        // In + out degree: the reciprocal pair counts twice.
        assert_eq!(attack_order(&graph, &strategy, &raw).into_vec(), ids(&[0, 1, 2, 3, 4]));
    }

    #[test]
    fn validated_rejects_non_permutations() {
        let graph = path_graph(3);
        assert!(AttackOrder::validated(&graph, ids(&[2, 0, 1])).is_ok());
        assert_eq!(
            AttackOrder::validated(&graph, ids(&[0, 0, 1])).unwrap_err(),
            PercolateError::InconsistentOrder(OrderDefect::Duplicate(NodeId(0)))
        );
        assert_eq!(
            AttackOrder::validated(&graph, ids(&[0, 7, 1])).unwrap_err(),
            PercolateError::InconsistentOrder(OrderDefect::Unknown(NodeId(7)))
        );
        assert_eq!(
            AttackOrder::validated(&graph, ids(&[0, 1])).unwrap_err(),
            PercolateError::InconsistentOrder(OrderDefect::Missing {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn normalized_appends_missing_nodes_in_graph_order() {
        let graph = path_graph(5);
        let order = AttackOrder::normalized(&graph, ids(&[3, 1])).unwrap();
        assert_eq!(order.into_vec(), ids(&[3, 1, 0, 2, 4]));
        assert!(AttackOrder::normalized(&graph, ids(&[3, 3])).is_err());
    }

    #[test]
    fn strategy_names_parse() {
        for strategy in all_strategies() {
            let parsed: AttackStrategy = strategy.name().parse().unwrap();
            assert_eq!(parsed.name(), strategy.name());
        }
        assert!("pagerank".parse::<AttackStrategy>().is_err());
    }
}
