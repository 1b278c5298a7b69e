//! Node-level consistency statistics

use crate::config::DEFAULT_CUTOFFS;
use crate::consistency::EdgeConsistency;
use crate::error::{Error, Result};
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Share of a node's edges whose consistency reaches `cutoff`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoffFraction {
    pub cutoff: f64,
    pub fraction: Option<f64>,
}

/// Consistency of the edges around one node
///
/// Every statistic is `None` when none of the node's edges has a defined
/// consistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConsistency {
    pub node: String,

    /// Incident edges with a defined consistency
    pub edges: usize,

    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,

    /// Population standard deviation
    pub std: Option<f64>,

    pub mean_minus_std: Option<f64>,
    pub neighbors: Vec<CutoffFraction>,
}

/// Mean, extremes and spread of a set of values
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

pub(crate) fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    Some(Summary {
        mean: values.iter().mean(),
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
        std: values.iter().population_std_dev(),
    })
}

/// Aggregate edge consistency per node
///
/// An edge contributes to both of its endpoints. Edges with missing
/// consistency are skipped, including in the cutoff denominators. `cutoffs`
/// defaults to 0.8, 0.9 and 1.0.
pub fn node_consistency(
    graph: &WeightedGraph,
    edges: &[EdgeConsistency],
    cutoffs: Option<&[f64]>,
) -> Result<Vec<NodeConsistency>> {
    let cutoffs = cutoffs.unwrap_or(&DEFAULT_CUTOFFS);

    let mut incident: Vec<Vec<f64>> = vec![Vec::new(); graph.node_count()];
    for row in edges {
        let source = graph.index_of(&row.source);
        let target = graph.index_of(&row.target);
        let (source, target) = match (source, target) {
            (Some(source), Some(target)) => (source as usize, target as usize),
            _ => {
                return Err(Error::malformed(format!(
                    "edge {}-{} refers to a node outside the graph",
                    row.source, row.target
                )))
            }
        };

        if let Some(value) = row.consistency {
            incident[source].push(value);
            incident[target].push(value);
        }
    }

    Ok(incident
        .iter()
        .enumerate()
        .map(|(node, values)| {
            let summary = summarize(values);
            let neighbors = cutoffs
                .iter()
                .map(|&cutoff| CutoffFraction {
                    cutoff,
                    fraction: (!values.is_empty()).then(|| {
                        let passing = values.iter().filter(|&&v| v >= cutoff).count();
                        passing as f64 / values.len() as f64
                    }),
                })
                .collect();

            NodeConsistency {
                node: graph.node_id(node).to_string(),
                edges: values.len(),
                mean: summary.map(|s| s.mean),
                min: summary.map(|s| s.min),
                max: summary.map(|s| s.max),
                std: summary.map(|s| s.std),
                mean_minus_std: summary.map(|s| s.mean - s.std),
                neighbors,
            }
        })
        .collect())
}

/// Per-node spread of mean consistency across a threshold sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConsistency {
    pub node: String,

    /// Thresholds at which the node had a defined mean consistency
    pub thresholds: usize,

    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std: Option<f64>,
}

/// Combine node tables computed at several thresholds
///
/// All tables must list the same nodes in the same order. Missing means
/// are ignored.
pub fn aggregate_sweep(tables: &[Vec<NodeConsistency>]) -> Result<Vec<SweepConsistency>> {
    let first = match tables.first() {
        Some(first) => first,
        None => return Ok(Vec::new()),
    };

    for table in tables {
        let aligned = table.len() == first.len()
            && table.iter().zip(first).all(|(a, b)| a.node == b.node);
        if !aligned {
            return Err(Error::malformed("node tables of a sweep cover different nodes"));
        }
    }

    Ok(first
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let means: Vec<f64> = tables.iter().filter_map(|table| table[idx].mean).collect();
            let summary = summarize(&means);
            SweepConsistency {
                node: row.node.clone(),
                thresholds: means.len(),
                mean: summary.map(|s| s.mean),
                min: summary.map(|s| s.min),
                max: summary.map(|s| s.max),
                std: summary.map(|s| s.std),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn star() -> WeightedGraph {
        let mut builder = GraphBuilder::new();
        builder.add_edge("hub", "a", 1.0).unwrap();
        builder.add_edge("hub", "b", 1.0).unwrap();
        builder.add_edge("hub", "c", 1.0).unwrap();
        builder.add_node("lonely");
        builder.build().unwrap()
    }

    fn row(source: &str, target: &str, consistency: Option<f64>) -> EdgeConsistency {
        EdgeConsistency {
            source: source.to_string(),
            target: target.to_string(),
            weight: 1.0,
            consensus: consistency,
            consistency,
        }
    }

    fn table() -> Vec<EdgeConsistency> {
        vec![
            row("hub", "a", Some(1.0)),
            row("hub", "b", Some(0.5)),
            row("hub", "c", None),
        ]
    }

    #[test]
    fn test_statistics_of_hub() {
        let nodes = node_consistency(&star(), &table(), None).unwrap();
        let hub = &nodes[0];

        assert_eq!(hub.node, "hub");
        assert_eq!(hub.edges, 2);
        assert_eq!(hub.mean, Some(0.75));
        assert_eq!(hub.min, Some(0.5));
        assert_eq!(hub.max, Some(1.0));
        assert!((hub.std.unwrap() - 0.25).abs() < 1e-12);
        assert!((hub.mean_minus_std.unwrap() - 0.5).abs() < 1e-12);

        let fractions: Vec<f64> = hub.neighbors.iter().map(|f| f.fraction.unwrap()).collect();
        assert_eq!(fractions, vec![0.5, 0.5, 0.5]);
        assert_eq!(hub.neighbors[2].cutoff, 1.0);
    }

    #[test]
    fn test_edges_count_for_both_endpoints() {
        let nodes = node_consistency(&star(), &table(), None).unwrap();
        assert_eq!(nodes[1].mean, Some(1.0));
        assert_eq!(nodes[1].std, Some(0.0));
        assert_eq!(nodes[2].mean, Some(0.5));
    }

    #[test]
    fn test_nodes_without_evidence_are_missing() {
        let nodes = node_consistency(&star(), &table(), None).unwrap();

        // c only has an edge with missing consistency, lonely has no edge
        for node in &nodes[3..] {
            assert_eq!(node.edges, 0);
            assert_eq!(node.mean, None);
            assert_eq!(node.min, None);
            assert_eq!(node.std, None);
            assert_eq!(node.mean_minus_std, None);
            assert!(node.neighbors.iter().all(|f| f.fraction.is_none()));
        }
    }

    #[test]
    fn test_fractions_decrease_with_cutoff() {
        let rows = vec![
            row("hub", "a", Some(0.85)),
            row("hub", "b", Some(0.95)),
            row("hub", "c", Some(1.0)),
        ];
        let nodes = node_consistency(&star(), &rows, Some(&[0.8, 0.9, 1.0][..])).unwrap();
        for node in &nodes {
            let fractions: Vec<f64> = node.neighbors.iter().filter_map(|f| f.fraction).collect();
            assert!(fractions.windows(2).all(|pair| pair[0] >= pair[1]));
        }
        let hub: Vec<Option<f64>> = nodes[0].neighbors.iter().map(|f| f.fraction).collect();
        assert_eq!(hub[0], Some(1.0));
        assert!((hub[1].unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((hub[2].unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_recomputation_is_identical() {
        let graph = star();
        let first = node_consistency(&graph, &table(), None).unwrap();
        let second = node_consistency(&graph, &table(), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let rows = vec![row("hub", "ghost", Some(1.0))];
        let result = node_consistency(&star(), &rows, None);
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_aggregate_sweep() {
        let graph = star();
        let strong = node_consistency(&graph, &table(), None).unwrap();
        let weak_rows = vec![
            row("hub", "a", Some(0.25)),
            row("hub", "b", Some(0.25)),
            row("hub", "c", None),
        ];
        let weak = node_consistency(&graph, &weak_rows, None).unwrap();

        let sweep = aggregate_sweep(&[strong, weak]).unwrap();
        assert_eq!(sweep.len(), 5);
        assert_eq!(sweep[0].thresholds, 2);
        assert_eq!(sweep[0].mean, Some(0.5));
        assert_eq!(sweep[0].min, Some(0.25));
        assert_eq!(sweep[0].max, Some(0.75));
        assert_eq!(sweep[4].thresholds, 0);
        assert_eq!(sweep[4].mean, None);
    }

    #[test]
    fn test_aggregate_sweep_rejects_misaligned_tables() {
        let graph = star();
        let full = node_consistency(&graph, &table(), None).unwrap();
        let partial = full[..2].to_vec();
        assert!(aggregate_sweep(&[full, partial]).is_err());
        assert!(aggregate_sweep(&[]).unwrap().is_empty());
    }
}
