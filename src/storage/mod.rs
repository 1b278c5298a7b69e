//! Results persistence module

use crate::data::NodeAttributes;
use anyhow::Result;
use consensus_cluster::cluster::{summarize_communities, Partition};
use consensus_cluster::consensus::{ConsensusOutcome, ThresholdResult};
use consensus_cluster::consistency::{EdgeConsistency, NodeConsistency, SweepConsistency};
use consensus_cluster::graph::{connected_components, NodeProfile, WeightedGraph};
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Everything produced by a single-threshold consistency run
pub struct ConsistencyResults<'a> {
    pub graph: &'a WeightedGraph,
    pub initial_partitions: &'a [Partition],
    pub outcome: &'a ConsensusOutcome,
    pub threshold: f64,
    pub edges: &'a [EdgeConsistency],
    pub nodes: &'a [NodeConsistency],
    pub profiles: &'a [NodeProfile],

    /// Extra node columns, left-joined onto the node table
    pub attributes: Option<&'a NodeAttributes>,
}

/// Save a consistency run to the specified directory
pub fn save_consistency_results(results: &ConsistencyResults, output_dir: &str) -> Result<()> {
    log::info!("Saving consistency results to {}", output_dir);
    fs::create_dir_all(output_dir)?;
    let dir = Path::new(output_dir);

    save_partitions(results.graph, results.initial_partitions, &dir.join("partitions.csv"))?;
    save_consensus_matrix(results.graph, results.outcome, &dir.join("consensus.json"))?;
    save_edge_table(results.edges, &dir.join("edges-consistency.csv"))?;
    save_node_table(results, &dir.join("nodes-consistency.csv"))?;
    save_summary(results, &dir.join("summary.json"))?;

    log::info!("Results saved successfully");
    Ok(())
}

/// Save a threshold sweep to the specified directory
pub fn save_sweep_results(
    graph: &WeightedGraph,
    results: &[ThresholdResult],
    sweep: &[SweepConsistency],
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving sweep over {} thresholds to {}", results.len(), output_dir);
    fs::create_dir_all(output_dir)?;
    let dir = Path::new(output_dir);

    // One column of community labels per threshold
    let mut file = BufWriter::new(File::create(dir.join("consensus_thresholds.csv"))?);
    let header: Vec<String> = results
        .iter()
        .map(|r| format!("{:.3}", r.threshold))
        .collect();
    writeln!(file, "node,{}", header.join(","))?;
    for node in 0..graph.node_count() {
        let labels: Vec<String> = results
            .iter()
            .map(|r| {
                r.partition
                    .as_ref()
                    .map(|p| p.label(node).to_string())
                    .unwrap_or_default()
            })
            .collect();
        writeln!(file, "{},{}", escape(graph.node_id(node)), labels.join(","))?;
    }
    file.flush()?;

    let mut file = BufWriter::new(File::create(dir.join("thresholds_modularity.csv"))?);
    writeln!(file, "threshold,modularity,iterations,communities")?;
    for result in results {
        writeln!(
            file,
            "{:.3},{},{},{}",
            result.threshold,
            optional(result.modularity),
            result.iterations.map(|i| i.to_string()).unwrap_or_default(),
            result
                .partition
                .as_ref()
                .map(|p| p.community_count().to_string())
                .unwrap_or_default()
        )?;
    }
    file.flush()?;

    let mut file = BufWriter::new(File::create(dir.join("sweep_consistency.csv"))?);
    writeln!(file, "node,thresholds,mean,min,max,std")?;
    for row in sweep {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            escape(&row.node),
            row.thresholds,
            optional(row.mean),
            optional(row.min),
            optional(row.max),
            optional(row.std)
        )?;
    }
    file.flush()?;

    log::info!("Sweep results saved successfully");
    Ok(())
}

/// Save partitions: one column per node, one row per partition
fn save_partitions(graph: &WeightedGraph, partitions: &[Partition], path: &Path) -> Result<()> {
    log::info!("Saving {} initial partitions", partitions.len());
    let mut file = BufWriter::new(File::create(path)?);

    let header: Vec<String> = graph.node_ids().iter().map(|id| escape(id)).collect();
    writeln!(file, "{}", header.join(","))?;
    for partition in partitions {
        let row: Vec<String> = partition.labels().iter().map(|l| l.to_string()).collect();
        writeln!(file, "{}", row.join(","))?;
    }
    file.flush()?;
    Ok(())
}

fn save_consensus_matrix(
    graph: &WeightedGraph,
    outcome: &ConsensusOutcome,
    path: &Path,
) -> Result<()> {
    log::info!("Saving consensus matrix with {} pairs", outcome.matrix.len());
    let mut file = File::create(path)?;

    let entries: Vec<_> = outcome
        .matrix
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "source": graph.node_id(entry.source as usize),
                "target": graph.node_id(entry.target as usize),
                "value": entry.value,
            })
        })
        .collect();

    let matrix = json!({
        "partition_count": outcome.matrix.partition_count(),
        "node_count": outcome.matrix.node_count(),
        "entries": entries,
    });
    file.write_all(to_string_pretty(&matrix)?.as_bytes())?;
    Ok(())
}

fn save_edge_table(edges: &[EdgeConsistency], path: &Path) -> Result<()> {
    log::info!("Saving consistency of {} edges", edges.len());
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "Source,Target,weight,distance,consensus,consistency")?;
    for edge in edges {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            escape(&edge.source),
            escape(&edge.target),
            edge.weight,
            1.0 / edge.weight,
            optional(edge.consensus),
            optional(edge.consistency)
        )?;
    }
    file.flush()?;
    Ok(())
}

fn save_node_table(results: &ConsistencyResults, path: &Path) -> Result<()> {
    log::info!("Saving consistency of {} nodes", results.nodes.len());
    let mut file = BufWriter::new(File::create(path)?);

    let cutoff_columns: Vec<String> = results
        .nodes
        .first()
        .map(|row| {
            row.neighbors
                .iter()
                .map(|f| format!("consistency_neighbors_{:.1}", f.cutoff))
                .collect()
        })
        .unwrap_or_default();

    let mut header = vec![
        "node",
        "degree",
        "weighted_degree",
        "eigenvector_centrality",
        "betweenness",
        "consistency_mean",
        "consistency_min",
        "consistency_max",
        "consistency_std",
        "consistency_mean_min_std",
    ]
    .into_iter()
    .map(String::from)
    .collect::<Vec<_>>();
    header.extend(cutoff_columns);
    header.push("consensus".to_string());
    if let Some(attributes) = results.attributes {
        header.extend(attributes.columns.iter().map(|c| escape(c)));
    }
    writeln!(file, "{}", header.join(","))?;

    for (idx, (row, profile)) in results.nodes.iter().zip(results.profiles).enumerate() {
        let mut fields = vec![
            escape(&row.node),
            profile.degree.to_string(),
            profile.weighted_degree.to_string(),
            profile.eigenvector_centrality.to_string(),
            profile.betweenness.to_string(),
            optional(row.mean),
            optional(row.min),
            optional(row.max),
            optional(row.std),
            optional(row.mean_minus_std),
        ];
        fields.extend(row.neighbors.iter().map(|f| optional(f.fraction)));
        fields.push(results.outcome.partition.label(idx).to_string());
        if let Some(attributes) = results.attributes {
            match attributes.get(&row.node) {
                Some(values) => fields.extend(values.iter().map(|v| escape(v))),
                None => fields.extend(attributes.columns.iter().map(|_| String::new())),
            }
        }
        writeln!(file, "{}", fields.join(","))?;
    }
    file.flush()?;
    Ok(())
}

fn save_summary(results: &ConsistencyResults, path: &Path) -> Result<()> {
    log::info!("Saving summary information");
    let mut file = File::create(path)?;

    let graph = results.graph;
    let communities = summarize_communities(graph, &results.outcome.partition);
    let undefined_edges = results.edges.iter().filter(|e| e.consistency.is_none()).count();

    let summary = json!({
        "graph_stats": {
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "total_weight": graph.total_weight(),
            "components": connected_components(graph),
        },
        "consensus": {
            "threshold": results.threshold,
            "candidate_partitions": results.initial_partitions.len(),
            "iterations": results.outcome.iterations,
            "co_clustered_pairs": results.outcome.matrix.len(),
            "edges_without_evidence": undefined_edges,
        },
        "communities": communities.iter().map(|c| {
            json!({
                "id": c.id,
                "size": c.size,
                "density": c.density,
                "internal_weight": c.internal_weight,
                "central_nodes": c.central_nodes.iter()
                    .map(|&n| graph.node_id(n as usize))
                    .collect::<Vec<_>>(),
                "members": c.members.iter()
                    .map(|&n| graph.node_id(n as usize))
                    .collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;
    Ok(())
}

/// Missing values become empty CSV fields
fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
