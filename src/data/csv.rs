//! CSV file handling for graph and partition data

use anyhow::{anyhow, Context, Result};
use consensus_cluster::cluster::Partition;
use consensus_cluster::graph::{GraphBuilder, WeightedGraph};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Column layout of an edge list file
#[derive(Debug, Clone)]
pub struct EdgeListFormat {
    pub separator: u8,
    pub source_col: String,
    pub target_col: String,
    pub weight_col: String,
}

impl Default for EdgeListFormat {
    fn default() -> Self {
        Self {
            separator: b',',
            source_col: "Source".to_string(),
            target_col: "Target".to_string(),
            weight_col: "Weight".to_string(),
        }
    }
}

fn read_csv(path: &str, separator: u8) -> Result<DataFrame> {
    if !Path::new(path).exists() {
        return Err(anyhow!("File not found: {}", path));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()
        .with_context(|| format!("failed to parse {}", path))?;

    log::info!("Read {} rows from {}", df.height(), path);
    Ok(df)
}

/// Load a weighted undirected graph from an edge list
pub fn load_edge_list(path: &str, format: &EdgeListFormat) -> Result<WeightedGraph> {
    log::info!("Reading edge list: {}", path);
    let df = read_csv(path, format.separator)?;

    let sources = df.column(&format.source_col)?.cast(&DataType::String)?;
    let sources = sources.str()?;
    let targets = df.column(&format.target_col)?.cast(&DataType::String)?;
    let targets = targets.str()?;
    let weights = df.column(&format.weight_col)?.cast(&DataType::Float64)?;
    let weights = weights.f64()?;

    let mut builder = GraphBuilder::with_capacity(df.height());
    for row in 0..df.height() {
        let (source, target, weight) = match (sources.get(row), targets.get(row), weights.get(row)) {
            (Some(source), Some(target), Some(weight)) => (source, target, weight),
            _ => return Err(anyhow!("row {} of {} has an empty field", row + 1, path)),
        };
        builder
            .add_edge(source, target, weight)
            .with_context(|| format!("row {} of {}", row + 1, path))?;
    }

    let graph = builder.build()?;
    log::info!(
        "Loaded graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Load seed partitions: one column per node, one row per partition
pub fn load_partitions(path: &str, graph: &WeightedGraph) -> Result<Vec<Partition>> {
    log::info!("Reading partitions: {}", path);
    let df = read_csv(path, b',')?;

    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let labels = column.cast(&DataType::String)?;
            Ok((column.name().to_string(), labels))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut partitions = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let mut assignments = Vec::with_capacity(columns.len());
        for (node, labels) in &columns {
            let label = labels
                .str()?
                .get(row)
                .ok_or_else(|| anyhow!("partition {} has no label for node '{}'", row + 1, node))?;
            assignments.push((node.as_str(), label.to_string()));
        }
        let partition = Partition::from_assignments(graph, assignments)
            .with_context(|| format!("partition {} of {}", row + 1, path))?;
        partitions.push(partition);
    }

    log::info!("Loaded {} seed partitions", partitions.len());
    Ok(partitions)
}

/// Extra per-node columns joined onto the node table
#[derive(Debug, Clone, Default)]
pub struct NodeAttributes {
    pub columns: Vec<String>,
    values: HashMap<String, Vec<String>>,
}

impl NodeAttributes {
    /// Attribute values of a node in column order, `None` if the file does
    /// not list it
    pub fn get(&self, node: &str) -> Option<&[String]> {
        self.values.get(node).map(Vec::as_slice)
    }
}

/// Load node attributes keyed by the `id_col` column
pub fn load_node_attributes(path: &str, separator: u8, id_col: &str) -> Result<NodeAttributes> {
    log::info!("Reading node attributes: {}", path);
    let df = read_csv(path, separator)?;

    let ids = df.column(id_col)?.cast(&DataType::String)?;
    let ids = ids.str()?;

    let mut columns = Vec::new();
    let mut data = Vec::new();
    for column in df.get_columns() {
        if column.name().as_str() == id_col {
            continue;
        }
        columns.push(column.name().to_string());
        data.push(column.cast(&DataType::String)?);
    }
    let data = data
        .iter()
        .map(|column| column.str())
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut values = HashMap::with_capacity(df.height());
    for row in 0..df.height() {
        let id = ids
            .get(row)
            .ok_or_else(|| anyhow!("row {} of {} has no node id", row + 1, path))?;
        let row_values = data
            .iter()
            .map(|column| column.get(row).unwrap_or_default().to_string())
            .collect();
        if values.insert(id.to_string(), row_values).is_some() {
            return Err(anyhow!("node '{}' is listed twice in {}", id, path));
        }
    }

    log::info!("Loaded {} attributes for {} nodes", columns.len(), values.len());
    Ok(NodeAttributes { columns, values })
}
