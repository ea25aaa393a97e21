//! Graph loading and results persistence module
//!
//! Graphs are read from a JSON document of the form
//!
//! ```json
//! {
//!   "directed": true,
//!   "num_types": 2,
//!   "nodes": [{ "id": "a", "attributes": { "type": [1, 0] } },
//!             { "id": "b", "attributes": { "type": 1 } }],
//!   "edges": [{ "source": "a", "target": "b", "attributes": { "weight": 0.7 } }]
//! }
//! ```
//!
//! The type attribute is either a numeric vector or a layer index (one-hot
//! over `num_types`). Edges without a weight attribute weigh 1.

use crate::cluster::{CommunitySummary, Dendrogram, Partition};
use crate::config::LouvainConfig;
use crate::error::{LouvainError, Result};
use crate::graph::{one_hot, GraphBuilder, LayeredGraph, TypeVector};
use ndarray::Array1;
use serde::Deserialize;
use serde_json::{json, to_string_pretty, Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct GraphDocument {
    #[serde(default = "default_directed")]
    directed: bool,
    #[serde(default)]
    num_types: Option<usize>,
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    source: String,
    target: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

fn default_directed() -> bool {
    true
}

/// Everything a run produced, as written to disk
#[derive(Debug)]
pub struct RunReport<'a> {
    pub config: &'a LouvainConfig,
    pub dendrogram: &'a Dendrogram,
    /// Flattened partition that was reported
    pub partition: &'a Partition,
    /// Dendrogram level of `partition`
    pub level: usize,
    pub communities: &'a [CommunitySummary],
}

/// Load a layered graph from a JSON file
pub fn load_graph<P: AsRef<Path>>(
    path: P,
    weight_key: &str,
    nodetype_key: &str,
) -> Result<LayeredGraph> {
    let path = path.as_ref();
    log::info!("Reading graph file: {}", path.display());

    let text = fs::read_to_string(path)?;
    let graph = parse_graph(&text, weight_key, nodetype_key)?;

    log::info!(
        "Loaded graph with {} nodes, {} edges and {} types",
        graph.node_count(),
        graph.edge_count(),
        graph.num_types
    );

    Ok(graph)
}

/// Parse a layered graph from JSON text
pub fn parse_graph(text: &str, weight_key: &str, nodetype_key: &str) -> Result<LayeredGraph> {
    let document: GraphDocument = serde_json::from_str(text)?;
    if !document.directed {
        return Err(LouvainError::InvalidGraphType);
    }

    let num_types = match document.num_types {
        Some(num_types) => num_types,
        None => document
            .nodes
            .first()
            .map(|node| match node.attributes.get(nodetype_key) {
                Some(Value::Array(values)) => Ok(values.len()),
                _ => Err(missing(&node.id, nodetype_key)),
            })
            .transpose()?
            .unwrap_or(0),
    };

    let mut builder =
        GraphBuilder::with_capacity(num_types, document.nodes.len(), document.edges.len());

    for node in &document.nodes {
        let types = read_type_vector(node, nodetype_key, num_types)?;
        builder.add_node(&node.id, types)?;
    }

    for edge in &document.edges {
        let weight = match edge.attributes.get(weight_key) {
            None => 1.0,
            Some(value) => value.as_f64().ok_or_else(|| {
                missing(&format!("edge {} -> {}", edge.source, edge.target), weight_key)
            })?,
        };
        builder.add_edge(&edge.source, &edge.target, weight)?;
    }

    Ok(builder.build())
}

fn read_type_vector(node: &NodeRecord, key: &str, num_types: usize) -> Result<TypeVector> {
    match node.attributes.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| value.as_f64().ok_or_else(|| missing(&node.id, key)))
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from),
        Some(value) => match layer_index(value) {
            Some(layer) if layer < num_types => Ok(one_hot(layer, num_types)),
            _ => Err(missing(&node.id, key)),
        },
        None => Err(missing(&node.id, key)),
    }
}

/// Non-negative integral layer index, written either as `1` or `1.0`
fn layer_index(value: &Value) -> Option<usize> {
    match value.as_u64() {
        Some(layer) => usize::try_from(layer).ok(),
        None => value
            .as_f64()
            .filter(|layer| *layer >= 0.0 && layer.fract() == 0.0 && *layer <= usize::MAX as f64)
            .map(|layer| layer as usize),
    }
}

fn missing(owner: &str, key: &str) -> LouvainError {
    LouvainError::MissingAttribute {
        owner: owner.to_string(),
        key: key.to_string(),
    }
}

/// Save run results to the specified directory
pub fn save_results<P: AsRef<Path>>(
    report: &RunReport<'_>,
    graph: &LayeredGraph,
    output_dir: P,
) -> Result<()> {
    let output_dir = output_dir.as_ref();
    log::info!(
        "Saving {} communities to {}",
        report.communities.len(),
        output_dir.display()
    );

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_summary(report, graph, output_dir)?;
    save_partition(report.partition, graph, output_dir)?;
    write_json(&output_dir.join("dendrogram.json"), &json!(report.dendrogram))?;
    save_communities(report.communities, graph, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

fn save_summary(report: &RunReport<'_>, graph: &LayeredGraph, output_dir: &Path) -> Result<()> {
    let modularity: Vec<Option<f64>> = (0..report.dendrogram.len())
        .map(|level| report.dendrogram.modularity_at(level))
        .collect();

    let summary = json!({
        "graph_stats": {
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "num_types": graph.num_types,
            "total_weight": graph.total_weight(),
            "type_totals": graph.type_totals().to_vec(),
        },
        "config": report.config,
        "levels": report.dendrogram.len(),
        "reported_level": report.level,
        "modularity_per_level": modularity,
        "community_count": report.communities.len(),
        "largest_community_size": report.communities.first().map_or(0, |c| c.size),
    });

    write_json(&output_dir.join("summary.json"), &summary)
}

/// node id -> community, in node order
fn save_partition(partition: &Partition, graph: &LayeredGraph, output_dir: &Path) -> Result<()> {
    let assignments: Map<String, Value> = partition
        .iter()
        .enumerate()
        .map(|(node, &community)| (resolve_id(graph, node), json!(community)))
        .collect();

    write_json(&output_dir.join("partition.json"), &Value::Object(assignments))
}

fn save_communities(
    communities: &[CommunitySummary],
    graph: &LayeredGraph,
    output_dir: &Path,
) -> Result<()> {
    let communities_json: Vec<Value> = communities
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "size": c.size,
                "density": c.density,
                "internal_weight": c.internal_weight,
                "type_counts": c.type_counts,
                "type_concentration": c.type_concentration,
                "members": c.members.iter().map(|&node| resolve_id(graph, node)).collect::<Vec<_>>(),
            })
        })
        .collect();

    write_json(
        &output_dir.join("communities.json"),
        &json!({ "communities": communities_json }),
    )
}

/// Resolve node IDs if available
fn resolve_id(graph: &LayeredGraph, node: usize) -> String {
    graph
        .node_id(node)
        .map_or_else(|| node.to_string(), str::to_string)
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const DOC: &str = r#"{
        "num_types": 2,
        "nodes": [
            { "id": "a", "attributes": { "layer": 0 } },
            { "id": "b", "attributes": { "layer": [0, 1] } },
            { "id": "c", "attributes": { "layer": 1 } }
        ],
        "edges": [
            { "source": "a", "target": "b", "attributes": { "w": 2.5 } },
            { "source": "b", "target": "c" }
        ]
    }"#;

    #[test]
    fn test_parse_graph_with_custom_keys() {
        let graph = parse_graph(DOC, "w", "layer").unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.num_types, 2);
        assert_eq!(graph.type_vector(0).unwrap(), &array![1.0, 0.0]);
        assert_eq!(graph.type_vector(1).unwrap(), &array![0.0, 1.0]);
        // missing weight defaults to 1
        assert!((graph.total_weight() - 3.5).abs() < 1e-12);
        assert_eq!(graph.node_id(2), Some("c"));
    }

    #[test]
    fn test_parse_graph_rejects_undirected() {
        let doc = r#"{ "directed": false, "nodes": [] }"#;
        assert!(matches!(
            parse_graph(doc, "weight", "type"),
            Err(LouvainError::InvalidGraphType)
        ));
    }

    #[test]
    fn test_parse_graph_missing_type() {
        let err = parse_graph(DOC, "w", "type").unwrap_err();
        assert!(matches!(err, LouvainError::MissingAttribute { .. }));
    }

    #[test]
    fn test_parse_graph_accepts_integral_float_layers() {
        let doc = r#"{
            "num_types": 2,
            "nodes": [
                { "id": "a", "attributes": { "type": 1.0 } },
                { "id": "b", "attributes": { "type": 0 } }
            ]
        }"#;
        let graph = parse_graph(doc, "weight", "type").unwrap();
        assert_eq!(graph.type_vector(0).unwrap(), &array![0.0, 1.0]);
        assert_eq!(graph.type_vector(1).unwrap(), &array![1.0, 0.0]);
    }

    #[test]
    fn test_parse_graph_rejects_fractional_or_out_of_range_layers() {
        for layer in ["0.5", "-1", "2"] {
            let doc = format!(
                r#"{{ "num_types": 2, "nodes": [{{ "id": "a", "attributes": {{ "type": {layer} }} }}] }}"#
            );
            assert!(matches!(
                parse_graph(&doc, "weight", "type"),
                Err(LouvainError::MissingAttribute { .. })
            ));
        }
    }

    #[test]
    fn test_parse_graph_infers_num_types() {
        let doc = r#"{
            "nodes": [
                { "id": "x", "attributes": { "type": [0, 0, 1] } },
                { "id": "y", "attributes": { "type": [1, 0, 0] } }
            ],
            "edges": [{ "source": "x", "target": "y", "attributes": { "weight": 1 } }]
        }"#;
        let graph = parse_graph(doc, "weight", "type").unwrap();
        assert_eq!(graph.num_types, 3);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_parse_graph_unknown_node() {
        let doc = r#"{
            "nodes": [{ "id": "x", "attributes": { "type": [1] } }],
            "edges": [{ "source": "x", "target": "nope" }]
        }"#;
        assert!(matches!(
            parse_graph(doc, "weight", "type"),
            Err(LouvainError::UnknownNode(id)) if id == "nope"
        ));
    }
}
