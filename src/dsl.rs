//! JSON graph documents.
//!
//! A document lists nodes by id and registry type, with their settings keyed
//! as in [`ShaderNode::params`] and the ids of slots the host has connected.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::ShaderGraph;
use crate::graph::node::ShaderNode;
use crate::graph::slot::SlotId;
use crate::nodes::create_node;

pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GraphDocument {
    pub version: String,
    pub name: String,
    pub nodes: Vec<NodeDocument>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub connected_slots: Vec<SlotId>,
}

pub fn load_graph_from_path(path: impl AsRef<Path>) -> Result<ShaderGraph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph json at {}", path.display()))?;
    let doc: GraphDocument = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse graph json at {}", path.display()))?;
    graph_from_document(&doc)
}

/// Build a graph, applying settings and connection state per node.
///
/// Nodes are constructed with defaults, settings are applied in document
/// order, and slots are re-declared once more before connections are marked.
/// Loading records no dirty events.
pub fn graph_from_document(doc: &GraphDocument) -> Result<ShaderGraph> {
    if doc.version != DOCUMENT_VERSION {
        warn!(
            "graph document version {} (expected {DOCUMENT_VERSION}); loading anyway",
            doc.version
        );
    }

    let mut graph = ShaderGraph::new(doc.name.clone());
    for node_doc in &doc.nodes {
        let node = node_from_document(node_doc)
            .with_context(|| format!("invalid node {}", node_doc.id))?;
        graph.add_node(node_doc.id.clone(), node)?;
    }
    Ok(graph)
}

fn node_from_document(node_doc: &NodeDocument) -> Result<Box<dyn ShaderNode>> {
    let mut node = create_node(&node_doc.node_type)?;
    for (key, value) in &node_doc.settings {
        node.apply_param(key, value)?;
    }
    node.update_after_deserialization();

    for &slot_id in &node_doc.connected_slots {
        if !node.slots_mut().set_connected(slot_id, true) {
            bail!(
                "{} node has no slot {slot_id} to connect",
                node_doc.node_type
            );
        }
    }
    Ok(node)
}

pub fn document_from_graph(graph: &ShaderGraph) -> GraphDocument {
    let nodes = graph
        .nodes()
        .map(|(id, node)| NodeDocument {
            id: id.to_string(),
            node_type: node.type_name().to_string(),
            settings: node.params(),
            connected_slots: node
                .slots()
                .iter()
                .filter(|s| s.connected)
                .map(|s| s.id)
                .collect(),
        })
        .collect();

    GraphDocument {
        version: DOCUMENT_VERSION.to_string(),
        name: graph.name().to_string(),
        nodes,
    }
}

pub fn param_bool(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| anyhow!("setting '{key}' expects a boolean, got {value}"))
}

pub fn param_str<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| anyhow!("setting '{key}' expects a string, got {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::space::NeededCoordinateSpace;
    use crate::graph::stage::ShaderStageCapability;
    use serde_json::json;

    fn parse(value: Value) -> GraphDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_minimal_document() {
        let doc = parse(json!({
            "version": "1.0",
            "name": "Lit",
            "nodes": [{ "id": "master", "type": "PBRMaster" }]
        }));
        let graph = graph_from_document(&doc).unwrap();
        assert_eq!(graph.name(), "Lit");
        assert_eq!(graph.len(), 1);
        assert!(graph.dirty_events().is_empty());
    }

    #[test]
    fn test_settings_and_connections_applied() {
        let doc = parse(json!({
            "version": "1.0",
            "name": "Lit",
            "nodes": [{
                "id": "master",
                "type": "PBRMaster",
                "settings": { "anisotropy": true, "normalDropOffSpace": "world" },
                "connectedSlots": [15]
            }]
        }));
        let graph = graph_from_document(&doc).unwrap();
        let master = graph.node("master").unwrap();
        assert!(master.slots().is_connected(15));
        let reqs = graph.requirements(ShaderStageCapability::Fragment);
        assert_eq!(reqs.normal, NeededCoordinateSpace::WORLD);
        assert!(reqs.tangent.is_empty());
    }

    #[test]
    fn test_document_round_trip_keeps_settings() {
        let doc = parse(json!({
            "version": "1.0",
            "name": "Lit",
            "nodes": [
                { "id": "m", "type": "PBRMaster", "settings": { "gsaa": true }, "connectedSlots": [1] },
                { "id": "n", "type": "NormalVector", "settings": { "space": "view" } }
            ]
        }));
        let graph = graph_from_document(&doc).unwrap();
        let out = document_from_graph(&graph);
        assert_eq!(out.nodes.len(), 2);
        assert_eq!(out.nodes[0].settings["gsaa"], json!(true));
        assert_eq!(out.nodes[0].connected_slots, vec![1]);
        assert_eq!(out.nodes[1].settings["space"], json!("view"));

        let again = graph_from_document(&out).unwrap();
        assert_eq!(document_from_graph(&again), out);
    }

    #[test]
    fn test_errors() {
        let unknown_type = parse(json!({
            "version": "1.0", "name": "x",
            "nodes": [{ "id": "a", "type": "Unknown" }]
        }));
        assert!(graph_from_document(&unknown_type).is_err());

        let duplicate = parse(json!({
            "version": "1.0", "name": "x",
            "nodes": [{ "id": "a", "type": "VertexID" }, { "id": "a", "type": "VertexID" }]
        }));
        assert!(graph_from_document(&duplicate).is_err());

        let bad_setting = parse(json!({
            "version": "1.0", "name": "x",
            "nodes": [{ "id": "a", "type": "PBRMaster", "settings": { "gsaa": 1 } }]
        }));
        let err = graph_from_document(&bad_setting).err().unwrap();
        assert!(format!("{err:#}").contains("gsaa"));

        let missing_slot = parse(json!({
            "version": "1.0", "name": "x",
            "nodes": [{ "id": "a", "type": "PBRMaster", "connectedSlots": [16] }]
        }));
        assert!(graph_from_document(&missing_slot).is_err());
    }

    #[test]
    fn test_load_missing_file_has_path_context() {
        let err = load_graph_from_path("/definitely/not/here.json").err().unwrap();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
