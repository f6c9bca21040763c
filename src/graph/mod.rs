//! Shader graph model: slots, capability queries, nodes and the graph container.
//!
//! This module is organized into several submodules:
//! - `stage`: Pipeline stage tags (Vertex / Fragment / All)
//! - `space`: Coordinate spaces and the needed-space bitmask
//! - `slot`: Slots and the reconcile-by-id slot collection
//! - `capability`: Capability query protocol and requirement aggregation
//! - `node`: Node trait and modification scopes
//! - `requirements`: Graph-wide requirement records
//!
//! [`ShaderGraph`] owns the nodes and records one [`DirtyEvent`] per effective
//! settings change, which the host drains with [`ShaderGraph::take_dirty`].

pub mod capability;
pub mod node;
pub mod requirements;
pub mod slot;
pub mod space;
pub mod stage;

use anyhow::{Result, anyhow, bail};
use log::debug;
use serde_json::Value;

pub use capability::{
    Capabilities, FlagRequirement, MayRequire, SpaceRequirement, requires_normal,
    requires_position, requires_tangent, requires_vertex_id,
};
pub use node::{ModificationScope, ShaderNode};
pub use requirements::GraphRequirements;
pub use slot::{MaterialSlot, SlotCollection, SlotId, SlotType};
pub use space::{CoordinateSpace, NeededCoordinateSpace};
pub use stage::ShaderStageCapability;

/// Invalidation signal raised by a node change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtyEvent {
    pub node_id: String,
    pub scope: ModificationScope,
}

struct NodeEntry {
    id: String,
    node: Box<dyn ShaderNode>,
}

/// Node container with dirty tracking.
#[derive(Default)]
pub struct ShaderGraph {
    name: String,
    entries: Vec<NodeEntry>,
    dirty: Vec<DirtyEvent>,
}

impl ShaderGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_node(&mut self, id: impl Into<String>, node: Box<dyn ShaderNode>) -> Result<()> {
        let id = id.into();
        if self.entries.iter().any(|e| e.id == id) {
            bail!("duplicate node id: {id}");
        }
        self.entries.push(NodeEntry { id, node });
        Ok(())
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Box<dyn ShaderNode>> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx).node)
    }

    pub fn node(&self, id: &str) -> Option<&dyn ShaderNode> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.node.as_ref())
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &dyn ShaderNode)> {
        self.entries.iter().map(|e| (e.id.as_str(), e.node.as_ref()))
    }

    /// First node acting as a master node.
    pub fn master_node(&self) -> Option<(&str, &dyn ShaderNode)> {
        self.nodes().find(|(_, node)| node.as_master().is_some())
    }

    /// Apply a document-keyed setting and record the resulting dirty signal.
    pub fn set_param(&mut self, node_id: &str, key: &str, value: &Value) -> Result<ModificationScope> {
        self.update_node(node_id, |node| node.apply_param(key, value))
    }

    /// Run a mutation against one node and record the scope it reports.
    pub fn update_node<F>(&mut self, node_id: &str, f: F) -> Result<ModificationScope>
    where
        F: FnOnce(&mut (dyn ShaderNode + 'static)) -> Result<ModificationScope>,
    {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == node_id)
            .ok_or_else(|| anyhow!("no node with id {node_id}"))?;
        let scope = f(entry.node.as_mut())?;
        self.record(node_id, scope);
        Ok(scope)
    }

    /// Record host connection state for a slot. A change dirties the graph.
    pub fn set_slot_connected(
        &mut self,
        node_id: &str,
        slot_id: SlotId,
        connected: bool,
    ) -> Result<ModificationScope> {
        self.update_node(node_id, |node| {
            let slots = node.slots_mut();
            let was = slots
                .get(slot_id)
                .map(|s| s.connected)
                .ok_or_else(|| anyhow!("node {node_id} has no slot {slot_id}"))?;
            slots.set_connected(slot_id, connected);
            Ok(if was == connected {
                ModificationScope::Nothing
            } else {
                ModificationScope::Graph
            })
        })
    }

    fn record(&mut self, node_id: &str, scope: ModificationScope) {
        if !scope.is_dirty() {
            return;
        }
        debug!("node {node_id} dirty: {scope:?}");
        self.dirty.push(DirtyEvent {
            node_id: node_id.to_string(),
            scope,
        });
    }

    pub fn dirty_events(&self) -> &[DirtyEvent] {
        &self.dirty
    }

    /// Drain recorded dirty signals.
    pub fn take_dirty(&mut self) -> Vec<DirtyEvent> {
        std::mem::take(&mut self.dirty)
    }

    /// Requirements of every node in the graph for `stage`.
    pub fn requirements(&self, stage: ShaderStageCapability) -> GraphRequirements {
        GraphRequirements::from_nodes(self.nodes().map(|(_, node)| node), stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::pbr_master::PbrMasterNode;
    use crate::nodes::vertex_id::VertexIdNode;

    fn sample_graph() -> ShaderGraph {
        let mut graph = ShaderGraph::new("test");
        graph
            .add_node("master", Box::new(PbrMasterNode::new()))
            .unwrap();
        graph.add_node("vid", Box::new(VertexIdNode::new())).unwrap();
        graph
    }

    #[test]
    fn test_duplicate_node_id_rejected() {
        let mut graph = sample_graph();
        assert!(graph.add_node("vid", Box::new(VertexIdNode::new())).is_err());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_set_param_records_one_event_per_change() {
        let mut graph = sample_graph();
        let scope = graph
            .set_param("master", "anisotropy", &serde_json::json!(true))
            .unwrap();
        assert_eq!(scope, ModificationScope::Topological);
        let scope = graph
            .set_param("master", "anisotropy", &serde_json::json!(true))
            .unwrap();
        assert_eq!(scope, ModificationScope::Nothing);

        let events = graph.take_dirty();
        assert_eq!(
            events,
            vec![DirtyEvent {
                node_id: "master".to_string(),
                scope: ModificationScope::Topological,
            }]
        );
        assert!(graph.dirty_events().is_empty());
    }

    #[test]
    fn test_set_param_unknown_node() {
        let mut graph = sample_graph();
        assert!(graph.set_param("nope", "gsaa", &serde_json::json!(true)).is_err());
        assert!(graph.dirty_events().is_empty());
    }

    #[test]
    fn test_connecting_normal_slot_drops_tangent_requirement() {
        let mut graph = sample_graph();
        let before = graph.requirements(ShaderStageCapability::Fragment);
        assert!(before.normal.contains(NeededCoordinateSpace::TANGENT));

        let scope = graph.set_slot_connected("master", 1, true).unwrap();
        assert_eq!(scope, ModificationScope::Graph);
        let after = graph.requirements(ShaderStageCapability::Fragment);
        assert!(after.normal.is_empty());

        let scope = graph.set_slot_connected("master", 1, true).unwrap();
        assert_eq!(scope, ModificationScope::Nothing);
        assert_eq!(graph.take_dirty().len(), 1);
    }

    #[test]
    fn test_graph_requirements_include_vertex_id() {
        let graph = sample_graph();
        for stage in ShaderStageCapability::CONCRETE {
            assert!(graph.requirements(stage).vertex_id);
        }
    }

    #[test]
    fn test_master_node_lookup() {
        let graph = sample_graph();
        let (id, node) = graph.master_node().unwrap();
        assert_eq!(id, "master");
        assert_eq!(node.type_name(), "PBRMaster");
    }
}
