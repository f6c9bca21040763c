use crate::graph::capability::{Capabilities, FlagRequirement, MayRequire};
use crate::graph::node::{PreviewMode, ShaderNode};
use crate::graph::slot::{MaterialSlot, SlotCollection, SlotDiff, SlotId, SlotType};
use crate::graph::stage::ShaderStageCapability;

pub const OUTPUT_SLOT_ID: SlotId = 0;
const OUTPUT_SLOT_NAME: &str = "Out";

/// Index of the vertex being processed.
#[derive(Clone, Debug)]
pub struct VertexIdNode {
    slots: SlotCollection,
}

impl Default for VertexIdNode {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexIdNode {
    pub const TYPE_NAME: &'static str = "VertexID";

    pub fn new() -> Self {
        let mut node = Self {
            slots: SlotCollection::new(),
        };
        node.update_after_deserialization();
        node
    }
}

impl MayRequire for VertexIdNode {
    fn capabilities(&self) -> Capabilities {
        Capabilities::VERTEX_ID
    }

    fn requires_flag(&self, kind: FlagRequirement, _stage: ShaderStageCapability) -> bool {
        kind == FlagRequirement::VertexId
    }
}

impl ShaderNode for VertexIdNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn name(&self) -> &str {
        "Vertex ID"
    }

    fn slots(&self) -> &SlotCollection {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut SlotCollection {
        &mut self.slots
    }

    fn update_after_deserialization(&mut self) -> SlotDiff {
        self.slots.reconcile(vec![MaterialSlot::vector1(
            OUTPUT_SLOT_ID,
            OUTPUT_SLOT_NAME,
            SlotType::Output,
            0.0,
            ShaderStageCapability::All,
        )])
    }

    fn has_preview(&self) -> bool {
        true
    }

    fn preview_mode(&self) -> PreviewMode {
        PreviewMode::Preview3D
    }

    fn variable_name_for_slot(&self, _slot_id: SlotId) -> String {
        "IN.VertexID".to_string()
    }
}
