//! Mesh geometry inputs: position, normal, tangent and vertex color.

use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Value};

use crate::dsl::param_str;
use crate::graph::capability::{Capabilities, FlagRequirement, MayRequire, SpaceRequirement};
use crate::graph::node::{ModificationScope, PreviewMode, ShaderNode, update_setting};
use crate::graph::slot::{MaterialSlot, SlotCollection, SlotDiff, SlotId, SlotType};
use crate::graph::space::{CoordinateSpace, NeededCoordinateSpace};
use crate::graph::stage::ShaderStageCapability;

pub const OUTPUT_SLOT_ID: SlotId = 0;
const OUTPUT_SLOT_NAME: &str = "Out";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryQuantity {
    Position,
    Normal,
    Tangent,
}

impl GeometryQuantity {
    fn requirement(self) -> SpaceRequirement {
        match self {
            GeometryQuantity::Position => SpaceRequirement::Position,
            GeometryQuantity::Normal => SpaceRequirement::Normal,
            GeometryQuantity::Tangent => SpaceRequirement::Tangent,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            GeometryQuantity::Position => "Position",
            GeometryQuantity::Normal => "NormalVector",
            GeometryQuantity::Tangent => "TangentVector",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            GeometryQuantity::Position => "Position",
            GeometryQuantity::Normal => "Normal Vector",
            GeometryQuantity::Tangent => "Tangent Vector",
        }
    }

    /// Suffix of the interpolator field, e.g. `WorldSpaceNormal`.
    fn field_suffix(self) -> &'static str {
        match self {
            GeometryQuantity::Position => "Position",
            GeometryQuantity::Normal => "Normal",
            GeometryQuantity::Tangent => "Tangent",
        }
    }

    /// Absolute world only makes sense for positions.
    fn supports(self, space: CoordinateSpace) -> bool {
        space != CoordinateSpace::AbsoluteWorld || self == GeometryQuantity::Position
    }
}

/// A mesh attribute read in a selectable coordinate space.
#[derive(Clone, Debug)]
pub struct GeometryNode {
    quantity: GeometryQuantity,
    space: CoordinateSpace,
    slots: SlotCollection,
}

impl GeometryNode {
    pub fn new(quantity: GeometryQuantity) -> Self {
        let mut node = Self {
            quantity,
            space: CoordinateSpace::World,
            slots: SlotCollection::new(),
        };
        node.update_after_deserialization();
        node
    }

    pub fn position() -> Self {
        Self::new(GeometryQuantity::Position)
    }

    pub fn normal() -> Self {
        Self::new(GeometryQuantity::Normal)
    }

    pub fn tangent() -> Self {
        Self::new(GeometryQuantity::Tangent)
    }

    pub fn quantity(&self) -> GeometryQuantity {
        self.quantity
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn set_space(&mut self, space: CoordinateSpace) -> Result<ModificationScope> {
        if !self.quantity.supports(space) {
            bail!("{} does not support {space:?} space", self.quantity.type_name());
        }
        Ok(update_setting(&mut self.space, space, ModificationScope::Graph))
    }
}

impl MayRequire for GeometryNode {
    fn capabilities(&self) -> Capabilities {
        self.quantity.requirement().capability()
    }

    fn requires_space(
        &self,
        kind: SpaceRequirement,
        _stage: ShaderStageCapability,
    ) -> NeededCoordinateSpace {
        if kind == self.quantity.requirement() {
            self.space.to_needed()
        } else {
            NeededCoordinateSpace::empty()
        }
    }
}

impl ShaderNode for GeometryNode {
    fn type_name(&self) -> &'static str {
        self.quantity.type_name()
    }

    fn name(&self) -> &str {
        self.quantity.display_name()
    }

    fn slots(&self) -> &SlotCollection {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut SlotCollection {
        &mut self.slots
    }

    fn update_after_deserialization(&mut self) -> SlotDiff {
        self.slots.reconcile(vec![MaterialSlot::vector3(
            OUTPUT_SLOT_ID,
            OUTPUT_SLOT_NAME,
            SlotType::Output,
            [0.0; 3],
            ShaderStageCapability::All,
        )])
    }

    fn variable_name_for_slot(&self, _slot_id: SlotId) -> String {
        format!(
            "IN.{}{}",
            self.space.generator_name(),
            self.quantity.field_suffix()
        )
    }

    fn params(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "space".into(),
            serde_json::to_value(self.space).unwrap_or(Value::Null),
        );
        map
    }

    fn apply_param(&mut self, key: &str, value: &Value) -> Result<ModificationScope> {
        match key {
            "space" => {
                let raw = param_str(key, value)?;
                let space = CoordinateSpace::parse(raw)
                    .ok_or_else(|| anyhow!("unknown coordinate space: {raw}"))?;
                self.set_space(space)
            }
            other => bail!("{} node has no setting '{other}'", self.type_name()),
        }
    }
}

/// Interpolated per-vertex color.
#[derive(Clone, Debug)]
pub struct VertexColorNode {
    slots: SlotCollection,
}

impl Default for VertexColorNode {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexColorNode {
    pub const TYPE_NAME: &'static str = "VertexColor";

    pub fn new() -> Self {
        let mut node = Self {
            slots: SlotCollection::new(),
        };
        node.update_after_deserialization();
        node
    }
}

impl MayRequire for VertexColorNode {
    fn capabilities(&self) -> Capabilities {
        Capabilities::VERTEX_COLOR
    }

    fn requires_flag(&self, kind: FlagRequirement, _stage: ShaderStageCapability) -> bool {
        kind == FlagRequirement::VertexColor
    }
}

impl ShaderNode for VertexColorNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn name(&self) -> &str {
        "Vertex Color"
    }

    fn slots(&self) -> &SlotCollection {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut SlotCollection {
        &mut self.slots
    }

    fn update_after_deserialization(&mut self) -> SlotDiff {
        self.slots.reconcile(vec![MaterialSlot::vector3(
            OUTPUT_SLOT_ID,
            OUTPUT_SLOT_NAME,
            SlotType::Output,
            [1.0; 3],
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
        "IN.VertexColor".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::capability::{
        requires_normal, requires_position, requires_tangent, requires_vertex_color,
    };
    use ShaderStageCapability::*;

    #[test]
    fn test_geometry_nodes_default_to_world() {
        assert_eq!(requires_position(&GeometryNode::position(), Vertex), NeededCoordinateSpace::WORLD);
        assert_eq!(requires_normal(&GeometryNode::normal(), Vertex), NeededCoordinateSpace::WORLD);
        assert_eq!(requires_tangent(&GeometryNode::tangent(), Fragment), NeededCoordinateSpace::WORLD);
        assert_eq!(
            GeometryNode::tangent().variable_name_for_slot(OUTPUT_SLOT_ID),
            "IN.WorldSpaceTangent"
        );
    }

    #[test]
    fn test_normal_vector_space_setting() {
        let mut node = GeometryNode::normal();
        assert_eq!(requires_normal(&node, Fragment), NeededCoordinateSpace::WORLD);
        assert_eq!(
            node.set_space(CoordinateSpace::World).unwrap(),
            ModificationScope::Nothing
        );
        assert_eq!(
            node.set_space(CoordinateSpace::Object).unwrap(),
            ModificationScope::Graph
        );
        assert_eq!(requires_normal(&node, Vertex), NeededCoordinateSpace::OBJECT);
        node.set_space(CoordinateSpace::World).unwrap();
        for stage in [Vertex, Fragment, All] {
            assert_eq!(requires_normal(&node, stage), NeededCoordinateSpace::WORLD);
            assert!(requires_tangent(&node, stage).is_empty());
        }
        assert_eq!(node.variable_name_for_slot(OUTPUT_SLOT_ID), "IN.WorldSpaceNormal");
    }

    #[test]
    fn test_absolute_world_is_position_only() {
        let mut position = GeometryNode::position();
        assert!(position.set_space(CoordinateSpace::AbsoluteWorld).is_ok());
        assert_eq!(
            requires_position(&position, Vertex),
            NeededCoordinateSpace::ABSOLUTE_WORLD
        );
        assert_eq!(
            position.variable_name_for_slot(OUTPUT_SLOT_ID),
            "IN.AbsoluteWorldSpacePosition"
        );

        let mut tangent = GeometryNode::tangent();
        assert!(tangent.set_space(CoordinateSpace::AbsoluteWorld).is_err());
        assert_eq!(tangent.space(), CoordinateSpace::World);
    }

    #[test]
    fn test_space_param() {
        let mut node = GeometryNode::tangent();
        assert_eq!(
            node.apply_param("space", &serde_json::json!("tangent")).unwrap(),
            ModificationScope::Graph
        );
        assert_eq!(node.params()["space"], serde_json::json!("tangent"));
        assert!(node.apply_param("space", &serde_json::json!("screen")).is_err());
        assert!(node.apply_param("colour", &serde_json::json!("world")).is_err());
    }

    #[test]
    fn test_vertex_color() {
        let node = VertexColorNode::new();
        for stage in [Vertex, Fragment, All] {
            assert!(requires_vertex_color(&node, stage));
        }
        assert_eq!(node.variable_name_for_slot(OUTPUT_SLOT_ID), "IN.VertexColor");
        assert_eq!(node.type_name(), "VertexColor");
    }
}
