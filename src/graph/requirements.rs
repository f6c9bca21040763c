//! Graph-wide requirement records.

use super::capability::{FlagRequirement, MayRequire, SpaceRequirement, query_flag, query_space};
use super::node::ShaderNode;
use super::space::NeededCoordinateSpace;
use super::stage::ShaderStageCapability;

/// Everything a set of nodes needs from the mesh for one stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphRequirements {
    pub normal: NeededCoordinateSpace,
    pub position: NeededCoordinateSpace,
    pub tangent: NeededCoordinateSpace,
    pub bitangent: NeededCoordinateSpace,
    pub view_direction: NeededCoordinateSpace,
    pub vertex_id: bool,
    pub vertex_color: bool,
}

impl GraphRequirements {
    /// Requirements of a single node for `stage`.
    pub fn of_node<N: MayRequire + ?Sized>(node: &N, stage: ShaderStageCapability) -> Self {
        Self {
            normal: query_space(node, SpaceRequirement::Normal, stage),
            position: query_space(node, SpaceRequirement::Position, stage),
            tangent: query_space(node, SpaceRequirement::Tangent, stage),
            bitangent: query_space(node, SpaceRequirement::Bitangent, stage),
            view_direction: query_space(node, SpaceRequirement::ViewDirection, stage),
            vertex_id: query_flag(node, FlagRequirement::VertexId, stage),
            vertex_color: query_flag(node, FlagRequirement::VertexColor, stage),
        }
    }

    /// Fold the requirements of every node for `stage`.
    pub fn from_nodes<'a, I>(nodes: I, stage: ShaderStageCapability) -> Self
    where
        I: IntoIterator<Item = &'a dyn ShaderNode>,
    {
        nodes
            .into_iter()
            .fold(Self::default(), |acc, node| acc.union(Self::of_node(node, stage)))
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            normal: self.normal | other.normal,
            position: self.position | other.position,
            tangent: self.tangent | other.tangent,
            bitangent: self.bitangent | other.bitangent,
            view_direction: self.view_direction | other.view_direction,
            vertex_id: self.vertex_id || other.vertex_id,
            vertex_color: self.vertex_color || other.vertex_color,
        }
    }

    pub fn space(&self, kind: SpaceRequirement) -> NeededCoordinateSpace {
        match kind {
            SpaceRequirement::Normal => self.normal,
            SpaceRequirement::Position => self.position,
            SpaceRequirement::Tangent => self.tangent,
            SpaceRequirement::Bitangent => self.bitangent,
            SpaceRequirement::ViewDirection => self.view_direction,
        }
    }

    /// Anything expressed in tangent space needs the full TBN frame.
    pub fn needs_tangent_frame(&self) -> bool {
        SpaceRequirement::ALL
            .into_iter()
            .any(|kind| self.space(kind).contains(NeededCoordinateSpace::TANGENT))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
