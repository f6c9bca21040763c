//! Capability queries and requirement aggregation.
//!
//! Slots and nodes advertise which geometric inputs they may need through
//! [`MayRequire::capabilities`]. Aggregation filters a collection by stage,
//! keeps the members that advertise the queried capability and ORs their
//! answers together. The fold is commutative, so the result never depends on
//! enumeration order.

use bitflags::bitflags;

use super::slot::MaterialSlot;
use super::space::NeededCoordinateSpace;
use super::stage::ShaderStageCapability;

bitflags! {
    /// Capability kinds a slot or node answers queries for.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        const NORMAL         = 1 << 0;
        const POSITION       = 1 << 1;
        const TANGENT        = 1 << 2;
        const BITANGENT      = 1 << 3;
        const VIEW_DIRECTION = 1 << 4;
        const VERTEX_ID      = 1 << 5;
        const VERTEX_COLOR   = 1 << 6;
    }
}

/// Geometric quantities needed in one or more coordinate spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpaceRequirement {
    Normal,
    Position,
    Tangent,
    Bitangent,
    ViewDirection,
}

/// Per-vertex values that are either needed or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagRequirement {
    VertexId,
    VertexColor,
}

impl SpaceRequirement {
    pub const ALL: [SpaceRequirement; 5] = [
        SpaceRequirement::Normal,
        SpaceRequirement::Position,
        SpaceRequirement::Tangent,
        SpaceRequirement::Bitangent,
        SpaceRequirement::ViewDirection,
    ];

    pub fn capability(self) -> Capabilities {
        match self {
            SpaceRequirement::Normal => Capabilities::NORMAL,
            SpaceRequirement::Position => Capabilities::POSITION,
            SpaceRequirement::Tangent => Capabilities::TANGENT,
            SpaceRequirement::Bitangent => Capabilities::BITANGENT,
            SpaceRequirement::ViewDirection => Capabilities::VIEW_DIRECTION,
        }
    }
}

impl FlagRequirement {
    pub fn capability(self) -> Capabilities {
        match self {
            FlagRequirement::VertexId => Capabilities::VERTEX_ID,
            FlagRequirement::VertexColor => Capabilities::VERTEX_COLOR,
        }
    }
}

/// Capability query protocol shared by slots and nodes.
///
/// Implementors must advertise every kind they answer in `capabilities`;
/// aggregation never asks about kinds that are not advertised. Queries must
/// not have side effects.
pub trait MayRequire {
    fn capabilities(&self) -> Capabilities;

    fn requires_space(
        &self,
        _kind: SpaceRequirement,
        _stage: ShaderStageCapability,
    ) -> NeededCoordinateSpace {
        NeededCoordinateSpace::empty()
    }

    fn requires_flag(&self, _kind: FlagRequirement, _stage: ShaderStageCapability) -> bool {
        false
    }
}

/// Items that are only valid in some pipeline stages.
pub trait StageScoped {
    fn stage_capability(&self) -> ShaderStageCapability;
}

impl StageScoped for MaterialSlot {
    fn stage_capability(&self) -> ShaderStageCapability {
        self.stage
    }
}

/// Union of the spaces `kind` is needed in by the stage-relevant items.
pub fn aggregate_space<'a, T, I>(
    items: I,
    kind: SpaceRequirement,
    stage: ShaderStageCapability,
) -> NeededCoordinateSpace
where
    T: MayRequire + StageScoped + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .filter(|item| item.stage_capability().admits(stage))
        .filter(|item| item.capabilities().contains(kind.capability()))
        .fold(NeededCoordinateSpace::empty(), |mask, item| {
            mask | item.requires_space(kind, stage)
        })
}

/// Whether any stage-relevant item needs the per-vertex value `kind`.
pub fn aggregate_flag<'a, T, I>(items: I, kind: FlagRequirement, stage: ShaderStageCapability) -> bool
where
    T: MayRequire + StageScoped + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .filter(|item| item.stage_capability().admits(stage))
        .filter(|item| item.capabilities().contains(kind.capability()))
        .fold(false, |needed, item| needed | item.requires_flag(kind, stage))
}

/// Spaces `node` needs `kind` in, or none if it does not advertise `kind`.
pub fn query_space<N: MayRequire + ?Sized>(
    node: &N,
    kind: SpaceRequirement,
    stage: ShaderStageCapability,
) -> NeededCoordinateSpace {
    if node.capabilities().contains(kind.capability()) {
        node.requires_space(kind, stage)
    } else {
        NeededCoordinateSpace::empty()
    }
}

/// Spaces the node needs the mesh normal in for `stage`.
pub fn requires_normal<N: MayRequire + ?Sized>(
    node: &N,
    stage: ShaderStageCapability,
) -> NeededCoordinateSpace {
    query_space(node, SpaceRequirement::Normal, stage)
}

/// Spaces the node needs the vertex position in for `stage`.
pub fn requires_position<N: MayRequire + ?Sized>(
    node: &N,
    stage: ShaderStageCapability,
) -> NeededCoordinateSpace {
    query_space(node, SpaceRequirement::Position, stage)
}

/// Spaces the node needs the mesh tangent in for `stage`.
pub fn requires_tangent<N: MayRequire + ?Sized>(
    node: &N,
    stage: ShaderStageCapability,
) -> NeededCoordinateSpace {
    query_space(node, SpaceRequirement::Tangent, stage)
}

/// Whether `node` needs the per-vertex value `kind`; false if not advertised.
pub fn query_flag<N: MayRequire + ?Sized>(
    node: &N,
    kind: FlagRequirement,
    stage: ShaderStageCapability,
) -> bool {
    node.capabilities().contains(kind.capability()) && node.requires_flag(kind, stage)
}

pub fn requires_vertex_id<N: MayRequire + ?Sized>(node: &N, stage: ShaderStageCapability) -> bool {
    query_flag(node, FlagRequirement::VertexId, stage)
}

pub fn requires_vertex_color<N: MayRequire + ?Sized>(
    node: &N,
    stage: ShaderStageCapability,
) -> bool {
    query_flag(node, FlagRequirement::VertexColor, stage)
}
