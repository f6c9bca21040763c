//! Slots and the per-node slot collection.
//!
//! A node's slot set is never edited piecemeal. The node declares the full set
//! it wants for its current settings and [`SlotCollection::reconcile`] swaps it
//! in by stable id, so the collection can't hold duplicates or a half-applied
//! declaration.

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::capability::{Capabilities, FlagRequirement, MayRequire, SpaceRequirement};
use super::space::{CoordinateSpace, NeededCoordinateSpace};
use super::stage::ShaderStageCapability;

/// Stable slot identifier, unique within a node.
pub type SlotId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Input,
    Output,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Default,
    Hdr,
}

/// What a slot carries, including its declared default.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotKind {
    Vector1 { value: f32 },
    Vector3 { value: [f32; 3] },
    ColorRgb { value: [f32; 3], mode: ColorMode },
    /// Falls back to the mesh position in `space` when unconnected.
    Position { space: CoordinateSpace },
    /// Falls back to the mesh normal in `space` when unconnected.
    Normal { space: CoordinateSpace },
    /// Falls back to the mesh tangent in `space` when unconnected.
    Tangent { space: CoordinateSpace },
}

impl SlotKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            SlotKind::Vector1 { .. } => "Vector1",
            SlotKind::Vector3 { .. } => "Vector3",
            SlotKind::ColorRgb { .. } => "ColorRGB",
            SlotKind::Position { .. } => "Position",
            SlotKind::Normal { .. } => "Normal",
            SlotKind::Tangent { .. } => "Tangent",
        }
    }

    /// Keep a user-edited value from `previous` when the slot is re-declared
    /// with the same value type. Geometric slots always take the declared space.
    fn adopt_value_from(&mut self, previous: &SlotKind) {
        match (self, previous) {
            (SlotKind::Vector1 { value }, SlotKind::Vector1 { value: old }) => *value = *old,
            (SlotKind::Vector3 { value }, SlotKind::Vector3 { value: old }) => *value = *old,
            (SlotKind::ColorRgb { value, mode }, SlotKind::ColorRgb { value: old, mode: old_mode })
                if *mode == *old_mode =>
            {
                *value = *old
            }
            _ => {}
        }
    }
}

/// One named input or output port on a node.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSlot {
    pub id: SlotId,
    pub display_name: String,
    pub shader_output_name: String,
    pub slot_type: SlotType,
    pub stage: ShaderStageCapability,
    pub kind: SlotKind,
    /// Host connection state. Geometric inputs only need their built-in
    /// fallback while nothing is connected.
    pub connected: bool,
}

impl MaterialSlot {
    pub fn new(
        id: SlotId,
        name: impl Into<String>,
        slot_type: SlotType,
        kind: SlotKind,
        stage: ShaderStageCapability,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            shader_output_name: name.clone(),
            display_name: name,
            slot_type,
            stage,
            kind,
            connected: false,
        }
    }

    pub fn vector1(
        id: SlotId,
        name: impl Into<String>,
        slot_type: SlotType,
        value: f32,
        stage: ShaderStageCapability,
    ) -> Self {
        Self::new(id, name, slot_type, SlotKind::Vector1 { value }, stage)
    }

    pub fn vector3(
        id: SlotId,
        name: impl Into<String>,
        slot_type: SlotType,
        value: [f32; 3],
        stage: ShaderStageCapability,
    ) -> Self {
        Self::new(id, name, slot_type, SlotKind::Vector3 { value }, stage)
    }

    pub fn color_rgb(
        id: SlotId,
        name: impl Into<String>,
        slot_type: SlotType,
        value: [f32; 3],
        mode: ColorMode,
        stage: ShaderStageCapability,
    ) -> Self {
        Self::new(id, name, slot_type, SlotKind::ColorRgb { value, mode }, stage)
    }

    pub fn position(
        id: SlotId,
        name: impl Into<String>,
        space: CoordinateSpace,
        stage: ShaderStageCapability,
    ) -> Self {
        Self::new(id, name, SlotType::Input, SlotKind::Position { space }, stage)
    }

    pub fn normal(
        id: SlotId,
        name: impl Into<String>,
        space: CoordinateSpace,
        stage: ShaderStageCapability,
    ) -> Self {
        Self::new(id, name, SlotType::Input, SlotKind::Normal { space }, stage)
    }

    pub fn tangent(
        id: SlotId,
        name: impl Into<String>,
        space: CoordinateSpace,
        stage: ShaderStageCapability,
    ) -> Self {
        Self::new(id, name, SlotType::Input, SlotKind::Tangent { space }, stage)
    }

    pub fn is_input(&self) -> bool {
        self.slot_type == SlotType::Input
    }

    pub fn is_output(&self) -> bool {
        self.slot_type == SlotType::Output
    }

    /// Space of the geometric fallback this slot needs, if any.
    fn fallback_space(&self, kind: SpaceRequirement) -> NeededCoordinateSpace {
        if self.connected {
            return NeededCoordinateSpace::empty();
        }
        match (&self.kind, kind) {
            (SlotKind::Position { space }, SpaceRequirement::Position)
            | (SlotKind::Normal { space }, SpaceRequirement::Normal)
            | (SlotKind::Tangent { space }, SpaceRequirement::Tangent) => space.to_needed(),
            _ => NeededCoordinateSpace::empty(),
        }
    }
}

impl MayRequire for MaterialSlot {
    fn capabilities(&self) -> Capabilities {
        match self.kind {
            SlotKind::Position { .. } => Capabilities::POSITION,
            SlotKind::Normal { .. } => Capabilities::NORMAL,
            SlotKind::Tangent { .. } => Capabilities::TANGENT,
            _ => Capabilities::empty(),
        }
    }

    fn requires_space(
        &self,
        kind: SpaceRequirement,
        _stage: ShaderStageCapability,
    ) -> NeededCoordinateSpace {
        self.fallback_space(kind)
    }

    fn requires_flag(&self, _kind: FlagRequirement, _stage: ShaderStageCapability) -> bool {
        false
    }
}

/// Result of a reconcile, listed by slot id in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotDiff {
    pub added: Vec<SlotId>,
    pub removed: Vec<SlotId>,
    pub refreshed: Vec<SlotId>,
}

impl SlotDiff {
    /// True when the set of slot ids did not change.
    pub fn is_topology_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered slot set owned by a node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotCollection {
    slots: Vec<MaterialSlot>,
}

impl SlotCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MaterialSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: SlotId) -> Option<&MaterialSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut MaterialSlot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<SlotId> {
        self.slots.iter().map(|s| s.id).collect()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &MaterialSlot> {
        self.slots.iter().filter(|s| s.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &MaterialSlot> {
        self.slots.iter().filter(|s| s.is_output())
    }

    /// Record host connection state for a slot. Returns false if no such slot.
    pub fn set_connected(&mut self, id: SlotId, connected: bool) -> bool {
        match self.get_mut(id) {
            Some(slot) => {
                slot.connected = connected;
                true
            }
            None => false,
        }
    }

    pub fn is_connected(&self, id: SlotId) -> bool {
        self.get(id).is_some_and(|s| s.connected)
    }

    /// Replace the slot set with `desired`, matching existing slots by id.
    ///
    /// Slots whose id is not declared are dropped. Surviving slots take the new
    /// declaration but keep their connection state and any edited value of the
    /// same type. The first declaration of a duplicated id wins.
    pub fn reconcile(&mut self, desired: Vec<MaterialSlot>) -> SlotDiff {
        let mut diff = SlotDiff::default();
        let mut seen: HashSet<SlotId> = HashSet::with_capacity(desired.len());
        let mut next: Vec<MaterialSlot> = Vec::with_capacity(desired.len());

        for mut slot in desired {
            if !seen.insert(slot.id) {
                warn!(
                    "slot id {} declared twice ({:?}); keeping the first declaration",
                    slot.id, slot.display_name
                );
                continue;
            }
            match self.get(slot.id) {
                Some(previous) => {
                    slot.connected = previous.connected;
                    slot.kind.adopt_value_from(&previous.kind);
                    diff.refreshed.push(slot.id);
                }
                None => diff.added.push(slot.id),
            }
            next.push(slot);
        }

        diff.removed = self
            .slots
            .iter()
            .map(|s| s.id)
            .filter(|id| !seen.contains(id))
            .collect();

        if !diff.is_topology_unchanged() {
            debug!(
                "slot reconcile: added {:?}, removed {:?}",
                diff.added, diff.removed
            );
        }

        self.slots = next;
        diff
    }
}

impl<'a> IntoIterator for &'a SlotCollection {
    type Item = &'a MaterialSlot;
    type IntoIter = std::slice::Iter<'a, MaterialSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
