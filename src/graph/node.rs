//! Node trait, modification scopes and the compare-then-apply setting helper.

use anyhow::{Result, bail};
use serde_json::{Map, Value};

use super::capability::MayRequire;
use super::slot::{SlotCollection, SlotDiff, SlotId};
use crate::render_state::MaterialOptions;

/// How much of the graph a settings change invalidates.
///
/// Ordered by severity, so merging two scopes is `max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModificationScope {
    /// Value was unchanged; nothing to do.
    #[default]
    Nothing,
    /// Generated output changed, slot set did not.
    Graph,
    /// Slot set was re-declared; downstream connections may be stale.
    Topological,
}

impl ModificationScope {
    pub fn is_dirty(self) -> bool {
        self != ModificationScope::Nothing
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreviewMode {
    #[default]
    Inherit,
    Preview2D,
    Preview3D,
}

/// Store `value` in `field` if it differs and report `scope`, otherwise report
/// [`ModificationScope::Nothing`].
pub fn update_setting<T: PartialEq>(
    field: &mut T,
    value: T,
    scope: ModificationScope,
) -> ModificationScope {
    if *field == value {
        return ModificationScope::Nothing;
    }
    *field = value;
    scope
}

/// Replace characters that are not valid in HLSL identifiers.
pub fn hlsl_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Master nodes describe the surface the generated passes render.
pub trait MasterNode {
    fn material_options(&self) -> MaterialOptions;

    /// Preprocessor defines selected by the node's settings.
    fn feature_defines(&self) -> Vec<&'static str>;
}

/// A unit of the shader graph: a slot set plus settings.
pub trait ShaderNode: MayRequire {
    /// Registry type name, as used in graph documents.
    fn type_name(&self) -> &'static str;

    /// Display name.
    fn name(&self) -> &str;

    fn slots(&self) -> &SlotCollection;

    fn slots_mut(&mut self) -> &mut SlotCollection;

    /// Re-declare slots from the current settings. Runs at construction,
    /// after deserialization and after every topological settings change.
    fn update_after_deserialization(&mut self) -> SlotDiff;

    fn has_preview(&self) -> bool {
        false
    }

    fn preview_mode(&self) -> PreviewMode {
        PreviewMode::Inherit
    }

    fn variable_name_for_slot(&self, slot_id: SlotId) -> String {
        let slot_name = self
            .slots()
            .get(slot_id)
            .map(|s| hlsl_safe_name(&s.shader_output_name))
            .unwrap_or_else(|| slot_id.to_string());
        format!("_{}_{}", hlsl_safe_name(self.name()), slot_name)
    }

    /// Current settings, keyed as in graph documents.
    fn params(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Apply one setting by document key.
    fn apply_param(&mut self, key: &str, _value: &Value) -> Result<ModificationScope> {
        bail!("{} node has no setting '{key}'", self.type_name())
    }

    fn as_master(&self) -> Option<&dyn MasterNode> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_setting_same_value_is_nothing() {
        let mut flag = true;
        assert_eq!(
            update_setting(&mut flag, true, ModificationScope::Topological),
            ModificationScope::Nothing
        );
        assert!(flag);
    }

    #[test]
    fn test_update_setting_new_value_reports_scope() {
        let mut flag = false;
        assert_eq!(
            update_setting(&mut flag, true, ModificationScope::Graph),
            ModificationScope::Graph
        );
        assert!(flag);
    }

    #[test]
    fn test_scope_ordering() {
        assert!(ModificationScope::Topological > ModificationScope::Graph);
        assert_eq!(
            ModificationScope::Graph.max(ModificationScope::Nothing),
            ModificationScope::Graph
        );
        assert!(!ModificationScope::Nothing.is_dirty());
    }

    #[test]
    fn test_hlsl_safe_name() {
        assert_eq!(hlsl_safe_name("Vertex Position"), "Vertex_Position");
        assert_eq!(hlsl_safe_name("GSAA-Variance"), "GSAA_Variance");
    }
}
