//! PBR surface master node.
//!
//! The slot set is a pure function of [`PbrSettings`] ([`declare_slots`]).
//! Setters that can change it re-declare immediately and report
//! [`ModificationScope::Topological`]; the rest report
//! [`ModificationScope::Graph`]. The specular model reuses the Metallic
//! slot, so switching models keeps its connection.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dsl::{param_bool, param_str};
use crate::graph::capability::{Capabilities, MayRequire, SpaceRequirement, aggregate_space};
use crate::graph::node::{MasterNode, ModificationScope, ShaderNode, update_setting};
use crate::graph::slot::{ColorMode, MaterialSlot, SlotCollection, SlotDiff, SlotId, SlotType};
use crate::graph::space::{CoordinateSpace, NeededCoordinateSpace};
use crate::graph::stage::ShaderStageCapability::{self, Fragment, Vertex};
use crate::render_state::{
    AlphaMode, MaterialOptions, SurfaceType, parse_alpha_mode, parse_surface_type,
};

pub const ALBEDO_SLOT_NAME: &str = "Albedo";
pub const NORMAL_SLOT_NAME: &str = "Normal";
pub const EMISSION_SLOT_NAME: &str = "Emission";
pub const METALLIC_SLOT_NAME: &str = "Metallic";
pub const SMOOTHNESS_SLOT_NAME: &str = "Smoothness";
pub const OCCLUSION_SLOT_NAME: &str = "Occlusion";
pub const ALPHA_SLOT_NAME: &str = "Alpha";
pub const ALPHA_CLIP_THRESHOLD_SLOT_NAME: &str = "AlphaClipThreshold";
pub const POSITION_NAME: &str = "Vertex Position";
pub const VERT_NORMAL_NAME: &str = "Vertex Normal";
pub const VERT_TANGENT_NAME: &str = "Vertex Tangent";
pub const VERT_COLOR_NAME: &str = "Vertex Color";
pub const VERT_ALPHA_NAME: &str = "Vertex Alpha";
pub const REFLECTANCE_NAME: &str = "Reflectance";
pub const GSAA_VARIANCE_NAME: &str = "GSAA Variance";
pub const GSAA_THRESHOLD_NAME: &str = "GSAA Threshold";
pub const ANISOTROPY_TANGENT_NAME: &str = "Tangent";
pub const ANISOTROPY_LEVEL_NAME: &str = "Anisotropy";

pub const ALBEDO_SLOT_ID: SlotId = 0;
pub const NORMAL_SLOT_ID: SlotId = 1;
pub const METALLIC_SLOT_ID: SlotId = 2;
pub const EMISSION_SLOT_ID: SlotId = 4;
pub const SMOOTHNESS_SLOT_ID: SlotId = 5;
pub const OCCLUSION_SLOT_ID: SlotId = 6;
pub const ALPHA_SLOT_ID: SlotId = 7;
pub const ALPHA_THRESHOLD_SLOT_ID: SlotId = 8;
pub const POSITION_SLOT_ID: SlotId = 9;
pub const VERT_NORMAL_SLOT_ID: SlotId = 10;
pub const VERT_TANGENT_SLOT_ID: SlotId = 11;
pub const REFLECTANCE_SLOT_ID: SlotId = 12;
pub const GSAA_VARIANCE_SLOT_ID: SlotId = 13;
pub const GSAA_THRESHOLD_SLOT_ID: SlotId = 14;
pub const ANISOTROPY_TANGENT_SLOT_ID: SlotId = 15;
pub const ANISOTROPY_LEVEL_SLOT_ID: SlotId = 16;
pub const VERT_COLOR_SLOT_ID: SlotId = 17;
pub const VERT_ALPHA_SLOT_ID: SlotId = 18;

/// Mid grey (0.5 linear) converted to gamma space.
const GREY_GAMMA: [f32; 3] = [0.735_357; 3];
const BLACK: [f32; 3] = [0.0; 3];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    Specular,
    #[default]
    Metallic,
}

/// Space the fragment normal input is interpreted in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalDropOffSpace {
    #[default]
    Tangent,
    Object,
    World,
}

impl NormalDropOffSpace {
    pub fn coordinate_space(self) -> CoordinateSpace {
        match self {
            NormalDropOffSpace::Tangent => CoordinateSpace::Tangent,
            NormalDropOffSpace::Object => CoordinateSpace::Object,
            NormalDropOffSpace::World => CoordinateSpace::World,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(match CoordinateSpace::parse(s) {
            Some(CoordinateSpace::Tangent) => NormalDropOffSpace::Tangent,
            Some(CoordinateSpace::Object) => NormalDropOffSpace::Object,
            Some(CoordinateSpace::World) => NormalDropOffSpace::World,
            _ => bail!("unsupported normal drop-off space: {s}"),
        })
    }
}

impl Model {
    pub fn parse(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "specular" => Model::Specular,
            "metallic" => Model::Metallic,
            other => bail!("unsupported PBR model: {other}"),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PbrSettings {
    pub model: Model,
    pub surface_type: SurfaceType,
    pub alpha_mode: AlphaMode,
    pub two_sided: bool,
    pub normal_drop_off_space: NormalDropOffSpace,
    pub bicubic_lightmap: bool,
    pub gsaa: bool,
    pub anisotropy: bool,
    pub flat_lit: bool,
}

/// Slots the master node exposes for `settings`, in display order.
pub fn declare_slots(settings: &PbrSettings) -> Vec<MaterialSlot> {
    let mut slots = vec![
        MaterialSlot::position(POSITION_SLOT_ID, POSITION_NAME, CoordinateSpace::Object, Vertex),
        MaterialSlot::normal(VERT_NORMAL_SLOT_ID, VERT_NORMAL_NAME, CoordinateSpace::Object, Vertex),
        MaterialSlot::tangent(VERT_TANGENT_SLOT_ID, VERT_TANGENT_NAME, CoordinateSpace::Object, Vertex),
        MaterialSlot::color_rgb(
            VERT_COLOR_SLOT_ID,
            VERT_COLOR_NAME,
            SlotType::Input,
            GREY_GAMMA,
            ColorMode::Default,
            Vertex,
        ),
        MaterialSlot::vector1(VERT_ALPHA_SLOT_ID, VERT_ALPHA_NAME, SlotType::Input, 1.0, Vertex),
        MaterialSlot::color_rgb(
            ALBEDO_SLOT_ID,
            ALBEDO_SLOT_NAME,
            SlotType::Input,
            GREY_GAMMA,
            ColorMode::Default,
            Fragment,
        ),
        MaterialSlot::normal(
            NORMAL_SLOT_ID,
            NORMAL_SLOT_NAME,
            settings.normal_drop_off_space.coordinate_space(),
            Fragment,
        ),
        MaterialSlot::color_rgb(
            EMISSION_SLOT_ID,
            EMISSION_SLOT_NAME,
            SlotType::Input,
            BLACK,
            ColorMode::Default,
            Fragment,
        ),
        MaterialSlot::vector1(METALLIC_SLOT_ID, METALLIC_SLOT_NAME, SlotType::Input, 0.0, Fragment),
        MaterialSlot::vector1(SMOOTHNESS_SLOT_ID, SMOOTHNESS_SLOT_NAME, SlotType::Input, 0.5, Fragment),
        MaterialSlot::vector1(REFLECTANCE_SLOT_ID, REFLECTANCE_NAME, SlotType::Input, 0.5, Fragment),
        MaterialSlot::vector1(OCCLUSION_SLOT_ID, OCCLUSION_SLOT_NAME, SlotType::Input, 1.0, Fragment),
        MaterialSlot::vector1(ALPHA_SLOT_ID, ALPHA_SLOT_NAME, SlotType::Input, 1.0, Fragment),
        MaterialSlot::vector1(
            ALPHA_THRESHOLD_SLOT_ID,
            ALPHA_CLIP_THRESHOLD_SLOT_NAME,
            SlotType::Input,
            0.0,
            Fragment,
        ),
    ];

    if settings.gsaa {
        slots.push(MaterialSlot::vector1(
            GSAA_VARIANCE_SLOT_ID,
            GSAA_VARIANCE_NAME,
            SlotType::Input,
            0.15,
            Fragment,
        ));
        slots.push(MaterialSlot::vector1(
            GSAA_THRESHOLD_SLOT_ID,
            GSAA_THRESHOLD_NAME,
            SlotType::Input,
            0.1,
            Fragment,
        ));
    }

    if settings.anisotropy {
        slots.push(MaterialSlot::tangent(
            ANISOTROPY_TANGENT_SLOT_ID,
            ANISOTROPY_TANGENT_NAME,
            CoordinateSpace::Tangent,
            Fragment,
        ));
        slots.push(MaterialSlot::vector1(
            ANISOTROPY_LEVEL_SLOT_ID,
            ANISOTROPY_LEVEL_NAME,
            SlotType::Input,
            0.0,
            Fragment,
        ));
    }

    slots
}

#[derive(Clone, Debug)]
pub struct PbrMasterNode {
    name: String,
    settings: PbrSettings,
    slots: SlotCollection,
}

impl Default for PbrMasterNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PbrMasterNode {
    pub const TYPE_NAME: &'static str = "PBRMaster";

    pub fn new() -> Self {
        Self::with_settings(PbrSettings::default())
    }

    pub fn with_settings(settings: PbrSettings) -> Self {
        let mut node = Self {
            name: "PBR Master".to_string(),
            settings,
            slots: SlotCollection::new(),
        };
        node.update_after_deserialization();
        node
    }

    pub fn settings(&self) -> &PbrSettings {
        &self.settings
    }

    fn topological(&mut self, scope: ModificationScope) -> ModificationScope {
        if scope.is_dirty() {
            self.update_after_deserialization();
        }
        scope
    }

    pub fn set_model(&mut self, model: Model) -> ModificationScope {
        let scope = update_setting(&mut self.settings.model, model, ModificationScope::Topological);
        self.topological(scope)
    }

    pub fn set_surface_type(&mut self, surface_type: SurfaceType) -> ModificationScope {
        update_setting(&mut self.settings.surface_type, surface_type, ModificationScope::Graph)
    }

    pub fn set_alpha_mode(&mut self, alpha_mode: AlphaMode) -> ModificationScope {
        update_setting(&mut self.settings.alpha_mode, alpha_mode, ModificationScope::Graph)
    }

    pub fn set_two_sided(&mut self, two_sided: bool) -> ModificationScope {
        update_setting(&mut self.settings.two_sided, two_sided, ModificationScope::Graph)
    }

    pub fn set_normal_drop_off_space(&mut self, space: NormalDropOffSpace) -> ModificationScope {
        let scope = update_setting(
            &mut self.settings.normal_drop_off_space,
            space,
            ModificationScope::Topological,
        );
        self.topological(scope)
    }

    pub fn set_anisotropy(&mut self, anisotropy: bool) -> ModificationScope {
        let scope = update_setting(
            &mut self.settings.anisotropy,
            anisotropy,
            ModificationScope::Topological,
        );
        self.topological(scope)
    }

    pub fn set_gsaa(&mut self, gsaa: bool) -> ModificationScope {
        let scope = update_setting(&mut self.settings.gsaa, gsaa, ModificationScope::Topological);
        self.topological(scope)
    }

    pub fn set_flat_lit(&mut self, flat_lit: bool) -> ModificationScope {
        update_setting(&mut self.settings.flat_lit, flat_lit, ModificationScope::Graph)
    }

    pub fn set_bicubic_lightmap(&mut self, bicubic_lightmap: bool) -> ModificationScope {
        update_setting(
            &mut self.settings.bicubic_lightmap,
            bicubic_lightmap,
            ModificationScope::Graph,
        )
    }
}

impl MayRequire for PbrMasterNode {
    fn capabilities(&self) -> Capabilities {
        Capabilities::NORMAL | Capabilities::POSITION | Capabilities::TANGENT
    }

    fn requires_space(
        &self,
        kind: SpaceRequirement,
        stage: ShaderStageCapability,
    ) -> NeededCoordinateSpace {
        aggregate_space(&self.slots, kind, stage)
    }
}

impl MasterNode for PbrMasterNode {
    fn material_options(&self) -> MaterialOptions {
        MaterialOptions::new(
            self.settings.surface_type,
            self.settings.alpha_mode,
            self.settings.two_sided,
        )
    }

    fn feature_defines(&self) -> Vec<&'static str> {
        let s = &self.settings;
        let mut defines = Vec::new();
        if s.model == Model::Specular {
            defines.push("_SPECULAR_SETUP");
        }
        if s.surface_type == SurfaceType::Transparent {
            defines.push("_SURFACE_TYPE_TRANSPARENT");
            if s.alpha_mode == AlphaMode::Premultiply {
                defines.push("_ALPHAPREMULTIPLY_ON");
            }
        }
        defines.push(match s.normal_drop_off_space {
            NormalDropOffSpace::Tangent => "_NORMAL_DROPOFF_TS",
            NormalDropOffSpace::Object => "_NORMAL_DROPOFF_OS",
            NormalDropOffSpace::World => "_NORMAL_DROPOFF_WS",
        });
        if s.gsaa {
            defines.push("_GSAA");
        }
        if s.anisotropy {
            defines.push("_ANISOTROPY");
        }
        if s.flat_lit {
            defines.push("_FLAT_LIT");
        }
        if s.bicubic_lightmap {
            defines.push("_BICUBIC_LIGHTMAP");
        }
        defines
    }
}

impl ShaderNode for PbrMasterNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn slots(&self) -> &SlotCollection {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut SlotCollection {
        &mut self.slots
    }

    fn update_after_deserialization(&mut self) -> SlotDiff {
        self.slots.reconcile(declare_slots(&self.settings))
    }

    fn params(&self) -> Map<String, Value> {
        let s = &self.settings;
        let mut map = Map::new();
        map.insert("model".into(), serde_json::to_value(s.model).unwrap_or(Value::Null));
        map.insert(
            "surfaceType".into(),
            serde_json::to_value(s.surface_type).unwrap_or(Value::Null),
        );
        map.insert(
            "alphaMode".into(),
            serde_json::to_value(s.alpha_mode).unwrap_or(Value::Null),
        );
        map.insert("twoSided".into(), Value::Bool(s.two_sided));
        map.insert(
            "normalDropOffSpace".into(),
            serde_json::to_value(s.normal_drop_off_space).unwrap_or(Value::Null),
        );
        map.insert("bicubicLightmap".into(), Value::Bool(s.bicubic_lightmap));
        map.insert("gsaa".into(), Value::Bool(s.gsaa));
        map.insert("anisotropy".into(), Value::Bool(s.anisotropy));
        map.insert("flatLit".into(), Value::Bool(s.flat_lit));
        map
    }

    fn apply_param(&mut self, key: &str, value: &Value) -> Result<ModificationScope> {
        Ok(match key {
            "model" => self.set_model(Model::parse(param_str(key, value)?)?),
            "surfaceType" => self.set_surface_type(parse_surface_type(param_str(key, value)?)?),
            "alphaMode" => self.set_alpha_mode(parse_alpha_mode(param_str(key, value)?)?),
            "twoSided" => self.set_two_sided(param_bool(key, value)?),
            "normalDropOffSpace" => {
                self.set_normal_drop_off_space(NormalDropOffSpace::parse(param_str(key, value)?)?)
            }
            "bicubicLightmap" => self.set_bicubic_lightmap(param_bool(key, value)?),
            "gsaa" => self.set_gsaa(param_bool(key, value)?),
            "anisotropy" => self.set_anisotropy(param_bool(key, value)?),
            "flatLit" => self.set_flat_lit(param_bool(key, value)?),
            other => bail!("{} node has no setting '{other}'", Self::TYPE_NAME),
        })
    }

    fn as_master(&self) -> Option<&dyn MasterNode> {
        Some(self)
    }
}
