//! Render state for generated shader passes.
//!
//! [`MaterialOptions`] resolves surface settings into concrete blend, cull and
//! depth state. Pass helpers write ShaderLab-style directive strings into a
//! [`ShaderPass`]; the forward pass reads its state from material properties so
//! a single shader serves opaque and transparent materials.

use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    #[default]
    Opaque,
    Transparent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    #[default]
    Alpha,
    Premultiply,
    Additive,
    Multiply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Zero,
    One,
    DstColor,
    SrcColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcColor,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
    OneMinusSrcAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullMode {
    Off,
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZTest {
    Less,
    Greater,
    LEqual,
    GEqual,
    Equal,
    NotEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZWrite {
    On,
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderQueue {
    Background,
    Geometry,
    AlphaTest,
    Transparent,
    Overlay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderType {
    Opaque,
    Transparent,
}

impl BlendMode {
    /// Value of the engine's blend-mode enum, used for material property defaults.
    pub fn engine_value(self) -> u32 {
        match self {
            BlendMode::Zero => 0,
            BlendMode::One => 1,
            BlendMode::DstColor => 2,
            BlendMode::SrcColor => 3,
            BlendMode::OneMinusDstColor => 4,
            BlendMode::SrcAlpha => 5,
            BlendMode::OneMinusSrcColor => 6,
            BlendMode::DstAlpha => 7,
            BlendMode::OneMinusDstAlpha => 8,
            BlendMode::SrcAlphaSaturate => 9,
            BlendMode::OneMinusSrcAlpha => 10,
        }
    }
}

impl CullMode {
    pub fn engine_value(self) -> u32 {
        match self {
            CullMode::Off => 0,
            CullMode::Front => 1,
            CullMode::Back => 2,
        }
    }
}

impl RenderQueue {
    pub fn value(self) -> u32 {
        match self {
            RenderQueue::Background => 1000,
            RenderQueue::Geometry => 2000,
            RenderQueue::AlphaTest => 2450,
            RenderQueue::Transparent => 3000,
            RenderQueue::Overlay => 4000,
        }
    }
}

macro_rules! display_as_debug {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self, f)
                }
            }
        )*
    };
}

display_as_debug!(BlendMode, CullMode, ZTest, ZWrite, RenderQueue, RenderType);

/// Concrete render state resolved from surface settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialOptions {
    pub src_blend: BlendMode,
    pub dst_blend: BlendMode,
    pub cull_mode: CullMode,
    pub z_test: ZTest,
    pub z_write: ZWrite,
    pub render_queue: RenderQueue,
    pub render_type: RenderType,
}

impl MaterialOptions {
    pub fn new(surface_type: SurfaceType, alpha_mode: AlphaMode, two_sided: bool) -> Self {
        let cull_mode = if two_sided { CullMode::Off } else { CullMode::Back };
        match surface_type {
            SurfaceType::Opaque => Self {
                src_blend: BlendMode::One,
                dst_blend: BlendMode::Zero,
                cull_mode,
                z_test: ZTest::LEqual,
                z_write: ZWrite::On,
                render_queue: RenderQueue::Geometry,
                render_type: RenderType::Opaque,
            },
            SurfaceType::Transparent => {
                let (src_blend, dst_blend) = match alpha_mode {
                    AlphaMode::Alpha => (BlendMode::SrcAlpha, BlendMode::OneMinusSrcAlpha),
                    AlphaMode::Premultiply => (BlendMode::One, BlendMode::OneMinusSrcAlpha),
                    AlphaMode::Additive => (BlendMode::One, BlendMode::One),
                    AlphaMode::Multiply => (BlendMode::DstColor, BlendMode::Zero),
                };
                Self {
                    src_blend,
                    dst_blend,
                    cull_mode,
                    z_test: ZTest::LEqual,
                    z_write: ZWrite::Off,
                    render_queue: RenderQueue::Transparent,
                    render_type: RenderType::Transparent,
                }
            }
        }
    }

    /// Defaults for the material properties the forward pass reads its state from.
    pub fn property_defaults(&self) -> Vec<(&'static str, u32)> {
        vec![
            ("_SrcBlend", self.src_blend.engine_value()),
            ("_DstBlend", self.dst_blend.engine_value()),
            ("_ZWrite", u32::from(self.z_write == ZWrite::On)),
            ("_Cull", self.cull_mode.engine_value()),
        ]
    }
}

/// Which generated pass a [`ShaderPass`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    ForwardBase,
    ShadowCaster,
}

impl PassKind {
    pub fn pass_name(self) -> &'static str {
        match self {
            PassKind::ForwardBase => "FORWARD",
            PassKind::ShadowCaster => "SHADOWCASTER",
        }
    }

    pub fn light_mode(self) -> &'static str {
        match self {
            PassKind::ForwardBase => "ForwardBase",
            PassKind::ShadowCaster => "ShadowCaster",
        }
    }
}

/// Render-state overrides for one generated pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderPass {
    pub kind: PassKind,
    pub zwrite_override: Option<String>,
    pub cull_override: Option<String>,
    pub blend_override: Option<String>,
    pub ztest_override: Option<String>,
}

impl ShaderPass {
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            zwrite_override: None,
            cull_override: None,
            blend_override: None,
            ztest_override: None,
        }
    }

    /// Overrides in emission order: blend, cull, depth test, depth write.
    pub fn directives(&self) -> impl Iterator<Item = &str> {
        [
            &self.blend_override,
            &self.cull_override,
            &self.ztest_override,
            &self.zwrite_override,
        ]
        .into_iter()
        .filter_map(|o| o.as_deref())
    }
}

/// Forward pass: all state comes from material properties.
pub fn set_render_state_forward_base_pass(pass: &mut ShaderPass) {
    pass.zwrite_override = Some("ZWrite [_ZWrite]".to_string());
    pass.cull_override = Some("Cull [_Cull]".to_string());
    pass.blend_override = Some("Blend [_SrcBlend] [_DstBlend]".to_string());
}

/// Shadow caster: always writes depth, culls like the material.
pub fn set_render_state_shadow_caster_pass(pass: &mut ShaderPass) {
    pass.zwrite_override = Some("ZWrite On".to_string());
    pass.cull_override = Some("Cull [_Cull]".to_string());
    pass.ztest_override = Some("ZTest LEqual".to_string());
}

/// Build a pass of `kind` with its render state applied.
pub fn configured_pass(kind: PassKind) -> ShaderPass {
    let mut pass = ShaderPass::new(kind);
    match kind {
        PassKind::ForwardBase => set_render_state_forward_base_pass(&mut pass),
        PassKind::ShadowCaster => set_render_state_shadow_caster_pass(&mut pass),
    }
    pass
}

fn normalize_token(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "")
}

pub fn parse_surface_type(s: &str) -> Result<SurfaceType> {
    Ok(match normalize_token(s).as_str() {
        "opaque" => SurfaceType::Opaque,
        "transparent" => SurfaceType::Transparent,
        other => bail!("unsupported surface type: {other}"),
    })
}

pub fn parse_alpha_mode(s: &str) -> Result<AlphaMode> {
    Ok(match normalize_token(s).as_str() {
        "alpha" | "blend" => AlphaMode::Alpha,
        "premultiply" | "premultiplied" | "premul" => AlphaMode::Premultiply,
        "additive" | "add" => AlphaMode::Additive,
        "multiply" | "mul" => AlphaMode::Multiply,
        other => bail!("unsupported alpha mode: {other}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_base_overrides() {
        let pass = configured_pass(PassKind::ForwardBase);
        assert_eq!(pass.zwrite_override.as_deref(), Some("ZWrite [_ZWrite]"));
        assert_eq!(pass.cull_override.as_deref(), Some("Cull [_Cull]"));
        assert_eq!(pass.blend_override.as_deref(), Some("Blend [_SrcBlend] [_DstBlend]"));
        assert_eq!(pass.ztest_override, None);
    }

    #[test]
    fn test_shadow_caster_overrides() {
        let pass = configured_pass(PassKind::ShadowCaster);
        assert_eq!(pass.zwrite_override.as_deref(), Some("ZWrite On"));
        assert_eq!(pass.cull_override.as_deref(), Some("Cull [_Cull]"));
        assert_eq!(pass.ztest_override.as_deref(), Some("ZTest LEqual"));
        assert_eq!(pass.blend_override, None);
        let directives: Vec<_> = pass.directives().collect();
        assert_eq!(directives, vec!["Cull [_Cull]", "ZTest LEqual", "ZWrite On"]);
    }

    #[test]
    fn test_opaque_options() {
        let opts = MaterialOptions::new(SurfaceType::Opaque, AlphaMode::Additive, false);
        assert_eq!(opts.src_blend, BlendMode::One);
        assert_eq!(opts.dst_blend, BlendMode::Zero);
        assert_eq!(opts.cull_mode, CullMode::Back);
        assert_eq!(opts.z_write, ZWrite::On);
        assert_eq!(opts.render_queue.value(), 2000);
        assert_eq!(opts.render_type, RenderType::Opaque);
    }

    #[test]
    fn test_transparent_blend_per_alpha_mode() {
        let cases = [
            (AlphaMode::Alpha, BlendMode::SrcAlpha, BlendMode::OneMinusSrcAlpha),
            (AlphaMode::Premultiply, BlendMode::One, BlendMode::OneMinusSrcAlpha),
            (AlphaMode::Additive, BlendMode::One, BlendMode::One),
            (AlphaMode::Multiply, BlendMode::DstColor, BlendMode::Zero),
        ];
        for (mode, src, dst) in cases {
            let opts = MaterialOptions::new(SurfaceType::Transparent, mode, true);
            assert_eq!((opts.src_blend, opts.dst_blend), (src, dst), "{mode:?}");
            assert_eq!(opts.z_write, ZWrite::Off);
            assert_eq!(opts.cull_mode, CullMode::Off);
            assert_eq!(opts.render_queue, RenderQueue::Transparent);
        }
    }

    #[test]
    fn test_property_defaults() {
        let opts = MaterialOptions::new(SurfaceType::Transparent, AlphaMode::Alpha, false);
        assert_eq!(
            opts.property_defaults(),
            vec![("_SrcBlend", 5), ("_DstBlend", 10), ("_ZWrite", 0), ("_Cull", 2)]
        );
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_surface_type("Transparent").unwrap(), SurfaceType::Transparent);
        assert_eq!(parse_alpha_mode("pre-multiply").unwrap(), AlphaMode::Premultiply);
        assert!(parse_alpha_mode("screen").is_err());
    }
}
