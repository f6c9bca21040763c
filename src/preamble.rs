//! Shader pass skeleton for a graph's master node.
//!
//! Emits the `Shader` block with material property defaults and one pass per
//! [`PassKind`]. Each pass carries its render-state overrides, the master
//! node's feature defines and the attribute/varying defines implied by the
//! graph's vertex and fragment requirements. Surface code itself is produced
//! elsewhere.

use anyhow::{Result, anyhow};

use crate::graph::requirements::GraphRequirements;
use crate::graph::stage::ShaderStageCapability;
use crate::graph::ShaderGraph;
use crate::render_state::{MaterialOptions, PassKind, ShaderPass, configured_pass};

const PASSES: [PassKind; 2] = [PassKind::ForwardBase, PassKind::ShadowCaster];

/// Mesh attributes and interpolators the generated passes must provide.
pub fn requirement_defines(
    vertex: &GraphRequirements,
    fragment: &GraphRequirements,
) -> Vec<&'static str> {
    let any = vertex.union(*fragment);
    let mut defines = Vec::new();

    if !any.normal.is_empty() || any.needs_tangent_frame() {
        defines.push("ATTRIBUTES_NEED_NORMAL");
    }
    if !any.tangent.is_empty() || !any.bitangent.is_empty() || any.needs_tangent_frame() {
        defines.push("ATTRIBUTES_NEED_TANGENT");
    }
    if any.vertex_id {
        defines.push("ATTRIBUTES_NEED_VERTEXID");
    }
    if any.vertex_color {
        defines.push("ATTRIBUTES_NEED_COLOR");
    }

    // Varyings only carry what the fragment stage reads.
    if !fragment.position.is_empty() || !fragment.view_direction.is_empty() {
        defines.push("VARYINGS_NEED_POSITION_WS");
    }
    if !fragment.normal.is_empty() || fragment.needs_tangent_frame() {
        defines.push("VARYINGS_NEED_NORMAL_WS");
    }
    if !fragment.tangent.is_empty()
        || !fragment.bitangent.is_empty()
        || fragment.needs_tangent_frame()
    {
        defines.push("VARYINGS_NEED_TANGENT_WS");
    }
    if fragment.vertex_id {
        defines.push("VARYINGS_NEED_VERTEXID");
    }
    if fragment.vertex_color {
        defines.push("VARYINGS_NEED_COLOR");
    }

    defines
}

fn property_label(name: &str) -> &'static str {
    match name {
        "_SrcBlend" => "__src",
        "_DstBlend" => "__dst",
        "_ZWrite" => "__zw",
        "_Cull" => "__cull",
        _ => "__state",
    }
}

fn properties_block(options: &MaterialOptions) -> String {
    let mut out = String::new();
    out.push_str("    Properties\n    {\n");
    for (name, value) in options.property_defaults() {
        out.push_str(&format!(
            "        [HideInInspector] {name}(\"{}\", Float) = {value}\n",
            property_label(name)
        ));
    }
    out.push_str("    }\n");
    out
}

fn pass_block(pass: &ShaderPass, defines: &[&str]) -> String {
    let mut out = String::new();
    out.push_str("        Pass\n        {\n");
    out.push_str(&format!("            Name \"{}\"\n", pass.kind.pass_name()));
    out.push_str(&format!(
        "            Tags {{ \"LightMode\"=\"{}\" }}\n",
        pass.kind.light_mode()
    ));
    for directive in pass.directives() {
        out.push_str(&format!("            {directive}\n"));
    }
    out.push_str("\n            HLSLPROGRAM\n");
    out.push_str(&format!(
        "            #define SHADERPASS_{}\n",
        pass.kind.pass_name()
    ));
    for define in defines {
        out.push_str(&format!("            #define {define}\n"));
    }
    out.push_str("            ENDHLSL\n        }\n");
    out
}

/// Build the pass skeleton for `graph`'s master node.
pub fn build_shader_preamble(graph: &ShaderGraph, shader_name: &str) -> Result<String> {
    let (_, master_node) = graph
        .master_node()
        .ok_or_else(|| anyhow!("graph '{}' has no master node", graph.name()))?;
    let master = master_node
        .as_master()
        .ok_or_else(|| anyhow!("node {} is not a master node", master_node.name()))?;

    let options = master.material_options();
    let vertex = graph.requirements(ShaderStageCapability::Vertex);
    let fragment = graph.requirements(ShaderStageCapability::Fragment);

    let mut defines: Vec<&str> = master.feature_defines();
    defines.extend(requirement_defines(&vertex, &fragment));

    let mut out = String::new();
    out.push_str(&format!("Shader \"{shader_name}\"\n{{\n"));
    out.push_str(&properties_block(&options));
    out.push_str("    SubShader\n    {\n");
    out.push_str(&format!(
        "        Tags {{ \"RenderType\"=\"{}\" \"Queue\"=\"{}\" }}\n",
        options.render_type, options.render_queue
    ));
    for kind in PASSES {
        out.push_str(&pass_block(&configured_pass(kind), &defines));
    }
    out.push_str("    }\n}\n");
    Ok(out)
}
