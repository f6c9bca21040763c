//! Concrete shader graph nodes and the type-name registry.
//!
//! - `pbr_master`: PBR surface master node
//! - `vertex_id`: vertex index input
//! - `geometry`: position / normal / tangent / vertex color inputs

pub mod geometry;
pub mod pbr_master;
pub mod vertex_id;

use anyhow::{Result, bail};

use crate::graph::node::ShaderNode;

pub use geometry::{GeometryNode, GeometryQuantity, VertexColorNode};
pub use pbr_master::{Model, NormalDropOffSpace, PbrMasterNode, PbrSettings};
pub use vertex_id::VertexIdNode;

/// Type names accepted by [`create_node`].
pub const NODE_TYPES: [&str; 6] = [
    "PBRMaster",
    "VertexID",
    "Position",
    "NormalVector",
    "TangentVector",
    "VertexColor",
];

/// Construct a node with default settings from its document type name.
pub fn create_node(node_type: &str) -> Result<Box<dyn ShaderNode>> {
    Ok(match node_type {
        "PBRMaster" => Box::new(PbrMasterNode::new()),
        "VertexID" => Box::new(VertexIdNode::new()),
        "Position" => Box::new(GeometryNode::position()),
        "NormalVector" => Box::new(GeometryNode::normal()),
        "TangentVector" => Box::new(GeometryNode::tangent()),
        "VertexColor" => Box::new(VertexColorNode::new()),
        other => bail!("unsupported node type: {other}"),
    })
}
