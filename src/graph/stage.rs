//! Pipeline stage tags for slots and capability queries.

use serde::{Deserialize, Serialize};

/// Pipeline stage a slot is valid in, or a query is asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStageCapability {
    Vertex,
    Fragment,
    #[default]
    All,
}

impl ShaderStageCapability {
    /// Whether a slot tagged `self` takes part in a query for `stage`.
    ///
    /// A slot tagged `All` matches every query and a query for `All` matches
    /// every slot. A slot tagged for one concrete stage never contributes to a
    /// query for the other one.
    pub fn admits(self, stage: ShaderStageCapability) -> bool {
        self == ShaderStageCapability::All || stage == ShaderStageCapability::All || self == stage
    }

    /// Concrete stages used for code generation.
    pub const CONCRETE: [ShaderStageCapability; 2] =
        [ShaderStageCapability::Vertex, ShaderStageCapability::Fragment];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertex" | "vert" | "vs" => Some(Self::Vertex),
            "fragment" | "frag" | "fs" | "pixel" => Some(Self::Fragment),
            "all" | "any" => Some(Self::All),
            _ => None,
        }
    }
}
