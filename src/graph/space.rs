//! Coordinate spaces and the needed-space mask.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Frame in which a geometric quantity (position, normal, tangent) is expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    #[default]
    Object,
    View,
    World,
    Tangent,
    AbsoluteWorld,
}

bitflags! {
    /// Union of coordinate spaces some consumer needs a quantity in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NeededCoordinateSpace: u32 {
        const OBJECT         = 1 << 0;
        const VIEW           = 1 << 1;
        const WORLD          = 1 << 2;
        const TANGENT        = 1 << 3;
        const ABSOLUTE_WORLD = 1 << 4;
    }
}

impl CoordinateSpace {
    pub const ALL: [CoordinateSpace; 5] = [
        CoordinateSpace::Object,
        CoordinateSpace::View,
        CoordinateSpace::World,
        CoordinateSpace::Tangent,
        CoordinateSpace::AbsoluteWorld,
    ];

    pub fn to_needed(self) -> NeededCoordinateSpace {
        match self {
            CoordinateSpace::Object => NeededCoordinateSpace::OBJECT,
            CoordinateSpace::View => NeededCoordinateSpace::VIEW,
            CoordinateSpace::World => NeededCoordinateSpace::WORLD,
            CoordinateSpace::Tangent => NeededCoordinateSpace::TANGENT,
            CoordinateSpace::AbsoluteWorld => NeededCoordinateSpace::ABSOLUTE_WORLD,
        }
    }

    /// Name fragment used in generated variable names, e.g. `WorldSpaceNormal`.
    pub fn generator_name(self) -> &'static str {
        match self {
            CoordinateSpace::Object => "ObjectSpace",
            CoordinateSpace::View => "ViewSpace",
            CoordinateSpace::World => "WorldSpace",
            CoordinateSpace::Tangent => "TangentSpace",
            CoordinateSpace::AbsoluteWorld => "AbsoluteWorldSpace",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "object" => Some(Self::Object),
            "view" => Some(Self::View),
            "world" => Some(Self::World),
            "tangent" => Some(Self::Tangent),
            "absoluteworld" => Some(Self::AbsoluteWorld),
            _ => None,
        }
    }
}

impl From<CoordinateSpace> for NeededCoordinateSpace {
    fn from(space: CoordinateSpace) -> Self {
        space.to_needed()
    }
}

impl NeededCoordinateSpace {
    /// Spaces contained in the mask, in declaration order.
    pub fn spaces(self) -> impl Iterator<Item = CoordinateSpace> {
        CoordinateSpace::ALL
            .into_iter()
            .filter(move |s| self.contains(s.to_needed()))
    }
}

impl fmt::Display for NeededCoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = self
            .spaces()
            .map(|s| match s {
                CoordinateSpace::Object => "Object",
                CoordinateSpace::View => "View",
                CoordinateSpace::World => "World",
                CoordinateSpace::Tangent => "Tangent",
                CoordinateSpace::AbsoluteWorld => "AbsoluteWorld",
            })
            .collect();
        f.write_str(&names.join(" | "))
    }
}
