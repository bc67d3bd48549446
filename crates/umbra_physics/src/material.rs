//! Surface materials reported by ray queries

use serde::{Deserialize, Serialize};

/// Material group of a level surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SurfaceMaterial {
    /// Unknown or unassigned
    #[default]
    Undefined = 0,
    /// Metal plates, grates
    Metal = 1,
    /// Rock, masonry
    Stone = 2,
    /// Planks, beams
    Wood = 3,
    /// Soil, grass, sand
    Earth = 4,
    /// Water surfaces
    Water = 5,
    /// Snow and ice
    Snow = 6,
}

impl SurfaceMaterial {
    /// Decode a stored material id; unknown ids map to `Undefined`
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Metal,
            2 => Self::Stone,
            3 => Self::Wood,
            4 => Self::Earth,
            5 => Self::Water,
            6 => Self::Snow,
            _ => Self::Undefined,
        }
    }

    /// Fraction of sound energy that passes through one surface of this material
    pub fn sound_transmission(&self) -> f32 {
        match self {
            Self::Undefined => 0.5,
            Self::Metal => 0.3,
            Self::Stone => 0.2,
            Self::Wood => 0.6,
            Self::Earth => 0.25,
            Self::Water => 0.7,
            Self::Snow => 0.4,
        }
    }

    /// Footstep / impact sound group name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undefined => "undef",
            Self::Metal => "metal",
            Self::Stone => "stone",
            Self::Wood => "wood",
            Self::Earth => "earth",
            Self::Water => "water",
            Self::Snow => "snow",
        }
    }
}
