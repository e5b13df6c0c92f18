//! Temperature-driven color palettes.

use rand::Rng;
use serde::Serialize;

pub type Rgb = [u8; 3];

/// Upper bound (exclusive) of the cool bracket, in °C.
pub const COOL_BELOW: f32 = 20.0;
/// Lower bound (inclusive) of the warm bracket, in °C.
pub const WARM_FROM: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteKind {
    Cool,
    Neutral,
    Warm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub kind: PaletteKind,
    pub colors: [Rgb; 4],
}

pub const COOL: Palette = Palette {
    kind: PaletteKind::Cool,
    colors: [
        [100, 150, 255],
        [50, 200, 255],
        [150, 220, 255],
        [200, 230, 255],
    ],
};

pub const NEUTRAL: Palette = Palette {
    kind: PaletteKind::Neutral,
    colors: [
        [150, 255, 150],
        [255, 255, 100],
        [200, 255, 150],
        [255, 220, 100],
    ],
};

pub const WARM: Palette = Palette {
    kind: PaletteKind::Warm,
    colors: [
        [255, 100, 100],
        [255, 150, 50],
        [255, 200, 100],
        [255, 120, 80],
    ],
};

/// Picks the palette for a temperature. No hysteresis: readings that hover on
/// a bracket edge may flip the palette every tick.
pub fn select_palette(temperature: f32) -> Palette {
    if temperature < COOL_BELOW {
        COOL
    } else if temperature < WARM_FROM {
        NEUTRAL
    } else {
        WARM
    }
}

impl Palette {
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgb {
        self.colors[rng.gen_range(0..self.colors.len())]
    }
}
