use std::str::FromStr;

use indexmap::IndexMap;
use palette::{Hsl, IntoColor, Srgb};

/// An 8-bit sRGB colour.
pub type Color = Srgb<u8>;

pub const GRAY: Color = Srgb::new(128, 128, 128);
pub const BLACK: Color = Srgb::new(0, 0, 0);

// ---------------------------------------------------------------------------
// Colour cycles
// ---------------------------------------------------------------------------

/// The ten-colour categorical cycle used when nothing else is configured.
pub const DEFAULT_CYCLE: [Color; 10] = [
    Srgb::new(0x1f, 0x77, 0xb4),
    Srgb::new(0xff, 0x7f, 0x0e),
    Srgb::new(0x2c, 0xa0, 0x2c),
    Srgb::new(0xd6, 0x27, 0x28),
    Srgb::new(0x94, 0x67, 0xbd),
    Srgb::new(0x8c, 0x56, 0x4b),
    Srgb::new(0xe3, 0x77, 0xc2),
    Srgb::new(0x7f, 0x7f, 0x7f),
    Srgb::new(0xbc, 0xbd, 0x22),
    Srgb::new(0x17, 0xbe, 0xcf),
];

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

/// Parse `#rrggbb` strings into a colour cycle.
pub fn parse_cycle<S: AsRef<str>>(hex: &[S]) -> Result<Vec<Color>, palette::rgb::FromHexError> {
    hex.iter().map(|h| Color::from_str(h.as_ref())).collect()
}

// ---------------------------------------------------------------------------
// Colour assignment: sounding identifier → colour
// ---------------------------------------------------------------------------

/// Decides which colour each sounding is drawn in.
///
/// Given the same identifiers in the same order, an assigner must always
/// return the same map.
pub trait ColorAssigner {
    fn assign(&self, ids: &[&str]) -> ColorMap;
}

/// Hands out colours from a fixed cycle in identifier order, wrapping
/// around when there are more soundings than colours.
#[derive(Debug, Clone)]
pub struct CycleAssigner {
    colors: Vec<Color>,
}

impl CycleAssigner {
    /// A cycle over `colors`; an empty list falls back to [`DEFAULT_CYCLE`].
    pub fn new(colors: Vec<Color>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors }
    }
}

impl Default for CycleAssigner {
    fn default() -> Self {
        Self {
            colors: DEFAULT_CYCLE.to_vec(),
        }
    }
}

impl ColorAssigner for CycleAssigner {
    fn assign(&self, ids: &[&str]) -> ColorMap {
        let mut map = ColorMap::default();
        let mut cursor = 0;
        for id in ids {
            if map.claim(id, self.colors[cursor % self.colors.len()]) {
                cursor += 1;
            }
        }
        map
    }
}

/// Spreads hues evenly over however many soundings there are, so colours
/// never repeat.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvenHues;

impl ColorAssigner for EvenHues {
    fn assign(&self, ids: &[&str]) -> ColorMap {
        let mut unique: Vec<&str> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(id);
            }
        }
        let mut map = ColorMap::default();
        for (id, color) in unique.iter().zip(generate_palette(unique.len())) {
            map.claim(id, color);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// ColorMap
// ---------------------------------------------------------------------------

/// Maps sounding identifiers to their colour, in assignment order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    mapping: IndexMap<String, Color>,
    default_color: Color,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            mapping: IndexMap::new(),
            default_color: GRAY,
        }
    }
}

impl ColorMap {
    /// First claim wins; returns whether `color` was taken.
    fn claim(&mut self, id: &str, color: Color) -> bool {
        if self.mapping.contains_key(id) {
            return false;
        }
        self.mapping.insert(id.to_string(), color);
        true
    }

    /// Look up the colour for a given sounding.
    pub fn color_for(&self, id: &str) -> Color {
        self.mapping.get(id).copied().unwrap_or(self.default_color)
    }

    /// Return the legend entries (identifier → colour).
    pub fn legend_entries(&self) -> Vec<(String, Color)> {
        self.mapping.iter().map(|(id, c)| (id.clone(), *c)).collect()
    }
}
