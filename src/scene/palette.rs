//! Named color ramps and the level → color rule.

use std::fmt;

/// Ramps hold `PALETTE_DEPTH + 1` shades; the root uses the last one.
pub const PALETTE_DEPTH: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
    Gray,
}

const BLUE: [Rgb; 7] = [
    Rgb(0x6b, 0xae, 0xd6),
    Rgb(0x42, 0x92, 0xc6),
    Rgb(0x21, 0x71, 0xb5),
    Rgb(0x08, 0x5b, 0xa8),
    Rgb(0x08, 0x51, 0x9c),
    Rgb(0x08, 0x45, 0x8a),
    Rgb(0x08, 0x30, 0x6b),
];

const GREEN: [Rgb; 7] = [
    Rgb(0x74, 0xc4, 0x76),
    Rgb(0x41, 0xab, 0x5d),
    Rgb(0x23, 0x8b, 0x45),
    Rgb(0x00, 0x7a, 0x3b),
    Rgb(0x00, 0x6d, 0x2c),
    Rgb(0x00, 0x5a, 0x24),
    Rgb(0x00, 0x44, 0x1b),
];

const PURPLE: [Rgb; 7] = [
    Rgb(0x9e, 0x9a, 0xc8),
    Rgb(0x80, 0x7d, 0xba),
    Rgb(0x6a, 0x51, 0xa3),
    Rgb(0x5e, 0x3f, 0x99),
    Rgb(0x54, 0x27, 0x8f),
    Rgb(0x4a, 0x14, 0x86),
    Rgb(0x3f, 0x00, 0x7d),
];

const ORANGE: [Rgb; 7] = [
    Rgb(0xfd, 0x8d, 0x3c),
    Rgb(0xf1, 0x69, 0x13),
    Rgb(0xd9, 0x48, 0x01),
    Rgb(0xc2, 0x3d, 0x02),
    Rgb(0xa6, 0x36, 0x03),
    Rgb(0x8c, 0x2d, 0x04),
    Rgb(0x7f, 0x27, 0x04),
];

const GRAY: [Rgb; 7] = [
    Rgb(0x96, 0x96, 0x96),
    Rgb(0x85, 0x85, 0x85),
    Rgb(0x73, 0x73, 0x73),
    Rgb(0x63, 0x63, 0x63),
    Rgb(0x52, 0x52, 0x52),
    Rgb(0x3a, 0x3a, 0x3a),
    Rgb(0x25, 0x25, 0x25),
];

impl Palette {
    pub const ALL: [Self; 5] = [
        Self::Blue,
        Self::Green,
        Self::Purple,
        Self::Orange,
        Self::Gray,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Gray => "gray",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn shades(self) -> &'static [Rgb; 7] {
        match self {
            Self::Blue => &BLUE,
            Self::Green => &GREEN,
            Self::Purple => &PURPLE,
            Self::Orange => &ORANGE,
            Self::Gray => &GRAY,
        }
    }
}

/// Shade `depth_index` of `palette`, clamped to the darkest shade.
pub fn palette_color(palette: Palette, depth_index: usize) -> Rgb {
    let shades = palette.shades();
    shades[depth_index.min(shades.len() - 1)]
}

/// Fill for a node at `level`: shade `PALETTE_DEPTH - level`, or the first
/// shade once that index would go negative.
pub fn level_color(palette: Palette, level: u32) -> Rgb {
    let index = PALETTE_DEPTH.saturating_sub(level);
    palette_color(palette, index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_gets_deepest_index() {
        assert_eq!(level_color(Palette::Blue, 0), BLUE[6]);
        assert_eq!(level_color(Palette::Blue, 1), BLUE[5]);
        assert_eq!(level_color(Palette::Blue, 6), BLUE[0]);
    }

    #[test]
    fn levels_past_the_ramp_clamp_to_first_shade() {
        assert_eq!(level_color(Palette::Green, 7), GREEN[0]);
        assert_eq!(level_color(Palette::Green, 40), GREEN[0]);
    }

    #[test]
    fn names_round_trip_and_cycle() {
        for palette in Palette::ALL {
            assert_eq!(Palette::from_name(palette.name()), Some(palette));
        }
        assert_eq!(Palette::from_name(" BLUE "), Some(Palette::Blue));
        assert_eq!(Palette::from_name("teal"), None);
        assert_eq!(Palette::Gray.next(), Palette::Blue);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(Rgb(0x08, 0x30, 0x6b).hex(), "#08306b");
    }
}
