// theme.rs - Light/dark palettes and the theme applier
//
// Theme changes are rare (mount + user toggle). Applying a theme writes
// background, fog and every segment's line material in one pass.

use serde::Deserialize;

use crate::tunnel::SegmentPool;

/// Linear colour, components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn hex(v: u32) -> Self {
        Self {
            r: ((v >> 16) & 0xFF) as f32 / 255.0,
            g: ((v >> 8) & 0xFF) as f32 / 255.0,
            b: (v & 0xFF) as f32 / 255.0,
        }
    }

    pub fn lerp(self, o: Rgb, t: f32) -> Rgb {
        Rgb {
            r: self.r + (o.r - self.r) * t,
            g: self.g + (o.g - self.g) * t,
            b: self.b + (o.b - self.b) * t,
        }
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    /// Accepts `#rrggbb` or `rrggbb`.
    fn try_from(s: String) -> Result<Self, Self::Error> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("expected #rrggbb colour, got {s:?}"));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb::hex)
            .map_err(|_| format!("expected #rrggbb colour, got {s:?}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Palette {
    pub background: Rgb,
    pub fog: Rgb,
    pub line: Rgb,
    pub line_opacity: f32,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        background: Rgb::hex(0xF4F1EA),
        fog: Rgb::hex(0xF4F1EA),
        line: Rgb::hex(0x1A1A1A),
        line_opacity: 0.18,
    };

    pub const DARK: Palette = Palette {
        background: Rgb::hex(0x0B0B0F),
        fog: Rgb::hex(0x0B0B0F),
        line: Rgb::hex(0xE8E8E8),
        line_opacity: 0.14,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_flag(dark: bool) -> Self {
        if dark { Theme::Dark } else { Theme::Light }
    }
}

/// Line material shared by every line in one segment's wireframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMaterial {
    pub color: Rgb,
    pub opacity: f32,
}

impl LineMaterial {
    pub fn from_palette(p: &Palette) -> Self {
        Self { color: p.line, opacity: p.line_opacity }
    }
}

/// Scene-level colours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneStyle {
    pub background: Rgb,
    pub fog: Rgb,
}

impl SceneStyle {
    pub fn from_palette(p: &Palette) -> Self {
        Self { background: p.background, fog: p.fog }
    }
}

/// Write `palette` into the scene and every segment's line material.
/// Slabs are untouched.
pub fn apply_palette(palette: &Palette, style: &mut SceneStyle, pool: &mut SegmentPool) {
    *style = SceneStyle::from_palette(palette);
    let material = LineMaterial::from_palette(palette);
    for segment in pool.segments_mut() {
        segment.material = material;
    }
}
