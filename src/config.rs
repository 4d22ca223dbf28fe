// config.rs - Tunnel configuration
//
// Defaults reproduce the shipped tunnel. The host may pass a JSON object
// overriding any subset of fields; missing fields keep their defaults.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::theme::{Palette, Theme};
use crate::tunnel::SegmentDims;

/// Per-face fill probability for one eligible cell.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FaceProbabilities {
    pub floor: f32,
    pub ceiling: f32,
    pub walls: f32,
}

impl Default for FaceProbabilities {
    fn default() -> Self {
        Self { floor: 0.20, ceiling: 0.12, walls: 0.20 }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    // Segment geometry
    pub half_width: f32,
    pub half_height: f32,
    pub segment_depth: f32,
    pub segment_count: usize,
    pub floor_cols: usize,
    pub wall_rows: usize,

    // Content
    pub slab_margin: f32,
    pub probabilities: FaceProbabilities,
    pub slab_opacity: f32,
    pub fade_ms: f64,
    pub catalog: Vec<String>,

    // Camera
    pub scroll_to_depth: f32,
    pub smoothing: f32,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,

    // Atmosphere
    pub fog_near: f32,
    pub fog_far: f32,
    pub light: Palette,
    pub dark: Palette,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            half_width: 6.0,
            half_height: 4.0,
            segment_depth: 6.0,
            segment_count: 14,
            floor_cols: 6,
            wall_rows: 4,
            slab_margin: 0.3,
            probabilities: FaceProbabilities::default(),
            slab_opacity: 0.85,
            fade_ms: 1000.0,
            catalog: default_catalog(),
            scroll_to_depth: 0.05,
            smoothing: 0.1,
            fov_deg: 75.0,
            near: 0.1,
            far: 200.0,
            fog_near: 10.0,
            fog_far: 70.0,
            light: Palette::LIGHT,
            dark: Palette::DARK,
        }
    }
}

fn default_catalog() -> Vec<String> {
    [10, 11, 15, 16, 17, 28, 29, 37, 42, 48, 54, 64]
        .iter()
        .map(|id| format!("https://picsum.photos/id/{id}/512/512"))
        .collect()
}

impl TunnelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TunnelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("half_width", self.half_width),
            ("half_height", self.half_height),
            ("segment_depth", self.segment_depth),
            ("scroll_to_depth", self.scroll_to_depth),
            ("fov_deg", self.fov_deg),
            ("near", self.near),
        ];
        for (field, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::invalid(field, "must be positive"));
            }
        }
        if self.segment_count == 0 {
            return Err(ConfigError::invalid("segment_count", "must be at least 1"));
        }
        if self.floor_cols == 0 {
            return Err(ConfigError::invalid("floor_cols", "must be at least 1"));
        }
        if self.wall_rows == 0 {
            return Err(ConfigError::invalid("wall_rows", "must be at least 1"));
        }
        if self.far <= self.near {
            return Err(ConfigError::invalid("far", "must exceed near"));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::invalid("smoothing", "must be in (0, 1]"));
        }
        let p = self.probabilities;
        for (field, v) in [("probabilities.floor", p.floor), ("probabilities.ceiling", p.ceiling), ("probabilities.walls", p.walls)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::invalid(field, "must be in [0, 1]"));
            }
        }
        if !(0.0..=1.0).contains(&self.slab_opacity) {
            return Err(ConfigError::invalid("slab_opacity", "must be in [0, 1]"));
        }
        if self.slab_margin < 0.0 {
            return Err(ConfigError::invalid("slab_margin", "must not be negative"));
        }
        if self.fog_far <= self.fog_near {
            return Err(ConfigError::invalid("fog_far", "must exceed fog_near"));
        }
        if self.catalog.is_empty() {
            return Err(ConfigError::invalid("catalog", "must list at least one image"));
        }
        Ok(())
    }

    pub fn segment_dims(&self) -> SegmentDims {
        SegmentDims {
            half_width: self.half_width,
            half_height: self.half_height,
            depth: self.segment_depth,
            floor_cols: self.floor_cols,
            wall_rows: self.wall_rows,
        }
    }

    pub fn palette(&self, theme: Theme) -> &Palette {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}
