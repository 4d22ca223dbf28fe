// wireframe.rs - Static grid geometry for one tunnel segment
//
// Segment-local coordinates: x across, y up, z along travel.
// The near face sits at z = 0 and the segment extends to z = -depth.

use glam::Vec3;

/// Box dimensions and grid divisions shared by every segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentDims {
    pub half_width: f32,
    pub half_height: f32,
    pub depth: f32,
    pub floor_cols: usize,
    pub wall_rows: usize,
}

pub type Line = [Vec3; 2];

/// Build the line list for one segment.
///
/// - `floor_cols + 1` longitudinal lines on the floor and on the ceiling
/// - `wall_rows - 1` longitudinal lines on each wall, between floor and ceiling
/// - four ring edges at the near face
pub fn build_wireframe(dims: &SegmentDims) -> Vec<Line> {
    let SegmentDims { half_width: w, half_height: h, depth: d, floor_cols, wall_rows } = *dims;
    let mut lines = Vec::with_capacity(line_count(dims));

    let col = 2.0 * w / floor_cols as f32;
    for i in 0..=floor_cols {
        let x = -w + i as f32 * col;
        lines.push([Vec3::new(x, -h, 0.0), Vec3::new(x, -h, -d)]);
        lines.push([Vec3::new(x, h, 0.0), Vec3::new(x, h, -d)]);
    }

    let row = 2.0 * h / wall_rows as f32;
    for i in 1..wall_rows {
        let y = -h + i as f32 * row;
        lines.push([Vec3::new(-w, y, 0.0), Vec3::new(-w, y, -d)]);
        lines.push([Vec3::new(w, y, 0.0), Vec3::new(w, y, -d)]);
    }

    // Near-face ring: floor, ceiling, left, right
    lines.push([Vec3::new(-w, -h, 0.0), Vec3::new(w, -h, 0.0)]);
    lines.push([Vec3::new(-w, h, 0.0), Vec3::new(w, h, 0.0)]);
    lines.push([Vec3::new(-w, -h, 0.0), Vec3::new(-w, h, 0.0)]);
    lines.push([Vec3::new(w, -h, 0.0), Vec3::new(w, h, 0.0)]);

    lines
}

pub fn line_count(dims: &SegmentDims) -> usize {
    2 * (dims.floor_cols + 1) + 2 * dims.wall_rows.saturating_sub(1) + 4
}
