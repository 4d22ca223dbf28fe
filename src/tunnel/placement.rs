// placement.rs - Content slabs and where they go
//
// Each face of a segment is a strip of cells. Cells are walked in order and
// an eligible cell (not next to the last filled one) is filled with the
// face's probability. The probabilities are set higher than the visual
// target because the adjacency gate skips roughly a third of the cells.

use glam::Vec3;

use super::fade::Fade;
use super::wireframe::SegmentDims;
use crate::config::{FaceProbabilities, TunnelConfig};
use crate::loader::{ImageLoader, SlabId, SlabIds};
use crate::rng::RandomSource;

// Keeps slabs off the grid lines
const SURFACE_INSET: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Floor,
    Ceiling,
    LeftWall,
    RightWall,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::Floor, Face::Ceiling, Face::LeftWall, Face::RightWall];

    pub fn cells(self, dims: &SegmentDims) -> usize {
        match self {
            Face::Floor | Face::Ceiling => dims.floor_cols,
            Face::LeftWall | Face::RightWall => dims.wall_rows,
        }
    }

    pub fn probability(self, p: &FaceProbabilities) -> f32 {
        match self {
            Face::Floor => p.floor,
            Face::Ceiling => p.ceiling,
            Face::LeftWall | Face::RightWall => p.walls,
        }
    }

    /// Unit normal pointing into the tunnel.
    pub fn inward_normal(self) -> Vec3 {
        match self {
            Face::Floor => Vec3::Y,
            Face::Ceiling => Vec3::NEG_Y,
            Face::LeftWall => Vec3::X,
            Face::RightWall => Vec3::NEG_X,
        }
    }

    /// (right, up) axes as seen from inside the tunnel looking at the face.
    fn axes(self) -> (Vec3, Vec3) {
        match self {
            Face::Floor => (Vec3::X, Vec3::NEG_Z),
            Face::Ceiling => (Vec3::X, Vec3::Z),
            Face::LeftWall => (Vec3::NEG_Z, Vec3::Y),
            Face::RightWall => (Vec3::Z, Vec3::Y),
        }
    }

    fn cell_size(self, dims: &SegmentDims) -> f32 {
        match self {
            Face::Floor | Face::Ceiling => 2.0 * dims.half_width / dims.floor_cols as f32,
            Face::LeftWall | Face::RightWall => 2.0 * dims.half_height / dims.wall_rows as f32,
        }
    }

    /// Centre of `cell`, segment-local, nudged off the surface.
    fn cell_center(self, cell: usize, dims: &SegmentDims) -> Vec3 {
        let size = self.cell_size(dims);
        let along = |half: f32| -half + (cell as f32 + 0.5) * size;
        let z = -dims.depth * 0.5;
        let (w, h) = (dims.half_width, dims.half_height);
        let surface = match self {
            Face::Floor => Vec3::new(along(w), -h, z),
            Face::Ceiling => Vec3::new(along(w), h, z),
            Face::LeftWall => Vec3::new(-w, along(h), z),
            Face::RightWall => Vec3::new(w, along(h), z),
        };
        surface + self.inward_normal() * SURFACE_INSET
    }
}

/// Opacity state of one slab's material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlabMaterial {
    /// Waiting on the image. Drawn at opacity 0.
    Pending,
    /// Load failed; stays at opacity 0 until recycled.
    Failed,
    Loaded(Fade),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slab {
    pub id: SlabId,
    pub face: Face,
    pub cell: usize,
    /// Index into the image catalog.
    pub image: usize,
    pub size: f32,
    /// Segment-local corners: top-left, top-right, bottom-right, bottom-left.
    pub corners: [Vec3; 4],
    pub material: SlabMaterial,
}

impl Slab {
    pub fn opacity(&self, now_ms: f64) -> f32 {
        match self.material {
            SlabMaterial::Loaded(fade) => fade.sample(now_ms),
            SlabMaterial::Pending | SlabMaterial::Failed => 0.0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.material, SlabMaterial::Loaded(_))
    }
}

/// Walk `cells` in order; return (cell, catalog index) for every fill.
///
/// One sample decides each eligible cell; a fill draws one more sample
/// for the image. Ineligible cells draw nothing.
pub fn plan_face(cells: usize, probability: f32, catalog_len: usize, rng: &mut dyn RandomSource) -> Vec<(usize, usize)> {
    let mut fills = Vec::new();
    let mut last: Option<usize> = None;

    for cell in 0..cells {
        if last.is_some_and(|l| cell <= l + 1) {
            continue;
        }
        if rng.next_f32() >= probability {
            continue;
        }
        let image = ((rng.next_f32() * catalog_len as f32) as usize).min(catalog_len.saturating_sub(1));
        fills.push((cell, image));
        last = Some(cell);
    }

    fills
}

/// Builds slab sets for segments and starts their image loads.
pub struct ContentPlacer {
    dims: SegmentDims,
    probabilities: FaceProbabilities,
    margin: f32,
    slab_opacity: f32,
    fade_ms: f64,
    catalog: Vec<String>,
    ids: SlabIds,
    rng: Box<dyn RandomSource>,
}

impl ContentPlacer {
    pub fn new(config: &TunnelConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            dims: config.segment_dims(),
            probabilities: config.probabilities,
            margin: config.slab_margin,
            slab_opacity: config.slab_opacity,
            fade_ms: config.fade_ms,
            catalog: config.catalog.clone(),
            ids: SlabIds::default(),
            rng,
        }
    }

    pub fn dims(&self) -> &SegmentDims {
        &self.dims
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Fresh slab set for one segment. Every slab has a load in flight.
    pub fn populate(&mut self, loader: &mut dyn ImageLoader) -> Vec<Slab> {
        let mut slabs = Vec::new();

        for face in Face::ALL {
            let cells = face.cells(&self.dims);
            let p = face.probability(&self.probabilities);
            for (cell, image) in plan_face(cells, p, self.catalog.len(), &mut *self.rng) {
                let slab = self.build_slab(face, cell, image);
                loader.request(slab.id, &self.catalog[image]);
                slabs.push(slab);
            }
        }

        slabs
    }

    fn build_slab(&mut self, face: Face, cell: usize, image: usize) -> Slab {
        let size = (face.cell_size(&self.dims) - self.margin).max(0.0);
        let center = face.cell_center(cell, &self.dims);
        let (right, up) = face.axes();
        let (r, u) = (right * size * 0.5, up * size * 0.5);

        Slab {
            id: self.ids.next(),
            face,
            cell,
            image,
            size,
            corners: [center - r + u, center + r + u, center + r - u, center - r - u],
            material: SlabMaterial::Pending,
        }
    }

    /// Material for a slab whose image just arrived.
    pub fn loaded_material(&self, now_ms: f64) -> SlabMaterial {
        SlabMaterial::Loaded(Fade::new(now_ms, self.fade_ms, self.slab_opacity))
    }
}
