// render.rs - Project the pool through the camera onto a draw surface
//
// The draw pass is backend agnostic: it clips and projects in Rust and emits
// screen-space lines and slab quads. `DrawList` packs them for the host canvas.
//
// DrawList encoding (f32, 12 per record):
//   [2, bg_r, bg_g, bg_b, width, height, 0, 0, 0, 0, 0, 0]   frame header
//   [0, x0, y0, x1, y1, r, g, b, a, 0, 0, 0]                 line
//   [1, x0, y0, x1, y1, x2, y2, x3, y3, image, alpha, slab]  slab (tl, tr, br, bl)
//
// The slab field holds the u32 slab id bit for bit; read it through a
// Uint32Array view of the same buffer, not as a float.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::camera::{Camera, Viewport};
use crate::loader::SlabId;
use crate::theme::{Rgb, SceneStyle};
use crate::tunnel::SegmentPool;

pub const RECORD: usize = 12;

const KIND_LINE: f32 = 0.0;
const KIND_SLAB: f32 = 1.0;
const KIND_HEADER: f32 = 2.0;

pub trait Surface {
    fn begin(&mut self, viewport: Viewport, background: Rgb);
    fn line(&mut self, a: Vec2, b: Vec2, color: Rgb, alpha: f32);
    fn slab(&mut self, id: SlabId, corners: [Vec2; 4], image: usize, alpha: f32);
    fn finish(&mut self) {}
}

/// Linear fog between two view distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// 0 = clear, 1 = fully fogged.
    pub fn factor(&self, distance: f32) -> f32 {
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

/// Everything the draw pass reads for one frame.
pub struct FrameInputs<'a> {
    pub pool: &'a SegmentPool,
    pub camera: &'a Camera,
    pub viewport: Viewport,
    pub style: &'a SceneStyle,
    pub fog: Fog,
    pub now_ms: f64,
}

struct Projector {
    view: Mat4,
    proj: Mat4,
    near: f32,
    far: f32,
    size: Vec2,
}

impl Projector {
    fn new(camera: &Camera, viewport: Viewport) -> Self {
        Self {
            view: camera.view_matrix(),
            proj: camera.projection_matrix(),
            near: camera.near,
            far: camera.far,
            size: Vec2::new(viewport.width as f32, viewport.height as f32),
        }
    }

    fn to_view(&self, p: Vec3) -> Vec3 {
        self.view.transform_point3(p)
    }

    /// View space to pixels. Caller guarantees the point is in front of the near plane.
    fn to_screen(&self, v: Vec3) -> Vec2 {
        let clip = self.proj * v.extend(1.0);
        let ndc = clip.xy() / clip.w;
        Vec2::new((ndc.x + 1.0) * 0.5 * self.size.x, (1.0 - ndc.y) * 0.5 * self.size.y)
    }

    /// Clip a view-space segment to the near/far planes.
    fn clip(&self, mut a: Vec3, mut b: Vec3) -> Option<(Vec3, Vec3)> {
        let (zn, zf) = (-self.near, -self.far);
        if (a.z > zn && b.z > zn) || (a.z < zf && b.z < zf) {
            return None;
        }
        if a.z > zn {
            a = a.lerp(b, (zn - a.z) / (b.z - a.z));
        } else if b.z > zn {
            b = b.lerp(a, (zn - b.z) / (a.z - b.z));
        }
        if a.z < zf {
            a = a.lerp(b, (zf - a.z) / (b.z - a.z));
        } else if b.z < zf {
            b = b.lerp(a, (zf - b.z) / (a.z - b.z));
        }
        Some((a, b))
    }
}

/// Draw the whole pool. Returns the number of primitives emitted.
pub fn draw_frame(frame: &FrameInputs<'_>, surface: &mut dyn Surface) -> usize {
    let p = Projector::new(frame.camera, frame.viewport);
    let mut emitted = 0;

    surface.begin(frame.viewport, frame.style.background);

    for seg in frame.pool.segments() {
        let offset = Vec3::new(0.0, 0.0, seg.slot() as f32 * frame.pool.depth());
        let material = seg.material;

        for [a, b] in seg.wireframe() {
            let Some((va, vb)) = p.clip(p.to_view(*a + offset), p.to_view(*b + offset)) else { continue };
            let fog = frame.fog.factor(-(va.z + vb.z) * 0.5);
            let color = material.color.lerp(frame.fog.color, fog);
            surface.line(p.to_screen(va), p.to_screen(vb), color, material.opacity);
            emitted += 1;
        }

        for slab in seg.slabs() {
            let view = slab.corners.map(|c| p.to_view(c + offset));
            if view.iter().any(|v| v.z > -p.near || v.z < -p.far) {
                continue;
            }
            let distance = -view.iter().map(|v| v.z).sum::<f32>() / 4.0;
            let alpha = slab.opacity(frame.now_ms) * (1.0 - frame.fog.factor(distance));
            surface.slab(slab.id, view.map(|v| p.to_screen(v)), slab.image, alpha);
            emitted += 1;
        }
    }

    surface.finish();
    emitted
}

/// Flat record buffer read by the host through a raw pointer.
#[derive(Debug, Default)]
pub struct DrawList {
    out: Vec<f32>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr(&self) -> *const f32 {
        self.out.as_ptr()
    }

    /// Length in f32s, always a multiple of `RECORD`.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &[f32]> {
        self.out.chunks_exact(RECORD)
    }

    fn push(&mut self, rec: [f32; RECORD]) {
        self.out.extend_from_slice(&rec);
    }
}

impl Surface for DrawList {
    fn begin(&mut self, viewport: Viewport, bg: Rgb) {
        self.out.clear();
        self.push([KIND_HEADER, bg.r, bg.g, bg.b, viewport.width as f32, viewport.height as f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    fn line(&mut self, a: Vec2, b: Vec2, c: Rgb, alpha: f32) {
        self.push([KIND_LINE, a.x, a.y, b.x, b.y, c.r, c.g, c.b, alpha, 0.0, 0.0, 0.0]);
    }

    fn slab(&mut self, id: SlabId, q: [Vec2; 4], image: usize, alpha: f32) {
        self.push([KIND_SLAB, q[0].x, q[0].y, q[1].x, q[1].y, q[2].x, q[2].y, q[3].x, q[3].y, image as f32, alpha, f32::from_bits(id.0)]);
    }
}
