// raster.rs - Software draw surface backed by an RgbaImage
//
// Lines are stepped per pixel with alpha blending. Slabs are split into two
// triangles and texture-mapped with affine UVs, nearest sampling.

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;
use image::{Rgba, RgbaImage};
use tunnel_engine::camera::Viewport;
use tunnel_engine::loader::SlabId;
use tunnel_engine::render::Surface;
use tunnel_engine::theme::Rgb;

pub struct ImageSurface {
    img: RgbaImage,
    textures: HashMap<SlabId, Rc<RgbaImage>>,
}

impl ImageSurface {
    pub fn new(w: u32, h: u32) -> Self {
        Self { img: RgbaImage::new(w, h), textures: HashMap::new() }
    }

    pub fn bind(&mut self, id: SlabId, tex: Rc<RgbaImage>) {
        self.textures.insert(id, tex);
    }

    pub fn unbind(&mut self, id: SlabId) {
        self.textures.remove(&id);
    }

    pub fn bound(&self) -> usize {
        self.textures.len()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    #[inline]
    fn blend(&mut self, x: i32, y: i32, src: [u8; 3], alpha: f32) {
        if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
            return;
        }
        let px = self.img.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let d = px[c] as f32;
            px[c] = (d + (src[c] as f32 - d) * alpha).round() as u8;
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

impl ImageSurface {
    fn triangle(&mut self, tex: &RgbaImage, p: [Vec2; 3], uv: [Vec2; 3], alpha: f32) {
        let area = edge(p[0], p[1], p[2]);
        if area.abs() < 1e-6 {
            return;
        }
        let (w, h) = (self.img.width() as f32, self.img.height() as f32);
        let min = p[0].min(p[1]).min(p[2]).max(Vec2::ZERO).floor();
        let max = p[0].max(p[1]).max(p[2]).min(Vec2::new(w - 1.0, h - 1.0)).ceil();
        let (tw, th) = (tex.width() as f32, tex.height() as f32);

        for y in min.y as i32..=max.y as i32 {
            for x in min.x as i32..=max.x as i32 {
                let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let b0 = edge(p[1], p[2], c) / area;
                let b1 = edge(p[2], p[0], c) / area;
                let b2 = 1.0 - b0 - b1;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }
                let t = uv[0] * b0 + uv[1] * b1 + uv[2] * b2;
                let tx = ((t.x * tw) as u32).min(tex.width() - 1);
                let ty = ((t.y * th) as u32).min(tex.height() - 1);
                let Rgba([r, g, b, a]) = *tex.get_pixel(tx, ty);
                self.blend(x, y, [r, g, b], alpha * a as f32 / 255.0);
            }
        }
    }
}

impl Surface for ImageSurface {
    fn begin(&mut self, viewport: Viewport, bg: Rgb) {
        if self.img.dimensions() != (viewport.width, viewport.height) {
            self.img = RgbaImage::new(viewport.width, viewport.height);
        }
        let [r, g, b] = bg.to_rgb8();
        for px in self.img.pixels_mut() {
            *px = Rgba([r, g, b, 255]);
        }
    }

    fn line(&mut self, a: Vec2, b: Vec2, color: Rgb, alpha: f32) {
        let rgb = color.to_rgb8();
        let steps = (b - a).abs().max_element().ceil().max(1.0) as i32;
        // Lines far off-screen would otherwise step millions of pixels
        if steps > 8 * (self.img.width() + self.img.height()) as i32 {
            return;
        }
        for i in 0..=steps {
            let p = a.lerp(b, i as f32 / steps as f32);
            self.blend(p.x as i32, p.y as i32, rgb, alpha);
        }
    }

    fn slab(&mut self, id: SlabId, q: [Vec2; 4], _image: usize, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        let Some(tex) = self.textures.get(&id).cloned() else { return };
        let uv = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        self.triangle(&tex, [q[0], q[1], q[2]], [uv[0], uv[1], uv[2]], alpha);
        self.triangle(&tex, [q[0], q[2], q[3]], [uv[0], uv[2], uv[3]], alpha);
    }
}
