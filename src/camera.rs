// camera.rs - Scroll-driven camera
//
// The driver turns page scroll into a target depth and eases toward it.
// The camera itself is a fixed-orientation perspective camera looking down -Z.

use glam::{Mat4, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct CameraDriver {
    depth: f32,
    target: f32,
    scroll_to_depth: f32,
    smoothing: f32,
}

impl CameraDriver {
    pub fn new(scroll_to_depth: f32, smoothing: f32) -> Self {
        Self { depth: 0.0, target: 0.0, scroll_to_depth, smoothing }
    }

    /// Latest scroll offset from the host. Not validated.
    pub fn set_scroll(&mut self, offset: f32) {
        self.target = -offset * self.scroll_to_depth;
    }

    /// Jump straight to the current target. Used at initialisation only.
    pub fn snap(&mut self) {
        self.depth = self.target;
    }

    /// One frame of exponential smoothing; returns the new depth.
    pub fn update(&mut self) -> f32 {
        self.depth += (self.target - self.depth) * self.smoothing;
        self.depth
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

/// Drawable surface size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self { position: Vec3::ZERO, fov_y: fov_deg.to_radians(), aspect, near, far }
    }

    pub fn set_depth(&mut self, z: f32) {
        self.position.z = z;
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        // Zero-area viewports give a degenerate aspect; keep the matrix finite
        Mat4::perspective_rh(self.fov_y, self.aspect.max(1e-6), self.near, self.far)
    }
}
