// tunnel/ - Infinite tunnel engine
//
// One `Tunnel` owns the camera, the segment pool and the content placer.
// The host calls `tick` once per display frame:
//   camera update -> recycle -> draw
// Recycling always happens before drawing, so a moved segment is never
// drawn at its old position.

mod fade;
mod placement;
mod pool;
mod wireframe;

pub use fade::{Fade, ease_out_quad};
pub use placement::{ContentPlacer, Face, Slab, SlabMaterial, plan_face};
pub use pool::{RecycleReport, Segment, SegmentPool};
pub use wireframe::{Line, SegmentDims, build_wireframe, line_count};

use crate::camera::{Camera, CameraDriver, Viewport};
use crate::config::TunnelConfig;
use crate::error::{ConfigError, LoadError};
use crate::loader::{ImageLoader, SlabId};
use crate::render::{Fog, FrameInputs, Surface, draw_frame};
use crate::rng::RandomSource;
use crate::theme::{LineMaterial, SceneStyle, Theme, apply_palette};

/// Result of one `tick`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    Drawn { primitives: usize, recycled: RecycleReport },
    /// Torn down, no surface, or a zero-area viewport.
    Skipped,
}

pub struct Tunnel<L: ImageLoader> {
    config: TunnelConfig,
    driver: CameraDriver,
    camera: Camera,
    viewport: Viewport,
    pool: SegmentPool,
    placer: ContentPlacer,
    loader: L,
    theme: Theme,
    style: SceneStyle,
    running: bool,
    frames: u64,
}

impl<L: ImageLoader> Tunnel<L> {
    /// Build the pool, start every initial image load and apply `theme`.
    pub fn new(
        config: TunnelConfig,
        viewport: Viewport,
        theme: Theme,
        mut loader: L,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let palette = *config.palette(theme);
        let mut placer = ContentPlacer::new(&config, rng);
        let pool = SegmentPool::new(config.segment_count, LineMaterial::from_palette(&palette), &mut placer, &mut loader);
        let camera = Camera::new(config.fov_deg, viewport.aspect(), config.near, config.far);
        let driver = CameraDriver::new(config.scroll_to_depth, config.smoothing);

        tracing::info!(
            segments = pool.len(),
            slabs = pool.slab_count(),
            ?theme,
            width = viewport.width,
            height = viewport.height,
            "tunnel initialised"
        );

        Ok(Self {
            config,
            driver,
            camera,
            viewport,
            pool,
            placer,
            loader,
            theme,
            style: SceneStyle::from_palette(&palette),
            running: true,
            frames: 0,
        })
    }

    /// Place the camera at `offset` without easing. Only meant for mount,
    /// when the page may already be scrolled.
    pub fn start_at(&mut self, offset: f32) {
        self.driver.set_scroll(offset);
        self.driver.snap();
        self.camera.set_depth(self.driver.depth());
    }

    pub fn set_scroll(&mut self, offset: f32) {
        self.driver.set_scroll(offset);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
        tracing::debug!(width = viewport.width, height = viewport.height, "viewport resized");
    }

    /// Recolour background, fog and every segment's lines. Slabs are untouched.
    pub fn set_theme(&mut self, theme: Theme) {
        let palette = *self.config.palette(theme);
        apply_palette(&palette, &mut self.style, &mut self.pool);
        if theme != self.theme {
            tracing::info!(?theme, "theme changed");
        }
        self.theme = theme;
    }

    /// One frame. Never blocks on image loads.
    pub fn tick<S: Surface>(&mut self, now_ms: f64, surface: Option<&mut S>) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Skipped;
        }
        let Some(surface) = surface else {
            return FrameOutcome::Skipped;
        };
        if self.viewport.is_empty() {
            return FrameOutcome::Skipped;
        }

        let z = self.driver.update();
        self.camera.set_depth(z);
        let recycled = self.pool.recycle(z, &mut self.placer, &mut self.loader);

        let inputs = FrameInputs {
            pool: &self.pool,
            camera: &self.camera,
            viewport: self.viewport,
            style: &self.style,
            fog: Fog { color: self.style.fog, near: self.config.fog_near, far: self.config.fog_far },
            now_ms,
        };
        let primitives = draw_frame(&inputs, surface);
        self.frames += 1;

        FrameOutcome::Drawn { primitives, recycled }
    }

    /// The image for `id` finished loading; start its fade-in.
    /// Returns false if the slab no longer exists or already settled.
    pub fn image_loaded(&mut self, id: SlabId, now_ms: f64) -> bool {
        if !self.running {
            return false;
        }
        let material = self.placer.loaded_material(now_ms);
        self.settle(id, material)
    }

    /// The image for `id` failed. The slab stays invisible; nothing is retried.
    pub fn image_failed(&mut self, id: SlabId, err: &LoadError) -> bool {
        tracing::debug!(slab = id.0, error = %err, "image load failed");
        if !self.running {
            return false;
        }
        self.settle(id, SlabMaterial::Failed)
    }

    // Only a pending slab takes a load result; repeats are dropped.
    fn settle(&mut self, id: SlabId, material: SlabMaterial) -> bool {
        match self.pool.slab_mut(id) {
            Some(slab) if slab.material == SlabMaterial::Pending => {
                slab.material = material;
                true
            }
            Some(_) => {
                tracing::debug!(slab = id.0, "duplicate load result ignored");
                false
            }
            None => {
                tracing::debug!(slab = id.0, "load resolved for a recycled slab");
                false
            }
        }
    }

    /// Stop drawing and release every slab resource. Safe to call twice.
    pub fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.pool.release_all(&mut self.loader);
        tracing::info!(frames = self.frames, recycled = self.pool.recycle_events(), "tunnel torn down");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    pub fn camera_depth(&self) -> f32 {
        self.driver.depth()
    }

    /// Depth the camera is easing toward.
    pub fn camera_target(&self) -> f32 {
        self.driver.target()
    }

    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::QueuedLoader;
    use crate::render::DrawList;
    use crate::rng::Xorshift32;
    use crate::theme::Palette;

    fn tunnel(theme: Theme) -> Tunnel<QueuedLoader> {
        Tunnel::new(
            TunnelConfig::default(),
            Viewport::new(800, 600),
            theme,
            QueuedLoader::new(),
            Box::new(Xorshift32::new(9)),
        )
        .unwrap()
    }

    fn any_slab(t: &Tunnel<QueuedLoader>) -> SlabId {
        t.pool().segments().iter().flat_map(|s| s.slabs()).next().expect("pool has slabs").id
    }

    #[test]
    fn invalid_config_rejected() {
        let config = TunnelConfig { segment_count: 0, ..TunnelConfig::default() };
        let r = Tunnel::new(config, Viewport::new(1, 1), Theme::Light, QueuedLoader::new(), Box::new(Xorshift32::default()));
        assert!(r.is_err());
    }

    #[test]
    fn missing_surface_skips_whole_frame() {
        let mut t = tunnel(Theme::Light);
        t.set_scroll(1000.0);
        assert_eq!(t.tick::<DrawList>(0.0, None), FrameOutcome::Skipped);
        assert_eq!(t.camera_depth(), 0.0);
        assert_eq!(t.frames(), 0);
    }

    #[test]
    fn zero_area_viewport_skips_whole_frame() {
        let mut t = Tunnel::new(
            TunnelConfig::default(),
            Viewport::new(0, 0),
            Theme::Light,
            QueuedLoader::new(),
            Box::new(Xorshift32::new(9)),
        )
        .unwrap();
        let mut out = DrawList::new();
        t.set_scroll(1000.0);
        assert_eq!(t.tick(0.0, Some(&mut out)), FrameOutcome::Skipped);
        assert!(out.is_empty());
        assert_eq!(t.camera_depth(), 0.0);

        t.resize(Viewport::new(800, 0));
        assert_eq!(t.tick(16.0, Some(&mut out)), FrameOutcome::Skipped);

        t.resize(Viewport::new(800, 600));
        assert!(matches!(t.tick(32.0, Some(&mut out)), FrameOutcome::Drawn { .. }));
        assert_eq!(t.frames(), 1);
    }

    #[test]
    fn tick_moves_camera_then_draws() {
        let mut t = tunnel(Theme::Light);
        let mut out = DrawList::new();
        t.set_scroll(200.0);
        match t.tick(16.0, Some(&mut out)) {
            FrameOutcome::Drawn { primitives, .. } => assert!(primitives > 0),
            FrameOutcome::Skipped => panic!("frame skipped"),
        }
        assert!((t.camera_depth() - -1.0).abs() < 1e-6);
        assert!(!out.is_empty());
    }

    #[test]
    fn start_at_snaps_camera() {
        let mut t = tunnel(Theme::Light);
        t.start_at(2000.0);
        assert_eq!(t.camera_depth(), -100.0);
        let mut out = DrawList::new();
        let FrameOutcome::Drawn { recycled, .. } = t.tick(0.0, Some(&mut out)) else { panic!("skipped") };
        assert!(recycled.reanchored);
    }

    #[test]
    fn load_completion_starts_fade() {
        let mut t = tunnel(Theme::Light);
        let id = any_slab(&t);
        assert!(t.image_loaded(id, 100.0));
        let slab = t.pool().segments().iter().flat_map(|s| s.slabs()).find(|s| s.id == id).unwrap();
        assert_eq!(slab.opacity(100.0), 0.0);
        assert!((slab.opacity(100.0 + t.config().fade_ms) - t.config().slab_opacity).abs() < 1e-6);
    }

    #[test]
    fn failed_load_stays_invisible() {
        let mut t = tunnel(Theme::Light);
        let id = any_slab(&t);
        assert!(t.image_failed(id, &LoadError::Network("404".into())));
        let slab = t.pool().segments().iter().flat_map(|s| s.slabs()).find(|s| s.id == id).unwrap();
        assert_eq!(slab.material, SlabMaterial::Failed);
        assert_eq!(slab.opacity(1e9), 0.0);
    }

    #[test]
    fn repeated_load_keeps_running_fade() {
        let mut t = tunnel(Theme::Light);
        let id = any_slab(&t);
        assert!(t.image_loaded(id, 0.0));
        assert!(!t.image_loaded(id, 500.0));
        let slab = t.pool().segments().iter().flat_map(|s| s.slabs()).find(|s| s.id == id).unwrap();
        // Still timed from the first completion
        assert!((slab.opacity(t.config().fade_ms) - t.config().slab_opacity).abs() < 1e-6);
        assert!(slab.opacity(500.0) > 0.0);
    }

    #[test]
    fn failed_slab_ignores_late_success() {
        let mut t = tunnel(Theme::Light);
        let id = any_slab(&t);
        assert!(t.image_failed(id, &LoadError::Network("timeout".into())));
        assert!(!t.image_loaded(id, 0.0));
        let slab = t.pool().segments().iter().flat_map(|s| s.slabs()).find(|s| s.id == id).unwrap();
        assert_eq!(slab.material, SlabMaterial::Failed);
    }

    #[test]
    fn late_load_for_recycled_slab_is_ignored() {
        let mut t = tunnel(Theme::Light);
        let first = t.pool().segments()[0].slabs().first().map(|s| s.id);
        t.start_at(200.0);
        let mut out = DrawList::new();
        t.tick(0.0, Some(&mut out));
        if let Some(id) = first {
            assert!(!t.image_loaded(id, 0.0));
            assert!(!t.loader().is_live(id));
        }
        assert!(!t.image_loaded(SlabId(u32::MAX), 0.0));
    }

    #[test]
    fn theme_switch_recolours_lines_only() {
        let mut t = tunnel(Theme::Light);
        let slabs_before: Vec<Slab> = t.pool().segments().iter().flat_map(|s| s.slabs().to_vec()).collect();

        t.set_theme(Theme::Dark);
        assert_eq!(t.style().background, Palette::DARK.background);
        assert_eq!(t.style().fog, Palette::DARK.fog);
        assert!(t.pool().segments().iter().all(|s| s.material == LineMaterial::from_palette(&Palette::DARK)));

        let slabs_after: Vec<Slab> = t.pool().segments().iter().flat_map(|s| s.slabs().to_vec()).collect();
        assert_eq!(slabs_before, slabs_after);
    }

    #[test]
    fn theme_apply_is_idempotent() {
        let mut once = tunnel(Theme::Light);
        once.set_theme(Theme::Dark);
        let style_once = *once.style();
        let mats_once: Vec<LineMaterial> = once.pool().segments().iter().map(|s| s.material).collect();

        once.set_theme(Theme::Dark);
        let mats_twice: Vec<LineMaterial> = once.pool().segments().iter().map(|s| s.material).collect();
        assert_eq!(style_once, *once.style());
        assert_eq!(mats_once, mats_twice);
    }

    #[test]
    fn teardown_releases_everything_and_stops() {
        let mut t = tunnel(Theme::Dark);
        assert!(t.loader().live_count() > 0);
        let id = any_slab(&t);
        t.teardown();
        assert!(!t.is_running());
        assert_eq!(t.loader().live_count(), 0);

        let mut out = DrawList::new();
        assert_eq!(t.tick(0.0, Some(&mut out)), FrameOutcome::Skipped);
        // In-flight loads resolving after teardown are harmless
        assert!(!t.image_loaded(id, 0.0));
        assert!(!t.image_failed(id, &LoadError::Decode("late".into())));
        t.teardown();
    }
}
