use wasm_bindgen::prelude::*;

// ============================================================================
// TUNNEL - Scroll-driven endless grid tunnel with image slabs
// ============================================================================
//
// The host page owns requestAnimationFrame, scroll/resize listeners and image
// elements. Each frame it calls `tick(now)` and draws the records exposed via
// `output_ptr()/output_len()` (see render.rs for the layout).

pub mod camera;
pub mod config;
pub mod error;
pub mod loader;
pub mod render;
pub mod rng;
pub mod theme;
pub mod tunnel;

use camera::Viewport;
use config::TunnelConfig;
use error::LoadError;
use loader::{JsImageLoader, SlabId};
use render::DrawList;
use rng::Xorshift32;
use theme::Theme;
use tunnel::Tunnel;

#[wasm_bindgen]
pub struct TunnelView {
    tunnel: Tunnel<JsImageLoader>,
    out: DrawList,
}

#[wasm_bindgen]
impl TunnelView {
    /// `load(id, url)` is called for every slab image; answer with
    /// `image_loaded(id, now)` or `image_failed(id, reason)`.
    /// `release(id)` means the slab is gone and its image can be dropped.
    #[wasm_bindgen(constructor)]
    pub fn new(w: u32, h: u32, dark: bool, scroll: f32, load: js_sys::Function, release: js_sys::Function) -> Result<TunnelView, JsValue> {
        Self::build(TunnelConfig::default(), w, h, dark, scroll, load, release)
    }

    /// Same as `new` with a JSON object overriding config fields.
    pub fn with_config(
        config_json: &str,
        w: u32,
        h: u32,
        dark: bool,
        scroll: f32,
        load: js_sys::Function,
        release: js_sys::Function,
    ) -> Result<TunnelView, JsValue> {
        let config = TunnelConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Self::build(config, w, h, dark, scroll, load, release)
    }

    pub fn tick(&mut self, now_ms: f64) {
        self.tunnel.tick(now_ms, Some(&mut self.out));
    }

    pub fn set_scroll(&mut self, offset: f32) {
        self.tunnel.set_scroll(offset);
    }

    pub fn resize(&mut self, w: u32, h: u32) {
        self.tunnel.resize(Viewport::new(w, h));
    }

    pub fn set_theme(&mut self, dark: bool) {
        self.tunnel.set_theme(Theme::from_dark_flag(dark));
    }

    pub fn image_loaded(&mut self, id: u32, now_ms: f64) -> bool {
        self.tunnel.image_loaded(SlabId(id), now_ms)
    }

    pub fn image_failed(&mut self, id: u32, reason: String) -> bool {
        self.tunnel.image_failed(SlabId(id), &LoadError::Network(reason))
    }

    pub fn teardown(&mut self) {
        self.tunnel.teardown();
    }

    /// Catalog URL for an image index found in a slab record.
    pub fn image_url(&self, image: usize) -> Option<String> {
        self.tunnel.config().catalog.get(image).cloned()
    }

    pub fn camera_depth(&self) -> f32 { self.tunnel.camera_depth() }
    pub fn output_ptr(&self) -> *const f32 { self.out.ptr() }
    pub fn output_len(&self) -> usize { self.out.len() }
    pub fn width(&self) -> u32 { self.tunnel.viewport().width }
    pub fn height(&self) -> u32 { self.tunnel.viewport().height }
}

impl TunnelView {
    fn build(
        config: TunnelConfig,
        w: u32,
        h: u32,
        dark: bool,
        scroll: f32,
        load: js_sys::Function,
        release: js_sys::Function,
    ) -> Result<TunnelView, JsValue> {
        let rng = Xorshift32::from_unit(js_sys::Math::random());
        let mut tunnel = Tunnel::new(
            config,
            Viewport::new(w, h),
            Theme::from_dark_flag(dark),
            JsImageLoader::new(load, release),
            Box::new(rng),
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        tunnel.start_at(scroll);

        Ok(Self { tunnel, out: DrawList::new() })
    }
}
