// files.rs - Resolve queued slab loads from local image files
//
// Stands in for the browser's image loading. Each catalog entry is decoded
// once and shared between every slab that shows it.

use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;
use tunnel_engine::error::LoadError;
use tunnel_engine::loader::QueuedLoader;
use tunnel_engine::tunnel::Tunnel;

use crate::raster::ImageSurface;

#[derive(Default)]
pub struct FileImages {
    decoded: HashMap<String, Result<Rc<RgbaImage>, LoadError>>,
}

impl FileImages {
    fn decode(&mut self, path: &str) -> Result<Rc<RgbaImage>, LoadError> {
        self.decoded
            .entry(path.to_string())
            .or_insert_with(|| {
                let img = image::open(path).map_err(|e| match e {
                    image::ImageError::IoError(io) => LoadError::Io(io.to_string()),
                    other => LoadError::Decode(other.to_string()),
                })?;
                let rgba = img.to_rgba8();
                if rgba.width() == 0 || rgba.height() == 0 {
                    return Err(LoadError::Decode(format!("{path}: empty image")));
                }
                Ok(Rc::new(rgba))
            })
            .clone()
    }

    /// Drop textures of released slabs, then answer every pending request.
    /// Returns (loaded, failed).
    pub fn resolve(&mut self, tunnel: &mut Tunnel<QueuedLoader>, surface: &mut ImageSurface, now_ms: f64) -> (usize, usize) {
        for id in tunnel.loader_mut().drain_released() {
            surface.unbind(id);
        }

        let (mut loaded, mut failed) = (0, 0);
        for (id, path) in tunnel.loader_mut().drain_pending() {
            match self.decode(&path) {
                Ok(tex) => {
                    if tunnel.image_loaded(id, now_ms) {
                        surface.bind(id, tex);
                        loaded += 1;
                    }
                }
                Err(e) => {
                    tunnel.image_failed(id, &e);
                    failed += 1;
                }
            }
        }
        (loaded, failed)
    }
}
