// loader.rs - Image loading collaborator
//
// Loads are fire-and-forget. The engine asks for an image by slab id and the
// host reports completion later through `Tunnel::image_loaded` or
// `Tunnel::image_failed`. Ids are never reused, so a late completion for a
// recycled slab finds nothing and is dropped.

use std::collections::BTreeSet;

use js_sys::Function;
use wasm_bindgen::JsValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlabId(pub u32);

/// Hands out slab ids in increasing order.
#[derive(Debug, Default)]
pub struct SlabIds {
    next: u32,
}

impl SlabIds {
    pub fn next(&mut self) -> SlabId {
        let id = SlabId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

pub trait ImageLoader {
    /// Start loading `url` for slab `id`. Must not block.
    fn request(&mut self, id: SlabId, url: &str);

    /// Slab `id` is gone; drop its texture and forget any pending load.
    fn release(&mut self, id: SlabId);
}

/// Forwards requests to host callbacks: `request(id, url)` and `release(id)`.
pub struct JsImageLoader {
    on_request: Function,
    on_release: Function,
}

impl JsImageLoader {
    pub fn new(on_request: Function, on_release: Function) -> Self {
        Self { on_request, on_release }
    }
}

impl ImageLoader for JsImageLoader {
    fn request(&mut self, id: SlabId, url: &str) {
        let r = self.on_request.call2(&JsValue::NULL, &JsValue::from(id.0), &JsValue::from_str(url));
        if r.is_err() {
            tracing::warn!(slab = id.0, url, "image request callback threw");
        }
    }

    fn release(&mut self, id: SlabId) {
        if self.on_release.call1(&JsValue::NULL, &JsValue::from(id.0)).is_err() {
            tracing::warn!(slab = id.0, "image release callback threw");
        }
    }
}

/// Queues requests in memory for the caller to resolve later.
/// Tracks which slab resources are still alive.
#[derive(Debug, Default)]
pub struct QueuedLoader {
    pending: Vec<(SlabId, String)>,
    released: Vec<SlabId>,
    live: BTreeSet<SlabId>,
}

impl QueuedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every request made since the last drain that was not released meanwhile.
    pub fn drain_pending(&mut self) -> Vec<(SlabId, String)> {
        std::mem::take(&mut self.pending)
    }

    /// Take every release since the last drain.
    pub fn drain_released(&mut self) -> Vec<SlabId> {
        std::mem::take(&mut self.released)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, id: SlabId) -> bool {
        self.live.contains(&id)
    }
}

impl ImageLoader for QueuedLoader {
    fn request(&mut self, id: SlabId, url: &str) {
        self.live.insert(id);
        self.pending.push((id, url.to_string()));
    }

    fn release(&mut self, id: SlabId) {
        self.live.remove(&id);
        self.pending.retain(|(p, _)| *p != id);
        self.released.push(id);
    }
}
