// pool.rs - Fixed ring of tunnel segments
//
// Segments are never created after construction. Each one holds an integer
// slot; its depth is `slot * depth`, so positions stay exact multiples of the
// segment depth no matter how far the camera travels. Adjacency is defined by
// slot value, not by index in the array.

use std::rc::Rc;

use super::placement::{ContentPlacer, Slab};
use super::wireframe::{Line, build_wireframe};
use crate::loader::{ImageLoader, SlabId};
use crate::theme::LineMaterial;

pub struct Segment {
    slot: i64,
    wireframe: Rc<[Line]>,
    pub material: LineMaterial,
    slabs: Vec<Slab>,
}

impl Segment {
    pub fn slot(&self) -> i64 {
        self.slot
    }

    pub fn wireframe(&self) -> &[Line] {
        &self.wireframe
    }

    pub fn slabs(&self) -> &[Slab] {
        &self.slabs
    }
}

/// What one recycling pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecycleReport {
    pub forward: usize,
    pub backward: usize,
    pub reanchored: bool,
}

impl RecycleReport {
    pub fn is_empty(&self) -> bool {
        self.forward == 0 && self.backward == 0 && !self.reanchored
    }
}

pub struct SegmentPool {
    segments: Vec<Segment>,
    depth: f32,
    recycle_events: u64,
}

impl SegmentPool {
    /// Build `count` segments at slots 0, -1, ..., -(count-1), each populated.
    pub fn new(count: usize, material: LineMaterial, placer: &mut ContentPlacer, loader: &mut dyn ImageLoader) -> Self {
        let wireframe: Rc<[Line]> = build_wireframe(placer.dims()).into();
        let segments = (0..count)
            .map(|i| Segment {
                slot: -(i as i64),
                wireframe: Rc::clone(&wireframe),
                material,
                slabs: placer.populate(loader),
            })
            .collect();

        Self { segments, depth: placer.dims().depth, recycle_events: 0 }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> impl Iterator<Item = &mut Segment> {
        self.segments.iter_mut()
    }

    /// World depth of segment `i`'s near face.
    pub fn z(&self, i: usize) -> f32 {
        self.segments[i].slot as f32 * self.depth
    }

    pub fn slab_count(&self) -> usize {
        self.segments.iter().map(|s| s.slabs.len()).sum()
    }

    /// Total relocations since construction.
    pub fn recycle_events(&self) -> u64 {
        self.recycle_events
    }

    pub fn slab_mut(&mut self, id: SlabId) -> Option<&mut Slab> {
        self.segments.iter_mut().flat_map(|s| s.slabs.iter_mut()).find(|s| s.id == id)
    }

    fn slot_bounds(&self) -> (i64, i64) {
        self.segments
            .iter()
            .fold((i64::MAX, i64::MIN), |(lo, hi), s| (lo.min(s.slot), hi.max(s.slot)))
    }

    /// Index of the extreme segment (`pick_max`) if it satisfies `out`.
    fn extreme_where(&self, pick_max: bool, out: impl Fn(f32) -> bool) -> Option<usize> {
        let (i, seg) = if pick_max {
            self.segments.iter().enumerate().max_by_key(|(_, s)| s.slot)?
        } else {
            self.segments.iter().enumerate().min_by_key(|(_, s)| s.slot)?
        };
        out(seg.slot as f32 * self.depth).then_some(i)
    }

    /// Recycle every segment that left the window around `cam_z`.
    ///
    /// Window: a segment is behind the camera once its near face is past
    /// `cam_z + depth`, and too far ahead once it is beyond
    /// `cam_z - count * depth - depth`.
    pub fn recycle(&mut self, cam_z: f32, placer: &mut ContentPlacer, loader: &mut dyn ImageLoader) -> RecycleReport {
        let mut report = RecycleReport::default();
        if self.segments.is_empty() || !cam_z.is_finite() {
            return report;
        }

        let d = self.depth;
        let n = self.segments.len();
        let behind = cam_z + d;
        let ahead = cam_z - n as f32 * d - d;

        // The camera outran the whole pool in one frame
        let (lo, hi) = self.slot_bounds();
        if lo as f32 * d > behind || (hi as f32 * d) < ahead {
            self.reanchor(cam_z, placer, loader);
            report.reanchored = true;
            return report;
        }

        // Farthest-behind first keeps the run contiguous after every move.
        for _ in 0..n {
            let Some(i) = self.extreme_where(true, |z| z > behind) else { break };
            let slot = self.slot_bounds().0 - 1;
            self.relocate(i, slot, placer, loader);
            report.forward += 1;
        }
        for _ in 0..n {
            let Some(i) = self.extreme_where(false, |z| z < ahead) else { break };
            let slot = self.slot_bounds().1 + 1;
            self.relocate(i, slot, placer, loader);
            report.backward += 1;
        }

        report
    }

    /// Lay the pool out fresh from the camera's slot forward.
    fn reanchor(&mut self, cam_z: f32, placer: &mut ContentPlacer, loader: &mut dyn ImageLoader) {
        let top = (cam_z / self.depth).ceil() as i64;
        tracing::debug!(cam_z, top, "camera left the pool, re-anchoring");
        for i in 0..self.segments.len() {
            self.relocate(i, top - i as i64, placer, loader);
        }
    }

    fn relocate(&mut self, i: usize, slot: i64, placer: &mut ContentPlacer, loader: &mut dyn ImageLoader) {
        let seg = &mut self.segments[i];
        tracing::debug!(from = seg.slot, to = slot, released = seg.slabs.len(), "recycling segment");
        for slab in seg.slabs.drain(..) {
            loader.release(slab.id);
        }
        seg.slot = slot;
        seg.slabs = placer.populate(loader);
        self.recycle_events += 1;
    }

    /// Drop every slab and release its resources. Segments stay in place.
    pub fn release_all(&mut self, loader: &mut dyn ImageLoader) {
        for seg in &mut self.segments {
            for slab in seg.slabs.drain(..) {
                loader.release(slab.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TunnelConfig;
    use crate::loader::QueuedLoader;
    use crate::rng::Xorshift32;
    use crate::theme::Palette;

    fn pool(config: &TunnelConfig) -> (SegmentPool, ContentPlacer, QueuedLoader) {
        let mut placer = ContentPlacer::new(config, Box::new(Xorshift32::new(42)));
        let mut loader = QueuedLoader::new();
        let material = LineMaterial::from_palette(&Palette::LIGHT);
        let pool = SegmentPool::new(config.segment_count, material, &mut placer, &mut loader);
        (pool, placer, loader)
    }

    fn sorted_slots(pool: &SegmentPool) -> Vec<i64> {
        let mut slots: Vec<i64> = pool.segments().iter().map(Segment::slot).collect();
        slots.sort_unstable();
        slots
    }

    fn assert_contiguous(pool: &SegmentPool) {
        let slots = sorted_slots(pool);
        for w in slots.windows(2) {
            assert_eq!(w[1] - w[0], 1, "gap or duplicate in {slots:?}");
        }
    }

    #[test]
    fn initial_layout() {
        let (pool, _, loader) = pool(&TunnelConfig::default());
        assert_eq!(pool.len(), 14);
        assert_eq!(sorted_slots(&pool), (-13..=0).collect::<Vec<_>>());
        assert_eq!(pool.z(0), 0.0);
        assert_eq!(pool.z(13), -78.0);
        assert_eq!(loader.live_count(), pool.slab_count());
    }

    #[test]
    fn camera_at_origin_recycles_nothing() {
        let (mut pool, mut placer, mut loader) = pool(&TunnelConfig::default());
        let r = pool.recycle(0.0, &mut placer, &mut loader);
        assert!(r.is_empty());
        assert_eq!(pool.recycle_events(), 0);
    }

    #[test]
    fn forward_moves_nearest_to_far_end() {
        let (mut pool, mut placer, mut loader) = pool(&TunnelConfig::default());
        let before: Vec<SlabId> = pool.segments()[0].slabs().iter().map(|s| s.id).collect();

        let r = pool.recycle(-6.5, &mut placer, &mut loader);
        assert_eq!(r, RecycleReport { forward: 1, backward: 0, reanchored: false });
        assert_eq!(pool.z(0), -84.0);
        assert_contiguous(&pool);
        for id in before {
            assert!(!loader.is_live(id));
        }
        assert_eq!(loader.live_count(), pool.slab_count());
    }

    #[test]
    fn backward_moves_far_end_behind_camera() {
        let (mut pool, mut placer, mut loader) = pool(&TunnelConfig::default());
        pool.recycle(-20.0, &mut placer, &mut loader);
        assert_contiguous(&pool);
        assert_eq!(sorted_slots(&pool), (-16..=-3).collect::<Vec<_>>());

        // Back at the top only the segment past cam - 15d returns
        let r = pool.recycle(0.0, &mut placer, &mut loader);
        assert_eq!(r, RecycleReport { forward: 0, backward: 1, reanchored: false });
        assert_eq!(sorted_slots(&pool), (-15..=-2).collect::<Vec<_>>());
        assert_eq!(loader.live_count(), pool.slab_count());

        let r = pool.recycle(12.0, &mut placer, &mut loader);
        assert_eq!(r.backward, 2);
        assert_eq!(sorted_slots(&pool), (-13..=0).collect::<Vec<_>>());
    }

    #[test]
    fn multi_segment_step_stays_contiguous() {
        let (mut pool, mut placer, mut loader) = pool(&TunnelConfig::default());
        let r = pool.recycle(-31.0, &mut placer, &mut loader);
        assert_eq!(r.forward, 5);
        assert_contiguous(&pool);
        assert_eq!(sorted_slots(&pool).last(), Some(&-5));
    }

    #[test]
    fn huge_jump_reanchors() {
        let (mut pool, mut placer, mut loader) = pool(&TunnelConfig::default());
        let r = pool.recycle(-1000.0, &mut placer, &mut loader);
        assert!(r.reanchored);
        assert_contiguous(&pool);
        let slots = sorted_slots(&pool);
        let top = *slots.last().unwrap() as f32 * 6.0;
        assert!(top <= -1000.0 + 6.0 && top >= -1000.0);
        assert_eq!(pool.recycle_events(), 14);

        // Stable afterwards
        assert!(pool.recycle(-1000.0, &mut placer, &mut loader).is_empty());
        assert_eq!(loader.live_count(), pool.slab_count());
    }

    #[test]
    fn huge_jump_back_reanchors() {
        let (mut pool, mut placer, mut loader) = pool(&TunnelConfig::default());
        let r = pool.recycle(500.0, &mut placer, &mut loader);
        assert!(r.reanchored);
        assert_contiguous(&pool);
        assert!(pool.recycle(500.0, &mut placer, &mut loader).is_empty());
    }

    #[test]
    fn non_finite_camera_is_ignored() {
        let (mut pool, mut placer, mut loader) = pool(&TunnelConfig::default());
        assert!(pool.recycle(f32::NAN, &mut placer, &mut loader).is_empty());
        assert_eq!(sorted_slots(&pool), (-13..=0).collect::<Vec<_>>());
    }

    #[test]
    fn release_all_frees_every_slab() {
        let (mut pool, _, mut loader) = pool(&TunnelConfig::default());
        pool.release_all(&mut loader);
        assert_eq!(pool.slab_count(), 0);
        assert_eq!(loader.live_count(), 0);
        assert_eq!(pool.len(), 14);
    }

    #[test]
    fn segments_share_one_wireframe() {
        let (pool, _, _) = pool(&TunnelConfig::default());
        let a = pool.segments()[0].wireframe().as_ptr();
        let b = pool.segments()[5].wireframe().as_ptr();
        assert_eq!(a, b);
    }
}
