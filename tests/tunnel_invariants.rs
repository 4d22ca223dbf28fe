//! Invariant tests for the tunnel engine.
//!
//! Verifies:
//! 1. Pool size and contiguity hold for any camera path, jumps included
//! 2. Live slab resources always equal the slabs held by the pool
//! 3. Adjacency law: no two filled cells on a face are neighbours
//! 4. Scrolling one tunnel length recycles every segment exactly once
//! 5. Camera smoothing closes the gap every frame without overshooting

use proptest::prelude::*;
use tunnel_engine::camera::{CameraDriver, Viewport};
use tunnel_engine::config::TunnelConfig;
use tunnel_engine::loader::QueuedLoader;
use tunnel_engine::render::DrawList;
use tunnel_engine::rng::{ScriptedRandom, Xorshift32};
use tunnel_engine::theme::Theme;
use tunnel_engine::tunnel::{FrameOutcome, SegmentPool, Tunnel, plan_face};

fn tunnel(seed: u32) -> Tunnel<QueuedLoader> {
    Tunnel::new(
        TunnelConfig::default(),
        Viewport::new(640, 480),
        Theme::Light,
        QueuedLoader::new(),
        Box::new(Xorshift32::new(seed)),
    )
    .unwrap()
}

fn slots(pool: &SegmentPool) -> Vec<i64> {
    let mut s: Vec<i64> = pool.segments().iter().map(|s| s.slot()).collect();
    s.sort_unstable();
    s
}

fn assert_pool_ok(t: &Tunnel<QueuedLoader>, n: usize) {
    let s = slots(t.pool());
    assert_eq!(s.len(), n);
    for w in s.windows(2) {
        assert_eq!(w[1] - w[0], 1, "slots not contiguous: {s:?}");
    }
    assert_eq!(t.loader().live_count(), t.pool().slab_count());
}

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_scroll_path() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(
        prop_oneof![
            4 => 0.0f32..3000.0,
            1 => 0.0f32..100_000.0,
        ],
        1..20,
    )
}

proptest! {
    #[test]
    fn pool_stays_whole_for_any_scroll_path(seed in 1u32.., path in arb_scroll_path(), frames in 1usize..8) {
        let mut t = tunnel(seed);
        let mut out = DrawList::new();
        for offset in path {
            t.set_scroll(offset);
            for f in 0..frames {
                t.tick(f as f64, Some(&mut out));
                assert_pool_ok(&t, 14);
            }
        }
    }

    #[test]
    fn pool_stays_whole_when_jumping(seed in 1u32.., offsets in prop::collection::vec(-50_000.0f32..50_000.0, 1..20)) {
        let mut t = tunnel(seed);
        let mut out = DrawList::new();
        for offset in offsets {
            t.start_at(offset);
            t.tick(0.0, Some(&mut out));
            assert_pool_ok(&t, 14);
        }
    }

    #[test]
    fn no_adjacent_fills(
        cells in 0usize..64,
        p in 0.0f32..=1.0,
        samples in prop::collection::vec(0.0f32..1.0, 1..128),
    ) {
        let mut rng = ScriptedRandom::new(samples);
        let fills = plan_face(cells, p, 12, &mut rng);
        for w in fills.windows(2) {
            prop_assert!(w[1].0 >= w[0].0 + 2, "adjacent fills {:?}", fills);
        }
        prop_assert!(fills.iter().all(|&(c, img)| c < cells && img < 12));
    }
}

#[test]
fn one_tunnel_length_recycles_each_segment_once() {
    let mut t = tunnel(77);
    let mut out = DrawList::new();
    let start = t.pool().segments().iter().map(|s| s.slot()).collect::<Vec<_>>();
    let first_ids: Vec<_> = t.pool().segments()[0].slabs().iter().map(|s| s.id).collect();
    let mut moves = vec![0usize; 14];
    let mut last = start.clone();

    // scroll 1800 px * 0.05 = depth 90
    t.set_scroll(1800.0);
    for f in 0..400 {
        let outcome = t.tick(f as f64 * 16.0, Some(&mut out));
        assert!(matches!(outcome, FrameOutcome::Drawn { recycled, .. } if !recycled.reanchored));
        for (i, seg) in t.pool().segments().iter().enumerate() {
            if seg.slot() != last[i] {
                moves[i] += 1;
                last[i] = seg.slot();
            }
        }
        assert_pool_ok(&t, 14);
    }

    assert!(moves.iter().all(|&m| m == 1), "moves {moves:?}");
    assert_eq!(t.pool().recycle_events(), 14);
    // The segment that started at 0 now opens the far end at -84
    assert_eq!(t.pool().z(0), -84.0);
    assert_eq!(slots(t.pool()), (-27..=-14).collect::<Vec<_>>());
    for id in first_ids {
        assert!(!t.loader().is_live(id));
    }
}

#[test]
fn smoothing_approaches_from_either_side() {
    for (from, to) in [(0.0f32, 1000.0f32), (1000.0, 0.0)] {
        let mut d = CameraDriver::new(0.05, 0.1);
        d.set_scroll(from);
        d.snap();
        d.set_scroll(to);
        let target = d.target();
        let side = (target - d.depth()).signum();
        let mut gap = (target - d.depth()).abs();
        for _ in 0..60 {
            let z = d.update();
            let g = (target - z).abs();
            assert!(g < gap);
            assert_eq!((target - z).signum(), side, "overshot target");
            gap = g;
        }
    }
}

#[test]
fn loads_resolved_after_recycling_are_harmless() {
    let mut t = tunnel(5);
    let mut out = DrawList::new();
    let stale = t.loader_mut().drain_pending();
    assert!(!stale.is_empty());

    t.start_at(10_000.0);
    t.tick(0.0, Some(&mut out));

    for (id, _) in stale {
        assert!(!t.image_loaded(id, 0.0));
    }
    for (id, _) in t.loader_mut().drain_pending() {
        assert!(t.image_loaded(id, 0.0));
    }
    assert!(t.pool().segments().iter().flat_map(|s| s.slabs()).all(|s| s.is_loaded()));
}
