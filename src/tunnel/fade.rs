// fade.rs - Slab fade-in tween
//
// Time based, sampled with the host's clock. Frame rate does not change
// how long a fade takes.

#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    start_ms: f64,
    duration_ms: f64,
    target: f32,
}

impl Fade {
    pub fn new(start_ms: f64, duration_ms: f64, target: f32) -> Self {
        Self { start_ms, duration_ms, target }
    }

    pub fn sample(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return self.target;
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms) as f32;
        self.target * ease_out_quad(t)
    }
}
