// rng.rs - Random sources for content placement
//
// Placement is random on purpose and never seeded from config.
// The source sits behind a trait so tests and previews can replay a stream.

/// Uniform samples in [0, 1).
pub trait RandomSource {
    fn next_f32(&mut self) -> f32;
}

/// xorshift32 (13, 17, 5), top 24 bits as the mantissa.
#[derive(Clone, Debug)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    pub fn new(seed: u32) -> Self {
        // Zero is a fixed point of xorshift
        Self { state: if seed == 0 { 0xDEADBEEF } else { seed } }
    }

    /// Seed from a unit float such as `Math.random()`.
    pub fn from_unit(u: f64) -> Self {
        Self::new((u.clamp(0.0, 1.0) * u32::MAX as f64) as u32)
    }
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(0xDEADBEEF)
    }
}

impl RandomSource for Xorshift32 {
    #[inline(always)]
    fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        (self.state >> 8) as f32 * (1.0 / 16777216.0)
    }
}

/// Replays a fixed sequence of samples, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values = values.into();
        assert!(!values.is_empty(), "scripted random needs at least one value");
        Self { values, pos: 0 }
    }

    /// Number of samples drawn so far.
    pub fn drawn(&self) -> usize {
        self.pos
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f32(&mut self) -> f32 {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}
