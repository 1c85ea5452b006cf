//! Scripted randomness.
//!
//! [`ScriptedRng`] replays a fixed list of uniform draws so tests can force
//! every roll of an attack. A value `v` in `[0, 1)` comes back out of
//! `rng.gen::<f64>()` as the largest multiple of `2^-53` not above `v`.

use rand::{Error, RngCore};

const F64_BITS: u32 = 53;

/// Random source that yields a predetermined sequence of `f64` draws.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    /// Replay `draws` in order.
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            cursor: 0,
        }
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    /// Draws not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len() - self.cursor
    }

    fn encode(value: f64) -> u64 {
        let clamped = value.clamp(0.0, 1.0 - f64::EPSILON);
        let fraction = (clamped * (1u64 << F64_BITS) as f64) as u64;
        fraction << (64 - F64_BITS)
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// # Panics
    ///
    /// Panics when the script is exhausted.
    fn next_u64(&mut self) -> u64 {
        let Some(&value) = self.draws.get(self.cursor) else {
            panic!(
                "ScriptedRng exhausted after {} draws; the code under test rolled more than scripted",
                self.cursor
            );
        };
        self.cursor += 1;
        Self::encode(value)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
