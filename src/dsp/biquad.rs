//! # Biquad Filter Stage
//!
//! One stage of the EQ chain: a set of [`Coefficients`], a bypass flag, and
//! the two state variables that give the filter its memory.
//!
//! ## Transposed Direct Form II
//!
//! ```text
//! y[n]  = b0·x[n] + s1
//! s1   ← b1·x[n] - a1·y[n] + s2
//! s2   ← b2·x[n] - a2·y[n]
//! ```
//!
//! Two state variables instead of four (direct form I keeps `x[n-1]`,
//! `x[n-2]`, `y[n-1]`, `y[n-2]`), and it behaves well in `f32` when a
//! high-Q section sits close to the unit circle.
//!
//! ## Coefficients vs. State
//!
//! Coefficients are swapped as a whole value and never touch the state
//! variables. The filter's history stays continuous across a parameter
//! change, which is what keeps a knob sweep from clicking.

use super::coefficients::Coefficients;

/// A single second-order IIR stage.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    coefficients: Coefficients,
    bypassed: bool,
    s1: f32,
    s2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

impl Biquad {
    /// Create a stage with identity coefficients and silent state.
    pub fn new() -> Self {
        Self {
            coefficients: Coefficients::IDENTITY,
            bypassed: false,
            s1: 0.0,
            s2: 0.0,
        }
    }

    /// Replace the coefficients. State is kept.
    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    /// A bypassed stage passes samples through untouched and does not
    /// advance its state.
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Run one sample through the difference equation.
    ///
    /// Ignores the bypass flag; callers that want bypass semantics use
    /// [`process_block`](Self::process_block).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coefficients;
        let output = c.b0 * input + self.s1;
        self.s1 = c.b1 * input - c.a1 * output + self.s2;
        self.s2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Filter a block in place, or leave it alone when bypassed.
    pub fn process_block(&mut self, samples: &mut [f32]) {
        if self.bypassed {
            return;
        }
        for sample in samples.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Zero the state variables.
    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}
