//! # Filter Coefficient Design
//!
//! Every stage of the EQ is a *biquad*: a second-order IIR filter with the
//! transfer function
//!
//! ```text
//!         b0 + b1·z⁻¹ + b2·z⁻²
//! H(z) = ──────────────────────
//!          1 + a1·z⁻¹ + a2·z⁻²
//! ```
//!
//! Five numbers fully describe a stage. This module turns musical
//! parameters (frequency, gain, Q, slope) into those five numbers. It never
//! touches audio; the stages in [`super::biquad`] run the difference
//! equation.
//!
//! ## Design Precision
//!
//! All formulas are evaluated in `f64` and rounded to `f32` once at the end.
//! Trigonometry near 20 Hz at 96 kHz is badly conditioned in `f32`, and the
//! rounding happens in exactly one place, which keeps two designs from the
//! same inputs bit-identical.
//!
//! ## Cut Filters as Cascades
//!
//! A single biquad low-pass or high-pass rolls off at 12 dB/octave. Steeper
//! slopes come from cascading Butterworth sections whose individual Q values
//! are chosen so the product of their responses is maximally flat in the
//! passband:
//!
//! ```text
//! order N (even):  Q_k = 1 / (2·cos((2k + 1)·π / 2N))    k = 0 .. N/2
//! order N (odd):   first-order section, then
//!                  Q_k = 1 / (2·cos((k + 1)·π / N))      k = 0 .. N/2
//! ```
//!
//! An order-8 Butterworth is four sections and falls at 48 dB/octave.

use std::f64::consts::PI;

use nih_plug::nih_debug_assert;
use num_complex::Complex64;

/// Number of section slots in a cut stage. Enough for an order-8
/// (48 dB/octave) Butterworth response.
pub const MAX_CUT_SECTIONS: usize = 4;

/// Normalised biquad coefficients (`a0` is always 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Coefficients {
    /// `H(z) = 1`. Output equals input.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Divide everything by `a0`.
    ///
    /// Uses a true division per tap rather than multiplying by `1 / a0`:
    /// when numerator and denominator share a term (a 0 dB peak), the
    /// normalised taps then come out exactly equal and the stage is an exact
    /// unity filter.
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        }
    }

    /// A peaking (bell) filter from the RBJ Audio EQ Cookbook.
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `freq` - Center frequency in Hz
    /// * `q` - Bandwidth; higher = narrower bell
    /// * `gain` - Linear gain at the center (1.0 = flat, 2.0 ≈ +6 dB)
    ///
    /// # The Math
    ///
    /// ```text
    /// A     = sqrt(gain)
    /// ω     = 2π · f / fs
    /// α     = sin(ω) / 2Q
    ///
    /// b0 = 1 + α·A    a0 = 1 + α/A
    /// b1 = -2·cos(ω)  a1 = -2·cos(ω)
    /// b2 = 1 - α·A    a2 = 1 - α/A
    /// ```
    ///
    /// At `ω` the magnitude is exactly `gain`; far away from it the bell
    /// flattens back to unity.
    pub fn peak(sample_rate: f64, freq: f64, q: f64, gain: f64) -> Self {
        nih_debug_assert!(sample_rate > 0.0);
        nih_debug_assert!(q > 0.0);
        nih_debug_assert!(gain >= 0.0);

        let a = gain.max(0.0).sqrt();
        // Below 2 Hz the bell degenerates numerically
        let omega = 2.0 * PI * freq.max(2.0) / sample_rate;
        let alpha = omega.sin() / (2.0 * q);
        let c2 = -2.0 * omega.cos();
        let alpha_times_a = alpha * a;
        let alpha_over_a = alpha / a;

        Self::normalized(
            1.0 + alpha_times_a,
            c2,
            1.0 - alpha_times_a,
            1.0 + alpha_over_a,
            c2,
            1.0 - alpha_over_a,
        )
    }

    /// Second-order low-pass section with the given Q.
    ///
    /// Designed through the bilinear transform with frequency pre-warping,
    /// so the -3 dB point (for `Q = 1/√2`) lands exactly on `freq`.
    pub fn low_pass(sample_rate: f64, freq: f64, q: f64) -> Self {
        nih_debug_assert!(sample_rate > 0.0);
        nih_debug_assert!(freq > 0.0 && freq < sample_rate * 0.5);

        let n = 1.0 / (PI * freq / sample_rate).tan();
        let n_squared = n * n;
        let inv_q = 1.0 / q;
        let c1 = 1.0 / (1.0 + inv_q * n + n_squared);

        Self {
            b0: c1 as f32,
            b1: (c1 * 2.0) as f32,
            b2: c1 as f32,
            a1: (c1 * 2.0 * (1.0 - n_squared)) as f32,
            a2: (c1 * (1.0 - inv_q * n + n_squared)) as f32,
        }
    }

    /// Second-order high-pass section with the given Q.
    pub fn high_pass(sample_rate: f64, freq: f64, q: f64) -> Self {
        nih_debug_assert!(sample_rate > 0.0);
        nih_debug_assert!(freq > 0.0 && freq < sample_rate * 0.5);

        let n = (PI * freq / sample_rate).tan();
        let n_squared = n * n;
        let inv_q = 1.0 / q;
        let c1 = 1.0 / (1.0 + inv_q * n + n_squared);

        Self {
            b0: c1 as f32,
            b1: (c1 * -2.0) as f32,
            b2: c1 as f32,
            a1: (c1 * 2.0 * (n_squared - 1.0)) as f32,
            a2: (c1 * (1.0 - inv_q * n + n_squared)) as f32,
        }
    }

    /// First-order (6 dB/octave) low-pass, expressed as a biquad with
    /// `b2 = a2 = 0`.
    pub fn first_order_low_pass(sample_rate: f64, freq: f64) -> Self {
        let n = (PI * freq / sample_rate).tan();
        Self::normalized(n, n, 0.0, n + 1.0, n - 1.0, 0.0)
    }

    /// First-order (6 dB/octave) high-pass.
    pub fn first_order_high_pass(sample_rate: f64, freq: f64) -> Self {
        let n = (PI * freq / sample_rate).tan();
        Self::normalized(1.0, -1.0, 0.0, n + 1.0, n - 1.0, 0.0)
    }

    /// Magnitude of the frequency response `|H(e^jω)|` at `freq`.
    ///
    /// Evaluates numerator and denominator polynomials on the unit circle,
    /// `z⁻¹ = e^(-jω)` with `ω = 2π · freq / sample_rate`.
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let z1 = Complex64::from_polar(1.0, -2.0 * PI * freq / sample_rate);
        let z2 = z1 * z1;

        let numerator = self.b0 as f64 + z1 * self.b1 as f64 + z2 * self.b2 as f64;
        let denominator = 1.0 + z1 * self.a1 as f64 + z2 * self.a2 as f64;

        numerator.norm() / denominator.norm()
    }
}

/// The section slots of one cut stage (low-cut or high-cut).
///
/// Always [`MAX_CUT_SECTIONS`] long. Slots beyond the selected slope keep
/// identity coefficients and are marked disabled, so the processing loop
/// never changes shape when the host automates the slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    pub sections: [Coefficients; MAX_CUT_SECTIONS],
    pub enabled: [bool; MAX_CUT_SECTIONS],
}

impl Default for CutCoefficients {
    fn default() -> Self {
        Self {
            sections: [Coefficients::IDENTITY; MAX_CUT_SECTIONS],
            enabled: [false; MAX_CUT_SECTIONS],
        }
    }
}

impl CutCoefficients {
    /// Butterworth high-pass (low-cut) of the given order.
    pub fn butterworth_high_pass(freq: f64, sample_rate: f64, order: usize) -> Self {
        Self::butterworth(
            order,
            || Coefficients::first_order_high_pass(sample_rate, freq),
            |q| Coefficients::high_pass(sample_rate, freq, q),
        )
    }

    /// Butterworth low-pass (high-cut) of the given order.
    pub fn butterworth_low_pass(freq: f64, sample_rate: f64, order: usize) -> Self {
        Self::butterworth(
            order,
            || Coefficients::first_order_low_pass(sample_rate, freq),
            |q| Coefficients::low_pass(sample_rate, freq, q),
        )
    }

    fn butterworth(
        order: usize,
        first_order: impl Fn() -> Coefficients,
        second_order: impl Fn(f64) -> Coefficients,
    ) -> Self {
        nih_debug_assert!(order > 0);
        nih_debug_assert!(order / 2 + order % 2 <= MAX_CUT_SECTIONS);

        let mut cut = Self::default();
        let mut slot = 0;
        let n = order as f64;

        if order % 2 == 1 {
            cut.push(&mut slot, first_order());
            for k in 0..order / 2 {
                let q = 1.0 / (2.0 * ((k as f64 + 1.0) * PI / n).cos());
                cut.push(&mut slot, second_order(q));
            }
        } else {
            for k in 0..order / 2 {
                let q = 1.0 / (2.0 * ((2.0 * k as f64 + 1.0) * PI / (n * 2.0)).cos());
                cut.push(&mut slot, second_order(q));
            }
        }

        cut
    }

    fn push(&mut self, slot: &mut usize, coefficients: Coefficients) {
        // Orders past the slot count are silently truncated in release builds
        let Some(section) = self.sections.get_mut(*slot) else {
            return;
        };
        *section = coefficients;
        self.enabled[*slot] = true;
        *slot += 1;
    }

    /// Number of enabled section slots.
    pub fn active_sections(&self) -> usize {
        self.enabled.iter().filter(|&&on| on).count()
    }

    /// Disable every slot, keeping the designed coefficients around.
    pub fn bypass_all(&mut self) {
        self.enabled = [false; MAX_CUT_SECTIONS];
    }

    /// Iterate over the coefficients of enabled slots only.
    pub fn active(&self) -> impl Iterator<Item = &Coefficients> {
        self.sections
            .iter()
            .zip(self.enabled.iter())
            .filter_map(|(c, &on)| on.then_some(c))
    }
}
