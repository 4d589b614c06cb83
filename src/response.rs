//! # Response Curve
//!
//! The curve drawn above the knobs: the combined magnitude of every active
//! stage, sampled at log-spaced frequencies from 20 Hz to 20 kHz.
//!
//! ## Getting Coefficients off the Audio Thread
//!
//! The audio thread owns the filter chains and must never block or
//! allocate. The UI runs on its own timer (60 Hz) and needs to read the
//! coefficients the audio path is actually using.
//!
//! ```text
//!  audio thread                               UI timer
//!  ────────────                               ────────
//!  update() ──► CoefficientPublisher ──► [bounded channel] ──► ResponseCurve::refresh()
//!               (try_send, Copy value)      (preallocated)      (try_iter, keep newest)
//! ```
//!
//! A [`ChainCoefficients`] is a plain `Copy` value, so it crosses the
//! channel whole. The UI may lag one refresh behind the audio path but can
//! never see half of one update and half of another.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

use crate::dsp::chain::ChainCoefficients;

/// Lowest frequency on the curve.
pub const MIN_FREQUENCY: f64 = 20.0;
/// Highest frequency on the curve.
pub const MAX_FREQUENCY: f64 = 20000.0;

/// Gain range of the display, ±24 dB (the peak gain range).
pub const DISPLAY_DB_RANGE: f64 = 24.0;

/// Vertical grid lines.
pub const FREQUENCY_MARKERS: &[f64] = &[
    20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0,
];

/// Horizontal grid lines.
pub const GAIN_MARKERS: &[f64] = &[-24.0, -12.0, 0.0, 12.0, 24.0];

/// Snapshots in flight between the threads. The UI drains all of them each
/// refresh, so a handful is plenty.
const CHANNEL_CAPACITY: usize = 8;

/// Create a connected publisher/curve pair.
pub fn response_channel() -> (CoefficientPublisher, ResponseCurve) {
    let (sender, receiver) = bounded(CHANNEL_CAPACITY);
    (
        CoefficientPublisher {
            sender,
            last_sent: None,
        },
        ResponseCurve {
            receiver,
            latest: None,
        },
    )
}

/// Audio-thread half. Sends a snapshot only when it differs from the last
/// one delivered.
pub struct CoefficientPublisher {
    sender: Sender<ChainCoefficients>,
    last_sent: Option<ChainCoefficients>,
}

impl CoefficientPublisher {
    /// Hand a snapshot to the UI without blocking.
    ///
    /// If the channel is full the snapshot is dropped and `last_sent` is left
    /// alone, so the next call retries with whatever is current then.
    pub fn publish(&mut self, coefficients: &ChainCoefficients) {
        if self.last_sent.as_ref() == Some(coefficients) {
            return;
        }

        match self.sender.try_send(*coefficients) {
            Ok(()) => self.last_sent = Some(*coefficients),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// UI-thread half: the latest coefficients plus the sampling math.
pub struct ResponseCurve {
    receiver: Receiver<ChainCoefficients>,
    latest: Option<ChainCoefficients>,
}

impl ResponseCurve {
    /// Drain everything published since the last call and keep the newest.
    ///
    /// Returns `true` when the curve needs repainting.
    pub fn refresh(&mut self) -> bool {
        let previous = self.latest;
        for coefficients in self.receiver.try_iter() {
            self.latest = Some(coefficients);
        }
        self.latest != previous
    }

    /// The snapshot the curve is currently drawn from, if any has arrived.
    pub fn coefficients(&self) -> Option<&ChainCoefficients> {
        self.latest.as_ref()
    }

    /// Sample the response at `points` log-spaced frequencies, in dB.
    ///
    /// Before the first snapshot arrives the curve is flat.
    pub fn magnitudes(&self, points: usize) -> Vec<f64> {
        let mut out = vec![0.0; points];
        if let Some(coefficients) = &self.latest {
            sample_response(coefficients, &mut out);
        }
        out
    }
}

/// Fill `out` with the chain's response in dB at `out.len()` frequencies,
/// from [`MIN_FREQUENCY`] to [`MAX_FREQUENCY`] inclusive.
pub fn sample_response(coefficients: &ChainCoefficients, out: &mut [f64]) {
    let last = out.len().saturating_sub(1).max(1) as f64;
    for (i, db) in out.iter_mut().enumerate() {
        *db = coefficients.magnitude_db_at(frequency_at(i as f64 / last));
    }
}

/// Map `0.0..=1.0` to a frequency on the log axis.
pub fn frequency_at(normalized: f64) -> f64 {
    MIN_FREQUENCY * (MAX_FREQUENCY / MIN_FREQUENCY).powf(normalized)
}

/// Inverse of [`frequency_at`].
pub fn normalized_position(freq: f64) -> f64 {
    (freq / MIN_FREQUENCY).log10() / (MAX_FREQUENCY / MIN_FREQUENCY).log10()
}

/// Map a gain in dB onto `0.0..=1.0` of the display height, clamping
/// anything outside ±24 dB.
pub fn db_to_normalized(db: f64) -> f64 {
    ((db + DISPLAY_DB_RANGE) / (2.0 * DISPLAY_DB_RANGE)).clamp(0.0, 1.0)
}
