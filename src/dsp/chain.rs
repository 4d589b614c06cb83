//! # The EQ Chain
//!
//! ```text
//! in ──► [LowCut ×4] ──► [Peak 1] ──► [Peak 2] ──► [Peak 3] ──► [HighCut ×4] ──► out
//! ```
//!
//! Three layers, each a plain value:
//!
//! - [`ChainSettings`]: what the user asked for (Hz, dB, Q, slope).
//! - [`ChainCoefficients`]: what the filters need, designed from the settings
//!   at a given sample rate. `Copy`, so it can be handed to every channel
//!   and to the UI thread as a whole.
//! - [`FilterChain`]: eleven [`Biquad`] stages plus their state, one per
//!   audio channel.

use nih_plug::prelude::*;

use super::biquad::Biquad;
use super::coefficients::{Coefficients, CutCoefficients, MAX_CUT_SECTIONS};

/// Number of peaking bands.
pub const NUM_PEAKS: usize = 3;

/// Roll-off of a cut stage.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slope {
    #[id = "12"]
    #[name = "12 dB/Oct"]
    Db12,
    #[id = "24"]
    #[name = "24 dB/Oct"]
    Db24,
    #[id = "36"]
    #[name = "36 dB/Oct"]
    Db36,
    #[id = "48"]
    #[name = "48 dB/Oct"]
    Db48,
}

impl Slope {
    /// Butterworth order that produces this slope (6 dB/octave per order).
    pub fn order(self) -> usize {
        match self {
            Slope::Db12 => 2,
            Slope::Db24 => 4,
            Slope::Db36 => 6,
            Slope::Db48 => 8,
        }
    }

    /// Second-order sections needed.
    pub fn sections(self) -> usize {
        self.order() / 2
    }

    pub fn db_per_octave(self) -> f32 {
        self.order() as f32 * 6.0
    }
}

/// One peaking band's settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSettings {
    pub freq: f32,
    pub gain_db: f32,
    pub quality: f32,
}

impl PeakSettings {
    fn flat_at(freq: f32) -> Self {
        Self {
            freq,
            gain_db: 0.0,
            quality: 1.0,
        }
    }
}

/// A snapshot of every parameter the chain depends on.
///
/// Values are assumed to already be inside the parameter ranges; nothing
/// here re-validates them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSettings {
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub peaks: [PeakSettings; NUM_PEAKS],
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
    pub low_cut_bypassed: bool,
    pub peaks_bypassed: bool,
    pub high_cut_bypassed: bool,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            peaks: [
                PeakSettings::flat_at(1000.0),
                PeakSettings::flat_at(750.0),
                PeakSettings::flat_at(400.0),
            ],
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
            low_cut_bypassed: false,
            peaks_bypassed: false,
            high_cut_bypassed: false,
        }
    }
}

/// Coefficients plus bypass flag for a single stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageCoefficients {
    pub coefficients: Coefficients,
    pub bypassed: bool,
}

/// Every coefficient in the chain, designed for one sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub low_cut: CutCoefficients,
    pub peaks: [StageCoefficients; NUM_PEAKS],
    pub high_cut: CutCoefficients,
    pub sample_rate: f32,
}

impl ChainCoefficients {
    /// Design the whole chain from a settings snapshot.
    ///
    /// Pure function of its inputs: the same settings and sample rate
    /// always produce the same bits.
    pub fn from_settings(settings: &ChainSettings, sample_rate: f32) -> Self {
        nih_debug_assert!(sample_rate > 0.0);
        let fs = sample_rate as f64;
        // Below 40 kHz sample rates the upper parameter range sits past
        // Nyquist, where the bilinear designs turn unstable
        let max_freq = fs * 0.49;

        let peaks = settings.peaks.map(|peak| StageCoefficients {
            coefficients: Coefficients::peak(
                fs,
                (peak.freq as f64).min(max_freq),
                peak.quality as f64,
                util::db_to_gain(peak.gain_db) as f64,
            ),
            bypassed: settings.peaks_bypassed,
        });

        let mut low_cut = CutCoefficients::butterworth_high_pass(
            (settings.low_cut_freq as f64).min(max_freq),
            fs,
            settings.low_cut_slope.order(),
        );
        if settings.low_cut_bypassed {
            low_cut.bypass_all();
        }

        let mut high_cut = CutCoefficients::butterworth_low_pass(
            (settings.high_cut_freq as f64).min(max_freq),
            fs,
            settings.high_cut_slope.order(),
        );
        if settings.high_cut_bypassed {
            high_cut.bypass_all();
        }

        Self {
            low_cut,
            peaks,
            high_cut,
            sample_rate,
        }
    }

    /// Coefficients of every non-bypassed stage, in processing order.
    pub fn active_stages(&self) -> impl Iterator<Item = &Coefficients> {
        self.low_cut
            .active()
            .chain(
                self.peaks
                    .iter()
                    .filter(|stage| !stage.bypassed)
                    .map(|stage| &stage.coefficients),
            )
            .chain(self.high_cut.active())
    }

    /// Linear magnitude of the whole chain at `freq`: the product of the
    /// active stages' magnitudes. With every stage bypassed this is exactly
    /// 1.0.
    pub fn magnitude_at(&self, freq: f64) -> f64 {
        let fs = self.sample_rate as f64;
        self.active_stages()
            .map(|c| c.magnitude_at(freq, fs))
            .product()
    }

    /// [`magnitude_at`](Self::magnitude_at) in decibels, `20·log10(mag)`.
    pub fn magnitude_db_at(&self, freq: f64) -> f64 {
        20.0 * self.magnitude_at(freq).log10()
    }
}

/// The per-channel chain of filter stages.
///
/// Owned by the audio thread. Coefficients arrive through
/// [`install`](Self::install) as a whole [`ChainCoefficients`] value.
#[derive(Debug, Clone)]
pub struct FilterChain {
    low_cut: [Biquad; MAX_CUT_SECTIONS],
    peaks: [Biquad; NUM_PEAKS],
    high_cut: [Biquad; MAX_CUT_SECTIONS],
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterChain {
    pub fn new() -> Self {
        Self {
            low_cut: [Biquad::new(); MAX_CUT_SECTIONS],
            peaks: [Biquad::new(); NUM_PEAKS],
            high_cut: [Biquad::new(); MAX_CUT_SECTIONS],
        }
    }

    /// Copy a coefficient snapshot into every stage and set bypass flags.
    pub fn install(&mut self, coefficients: &ChainCoefficients) {
        install_cut(&mut self.low_cut, &coefficients.low_cut);
        for (stage, peak) in self.peaks.iter_mut().zip(coefficients.peaks.iter()) {
            stage.set_coefficients(peak.coefficients);
            stage.set_bypassed(peak.bypassed);
        }
        install_cut(&mut self.high_cut, &coefficients.high_cut);
    }

    /// All eleven stages in processing order.
    pub fn stages(&self) -> impl Iterator<Item = &Biquad> {
        self.low_cut
            .iter()
            .chain(self.peaks.iter())
            .chain(self.high_cut.iter())
    }

    fn stages_mut(&mut self) -> impl Iterator<Item = &mut Biquad> {
        self.low_cut
            .iter_mut()
            .chain(self.peaks.iter_mut())
            .chain(self.high_cut.iter_mut())
    }

    /// Filter one block of a single channel in place.
    ///
    /// Each stage runs over the whole block before the next stage starts.
    /// The stages are linear and keep independent state, so this gives the
    /// same samples as running every stage per sample.
    pub fn process(&mut self, samples: &mut [f32]) {
        for stage in self.stages_mut() {
            stage.process_block(samples);
        }
    }

    /// Silence every stage's delay line.
    pub fn reset(&mut self) {
        for stage in self.stages_mut() {
            stage.reset();
        }
    }
}

fn install_cut(stages: &mut [Biquad; MAX_CUT_SECTIONS], cut: &CutCoefficients) {
    for ((stage, coefficients), &enabled) in stages
        .iter_mut()
        .zip(cut.sections.iter())
        .zip(cut.enabled.iter())
    {
        stage.set_coefficients(*coefficients);
        stage.set_bypassed(!enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FS: f32 = 44100.0;

    fn all_bypassed() -> ChainSettings {
        ChainSettings {
            low_cut_bypassed: true,
            peaks_bypassed: true,
            high_cut_bypassed: true,
            ..ChainSettings::default()
        }
    }

    fn slope_strategy() -> impl Strategy<Value = Slope> {
        prop_oneof![
            Just(Slope::Db12),
            Just(Slope::Db24),
            Just(Slope::Db36),
            Just(Slope::Db48),
        ]
    }

    fn peak_strategy() -> impl Strategy<Value = PeakSettings> {
        (20.0f32..20000.0, -24.0f32..24.0, 0.1f32..10.0).prop_map(|(freq, gain_db, quality)| {
            PeakSettings {
                freq,
                gain_db,
                quality,
            }
        })
    }

    prop_compose! {
        fn settings_strategy()(
            low_cut_freq in 20.0f32..20000.0,
            high_cut_freq in 20.0f32..20000.0,
            peaks in [peak_strategy(), peak_strategy(), peak_strategy()],
            low_cut_slope in slope_strategy(),
            high_cut_slope in slope_strategy(),
            bypass in any::<[bool; 3]>(),
        ) -> ChainSettings {
            ChainSettings {
                low_cut_freq,
                high_cut_freq,
                peaks,
                low_cut_slope,
                high_cut_slope,
                low_cut_bypassed: bypass[0],
                peaks_bypassed: bypass[1],
                high_cut_bypassed: bypass[2],
            }
        }
    }

    #[test]
    fn test_slope_orders() {
        assert_eq!(Slope::Db12.sections(), 1);
        assert_eq!(Slope::Db24.sections(), 2);
        assert_eq!(Slope::Db36.sections(), 3);
        assert_eq!(Slope::Db48.sections(), 4);
        assert_eq!(Slope::Db36.db_per_octave(), 36.0);
    }

    /// With everything bypassed the chain's magnitude is exactly unity at
    /// every frequency.
    #[test]
    fn test_all_bypassed_is_exactly_flat() {
        let coefficients = ChainCoefficients::from_settings(&all_bypassed(), FS);

        assert_eq!(coefficients.active_stages().count(), 0);
        for freq in [20.0, 100.0, 1000.0, 10000.0, 20000.0] {
            assert_eq!(coefficients.magnitude_at(freq), 1.0);
            assert_eq!(coefficients.magnitude_db_at(freq), 0.0);
        }
    }

    /// Peaks at 0 dB are flat even when not bypassed.
    #[test]
    fn test_zero_gain_peaks_are_flat() {
        let settings = ChainSettings {
            low_cut_bypassed: true,
            high_cut_bypassed: true,
            ..ChainSettings::default()
        };
        let coefficients = ChainCoefficients::from_settings(&settings, FS);

        assert_eq!(coefficients.active_stages().count(), NUM_PEAKS);
        for freq in [20.0, 400.0, 750.0, 1000.0, 20000.0] {
            assert_eq!(coefficients.magnitude_at(freq), 1.0);
        }
    }

    /// A single +6 dB bell at 1 kHz peaks there and flattens out at the
    /// edges of the audible band.
    #[test]
    fn test_single_peak_scenario() {
        let mut settings = ChainSettings {
            low_cut_bypassed: true,
            high_cut_bypassed: true,
            ..ChainSettings::default()
        };
        settings.peaks[0] = PeakSettings {
            freq: 1000.0,
            gain_db: 6.0,
            quality: 1.0,
        };
        let coefficients = ChainCoefficients::from_settings(&settings, FS);

        let at_center = coefficients.magnitude_db_at(1000.0);
        assert!(
            (at_center - 6.0).abs() < 0.1,
            "Expected +6 dB at 1 kHz, got {at_center}"
        );
        assert!(coefficients.magnitude_db_at(990.0) < at_center);
        assert!(coefficients.magnitude_db_at(1010.0) < at_center);

        for edge in [20.0, 20000.0] {
            let db = coefficients.magnitude_db_at(edge);
            assert!(db.abs() < 0.2, "Expected ~0 dB at {edge} Hz, got {db}");
        }
    }

    /// 48 dB/oct falls ~36 dB/oct faster than 12 dB/oct, measured two
    /// octaves below a 1 kHz low-cut.
    #[test]
    fn test_low_cut_slope_scenario() {
        let response_at_250 = |slope| {
            let settings = ChainSettings {
                low_cut_freq: 1000.0,
                low_cut_slope: slope,
                peaks_bypassed: true,
                high_cut_bypassed: true,
                ..ChainSettings::default()
            };
            ChainCoefficients::from_settings(&settings, FS).magnitude_db_at(250.0)
        };

        let gentle = response_at_250(Slope::Db12);
        let steep = response_at_250(Slope::Db48);

        assert!((gentle + 24.1).abs() < 0.5, "12 dB/oct at 250 Hz: {gentle}");
        assert!((steep + 96.3).abs() < 1.5, "48 dB/oct at 250 Hz: {steep}");

        let extra_per_octave = (gentle - steep) / 2.0;
        assert!(
            (extra_per_octave - 36.0).abs() < 1.0,
            "Expected ~36 dB/oct steeper, got {extra_per_octave}"
        );
    }

    /// Switching the slope only enables or disables slots; there are always
    /// four.
    #[test]
    fn test_cut_slots_follow_slope() {
        for slope in [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48] {
            let settings = ChainSettings {
                low_cut_slope: slope,
                high_cut_slope: slope,
                ..ChainSettings::default()
            };
            let coefficients = ChainCoefficients::from_settings(&settings, FS);
            let mut chain = FilterChain::new();
            chain.install(&coefficients);

            assert_eq!(coefficients.low_cut.active_sections(), slope.sections());
            assert_eq!(coefficients.high_cut.active_sections(), slope.sections());
            assert_eq!(chain.stages().count(), 2 * MAX_CUT_SECTIONS + NUM_PEAKS);

            let active_low_cut = chain.stages().take(MAX_CUT_SECTIONS).filter(|s| !s.is_bypassed());
            assert_eq!(active_low_cut.count(), slope.sections());
        }
    }

    /// The bypass flags switch whole groups off.
    #[test]
    fn test_group_bypass() {
        let settings = ChainSettings {
            low_cut_slope: Slope::Db48,
            low_cut_bypassed: true,
            ..ChainSettings::default()
        };
        let coefficients = ChainCoefficients::from_settings(&settings, FS);
        let mut chain = FilterChain::new();
        chain.install(&coefficients);

        assert!(chain.stages().take(MAX_CUT_SECTIONS).all(|s| s.is_bypassed()));
        assert!(chain
            .stages()
            .skip(MAX_CUT_SECTIONS)
            .take(NUM_PEAKS)
            .all(|s| !s.is_bypassed()));
    }

    /// A sine well inside the passband comes out at the same level; one far
    /// below a steep low-cut practically vanishes.
    #[test]
    fn test_chain_filters_real_signal() {
        let settings = ChainSettings {
            low_cut_freq: 1000.0,
            low_cut_slope: Slope::Db48,
            ..ChainSettings::default()
        };
        let coefficients = ChainCoefficients::from_settings(&settings, FS);

        let peak_after_settling = |freq: f32| {
            let mut chain = FilterChain::new();
            chain.install(&coefficients);
            let mut block: Vec<f32> = (0..44100)
                .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / FS).sin())
                .collect();
            chain.process(&mut block);
            block[22050..].iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
        };

        let passband = peak_after_settling(5000.0);
        let stopband = peak_after_settling(100.0);

        assert!((passband - 1.0).abs() < 0.05, "5 kHz level: {passband}");
        assert!(stopband < 1e-3, "100 Hz level: {stopband}");
    }

    #[test]
    fn test_reset_silences_chain() {
        let coefficients = ChainCoefficients::from_settings(&ChainSettings::default(), FS);
        let mut chain = FilterChain::new();
        chain.install(&coefficients);

        let mut block = [1.0; 64];
        chain.process(&mut block);
        chain.reset();

        let mut silence = [0.0; 64];
        chain.process(&mut silence);
        assert!(silence.iter().all(|&s| s == 0.0));
    }

    /// At 32 kHz the top of the frequency range is past Nyquist. The
    /// designs are pulled back below it and stay stable.
    #[test]
    fn test_frequencies_past_nyquist_stay_stable() {
        let mut settings = ChainSettings {
            high_cut_freq: 20000.0,
            high_cut_slope: Slope::Db48,
            ..ChainSettings::default()
        };
        settings.peaks[0] = PeakSettings {
            freq: 20000.0,
            gain_db: 12.0,
            quality: 2.0,
        };
        let coefficients = ChainCoefficients::from_settings(&settings, 32000.0);
        let mut chain = FilterChain::new();
        chain.install(&coefficients);

        let mut block = vec![0.0f32; 8192];
        block[0] = 1.0;
        chain.process(&mut block);

        assert!(block.iter().all(|s| s.is_finite()));
        let tail = block[8000..].iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(tail < 1e-3, "Impulse tail still at {tail}");
    }

    proptest! {
        /// Silence in, silence out, whatever the configuration.
        #[test]
        fn prop_zero_in_zero_out(settings in settings_strategy(), len in 1usize..512) {
            let coefficients = ChainCoefficients::from_settings(&settings, FS);
            let mut chain = FilterChain::new();
            chain.install(&coefficients);

            let mut block = vec![0.0f32; len];
            chain.process(&mut block);
            prop_assert!(block.iter().all(|&s| s == 0.0));
        }

        /// Designing twice from the same snapshot gives identical bits.
        #[test]
        fn prop_design_is_idempotent(settings in settings_strategy()) {
            let first = ChainCoefficients::from_settings(&settings, FS);
            let second = ChainCoefficients::from_settings(&settings, FS);
            prop_assert_eq!(first, second);
        }

        /// The response is finite everywhere in the audible band.
        #[test]
        fn prop_response_is_finite(settings in settings_strategy(), norm in 0.0f64..1.0) {
            let coefficients = ChainCoefficients::from_settings(&settings, FS);
            let freq = 20.0 * 1000f64.powf(norm);
            let mag = coefficients.magnitude_at(freq);
            prop_assert!(mag.is_finite() && mag >= 0.0);
        }
    }
}
