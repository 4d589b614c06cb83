//! # Plugin Parameters
//!
//! Everything the user (or host automation) can change. The string IDs are
//! what presets and saved sessions store, so they never change once
//! published.
//!
//! ## No Smoothing
//!
//! Unlike gain or delay-time knobs, EQ parameters aren't smoothed per
//! sample. Coefficients are redesigned once per block from the current
//! values, and the biquads keep their state across the swap, so a knob
//! sweep steps at block rate without clicking.
//!
//! ## Frequency Skew
//!
//! Frequencies span three decades (20 Hz – 20 kHz). A strong negative skew
//! gives each decade roughly the same share of knob travel, the way the ear
//! hears pitch.

use nih_plug::prelude::*;

use crate::dsp::chain::{ChainSettings, PeakSettings, Slope};

/// All user-facing parameters for Loveless EQ.
#[derive(Params)]
pub struct PluginParams {
    /// **LowCut Freq**: cutoff of the high-pass at the bottom of the chain.
    /// Default 20 Hz, i.e. out of the way.
    #[id = "lc_freq"]
    pub low_cut_freq: FloatParam,

    /// **HighCut Freq**: cutoff of the low-pass at the top of the chain.
    #[id = "hc_freq"]
    pub high_cut_freq: FloatParam,

    #[id = "pk1_freq"]
    pub peak1_freq: FloatParam,
    #[id = "pk1_gain"]
    pub peak1_gain: FloatParam,
    #[id = "pk1_q"]
    pub peak1_quality: FloatParam,

    #[id = "pk2_freq"]
    pub peak2_freq: FloatParam,
    #[id = "pk2_gain"]
    pub peak2_gain: FloatParam,
    #[id = "pk2_q"]
    pub peak2_quality: FloatParam,

    #[id = "pk3_freq"]
    pub peak3_freq: FloatParam,
    #[id = "pk3_gain"]
    pub peak3_gain: FloatParam,
    #[id = "pk3_q"]
    pub peak3_quality: FloatParam,

    /// **LowCut Slope**: 12 to 48 dB/octave, in 12 dB steps.
    #[id = "lc_slope"]
    pub low_cut_slope: EnumParam<Slope>,

    #[id = "hc_slope"]
    pub high_cut_slope: EnumParam<Slope>,

    #[id = "lc_bypass"]
    pub low_cut_bypassed: BoolParam,

    /// Bypasses all three peak bands at once.
    #[id = "pk_bypass"]
    pub peaks_bypassed: BoolParam,

    #[id = "hc_bypass"]
    pub high_cut_bypassed: BoolParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            low_cut_freq: frequency_param("LowCut Freq", 20.0),
            high_cut_freq: frequency_param("HighCut Freq", 20000.0),

            peak1_freq: frequency_param("Peak Freq 1", 1000.0),
            peak1_gain: gain_param("Peak Gain 1"),
            peak1_quality: quality_param("Peak Quality 1"),

            peak2_freq: frequency_param("Peak Freq 2", 750.0),
            peak2_gain: gain_param("Peak Gain 2"),
            peak2_quality: quality_param("Peak Quality 2"),

            peak3_freq: frequency_param("Peak Freq 3", 400.0),
            peak3_gain: gain_param("Peak Gain 3"),
            peak3_quality: quality_param("Peak Quality 3"),

            low_cut_slope: EnumParam::new("LowCut Slope", Slope::Db12),
            high_cut_slope: EnumParam::new("HighCut Slope", Slope::Db12),

            low_cut_bypassed: BoolParam::new("LowCut Bypassed", false),
            peaks_bypassed: BoolParam::new("Peak Bypassed", false),
            high_cut_bypassed: BoolParam::new("HighCut Bypassed", false),
        }
    }
}

impl PluginParams {
    /// Read every parameter once into a [`ChainSettings`] snapshot.
    ///
    /// Each parameter is an atomic, so this is safe from the audio thread
    /// and never blocks.
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            low_cut_freq: self.low_cut_freq.value(),
            high_cut_freq: self.high_cut_freq.value(),
            peaks: [
                PeakSettings {
                    freq: self.peak1_freq.value(),
                    gain_db: self.peak1_gain.value(),
                    quality: self.peak1_quality.value(),
                },
                PeakSettings {
                    freq: self.peak2_freq.value(),
                    gain_db: self.peak2_gain.value(),
                    quality: self.peak2_quality.value(),
                },
                PeakSettings {
                    freq: self.peak3_freq.value(),
                    gain_db: self.peak3_gain.value(),
                    quality: self.peak3_quality.value(),
                },
            ],
            low_cut_slope: self.low_cut_slope.value(),
            high_cut_slope: self.high_cut_slope.value(),
            low_cut_bypassed: self.low_cut_bypassed.value(),
            peaks_bypassed: self.peaks_bypassed.value(),
            high_cut_bypassed: self.high_cut_bypassed.value(),
        }
    }
}

/// 20 Hz – 20 kHz, whole-Hz steps, shown as "750 Hz" / "1.50 kHz".
fn frequency_param(name: &str, default: f32) -> FloatParam {
    FloatParam::new(
        name,
        default,
        FloatRange::Skewed {
            min: 20.0,
            max: 20000.0,
            factor: FloatRange::skew_factor(-2.0),
        },
    )
    .with_step_size(1.0)
    .with_value_to_string(formatters::v2s_f32_hz_then_khz(2))
    .with_string_to_value(formatters::s2v_f32_hz_then_khz())
}

/// ±24 dB in half-dB steps.
fn gain_param(name: &str) -> FloatParam {
    FloatParam::new(name, 0.0, FloatRange::Linear { min: -24.0, max: 24.0 })
        .with_unit(" dB")
        .with_step_size(0.5)
}

/// Q from 0.1 (very wide) to 10 (surgical).
fn quality_param(name: &str) -> FloatParam {
    FloatParam::new(name, 1.0, FloatRange::Linear { min: 0.1, max: 10.0 }).with_step_size(0.05)
}
