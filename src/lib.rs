//! # Loveless EQ: An AU/VST3/CLAP Equalizer Plugin
//!
//! A five-stage equalizer built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//! Outputs Audio Unit (AUv2), VST3, and CLAP formats from a single codebase.
//! Filter design, the biquad difference equation and the response curve are
//! all implemented from scratch.
//!
//! ## Signal Flow
//!
//! ```text
//! PluginParams ──► ChainSettings ──► ChainCoefficients   (designed once per block)
//!                                          │
//!                 ┌────────────────────────┼─────────────────────┐
//!                 ▼                        ▼                     ▼
//!          left FilterChain         right FilterChain      ResponseCurve
//!
//! each FilterChain:
//!
//! in ──► [LowCut ×1-4] ──► [Peak 1] ──► [Peak 2] ──► [Peak 3] ──► [HighCut ×1-4] ──► out
//! ```
//!
//! The coefficient snapshot is also published to the response curve
//! ([`response`]) without ever blocking the audio thread.

pub mod dsp;
mod params;
pub mod response;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::processor::EqProcessor;
use nih_plug::prelude::*;
use params::PluginParams;
use response::{response_channel, ResponseCurve};

pub use dsp::chain::{ChainCoefficients, ChainSettings, PeakSettings, Slope};

/// The main plugin struct.
///
/// `params` is shared with the host and readable from any thread; the
/// processor (and with it every filter's state) belongs to the audio thread
/// alone and is only touched from `initialize()`, `reset()` and `process()`.
pub struct LovelessEq {
    params: Arc<PluginParams>,

    /// Filter chains for every channel plus the coefficient designer.
    processor: EqProcessor,

    /// The UI half of the coefficient hand-off. Handed to an editor when one
    /// is opened.
    response_curve: Option<ResponseCurve>,
}

impl Default for LovelessEq {
    fn default() -> Self {
        let (publisher, response_curve) = response_channel();
        Self {
            params: Arc::new(PluginParams::default()),
            // Chains are allocated in initialize() once the channel count
            // and sample rate are known.
            processor: EqProcessor::with_publisher(publisher),
            response_curve: Some(response_curve),
        }
    }
}

impl LovelessEq {
    /// Take the response curve receiver. Only the first caller gets it.
    pub fn take_response_curve(&mut self) -> Option<ResponseCurve> {
        self.response_curve.take()
    }
}

impl Plugin for LovelessEq {
    const NAME: &'static str = "Loveless EQ";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first since that's what most tracks are; mono works the same
    // with a single chain.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Coefficients are redesigned once per block, so splitting blocks at
    // automation points gives sample-accurate parameter changes for free.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate one filter chain per channel for the host's sample rate and
    /// install coefficients for the current parameters.
    ///
    /// Returning `false` rejects the configuration.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;
        let max_block_size = buffer_config.max_buffer_size as usize;

        let Some(num_channels) = audio_io_layout.main_output_channels.map(|c| c.get() as usize)
        else {
            nih_warn!("Rejecting layout without main output channels");
            return false;
        };
        if sample_rate <= 0.0 {
            nih_warn!("Rejecting non-positive sample rate {sample_rate}");
            return false;
        }

        self.processor.prepare(sample_rate, max_block_size, num_channels);
        self.processor.update(&self.params.chain_settings());

        nih_log!(
            "Initialized: {sample_rate} Hz, {max_block_size} samples max, {num_channels} channel(s)"
        );

        true
    }

    /// Clear every filter's memory so the tail of the last playback doesn't
    /// ring into the next one.
    fn reset(&mut self) {
        self.processor.reset();
    }

    /// Redesign the chain from the current parameters, then filter every
    /// channel of the buffer in place.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let settings = self.params.chain_settings();
        self.processor.update(&settings);
        self.processor.process(buffer.as_slice());

        ProcessStatus::Normal
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessEq {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-eq-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Low-cut, three peaking bands and high-cut, built for learning filter design");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Equalizer,
    ];
}

impl Vst3Plugin for LovelessEq {
    // `*b"..."` turns the 16-character ASCII literal into the `[u8; 16]`
    // class ID.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssEQ_____v001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Eq];
}

nih_export_clap!(LovelessEq);
nih_export_vst3!(LovelessEq);

// AUv2 entry point for Logic Pro, wrapped around the CLAP export.
clap_wrapper::export_auv2!();
