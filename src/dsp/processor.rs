//! # EQ Processor
//!
//! The host-independent `prepare → update → process` contract around the
//! per-channel [`FilterChain`]s. The plugin wrapper in `lib.rs` is a thin
//! adapter from nih-plug's callbacks onto this type.
//!
//! Per audio block:
//!
//! 1. [`update`](EqProcessor::update) designs one [`ChainCoefficients`] from
//!    the current settings and installs that same value into every channel,
//!    so stereo channels always stay phase-matched.
//! 2. [`process`](EqProcessor::process) runs each channel's chain over its
//!    samples in place.
//!
//! Both run on the audio thread with `&mut self`, so an update can never
//! interleave with processing.

use nih_plug::nih_debug_assert;

use super::chain::{ChainCoefficients, ChainSettings, FilterChain};
use crate::response::CoefficientPublisher;

pub struct EqProcessor {
    sample_rate: f32,
    max_block_size: usize,
    /// One chain per audio channel.
    chains: Vec<FilterChain>,
    /// What every chain currently holds. `None` until the first update.
    installed: Option<ChainCoefficients>,
    /// Optional hand-off to the response curve.
    publisher: Option<CoefficientPublisher>,
}

impl Default for EqProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EqProcessor {
    pub fn new() -> Self {
        Self {
            sample_rate: 44100.0,
            max_block_size: 0,
            chains: Vec::new(),
            installed: None,
            publisher: None,
        }
    }

    /// Also forward every new coefficient snapshot to a response curve.
    pub fn with_publisher(publisher: CoefficientPublisher) -> Self {
        Self {
            publisher: Some(publisher),
            ..Self::new()
        }
    }

    /// Allocate fresh chains for a new audio configuration.
    ///
    /// Must be called before [`update`](Self::update) or
    /// [`process`](Self::process); this is the only method that allocates.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        nih_debug_assert!(sample_rate > 0.0);
        nih_debug_assert!(num_channels > 0);

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.chains = (0..num_channels).map(|_| FilterChain::new()).collect();
        self.installed = None;
    }

    /// Design coefficients for `settings` and install them into every
    /// channel.
    pub fn update(&mut self, settings: &ChainSettings) {
        nih_debug_assert!(!self.chains.is_empty(), "update() before prepare()");

        let coefficients = ChainCoefficients::from_settings(settings, self.sample_rate);
        for chain in &mut self.chains {
            chain.install(&coefficients);
        }
        self.installed = Some(coefficients);

        if let Some(publisher) = &mut self.publisher {
            publisher.publish(&coefficients);
        }
    }

    /// Filter one block, one slice per channel, in place.
    ///
    /// Channels beyond the prepared count are left untouched.
    pub fn process(&mut self, channels: &mut [&mut [f32]]) {
        for (channel_idx, samples) in channels.iter_mut().enumerate() {
            self.process_channel(channel_idx, samples);
        }
    }

    /// Filter a single channel's block in place.
    pub fn process_channel(&mut self, channel_idx: usize, samples: &mut [f32]) {
        nih_debug_assert!(samples.len() <= self.max_block_size);

        let Some(chain) = self.chains.get_mut(channel_idx) else {
            return;
        };
        chain.process(samples);
    }

    /// Clear every chain's filter state. Coefficients are kept.
    pub fn reset(&mut self) {
        for chain in &mut self.chains {
            chain.reset();
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.chains.len()
    }

    pub fn chain(&self, channel_idx: usize) -> Option<&FilterChain> {
        self.chains.get(channel_idx)
    }

    /// The coefficients every chain was last installed from.
    pub fn coefficients(&self) -> Option<&ChainCoefficients> {
        self.installed.as_ref()
    }
}
