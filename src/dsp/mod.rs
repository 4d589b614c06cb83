//! # DSP (Digital Signal Processing)
//!
//! The equalizer core, independent of any plugin host:
//!
//! - **`coefficients`**: Turns Hz, dB and Q into biquad coefficients (RBJ
//!   peaking bells, Butterworth low/high-pass cascades) and evaluates their
//!   magnitude response.
//!
//! - **`biquad`**: One filter stage. Runs the difference equation and keeps
//!   the state that makes it an IIR filter.
//!
//! - **`chain`**: The five-stage chain (low-cut, three peaks, high-cut), its
//!   settings snapshot and its coefficient snapshot.
//!
//! - **`processor`**: Owns one chain per channel and implements the
//!   `prepare → update → process` contract the plugin drives.

pub mod biquad;
pub mod chain;
pub mod coefficients;
pub mod processor;
