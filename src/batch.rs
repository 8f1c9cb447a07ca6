//! Batch (simulation) mode.
//!
//! Applies the full demodulation chain once over an entire in-memory
//! capture instead of streaming it block by block. Used to audition a
//! recorded capture and to produce testbench vectors.

use std::path::Path;

use num_complex::Complex;
use tracing::info;

use crate::AudioFrame;
use crate::dsp::{DemodChain, DemodConfig};
use crate::error::Result;
use crate::iqread;

/// Demodulate a whole capture in one pass.
///
/// Runs quadrature demod, decimating FIR, audio conditioning and
/// de-emphasis over `capture` and returns the finished audio frame.
pub fn demodulate(capture: &[Complex<f32>], config: &DemodConfig) -> Result<AudioFrame> {
    let mut chain = DemodChain::new(config)?;
    Ok(chain.process(capture))
}

/// Read a capture file and demodulate it in one pass.
pub fn demodulate_file<P: AsRef<Path>>(path: P, config: &DemodConfig) -> Result<AudioFrame> {
    let capture = iqread::read_capture(path)?;
    info!(
        samples = capture.len(),
        sample_rate = config.sample_rate,
        "loaded capture"
    );
    demodulate(&capture, config)
}
