//! FM broadcast demodulator.
//!
//! Demodulates wideband FM audio from complex baseband (IQ) samples, either
//! streamed live from an RTL-SDR front end or read from a pre-recorded
//! capture file. The result is played as 16-bit PCM audio or exported as a
//! hex testbench vector for HDL simulation.
//!
//! The processing chain is:
//!
//! ```text
//! IQ source → quadrature demod → decimating FIR → audio conditioning
//!           → de-emphasis → { audio sink | testbench export }
//! ```
//!
//! In streaming mode the stages run on dedicated worker threads connected by
//! channels, see [`pipeline`]. In batch mode the same chain is applied once
//! over an in-memory capture, see [`batch`].

use num_complex::Complex;

pub mod batch;
pub mod dsp;
pub mod error;
pub mod iqread;
pub mod pipeline;
#[cfg(feature = "rtlsdr")]
pub mod rtlsdr;
pub mod testbench;

pub use error::{Error, Result};

/// One delivery of complex baseband samples; length varies per delivery.
pub type SampleBlock = Vec<Complex<f32>>;

/// One finished block of audio samples, already scaled to the signed 16-bit
/// range (a normalized signal multiplied by 2^15/2). Cast to `i16` only at
/// the sink or exporter boundary.
pub type AudioFrame = Vec<f32>;

/// Tuner gain setting for hardware sources.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Gain {
    /// Automatic gain control in the tuner
    Auto,
    /// Manual gain in dB
    Manual(f64),
}

/// Convert raw capture bytes into complex samples.
///
/// The capture file format is a flat array of little-endian 8-byte complex
/// values: 4-byte float real part followed by 4-byte float imaginary part.
/// Trailing bytes that do not form a full sample are dropped.
pub fn complex_from_le_bytes(buffer: &[u8]) -> Vec<Complex<f32>> {
    buffer
        .chunks_exact(8)
        .map(|c| {
            Complex::new(
                f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_from_le_bytes() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-0.5f32).to_le_bytes());
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());

        let samples = complex_from_le_bytes(&bytes);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], Complex::new(0.5, -0.5));
        assert_eq!(samples[1], Complex::new(1.0, 0.0));
    }

    #[test]
    fn test_complex_from_le_bytes_partial_sample() {
        // 11 bytes: one full sample plus 3 trailing bytes
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.extend_from_slice(&3.0f32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 3]);

        let samples = complex_from_le_bytes(&bytes);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0], Complex::new(2.0, 3.0));
    }

    #[test]
    fn test_complex_from_le_bytes_empty() {
        assert!(complex_from_le_bytes(&[]).is_empty());
    }
}
