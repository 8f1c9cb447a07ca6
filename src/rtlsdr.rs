//! RTL-SDR capture source (requires the `rtlsdr` feature).
//!
//! Opens an RTL-SDR device through the `rtl_sdr_rs` crate, tunes it, and
//! feeds sample blocks into the pipeline's capture handle. Device errors
//! are surfaced once at startup; there is no retry.

use num_complex::Complex;
use rtl_sdr_rs::{DEFAULT_BUF_LENGTH, RtlSdr, TunerGain};
use tracing::{debug, info};

use crate::pipeline::{CancelToken, CaptureHandle};
use crate::{Gain, error};

/// RTL-SDR configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RtlSdrConfig {
    /// Device index (0 for the first device)
    pub device_index: usize,
    /// Center frequency in Hz
    pub center_freq: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Tuner gain (Auto or Manual in dB)
    pub gain: Gain,
}

/// Blocking capture loop reading IQ samples from an RTL-SDR device.
pub struct RtlSdrCapture {
    rtlsdr: RtlSdr,
    sample_rate: u32,
}

impl RtlSdrCapture {
    /// Open and tune the device.
    pub fn new(config: &RtlSdrConfig) -> error::Result<Self> {
        let mut rtlsdr = RtlSdr::open_with_index(config.device_index)?;
        rtlsdr.set_sample_rate(config.sample_rate)?;
        rtlsdr.set_center_freq(config.center_freq)?;
        match config.gain {
            Gain::Manual(gain_db) => {
                // Convert dB to rtl-sdr units (gain * 10)
                let gain_tenths = (gain_db * 10.0) as i32;
                rtlsdr.set_tuner_gain(TunerGain::Manual(gain_tenths))?
            }
            Gain::Auto => rtlsdr.set_tuner_gain(TunerGain::Auto)?,
        };
        rtlsdr.reset_buffer()?;
        info!(
            center_freq = config.center_freq,
            sample_rate = config.sample_rate,
            "RTL-SDR tuned"
        );
        Ok(Self {
            rtlsdr,
            sample_rate: config.sample_rate,
        })
    }

    /// Nominal sample rate of the delivered blocks in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Read samples until cancelled or the device stops delivering.
    ///
    /// Each read converts the device's unsigned 8-bit IQ bytes to complex
    /// floats and pushes the block through `handle` without blocking on
    /// downstream processing.
    pub fn run(mut self, handle: CaptureHandle, cancel: CancelToken) -> error::Result<()> {
        let mut buffer = vec![0u8; DEFAULT_BUF_LENGTH];
        loop {
            if cancel.is_cancelled() {
                debug!("capture cancelled");
                return Ok(());
            }
            let bytes_read = self.rtlsdr.read_sync(&mut buffer)?;
            if bytes_read == 0 {
                debug!("device returned no samples, capture ending");
                return Ok(());
            }
            handle.push(convert_cu8(&buffer[..bytes_read]));
        }
    }
}

/// Convert unsigned 8-bit interleaved IQ bytes to complex floats.
fn convert_cu8(buffer: &[u8]) -> Vec<Complex<f32>> {
    buffer
        .chunks_exact(2)
        .map(|c| {
            Complex::new(
                (c[0] as f32 - 127.5) / 128.0,
                (c[1] as f32 - 127.5) / 128.0,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cu8_centering() {
        // 127/128 straddle the mid-point of the unsigned range
        let samples = convert_cu8(&[127, 128, 255, 0]);
        assert_eq!(samples.len(), 2);
        assert!(samples[0].re < 0.0 && samples[0].im > 0.0);
        assert!(samples[1].re > 0.99 && samples[1].im < -0.99);
    }
}
