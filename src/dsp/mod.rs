//! Digital Signal Processing (DSP) module.
//!
//! Building blocks for the FM demodulation chain:
//!
//! - [`demod`]: quadrature demodulation of IQ blocks
//! - [`filters`]: streaming filters, FIR design, decimation, de-emphasis
//! - [`audio`]: audio conditioning (DC removal, normalization, scaling)
//!
//! [`DemodChain`] composes the stages in pipeline order and carries all
//! filter state, so the same chain serves both batch and streaming modes.

use num_complex::Complex;

pub mod audio;
pub mod demod;
pub mod filters;

use crate::AudioFrame;
use crate::error::Result;
use filters::{DecimatingFilter, DeemphasisFilter, fir_lowpass};

/// Configuration for the FM demodulation chain.
///
/// The defaults match a standard broadcast FM channel captured at 250 ksps:
/// decimation by 6 yields an audio rate of ~41.7 kHz.
#[derive(Debug, Clone)]
pub struct DemodConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// Decimation factor for the audio path
    pub decimation: usize,
    /// Number of taps in the decimating low-pass FIR
    pub num_taps: usize,
    /// FIR cutoff frequency in Hz. Must stay below half the decimated rate;
    /// this is a configuration obligation, not checked at runtime.
    pub cutoff: f32,
    /// De-emphasis time constant in seconds (75 µs broadcast standard)
    pub deemphasis_tau: f32,
    /// Optional mixer table, multiplied element-wise before filtering
    pub mixer: Option<Vec<f32>>,
    /// Whether the mixer is applied; requires `mixer` to be present
    pub mix: bool,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            sample_rate: 250_000,
            decimation: 6,
            num_taps: 91,
            cutoff: 19_000.0,
            deemphasis_tau: 75e-6,
            mixer: None,
            mix: false,
        }
    }
}

impl DemodConfig {
    /// Audio output rate in Hz after decimation.
    pub fn audio_rate(&self) -> f32 {
        self.sample_rate as f32 / self.decimation as f32
    }
}

/// Full FM demodulation chain with persistent filter state.
///
/// Stage order: quadrature demod → decimating FIR → audio conditioning →
/// de-emphasis. Filter state is created once here and carried across
/// [`DemodChain::process`] calls, so block boundaries introduce no
/// artifacts in streaming mode.
pub struct DemodChain {
    decimator: DecimatingFilter,
    deemphasis: DeemphasisFilter,
}

impl DemodChain {
    /// Build the chain from a configuration.
    ///
    /// Fails with [`crate::Error::InvalidArgument`] when mixing is enabled
    /// but no mixer table is provided.
    pub fn new(config: &DemodConfig) -> Result<Self> {
        let taps = fir_lowpass(config.num_taps, config.cutoff, config.sample_rate as f32);
        let decimator =
            DecimatingFilter::new(taps, config.decimation, config.mixer.clone(), config.mix)?;
        let deemphasis = DeemphasisFilter::with_time_constant(
            config.audio_rate(),
            config.deemphasis_tau,
        );
        Ok(Self {
            decimator,
            deemphasis,
        })
    }

    /// Run one block of IQ samples through the full chain.
    ///
    /// Blocks shorter than two samples yield an empty frame.
    pub fn process(&mut self, block: &[Complex<f32>]) -> AudioFrame {
        let fm = demod::quadrature_demod(block);
        let filtered = self.decimator.process(&fm);
        let conditioned = audio::condition_mono(&filtered);
        self.deemphasis.process(&conditioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DemodConfig::default();
        assert_eq!(config.sample_rate, 250_000);
        assert_eq!(config.decimation, 6);
        assert_eq!(config.num_taps, 91);
        assert!((config.audio_rate() - 41_666.67).abs() < 1.0);
    }

    #[test]
    fn test_chain_rejects_mix_without_mixer() {
        let config = DemodConfig {
            mix: true,
            mixer: None,
            ..Default::default()
        };
        let result = DemodChain::new(&config);
        assert!(matches!(
            result,
            Err(crate::Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_chain_short_block_yields_empty_frame() {
        let mut chain = DemodChain::new(&DemodConfig::default()).unwrap();
        assert!(chain.process(&[]).is_empty());
        assert!(chain.process(&[Complex::new(1.0, 0.0)]).is_empty());
    }

    #[test]
    fn test_chain_output_rate() {
        let mut chain = DemodChain::new(&DemodConfig::default()).unwrap();
        // 601 IQ samples → 600 demodulated → 100 audio samples at D=6
        let block: Vec<Complex<f32>> = (0..601)
            .map(|i| {
                let phase = 0.01 * i as f32;
                Complex::new(phase.cos(), phase.sin())
            })
            .collect();
        let frame = chain.process(&block);
        assert_eq!(frame.len(), 100);
    }
}
