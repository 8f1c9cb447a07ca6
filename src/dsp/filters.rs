//! Digital filter implementations.
//!
//! This module provides the filtering stages of the demodulation chain:
//!
//! - [`fir_lowpass`]: windowed-sinc low-pass FIR design
//! - [`StreamingFilter`]: general `(b, a)` filter with carried state
//! - [`DecimatingFilter`]: optional mixing, low-pass filtering, downsampling
//! - [`DeemphasisFilter`]: single-pole IIR de-emphasis for broadcast FM
//!
//! All filters persist their delay lines across `process` calls, so a
//! stream chopped into arbitrary blocks produces exactly the same output as
//! the concatenated stream. State is never reset mid-stream.

use std::f32::consts::PI;

use crate::error::{Error, Result};

/// Design a low-pass FIR filter using a Hamming-windowed sinc.
///
/// The cutoff is normalized against `nyq_hz`, matching the convention of
/// the classic `firwin(numtaps, cutoff, nyq)` design call. Coefficients are
/// scaled for unity gain at DC.
///
/// # Panics
///
/// Panics if `taps` is 0 or `nyq_hz` is not positive.
///
/// # Example
///
/// ```
/// use fmdemod::dsp::filters::fir_lowpass;
///
/// let taps = fir_lowpass(91, 19_000.0, 250_000.0);
/// assert_eq!(taps.len(), 91);
/// let dc_gain: f32 = taps.iter().sum();
/// assert!((dc_gain - 1.0).abs() < 1e-6);
/// ```
pub fn fir_lowpass(taps: usize, cutoff_hz: f32, nyq_hz: f32) -> Vec<f32> {
    assert!(taps > 0, "Number of taps must be greater than 0");
    assert!(nyq_hz > 0.0, "Nyquist frequency must be greater than 0");

    let fc = cutoff_hz / nyq_hz;
    let mid = (taps as f32 - 1.0) / 2.0;
    let mut fir = Vec::with_capacity(taps);

    for n in 0..taps {
        let x = n as f32 - mid;
        // Sinc kernel; the limit at x = 0 is fc
        let sinc = if x == 0.0 {
            fc
        } else {
            (PI * fc * x).sin() / (PI * x)
        };
        // Hamming window
        let window = if taps > 1 {
            0.54 - 0.46 * ((2.0 * PI * n as f32) / (taps as f32 - 1.0)).cos()
        } else {
            1.0
        };
        fir.push(sinc * window);
    }

    // Normalize to unity gain at DC
    let norm: f32 = fir.iter().sum();
    for v in fir.iter_mut() {
        *v /= norm;
    }
    fir
}

/// Streaming `(b, a)` digital filter.
///
/// Implements the standard difference equation
///
/// ```text
/// a[0]·y[n] = b[0]·x[n] + b[1]·x[n-1] + … − a[1]·y[n-1] − a[2]·y[n-2] − …
/// ```
///
/// in transposed direct form II. The delay line has length
/// `max(|a|, |b|) − 1` and is carried across [`StreamingFilter::process`]
/// calls, which guarantees continuity at block boundaries.
pub struct StreamingFilter {
    b: Vec<f32>,
    a: Vec<f32>,
    state: Vec<f32>,
}

impl StreamingFilter {
    /// Create a filter from numerator `b` and denominator `a` coefficients.
    ///
    /// Coefficients are normalized so that `a[0] == 1` and the shorter of
    /// the two is zero-padded to the filter order, so the hot loop indexes
    /// both directly.
    ///
    /// # Panics
    ///
    /// Panics if `b` is empty, `a` is empty, or `a[0]` is zero.
    pub fn new(b: Vec<f32>, a: Vec<f32>) -> Self {
        assert!(!b.is_empty(), "b coefficients must not be empty");
        assert!(!a.is_empty(), "a coefficients must not be empty");
        assert!(a[0] != 0.0, "a[0] must be non-zero");

        let a0 = a[0];
        let order = b.len().max(a.len()) - 1;
        let mut b: Vec<f32> = b.iter().map(|v| v / a0).collect();
        let mut a: Vec<f32> = a.iter().map(|v| v / a0).collect();
        b.resize(order + 1, 0.0);
        a.resize(order + 1, 0.0);
        let state = vec![0.0; order];
        Self { b, a, state }
    }

    /// Create a pure FIR filter (denominator `a = [1]`).
    pub fn fir(taps: Vec<f32>) -> Self {
        Self::new(taps, vec![1.0])
    }

    /// Filter one block of samples, carrying state from previous blocks.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let order = self.state.len();
        let mut out = Vec::with_capacity(input.len());

        for &x in input {
            let y = self.b[0] * x + if order > 0 { self.state[0] } else { 0.0 };
            for i in 0..order {
                let carry = if i + 1 < order { self.state[i + 1] } else { 0.0 };
                self.state[i] = self.b[i + 1] * x + carry - self.a[i + 1] * y;
            }
            out.push(y);
        }
        out
    }

    /// Length of the carried delay line, `max(|a|, |b|) - 1`.
    pub fn order(&self) -> usize {
        self.state.len()
    }
}

/// Decimating low-pass filter with an optional mixer stage.
///
/// Processing order per block: element-wise multiplication by the mixer
/// table (when enabled), streaming FIR filtering, then downsampling by
/// keeping every D-th sample. Both the filter delay line and the decimation
/// phase are carried across blocks, so streaming output matches batch
/// output sample for sample.
///
/// The filter cutoff must be at most half the decimated rate; this is a
/// configuration obligation and not validated here.
pub struct DecimatingFilter {
    filter: StreamingFilter,
    decimation: usize,
    mixer: Option<Vec<f32>>,
    mixer_pos: usize,
    skip: usize,
}

impl DecimatingFilter {
    /// Create a decimating filter.
    ///
    /// Fails with [`Error::InvalidArgument`] when `mix` is true but no
    /// mixer table is provided. The check happens here, once, so the
    /// processing loop never needs to re-validate.
    ///
    /// # Panics
    ///
    /// Panics if `decimation` is 0 or `taps` is empty.
    pub fn new(
        taps: Vec<f32>,
        decimation: usize,
        mixer: Option<Vec<f32>>,
        mix: bool,
    ) -> Result<Self> {
        assert!(decimation > 0, "Decimation factor must be greater than 0");
        if mix && mixer.as_ref().map_or(true, |m| m.is_empty()) {
            return Err(Error::invalid_argument(
                "mixing enabled but no mixer signal provided",
            ));
        }
        Ok(Self {
            filter: StreamingFilter::fir(taps),
            decimation,
            mixer: if mix { mixer } else { None },
            mixer_pos: 0,
            skip: 0,
        })
    }

    /// Returns the decimation factor.
    pub fn decimation(&self) -> usize {
        self.decimation
    }

    /// Filter and downsample one block of samples.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let filtered = match &self.mixer {
            Some(mixer) => {
                // Consume the mixer table with a wrapping position carried
                // across blocks so the mixing waveform stays continuous.
                let mixed: Vec<f32> = input
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| x * mixer[(self.mixer_pos + i) % mixer.len()])
                    .collect();
                self.mixer_pos = (self.mixer_pos + input.len()) % mixer.len();
                self.filter.process(&mixed)
            }
            None => self.filter.process(input),
        };

        let mut out = Vec::with_capacity(filtered.len() / self.decimation + 1);
        let mut i = self.skip;
        while i < filtered.len() {
            out.push(filtered[i]);
            i += self.decimation;
        }
        self.skip = i - filtered.len();
        out
    }
}

/// De-emphasis filter for FM broadcast audio.
///
/// FM transmitters boost high frequencies before modulation (pre-emphasis);
/// the receiver applies the inverse network H(s) = 1/(RC·s + 1) to restore
/// the spectral balance. The analog prototype is converted to digital
/// coefficients with the bilinear transform at the audio sample rate and
/// applied as a streaming IIR filter. DC gain is 1.
pub struct DeemphasisFilter {
    filter: StreamingFilter,
}

/// Broadcast de-emphasis time constant used in the Americas (75 µs).
pub const DEEMPHASIS_TAU: f32 = 75e-6;

impl DeemphasisFilter {
    /// Create a de-emphasis filter with the standard 75 µs time constant.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_time_constant(sample_rate, DEEMPHASIS_TAU)
    }

    /// Create a de-emphasis filter with an explicit time constant.
    ///
    /// Bilinear transform of H(s) = 1/(τ·s + 1) with s = 2·fs·(z−1)/(z+1):
    ///
    /// ```text
    /// k = 2·fs·τ
    /// b = [1/(1+k), 1/(1+k)]
    /// a = [1, (1−k)/(1+k)]
    /// ```
    pub fn with_time_constant(sample_rate: f32, tau: f32) -> Self {
        let k = 2.0 * sample_rate * tau;
        let b = vec![1.0 / (1.0 + k), 1.0 / (1.0 + k)];
        let a = vec![1.0, (1.0 - k) / (1.0 + k)];
        Self {
            filter: StreamingFilter::new(b, a),
        }
    }

    /// Filter one block of audio samples; output length equals input length.
    pub fn process(&mut self, samples: &[f32]) -> Vec<f32> {
        self.filter.process(samples)
    }
}
