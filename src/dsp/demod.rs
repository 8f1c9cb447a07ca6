//! Quadrature demodulation.
//!
//! Extracts the instantaneous frequency of a complex baseband signal from
//! the phase difference of consecutive samples. This is the core operation
//! for FM reception: the transmitted audio is the rate of change of phase.

use num_complex::Complex;

/// Quadrature demodulator (FM discriminator).
///
/// Computes `out[i] = 0.5 * arg(x[i] * conj(x[i+1]))` for each pair of
/// consecutive samples, so an input of N samples yields N−1 values in the
/// range (−π/2, π/2].
///
/// Inputs shorter than two samples produce an empty output; this never
/// fails.
///
/// # Example
///
/// ```
/// use fmdemod::dsp::demod::quadrature_demod;
/// use num_complex::Complex;
///
/// let samples = vec![
///     Complex::new(1.0, 0.0),
///     Complex::new(0.0, 1.0),
///     Complex::new(-1.0, 0.0),
/// ];
/// let out = quadrature_demod(&samples);
/// assert_eq!(out.len(), 2);
/// ```
pub fn quadrature_demod(samples: &[Complex<f32>]) -> Vec<f32> {
    if samples.len() < 2 {
        return Vec::new();
    }
    samples
        .windows(2)
        .map(|w| 0.5 * (w[0] * w[1].conj()).arg())
        .collect()
}
