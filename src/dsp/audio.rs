//! Audio conditioning.
//!
//! Prepares demodulated audio for a 16-bit PCM sink in three steps, in
//! order: per-channel DC removal, peak normalization, then scaling into the
//! signed 16-bit range. For stereo the two channels share one normalization
//! scale (the joint peak), which preserves the inter-channel amplitude
//! ratio; mono normalizes independently.
//!
//! A degenerate block (all zeros, or constant so that only floating-point
//! residue survives mean removal) would normalize noise up to full scale;
//! such input is passed through unchanged instead.

/// Scale factor into the signed 16-bit range: 2^15 / 2.
pub const AUDIO_SCALE: f32 = 16_384.0;

/// A block is degenerate when its peak after DC removal is below this
/// fraction of the peak before. Mean removal of a constant block leaves
/// summation residue a few ulps above zero, never this large.
const DEGENERATE_PEAK_RATIO: f32 = 1e-6;

/// Condition a mono audio block.
///
/// Removes the block mean, normalizes to a peak of 1, then scales by
/// [`AUDIO_SCALE`]. A degenerate block that is all zeros or constant (only
/// summation residue left after DC removal) is returned as-is.
pub fn condition_mono(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let raw_peak = samples.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    let mut out: Vec<f32> = samples.iter().map(|&s| s - mean).collect();

    let peak = out.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
    if peak <= raw_peak * DEGENERATE_PEAK_RATIO {
        return out;
    }

    for v in out.iter_mut() {
        *v = *v / peak * AUDIO_SCALE;
    }
    out
}

/// Condition a stereo pair of audio blocks.
///
/// Each channel has its own mean removed, but both are normalized by the
/// joint peak across the two channels before scaling, so their relative
/// amplitudes survive. Degenerate all-zero or constant input is passed
/// through unchanged.
pub fn condition_stereo(left: &[f32], right: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let remove_dc = |samples: &[f32]| -> Vec<f32> {
        if samples.is_empty() {
            return Vec::new();
        }
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        samples.iter().map(|&s| s - mean).collect()
    };

    let raw_peak = left
        .iter()
        .chain(right.iter())
        .fold(0.0f32, |m, &v| m.max(v.abs()));
    let mut l = remove_dc(left);
    let mut r = remove_dc(right);

    let peak = l
        .iter()
        .chain(r.iter())
        .fold(0.0f32, |m, &v| m.max(v.abs()));
    if peak <= raw_peak * DEGENERATE_PEAK_RATIO {
        return (l, r);
    }

    for v in l.iter_mut().chain(r.iter_mut()) {
        *v = *v / peak * AUDIO_SCALE;
    }
    (l, r)
}
