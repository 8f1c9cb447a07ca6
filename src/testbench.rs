//! Testbench vector export.
//!
//! Converts processed audio samples into the text format consumed by the
//! HDL testbench: one line per sample, `<tlast>\t<4-hex-digit>\n`, where
//! TLAST is 1 only on the final word of the block.
//!
//! The unsigned cast is the specific XOR-then-increment mapping used by the
//! testbench tooling and is reproduced exactly.

use std::io::{self, Write};
use std::path::Path;

use tracing::info;

/// Cast a signed integer to the testbench's unsigned representation.
///
/// For negative `x` the result is `((2^bits − 1) XOR |x|) + 1`; otherwise
/// `x` is returned unchanged. The XOR-then-increment form is kept verbatim
/// from the testbench tooling rather than rewritten as a wrapping cast.
///
/// # Panics
///
/// Panics if `bits` is 0 or greater than 63.
pub fn cast_unsigned(x: i64, bits: u32) -> u64 {
    assert!(bits > 0 && bits < 64, "bits must be in 1..=63");
    if x < 0 {
        let mask = (1u64 << bits) - 1;
        (mask ^ x.unsigned_abs()) + 1
    } else {
        x as u64
    }
}

/// Write one audio frame as a testbench vector.
///
/// Samples are truncated toward zero to integers and cast with a 16-bit
/// unsigned representation. Values are zero-padded to at least 4 hex
/// digits. An empty frame writes nothing.
pub fn write_vector<W: Write>(w: &mut W, frame: &[f32]) -> io::Result<()> {
    for (i, &sample) in frame.iter().enumerate() {
        let tlast = u8::from(i == frame.len() - 1);
        let value = cast_unsigned(sample.trunc() as i64, 16);
        writeln!(w, "{}\t{:04x}", tlast, value)?;
    }
    Ok(())
}

/// Write one audio frame as a testbench vector file.
pub fn write_vector_file<P: AsRef<Path>>(path: P, frame: &[f32]) -> io::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
    write_vector(&mut file, frame)?;
    file.flush()?;
    info!(samples = frame.len(), path = %path.as_ref().display(), "wrote testbench vector");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_unsigned_minus_one_four_bits() {
        // ((2^4 − 1) XOR |−1|) + 1 = (15 XOR 1) + 1 = 14 + 1
        assert_eq!(cast_unsigned(-1, 4), (15 ^ 1) + 1);
        assert_eq!(cast_unsigned(-1, 4), 15);
    }

    #[test]
    fn test_cast_unsigned_zero() {
        assert_eq!(cast_unsigned(0, 4), 0);
        assert_eq!(cast_unsigned(0, 16), 0);
    }

    #[test]
    fn test_cast_unsigned_max_positive() {
        // x = 2^bits − 1 passes through unchanged
        assert_eq!(cast_unsigned(15, 4), 15);
        assert_eq!(cast_unsigned(65_535, 16), 65_535);
    }

    #[test]
    fn test_cast_unsigned_sixteen_bits() {
        assert_eq!(cast_unsigned(-1, 16), (0xffff ^ 1) + 1);
        assert_eq!(cast_unsigned(-32_768, 16), (0xffff ^ 32_768) + 1);
        assert_eq!(cast_unsigned(-32_768, 16), 32_768);
        assert_eq!(cast_unsigned(12_345, 16), 12_345);
    }

    #[test]
    fn test_write_vector_format() {
        let frame = vec![0.0f32, 255.0, -1.0];
        let mut out = Vec::new();
        write_vector(&mut out, &frame).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0\t0000");
        assert_eq!(lines[1], "0\t00ff");
        // -1 → (0xffff ^ 1) + 1 = 0xffff
        assert_eq!(lines[2], "1\tffff");
    }

    #[test]
    fn test_write_vector_tlast_only_on_final_sample() {
        let frame = vec![1.0f32; 10];
        let mut out = Vec::new();
        write_vector(&mut out, &frame).unwrap();

        let text = String::from_utf8(out).unwrap();
        let tlasts: Vec<char> = text.lines().map(|l| l.chars().next().unwrap()).collect();
        assert_eq!(tlasts.iter().filter(|&&c| c == '1').count(), 1);
        assert_eq!(*tlasts.last().unwrap(), '1');
    }

    #[test]
    fn test_write_vector_truncates_toward_zero() {
        let frame = vec![3.9f32, -3.9];
        let mut out = Vec::new();
        write_vector(&mut out, &frame).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "0\t0003");
        // -3 → (0xffff ^ 3) + 1 = 0xfffd
        assert_eq!(lines[1], "1\tfffd");
    }

    #[test]
    fn test_write_vector_empty_frame() {
        let mut out = Vec::new();
        write_vector(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }
}
