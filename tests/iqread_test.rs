//! Unit and integration tests for capture file reading

use std::fs;

use fmdemod::iqread::{BYTES_PER_SAMPLE, CaptureReader, read_capture};
use num_complex::Complex;

fn write_capture(path: &str, samples: &[Complex<f32>]) {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for s in samples {
        bytes.extend_from_slice(&s.re.to_le_bytes());
        bytes.extend_from_slice(&s.im.to_le_bytes());
    }
    fs::write(path, &bytes).expect("Failed to write test capture");
}

#[test]
fn test_read_capture_roundtrip() {
    let temp_path = "/tmp/test_read_capture.iq";
    let samples: Vec<Complex<f32>> = (0..10)
        .map(|i| Complex::new(i as f32, -(i as f32)))
        .collect();
    write_capture(temp_path, &samples);

    let read = read_capture(temp_path).expect("Read error");
    assert_eq!(read, samples);

    fs::remove_file(temp_path).ok();
}

#[test]
fn test_capture_reader_multiple_chunks() {
    let temp_path = "/tmp/test_capture_chunks.iq";
    let samples: Vec<Complex<f32>> =
        (0..30).map(|i| Complex::new(i as f32, 0.0)).collect();
    write_capture(temp_path, &samples);

    let mut reader =
        CaptureReader::from_file(temp_path, 10).expect("Failed to open capture");

    for chunk_idx in 0..3 {
        let chunk = reader
            .next()
            .unwrap_or_else(|| panic!("Chunk {} missing", chunk_idx))
            .expect("Read error");
        assert_eq!(chunk.len(), 10, "Chunk {} should have 10 samples", chunk_idx);
        assert_eq!(chunk[0].re, (chunk_idx * 10) as f32);
    }

    assert!(reader.next().is_none(), "Should reach EOF after 3 chunks");

    fs::remove_file(temp_path).ok();
}

#[test]
fn test_capture_reader_partial_final_chunk() {
    // 25 samples read in chunks of 10: the final chunk holds 5 samples.
    let temp_path = "/tmp/test_capture_partial.iq";
    let samples: Vec<Complex<f32>> =
        (0..25).map(|i| Complex::new(i as f32, 1.0)).collect();
    write_capture(temp_path, &samples);

    let reader = CaptureReader::from_file(temp_path, 10).expect("Failed to open capture");
    let chunks: Vec<_> = reader.map(|c| c.expect("Read error")).collect();

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 10);
    assert_eq!(chunks[1].len(), 10);
    assert_eq!(chunks[2].len(), 5);

    fs::remove_file(temp_path).ok();
}

#[test]
fn test_capture_reader_empty_file() {
    let temp_path = "/tmp/test_capture_empty.iq";
    fs::write(temp_path, []).expect("Failed to write test capture");

    let mut reader = CaptureReader::from_file(temp_path, 10).expect("Failed to open capture");
    assert!(reader.next().is_none(), "Empty file should yield no chunks");

    fs::remove_file(temp_path).ok();
}

#[test]
fn test_capture_reader_nonexistent_file() {
    let result = CaptureReader::from_file("/tmp/nonexistent_capture_12345.iq", 10);
    assert!(result.is_err(), "Should return error for nonexistent file");
    assert_eq!(
        result.err().unwrap().kind(),
        std::io::ErrorKind::NotFound
    );
}

#[test]
fn test_capture_reader_drops_trailing_bytes() {
    // One full sample plus 3 stray bytes: the tail is discarded.
    let temp_path = "/tmp/test_capture_trailing.iq";
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1.0f32.to_le_bytes());
    bytes.extend_from_slice(&2.0f32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 3]);
    fs::write(temp_path, &bytes).expect("Failed to write test capture");

    let reader = CaptureReader::from_file(temp_path, 10).expect("Failed to open capture");
    let chunks: Vec<_> = reader.map(|c| c.expect("Read error")).collect();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0], vec![Complex::new(1.0, 2.0)]);

    fs::remove_file(temp_path).ok();
}
