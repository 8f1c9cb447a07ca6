//! IQ capture reading.
//!
//! Reads complex baseband samples from pre-recorded capture files. The
//! capture format is a flat binary array of little-endian 8-byte complex
//! values (f32 real followed by f32 imaginary).
//!
//! [`CaptureReader`] yields fixed-size chunks for streaming playback of a
//! file; [`read_capture`] loads an entire capture for batch mode.

use std::io::Read;
use std::path::{Path, PathBuf};

use num_complex::Complex;

use crate::SampleBlock;
use crate::complex_from_le_bytes;

/// Bytes per complex sample in a capture file (two little-endian f32).
pub const BYTES_PER_SAMPLE: usize = 8;

/// Chunked capture file reader.
///
/// Iterates over [`SampleBlock`]s of up to `chunk_size` samples. The final
/// chunk may be shorter when the file length is not a multiple of the chunk
/// size; trailing bytes that do not form a whole sample are dropped.
pub struct CaptureReader<R: Read> {
    chunk_size: usize,
    reader: R,
    done: bool,
}

impl CaptureReader<std::io::BufReader<std::fs::File>> {
    /// Open a capture file for chunked reading.
    ///
    /// Paths starting with `~` are expanded to the home directory.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        chunk_size: usize,
    ) -> Result<Self, std::io::Error> {
        let path = expanduser(path.as_ref().to_path_buf());
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(Self {
            chunk_size,
            reader,
            done: false,
        })
    }
}

impl<R: Read> CaptureReader<R> {
    fn read_chunk(&mut self) -> Result<Vec<Complex<f32>>, std::io::Error> {
        let mut buffer = vec![0u8; self.chunk_size * BYTES_PER_SAMPLE];
        let mut total = 0;
        while total < buffer.len() {
            match self.reader.read(&mut buffer[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buffer.truncate(total);
        Ok(complex_from_le_bytes(&buffer))
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<SampleBlock, std::io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(samples) => {
                if samples.len() < self.chunk_size {
                    self.done = true;
                }
                if samples.is_empty() {
                    None
                } else {
                    Some(Ok(samples))
                }
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read an entire capture file into memory.
pub fn read_capture<P: AsRef<Path>>(path: P) -> Result<SampleBlock, std::io::Error> {
    let path = expanduser(path.as_ref().to_path_buf());
    let bytes = std::fs::read(path)?;
    Ok(complex_from_le_bytes(&bytes))
}

fn expanduser(path: PathBuf) -> PathBuf {
    // Check if the path starts with "~"
    if let Some(stripped) = path.to_str().and_then(|p| p.strip_prefix("~"))
        && let Some(home_dir) = dirs::home_dir()
    {
        // Join the home directory with the rest of the path
        return home_dir.join(stripped.trim_start_matches('/'));
    }
    path
}
