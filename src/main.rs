//! FM broadcast demodulator CLI.
//!
//! Two modes:
//!
//! - `stream`: demodulate live samples from an RTL-SDR (or a capture file
//!   streamed block by block) and play the audio.
//! - `sim`: demodulate a recorded capture in one pass, then play it or
//!   export a testbench vector.
//!
//! # Usage Examples
//!
//! ```bash
//! # Live FM reception (requires the rtlsdr feature)
//! fmdemod stream -f 105.1M
//!
//! # Stream a capture file through the live pipeline
//! fmdemod stream -f 105.1M --file samples.iq
//!
//! # Batch-demodulate a capture and export an HDL testbench vector
//! fmdemod sim -f samples.iq --export audio_axis.txt
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};

use fmdemod::dsp::DemodConfig;
use fmdemod::pipeline::{AudioSink, Pipeline};
use fmdemod::{batch, iqread, testbench};

/// Default capture shipped with the project for simulation runs.
const DEFAULT_CAPTURE: &str = "data/fm_rds_250k_1Msamples.iq";

/// Samples per block when streaming from a capture file.
const FILE_CHUNK_SIZE: usize = 16_384;

#[derive(Debug, Clone, Copy)]
struct Frequency(u32);

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(stripped) = s.strip_suffix('M') {
            let val: f32 = stripped.trim().parse().map_err(|_| "Invalid MHz value")?;
            Ok(Frequency((val * 1_000_000.0) as u32))
        } else if let Some(stripped) = s.strip_suffix('k') {
            let val: f32 = stripped.trim().parse().map_err(|_| "Invalid kHz value")?;
            Ok(Frequency((val * 1_000.0) as u32))
        } else {
            let val: u32 = s.parse().map_err(|_| "Invalid Hz value")?;
            Ok(Frequency(val))
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "FM broadcast demodulator for IQ captures and RTL-SDR sources", long_about = None)]
struct Cli {
    /// Verbosity level (-v=info, -vv=debug, -vvv=trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Demodulate live samples and play audio
    Stream {
        /// Center frequency in Hz (accepts k/M suffix, e.g. 105.1M)
        #[arg(short = 'f', long, value_parser = Frequency::from_str)]
        center_freq: Frequency,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = 250_000)]
        sample_rate: u32,

        /// Decimation factor for the audio path
        #[arg(short, long, default_value_t = 6)]
        decimation: usize,

        /// Tuner gain in dB (automatic when omitted)
        #[arg(short, long)]
        gain: Option<f64>,

        /// RTL-SDR device index
        #[arg(long, default_value_t = 0)]
        device_index: usize,

        /// Stream from a capture file instead of hardware
        #[arg(long)]
        file: Option<String>,

        /// Write raw 16-bit PCM to stdout instead of the audio device
        #[arg(long, default_value_t = false)]
        no_audio: bool,
    },

    /// Demodulate a recorded capture in one pass
    Sim {
        /// Capture file of little-endian complex f32 samples
        #[arg(short = 'f', long, default_value = DEFAULT_CAPTURE)]
        filename: String,

        /// Sample rate of the capture in Hz
        #[arg(short, long, default_value_t = 250_000)]
        sample_rate: u32,

        /// Decimation factor for the audio path
        #[arg(short, long, default_value_t = 6)]
        decimation: usize,

        /// Export a testbench vector to this path instead of playing audio
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Write raw 16-bit PCM to stdout instead of the audio device
        #[arg(long, default_value_t = false)]
        no_audio: bool,
    },
}

fn main() -> fmdemod::Result<()> {
    let cli = Cli::parse();

    // 0 = WARN (quiet), 1 = INFO, 2 = DEBUG, 3+ = TRACE
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Command::Stream {
            center_freq,
            sample_rate,
            decimation,
            gain,
            device_index,
            file,
            no_audio,
        } => run_stream(
            center_freq,
            sample_rate,
            decimation,
            gain,
            device_index,
            file,
            no_audio,
        ),
        Command::Sim {
            filename,
            sample_rate,
            decimation,
            export,
            no_audio,
        } => run_sim(filename, sample_rate, decimation, export, no_audio),
    }
}

fn run_stream(
    center_freq: Frequency,
    sample_rate: u32,
    decimation: usize,
    gain: Option<f64>,
    device_index: usize,
    file: Option<String>,
    no_audio: bool,
) -> fmdemod::Result<()> {
    let config = DemodConfig {
        sample_rate,
        decimation,
        ..Default::default()
    };
    info!(
        center_freq = center_freq.0,
        sample_rate,
        decimation,
        audio_rate = config.audio_rate(),
        "streaming mode"
    );

    let sink = make_sink(&config, no_audio)?;
    let mut pipeline = Pipeline::new(config)?;
    pipeline.start(sink)?;

    let handle = pipeline.capture_handle();
    let cancel = pipeline.cancel_token();

    // Exit watcher: cancel the pipeline on Enter instead of killing the
    // process, so the workers shut down through their cancel checks.
    {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            eprintln!("Press Enter to exit");
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
            cancel.cancel();
        });
    }

    match file {
        Some(path) => {
            let reader = iqread::CaptureReader::from_file(&path, FILE_CHUNK_SIZE)?;
            let capture_cancel = cancel.clone();
            let capture = std::thread::spawn(move || {
                for block in reader {
                    if capture_cancel.is_cancelled() {
                        break;
                    }
                    match block {
                        Ok(b) => handle.push(b),
                        Err(e) => {
                            warn!("capture read error: {e}");
                            break;
                        }
                    }
                }
            });
            let _ = capture.join();
        }
        None => {
            #[cfg(feature = "rtlsdr")]
            {
                let rtl_config = fmdemod::rtlsdr::RtlSdrConfig {
                    device_index,
                    center_freq: center_freq.0,
                    sample_rate,
                    gain: match gain {
                        Some(db) => fmdemod::Gain::Manual(db),
                        None => fmdemod::Gain::Auto,
                    },
                };
                let capture = fmdemod::rtlsdr::RtlSdrCapture::new(&rtl_config)?;
                capture.run(handle, cancel.clone())?;
            }
            #[cfg(not(feature = "rtlsdr"))]
            {
                let _ = (gain, device_index, handle);
                eprintln!("Error: rtlsdr feature not enabled. Rebuild with --features rtlsdr");
                std::process::exit(1);
            }
        }
    }

    // Capture ended or the user cancelled; let the queues drain and join.
    pipeline.wait();
    Ok(())
}

fn run_sim(
    filename: String,
    sample_rate: u32,
    decimation: usize,
    export: Option<PathBuf>,
    no_audio: bool,
) -> fmdemod::Result<()> {
    let config = DemodConfig {
        sample_rate,
        decimation,
        ..Default::default()
    };
    let audio = batch::demodulate_file(&filename, &config)?;
    info!(samples = audio.len(), "demodulated capture");

    match export {
        Some(path) => testbench::write_vector_file(path, &audio)?,
        None => {
            let mut sink = make_sink(&config, no_audio)?;
            let pcm: Vec<i16> = audio.iter().map(|&s| s as i16).collect();
            sink.write(&pcm)?;
            // Play out whatever the sink still holds before exiting.
            sink.drain();
        }
    }
    Ok(())
}

#[cfg(feature = "audio")]
const SINK_BUFFER_SECONDS: f32 = 2.0;

/// Samples per device callback.
#[cfg(feature = "audio")]
const CALLBACK_SAMPLES: usize = 1024;

fn make_sink(config: &DemodConfig, no_audio: bool) -> fmdemod::Result<Box<dyn AudioSink>> {
    #[cfg(feature = "audio")]
    if !no_audio {
        return Ok(Box::new(TinyAudioSink::new(config)?));
    }
    #[cfg(not(feature = "audio"))]
    if !no_audio {
        info!("built without the audio feature, writing PCM to stdout");
    }
    let _ = config;
    Ok(Box::new(StdoutSink {
        out: std::io::stdout(),
    }))
}

/// Writes raw little-endian 16-bit PCM to stdout.
struct StdoutSink {
    out: std::io::Stdout,
}

impl AudioSink for StdoutSink {
    fn write(&mut self, frame: &[i16]) -> fmdemod::Result<()> {
        use std::io::Write;
        let mut bytes = Vec::with_capacity(frame.len() * 2);
        for s in frame {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        self.out.write_all(&bytes)?;
        Ok(())
    }

    fn drain(&mut self) {
        use std::io::Write;
        let _ = self.out.flush();
    }
}

/// Plays PCM through the default output device.
///
/// The device callback pulls from a bounded channel; `write` blocks when
/// the buffer is full, which paces the playback worker to the hardware.
#[cfg(feature = "audio")]
struct TinyAudioSink {
    tx: crossbeam::channel::Sender<f32>,
    sample_rate: usize,
    _device: tinyaudio::OutputDevice,
}

#[cfg(feature = "audio")]
impl TinyAudioSink {
    fn new(config: &DemodConfig) -> fmdemod::Result<Self> {
        use tinyaudio::prelude::*;

        let audio_rate = (config.sample_rate / config.decimation as u32) as usize;
        let buffer = (audio_rate as f32 * SINK_BUFFER_SECONDS) as usize;
        let (tx, rx) = crossbeam::channel::bounded::<f32>(buffer);

        let params = OutputDeviceParameters {
            channels_count: 1,
            sample_rate: audio_rate,
            channel_sample_count: CALLBACK_SAMPLES,
        };
        let device = run_output_device(params, move |data| {
            for sample in data.iter_mut() {
                // fill silence if the buffer underruns
                *sample = rx.try_recv().unwrap_or(0.0);
            }
        })
        .map_err(|e| fmdemod::Error::device(format!("audio output: {e}")))?;

        Ok(Self {
            tx,
            sample_rate: audio_rate,
            _device: device,
        })
    }
}

#[cfg(feature = "audio")]
impl AudioSink for TinyAudioSink {
    fn write(&mut self, frame: &[i16]) -> fmdemod::Result<()> {
        for &s in frame {
            if self.tx.send(s as f32 / 32_768.0).is_err() {
                return Err(fmdemod::Error::device("audio device stopped"));
            }
        }
        Ok(())
    }

    fn drain(&mut self) {
        // Wait for the device callback to consume the channel, then give it
        // time to play out the samples already pulled into its own buffer.
        while !self.tx.is_empty() {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        let tail = 2.0 * CALLBACK_SAMPLES as f32 / self.sample_rate as f32;
        std::thread::sleep(std::time::Duration::from_secs_f32(tail));
    }
}
