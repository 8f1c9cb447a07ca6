//! Streaming pipeline orchestrator.
//!
//! Threads continuous sample arrival through the demodulation chain without
//! dropping data or introducing block-boundary artifacts. Three execution
//! contexts cooperate, connected only by channels:
//!
//! - **Capture**: the hardware callback (or a file reader thread) pushes
//!   [`SampleBlock`]s through a [`CaptureHandle`]. The push never blocks on
//!   downstream processing; the raw queue is unbounded, trading memory
//!   growth for guaranteed callback latency.
//! - **Demod worker**: blocking-dequeues raw blocks, runs the full
//!   [`DemodChain`], enqueues finished [`AudioFrame`]s. A single worker
//!   preserves FIFO order end to end.
//! - **Playback worker**: blocking-dequeues audio frames, casts to 16-bit
//!   PCM and writes them to an [`AudioSink`].
//!
//! Cancellation is cooperative: every worker checks a shared
//! [`CancelToken`] each loop iteration, so [`Pipeline::stop`] terminates
//! the workers without tearing down the process. In-flight blocks are not
//! drained on cancellation; a capture that simply ends (all handles
//! dropped) drains naturally instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use crate::dsp::{DemodChain, DemodConfig};
use crate::error::Result;
use crate::{AudioFrame, SampleBlock};

/// How often a blocked worker wakes up to observe the cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Destination for finished PCM frames.
///
/// Implementations may block in `write`; backpressure from the sink paces
/// the playback worker, never the capture side.
pub trait AudioSink: Send {
    fn write(&mut self, frame: &[i16]) -> Result<()>;

    /// Block until audio accepted by `write` has actually been delivered.
    ///
    /// Called once when playback ends naturally, so buffered sinks are not
    /// clipped. The default is a no-op for unbuffered sinks.
    fn drain(&mut self) {}
}

/// Cooperative cancellation token shared by all pipeline workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination of everything holding a clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Producer-side handle used by the capture context.
///
/// Cloneable so it can be moved into a hardware callback. `push` enqueues
/// without blocking; once the pipeline has stopped the block is dropped
/// silently.
#[derive(Clone)]
pub struct CaptureHandle {
    tx: Sender<SampleBlock>,
}

impl CaptureHandle {
    /// Enqueue one block of raw samples. Never blocks.
    pub fn push(&self, block: SampleBlock) {
        if self.tx.send(block).is_err() {
            debug!("capture push after pipeline shutdown, block dropped");
        }
    }
}

/// Lifecycle of a [`Pipeline`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

/// Owns the worker threads and the queues connecting them.
pub struct Pipeline {
    config: DemodConfig,
    state: PipelineState,
    cancel: CancelToken,
    raw_tx: Option<Sender<SampleBlock>>,
    raw_rx: Option<Receiver<SampleBlock>>,
    workers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Create an idle pipeline.
    ///
    /// The configuration is validated here, before any thread starts: a
    /// chain that enables mixing without a mixer table fails with
    /// [`crate::Error::InvalidArgument`].
    pub fn new(config: DemodConfig) -> Result<Self> {
        // Construct a throwaway chain to surface configuration errors now
        // rather than inside a worker.
        DemodChain::new(&config)?;

        let (raw_tx, raw_rx) = channel::unbounded::<SampleBlock>();
        Ok(Self {
            config,
            state: PipelineState::Idle,
            cancel: CancelToken::new(),
            raw_tx: Some(raw_tx),
            raw_rx: Some(raw_rx),
            workers: Vec::new(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Token observed by all workers; cancel it to stop the pipeline from
    /// another thread (e.g. a keypress watcher).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Handle for the capture context. May be cloned into callbacks.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has already been stopped.
    pub fn capture_handle(&self) -> CaptureHandle {
        let tx = self
            .raw_tx
            .as_ref()
            .expect("capture handle requested after stop")
            .clone();
        CaptureHandle { tx }
    }

    /// Spawn the demod and playback workers. Idle → Running.
    pub fn start(&mut self, sink: Box<dyn AudioSink>) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(crate::Error::invalid_argument(
                "pipeline can only be started once from the idle state",
            ));
        }

        let raw_rx = self
            .raw_rx
            .take()
            .expect("raw queue receiver already taken");
        let (audio_tx, audio_rx) = channel::unbounded::<AudioFrame>();

        let chain = DemodChain::new(&self.config)?;
        let demod_cancel = self.cancel.clone();
        let playback_cancel = self.cancel.clone();

        info!(
            sample_rate = self.config.sample_rate,
            decimation = self.config.decimation,
            audio_rate = self.config.audio_rate(),
            "starting pipeline workers"
        );

        self.workers.push(
            std::thread::Builder::new()
                .name("fm-demod".into())
                .spawn(move || demod_worker(raw_rx, audio_tx, chain, demod_cancel))
                .map_err(|e| crate::Error::other(format!("failed to spawn worker: {e}")))?,
        );
        self.workers.push(
            std::thread::Builder::new()
                .name("fm-playback".into())
                .spawn(move || playback_worker(audio_rx, sink, playback_cancel))
                .map_err(|e| crate::Error::other(format!("failed to spawn worker: {e}")))?,
        );

        self.state = PipelineState::Running;
        Ok(())
    }

    /// Block until the workers finish on their own (capture ended and the
    /// queues drained, or the token was cancelled). Running → Stopped.
    pub fn wait(&mut self) {
        // Drop our producer end so an ended capture disconnects the queue.
        self.raw_tx = None;
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        if self.state == PipelineState::Running {
            self.state = PipelineState::Stopped;
            info!("pipeline stopped");
        }
    }

    /// Cancel the workers and join them. Running → Stopped.
    ///
    /// In-flight blocks are discarded, not drained.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.wait();
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if self.state == PipelineState::Running {
            self.stop();
        }
    }
}

/// Demod context: raw blocks in, finished audio frames out.
fn demod_worker(
    raw_rx: Receiver<SampleBlock>,
    audio_tx: Sender<AudioFrame>,
    mut chain: DemodChain,
    cancel: CancelToken,
) {
    loop {
        if cancel.is_cancelled() {
            debug!("demod worker cancelled");
            break;
        }
        match raw_rx.recv_timeout(CANCEL_POLL) {
            Ok(block) => {
                let frame = chain.process(&block);
                if frame.is_empty() {
                    continue;
                }
                if audio_tx.send(frame).is_err() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("raw queue disconnected, demod worker exiting");
                break;
            }
        }
    }
}

/// Playback context: audio frames in, PCM out to the sink.
fn playback_worker(
    audio_rx: Receiver<AudioFrame>,
    mut sink: Box<dyn AudioSink>,
    cancel: CancelToken,
) {
    loop {
        if cancel.is_cancelled() {
            debug!("playback worker cancelled");
            break;
        }
        match audio_rx.recv_timeout(CANCEL_POLL) {
            Ok(frame) => {
                let pcm: Vec<i16> = frame.iter().map(|&s| s as i16).collect();
                if let Err(e) = sink.write(&pcm) {
                    warn!("audio sink error, playback worker exiting: {e}");
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                // Only a capture that ended naturally gets played out in
                // full; cancellation discards buffered audio.
                if !cancel.is_cancelled() {
                    debug!("audio queue disconnected, draining sink");
                    sink.drain();
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let config = DemodConfig {
            mix: true,
            mixer: None,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(crate::Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pipeline_state_transitions() {
        struct NullSink;
        impl AudioSink for NullSink {
            fn write(&mut self, _frame: &[i16]) -> Result<()> {
                Ok(())
            }
        }

        let mut pipeline = Pipeline::new(DemodConfig::default()).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Idle);

        pipeline.start(Box::new(NullSink)).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);

        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
    }

    #[test]
    fn test_pipeline_cannot_start_twice() {
        struct NullSink;
        impl AudioSink for NullSink {
            fn write(&mut self, _frame: &[i16]) -> Result<()> {
                Ok(())
            }
        }

        let mut pipeline = Pipeline::new(DemodConfig::default()).unwrap();
        pipeline.start(Box::new(NullSink)).unwrap();
        let second = pipeline.start(Box::new(NullSink));
        assert!(second.is_err());
        pipeline.stop();
    }
}
