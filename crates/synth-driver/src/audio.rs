//! Audio output collaborator
//!
//! The harness never produces samples itself. When a playback stream is
//! attached it is only configured, so the synthesizer's output path is live
//! while the voices are triggered.

use crate::error::Result;
use std::fmt::Debug;

/// PCM sample format requested from the playback device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 24-bit little-endian
    S24Le,
}

/// Playback stream parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Frames per second
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Sample format
    pub format: SampleFormat,
    /// Open without blocking on a busy device
    pub non_blocking: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            format: SampleFormat::S24Le,
            non_blocking: true,
        }
    }
}

/// Playback stream the orchestrator configures before programming voices
///
/// Dropping the sink closes the stream.
pub trait AudioSink: Debug {
    /// Apply `config` to the stream
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    fn configure(&mut self, config: &StreamConfig) -> Result<()>;
}

/// What a configuration failure means for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioPolicy {
    /// Report the failure and keep programming registers
    #[default]
    Advisory,
    /// Fail the run
    Required,
}
