//! Harness configuration
//!
//! One struct carries every tunable the run needs. Defaults reproduce the
//! reference test: 32 packed voices on `zed_uio_module`, 2 Hz at unity gain,
//! two seconds per gate phase.

use crate::audio::{AudioPolicy, StreamConfig};
use crate::discovery::{DEFAULT_DEVICE_NAME, DEV_ROOT, UIO_CLASS_ROOT};
use crate::voice::VoicePlan;
use std::path::PathBuf;
use std::time::Duration;
use synth_chip::regs::RegisterLayout;

/// Pacing delays between register operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Wait between the programming pass and the read-back pass
    pub settle: Duration,
    /// How long each voice stays gated on
    pub gate_on: Duration,
    /// Wait after releasing a voice before the next one
    pub gate_off: Duration,
}

impl Pacing {
    /// No waits at all
    pub const IMMEDIATE: Self = Self {
        settle: Duration::ZERO,
        gate_on: Duration::ZERO,
        gate_off: Duration::ZERO,
    };
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            settle: Duration::from_micros(100),
            gate_on: Duration::from_secs(2),
            gate_off: Duration::from_secs(2),
        }
    }
}

/// Everything a harness run needs
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// UIO name to look for
    pub device_name: String,
    /// UIO class directory
    pub class_root: PathBuf,
    /// Directory holding the device nodes
    pub dev_root: PathBuf,
    /// Voice bank geometry
    pub layout: RegisterLayout,
    /// Voice parameters
    pub plan: VoicePlan,
    /// Delays
    pub pacing: Pacing,
    /// Gate each voice after programming
    pub trigger: bool,
    /// Playback stream parameters, used when a sink is attached
    pub stream: StreamConfig,
    /// Whether a failed stream aborts the run
    pub audio_policy: AudioPolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            class_root: PathBuf::from(UIO_CLASS_ROOT),
            dev_root: PathBuf::from(DEV_ROOT),
            layout: RegisterLayout::default(),
            plan: VoicePlan::default(),
            pacing: Pacing::default(),
            trigger: true,
            stream: StreamConfig::default(),
            audio_policy: AudioPolicy::default(),
        }
    }
}
