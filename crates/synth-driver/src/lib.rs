//! Userspace driver for the ZedBoard UIO synthesizer peripheral.
//!
//! Finds the peripheral among `/sys/class/uio` entries, resolves its memory
//! window from sysfs, maps it and programs the voice bank.
//!
//! # Pipeline
//!
//! ```text
//! DeviceLocator ──▶ MappingResolver ──▶ RegionMapper ──▶ RegisterSpace
//!   (name match)     (maps/map0/*)       (mmap)            │
//!                                                          ▼
//!                                   TestOrchestrator ◀── VoiceProgrammer
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use synth_driver::{HarnessConfig, TestOrchestrator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut harness = TestOrchestrator::new(HarnessConfig::default());
//! let report = harness.run()?;
//! println!("{} voices triggered via {}", report.triggered, report.device_file.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod audio;
mod bus;
mod config;
pub mod descriptor;
mod discovery;
mod error;
mod mapping;
mod mmap;
mod orchestrator;
mod regspace;
mod voice;

/// Register model (re-exported from synth-chip).
pub use synth_chip as chip;

pub use audio::{AudioPolicy, AudioSink, SampleFormat, StreamConfig};
pub use bus::{RegionMapper, RegisterBus};
pub use config::{HarnessConfig, Pacing};
pub use discovery::{DeviceDescriptor, DeviceLocator, DEFAULT_DEVICE_NAME, DEV_ROOT, UIO_CLASS_ROOT};
pub use error::{FailureKind, Result, SynthError};
pub use mapping::{MappingRecord, MappingResolver, MAP_SUBDIR};
pub use mmap::{UioMapper, UioMapping};
pub use orchestrator::{RunReport, TestOrchestrator, TestState};
pub use regspace::RegisterSpace;
pub use voice::{
    FrequencyMode, Mismatch, ProgramSummary, ReadbackReport, ReadbackWord, VoicePlan,
    VoiceProgrammer, VoiceSettings,
};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        DeviceLocator, HarnessConfig, MappingResolver, RegisterSpace, Result, SynthError,
        TestOrchestrator, TestState, UioMapper, VoicePlan, VoiceProgrammer,
    };
}
