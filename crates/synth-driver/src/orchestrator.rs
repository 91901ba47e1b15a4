//! Test sequencing
//!
//! ```text
//! Idle ──locate──▶ Located ──resolve+map──▶ Mapped ──program+read-back──▶ Programmed
//!   │                 │                        │                              │
//!   ▼                 ▼                        ▼                              ▼
//! NotFound         Failed                   Failed                 Triggering(0..N) ──▶ Done
//! ```
//!
//! The register space lives in a local of [`TestOrchestrator::run`], so every
//! exit path (early `?` or normal return) drops it, and with it the mapping,
//! exactly once. The audio sink is dropped when the run ends as well.

use crate::audio::{AudioPolicy, AudioSink};
use crate::bus::{RegionMapper, RegisterBus};
use crate::config::HarnessConfig;
use crate::discovery::DeviceLocator;
use crate::error::{FailureKind, Result, SynthError};
use crate::mapping::{MappingRecord, MappingResolver};
use crate::mmap::UioMapper;
use crate::regspace::RegisterSpace;
use crate::voice::{ReadbackReport, VoiceProgrammer, VoiceSettings};
use std::path::PathBuf;
use std::time::Duration;

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    /// Nothing done yet
    Idle,
    /// Device entry found
    Located,
    /// Register window mapped
    Mapped,
    /// All voices written and read back
    Programmed,
    /// Gating voice `voice`
    Triggering {
        /// Voice being gated
        voice: usize,
    },
    /// Run complete
    Done,
    /// Device absent
    NotFound,
    /// Run aborted
    Failed(FailureKind),
}

impl TestState {
    /// True for `Done`, `NotFound` and `Failed`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::NotFound | Self::Failed(_))
    }
}

/// What a successful run did
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Device special file that was mapped
    pub device_file: PathBuf,
    /// Mapping record used
    pub record: MappingRecord,
    /// Parameters written per voice
    pub voices: Vec<VoiceSettings>,
    /// Read-back pass
    pub readback: ReadbackReport,
    /// Voices gated on and off
    pub triggered: usize,
}

/// Drives one harness run against a device
#[derive(Debug)]
pub struct TestOrchestrator<M: RegionMapper = UioMapper> {
    config: HarnessConfig,
    mapper: M,
    audio: Option<Box<dyn AudioSink>>,
    state: TestState,
    history: Vec<TestState>,
}

impl TestOrchestrator<UioMapper> {
    /// Orchestrator using real UIO mappings
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_mapper(config, UioMapper)
    }
}

impl<M: RegionMapper> TestOrchestrator<M> {
    /// Orchestrator acquiring its register window through `mapper`
    pub fn with_mapper(config: HarnessConfig, mapper: M) -> Self {
        Self {
            config,
            mapper,
            audio: None,
            state: TestState::Idle,
            history: vec![TestState::Idle],
        }
    }

    /// Attach a playback stream, configured once the device is mapped
    #[must_use]
    pub fn with_audio(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.audio = Some(sink);
        self
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> TestState {
        self.state
    }

    /// Every state entered during the last run, starting with `Idle`
    #[must_use]
    pub fn history(&self) -> &[TestState] {
        &self.history
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Mapper in use
    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    fn enter(&mut self, state: TestState) {
        tracing::debug!("{:?} -> {state:?}", self.state);
        self.state = state;
        self.history.push(state);
    }

    /// Run the full sequence
    ///
    /// The final state is `Done`, `NotFound` or `Failed`; the mapping and any
    /// audio sink have been released by the time this returns.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the run. `DeviceNotFound` is the
    /// expected outcome on a board without the bitstream loaded.
    pub fn run(&mut self) -> Result<RunReport> {
        self.state = TestState::Idle;
        self.history = vec![TestState::Idle];

        let result = self.execute();

        // Closes the stream on every path
        self.audio = None;

        if let Err(e) = &result {
            let terminal = match e.kind() {
                FailureKind::NotFound => TestState::NotFound,
                kind => TestState::Failed(kind),
            };
            tracing::warn!("Harness run stopped: {e}");
            self.enter(terminal);
        }

        result
    }

    fn execute(&mut self) -> Result<RunReport> {
        let device = DeviceLocator::new(&self.config.class_root).locate(&self.config.device_name)?;
        self.enter(TestState::Located);

        let record = MappingResolver::resolve(&device.directory).validate()?;
        let device_file = device.device_file(&self.config.dev_root);
        drop(device);

        let region = self.mapper.map(&device_file, &record)?;
        let mut space = RegisterSpace::new(region, self.config.layout)?;
        self.enter(TestState::Mapped);

        self.configure_audio()?;

        let programmer = VoiceProgrammer::new(self.config.plan);
        let summary = programmer.program_all(&mut space)?;
        hold(self.config.pacing.settle);
        let readback = VoiceProgrammer::read_back(&space, &summary)?;
        if !readback.is_clean() {
            tracing::warn!("{} register(s) did not read back as written", readback.mismatches.len());
        }
        self.enter(TestState::Programmed);

        let triggered = if self.config.trigger {
            self.trigger_all(&mut space)?
        } else {
            0
        };

        self.enter(TestState::Done);

        Ok(RunReport {
            device_file,
            record,
            voices: summary.voices,
            readback,
            triggered,
        })
    }

    fn configure_audio(&mut self) -> Result<()> {
        let Some(sink) = self.audio.as_mut() else {
            return Ok(());
        };

        match sink.configure(&self.config.stream) {
            Ok(()) => {
                tracing::info!(
                    "Audio stream configured: {} Hz, {} ch, {:?}",
                    self.config.stream.sample_rate,
                    self.config.stream.channels,
                    self.config.stream.format
                );
                Ok(())
            }
            Err(e) => match self.config.audio_policy {
                AudioPolicy::Advisory => {
                    tracing::warn!("Audio stream unavailable, continuing: {e}");
                    Ok(())
                }
                AudioPolicy::Required => Err(SynthError::audio_unavailable(e.to_string())),
            },
        }
    }

    fn trigger_all<B: RegisterBus>(&mut self, space: &mut RegisterSpace<B>) -> Result<usize> {
        let pacing = self.config.pacing;

        for voice in 0..space.num_units() {
            self.enter(TestState::Triggering { voice });

            tracing::info!("Unit{voice} on");
            VoiceProgrammer::set_gate(space, voice, true)?;
            hold(pacing.gate_on);

            tracing::info!("Unit{voice} off");
            VoiceProgrammer::set_gate(space, voice, false)?;
            hold(pacing.gate_off);
        }

        Ok(space.num_units())
    }
}

fn hold(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
