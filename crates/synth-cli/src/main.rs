//! `synth-harness` — diagnostic harness for the UIO synthesizer peripheral.
//!
//! ```text
//! USAGE:
//!   synth-harness run      Program every voice, read back, gate each voice in turn
//!   synth-harness locate   Show the matching UIO entry and its mapping record
//!   synth-harness dump     Map the device and print every voice register
//! ```
//!
//! Failures are printed and exit with status 0 unless `--strict-exit` is given.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use synth_driver::chip::regs::{RegisterLayout, VoiceFormat, DEFAULT_NUM_UNITS};
use synth_driver::chip::voice::{Amplitude, WaveAssignment, DEFAULT_FREQUENCY_HZ, DEFAULT_SUSTAIN};
use synth_driver::{
    DeviceLocator, FailureKind, FrequencyMode, HarnessConfig, MappingResolver, Pacing,
    RegisterSpace, SynthError, TestOrchestrator, UioMapping, VoicePlan, DEFAULT_DEVICE_NAME,
    DEV_ROOT, UIO_CLASS_ROOT,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synth-harness", about = "UIO synthesizer peripheral test harness", version)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    /// Exit with a distinct status per failure kind instead of always 0.
    #[arg(long, global = true)]
    strict_exit: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args)]
struct DeviceArgs {
    /// UIO device name to look for.
    #[arg(long, global = true, env = "SYNTH_UIO_NAME", default_value = DEFAULT_DEVICE_NAME)]
    name: String,

    /// UIO class directory.
    #[arg(long, global = true, env = "SYNTH_UIO_CLASS_ROOT", default_value = UIO_CLASS_ROOT)]
    class_root: PathBuf,

    /// Directory holding the UIO device nodes.
    #[arg(long, global = true, env = "SYNTH_DEV_ROOT", default_value = DEV_ROOT)]
    dev_root: PathBuf,
}

#[derive(Args)]
struct LayoutArgs {
    /// Number of voices in the bank.
    #[arg(long, default_value_t = DEFAULT_NUM_UNITS)]
    units: usize,

    /// Register format of each voice block.
    #[arg(long, value_enum, default_value_t = FormatArg::Packed)]
    format: FormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// 3 words: amp|freq, waveform, envelope.
    Packed,
    /// 4 words: freq, waveform, envelope, amp.
    Split,
}

#[derive(Clone, Copy, ValueEnum)]
enum WavesArg {
    /// voice % 3
    Modulo3,
    /// (voice / 7) % 3
    Bands7,
}

#[derive(Subcommand)]
enum Cmd {
    /// Program, read back and trigger every voice.
    Run {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Use the equal-temperament scale instead of a fixed frequency.
        #[arg(long, conflicts_with = "freq")]
        tuned: bool,

        /// Frequency in Hz for every voice.
        #[arg(long, default_value_t = DEFAULT_FREQUENCY_HZ)]
        freq: u32,

        /// Raw Q8.8 amplitude (256 = unity gain).
        #[arg(long, default_value_t = Amplitude::UNITY.raw())]
        amp: u16,

        /// Envelope sustain level.
        #[arg(long, default_value_t = DEFAULT_SUSTAIN)]
        sustain: u8,

        /// Wave shape assignment.
        #[arg(long, value_enum, default_value_t = WavesArg::Modulo3)]
        waves: WavesArg,

        /// Milliseconds each voice stays gated on.
        #[arg(long, default_value_t = 2000)]
        gate_on_ms: u64,

        /// Milliseconds to wait after releasing each voice.
        #[arg(long, default_value_t = 2000)]
        gate_off_ms: u64,

        /// Stop after the read-back pass.
        #[arg(long)]
        no_trigger: bool,
    },
    /// Print the matching UIO entry and its mapping record.
    Locate,
    /// Map the device and print every voice register.
    Dump {
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

impl LayoutArgs {
    fn format(&self) -> VoiceFormat {
        match self.format {
            FormatArg::Packed => VoiceFormat::Packed,
            FormatArg::Split => VoiceFormat::Split,
        }
    }

    fn layout(&self) -> RegisterLayout {
        RegisterLayout::new(self.units, self.format())
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Cmd::Run {
            layout,
            tuned,
            freq,
            amp,
            sustain,
            waves,
            gate_on_ms,
            gate_off_ms,
            no_trigger,
        } => {
            let config = HarnessConfig {
                device_name: cli.device.name,
                class_root: cli.device.class_root,
                dev_root: cli.device.dev_root,
                layout: layout.layout(),
                plan: VoicePlan {
                    format: layout.format(),
                    frequency: if tuned {
                        FrequencyMode::Tuned
                    } else {
                        FrequencyMode::Fixed(freq)
                    },
                    amplitude: Amplitude(amp),
                    sustain,
                    waves: match waves {
                        WavesArg::Modulo3 => WaveAssignment::Modulo3,
                        WavesArg::Bands7 => WaveAssignment::Bands7,
                    },
                },
                pacing: Pacing {
                    gate_on: Duration::from_millis(gate_on_ms),
                    gate_off: Duration::from_millis(gate_off_ms),
                    ..Pacing::default()
                },
                trigger: !no_trigger,
                ..HarnessConfig::default()
            };
            cmd_run(config)
        }
        Cmd::Locate => cmd_locate(&cli.device),
        Cmd::Dump { layout } => cmd_dump(&cli.device, layout.layout()),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            println!("{e:#}");
            let kind = e.downcast_ref::<SynthError>().map(SynthError::kind);
            Ok(if cli.strict_exit {
                exit_code(kind)
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

/// Status codes used with `--strict-exit`
fn exit_code(kind: Option<FailureKind>) -> ExitCode {
    match kind {
        Some(FailureKind::NotFound) => ExitCode::from(2),
        Some(FailureKind::MappingUnresolved) => ExitCode::from(3),
        Some(FailureKind::DeviceOpenFailed) => ExitCode::from(4),
        Some(FailureKind::MapFailed) => ExitCode::from(5),
        _ => ExitCode::FAILURE,
    }
}

fn cmd_run(config: HarnessConfig) -> Result<()> {
    let mut harness = TestOrchestrator::new(config);
    let report = harness.run()?;

    println!();
    println!("Device       : {}", report.device_file.display());
    println!("Mapping      : {}", report.record);
    println!("Voices       : {}", report.voices.len());
    for v in &report.voices {
        println!(
            "  unit{:<3} {:>5} Hz  gain {:.2}  wave {}  A{} D{} S{:#04x} R{}",
            v.voice,
            v.frequency,
            v.amplitude.gain(),
            v.shape.index(),
            v.envelope.attack,
            v.envelope.decay,
            v.envelope.sustain,
            v.envelope.release
        );
    }
    if report.readback.is_clean() {
        println!("Read-back    : {} registers OK", report.readback.words.len());
    } else {
        println!(
            "Read-back    : {} of {} registers differ",
            report.readback.mismatches.len(),
            report.readback.words.len()
        );
    }
    println!("Triggered    : {}", report.triggered);

    Ok(())
}

fn cmd_locate(device: &DeviceArgs) -> Result<()> {
    let found = DeviceLocator::new(&device.class_root).locate(&device.name)?;
    let record = MappingResolver::resolve(&found.directory);

    println!("Device found in {}", found.directory.display());
    println!("Device file  : {}", found.device_file(&device.dev_root).display());
    println!("{record}");
    println!("Usable       : {}", record.is_usable());

    Ok(())
}

fn cmd_dump(device: &DeviceArgs, layout: RegisterLayout) -> Result<()> {
    let found = DeviceLocator::new(&device.class_root).locate(&device.name)?;
    let record = MappingResolver::resolve(&found.directory).validate()?;
    let device_file = found.device_file(&device.dev_root);

    let region = UioMapping::map(&device_file, &record)?;
    let space = RegisterSpace::new(region, layout)
        .with_context(|| format!("cannot lay out voices over {}", device_file.display()))?;

    for voice in 0..layout.num_units {
        let words = (0..layout.num_addr_per_unit)
            .map(|field| space.read(voice, field).map(|w| format!("{w:08x}")))
            .collect::<synth_driver::Result<Vec<_>>>()?;
        println!("unit{voice:<3} {}", words.join(" "));
    }

    Ok(())
}
