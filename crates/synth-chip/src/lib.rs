//! Register model for the ZedBoard UIO synthesizer peripheral.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the peripheral as seen from the AXI side: the per-voice
//! register block, bit definitions, and the encodings used to program each
//! voice.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Voice block field indices, gate/shape bits, [`regs::RegisterLayout`] |
//! | [`voice`] | Envelope, amplitude, waveform and frequency word encodings |
//! | [`tuning`] | Equal-temperament frequency table (A4 = 440 Hz) |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod regs;
pub mod tuning;
pub mod voice;
