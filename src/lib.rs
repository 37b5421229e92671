//! DriveKernel — real-time guitar distortion cores built on Wave Digital
//! Filters (WDFs), with parametric tone shaping around them.
//!
//! # Modules
//!
//! - [`wdf`] — one-port leaf elements, adaptors, the op-amp R-type
//!   junction, and the Wright-Omega diode clipper root
//! - [`circuits`] — complete circuit models (MouseDrive, TubeScreamer)
//! - [`quantity`] — tunable component values shared with a control thread
//! - [`params`] — ramped gain-style parameters
//! - [`eq`] — biquad designs, filter sections, and fixed filter banks
//! - [`chain`] — the full per-channel processing chain
//! - [`diagnostics`] — lock-free audio-thread statistics
//!
//! The processing path allocates nothing and never blocks; everything
//! that allocates runs in `prepare`, off the audio thread.

pub mod chain;
pub mod circuits;
pub mod diagnostics;
pub mod eq;
pub mod params;
pub mod quantity;
pub mod wdf;

pub use chain::{DriveChain, ParamId};
pub use circuits::{CircuitKind, CircuitModel};
pub use diagnostics::EngineStats;
pub use eq::{Equaliser, EqualiserKind};
pub use quantity::{CircuitQuantity, CircuitQuantityList, QuantityKind};

use thiserror::Error;

/// Rejected `prepare` requests. The chain keeps its previous
/// configuration when one of these is returned.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// Sample rate must be finite and positive.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),
    /// At least one channel is required.
    #[error("channel count must be nonzero")]
    NoChannels,
    /// The maximum block size must be nonzero.
    #[error("maximum block size must be nonzero")]
    EmptyBlock,
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
