//! Wave digital filter building blocks.
//!
//! A circuit is emulated as a static tree of one-port leaves joined by
//! adaptors, with a single nonlinear element at the root. Every sample is
//! processed in four phases:
//! 1. **scatter_up** — bottom-up: leaves produce reflected waves `b`,
//!    adaptors combine them via scattering coefficients.
//! 2. **root solve** — the nonlinear root resolves its implicit equation
//!    and produces a reflected wave back down.
//! 3. **scatter_down** — top-down: adaptors distribute incident waves to
//!    children.
//! 4. **state update** — reactive elements latch their incident wave as
//!    state for the next sample.
//!
//! Tree shape is fixed at construction; only element values change at run
//! time. Zero allocation on the hot path.

mod adaptors;
mod diode;
mod leaves;
mod omega;
mod rtype;

pub use adaptors::{ParallelAdaptor, SeriesAdaptor};
pub use diode::{diode_model, DiodeModel, DiodePair};
pub use leaves::{
    CapacitiveVoltageSource, Capacitor, Inductor, Resistor, ResistiveVoltageSource, VoltageSource,
};
pub use omega::{omega1, omega3, OmegaOrder};
pub use rtype::{OpAmpModel, OpAmpRtypeAdaptor};

/// Smallest admissible port resistance (Ω).
///
/// Scattering coefficients divide by port resistances; a zero or negative
/// value is a configuration error. Debug builds assert, release builds
/// clamp to this floor and keep running.
pub const MIN_PORT_RESISTANCE: f64 = 1e-9;

/// Validate a port resistance, clamping to [`MIN_PORT_RESISTANCE`].
#[inline]
pub(crate) fn checked_port_resistance(rp: f64) -> f64 {
    debug_assert!(
        rp.is_finite() && rp > 0.0,
        "port resistance must be positive and finite, got {rp}"
    );
    if rp.is_finite() && rp > MIN_PORT_RESISTANCE {
        rp
    } else {
        MIN_PORT_RESISTANCE
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One-port WDF leaf element (resistor, capacitor, inductor, sources).
///
/// Leaf elements sit at the ends of the tree and interact with the wave
/// domain through incident (`a`) and reflected (`b`) waves.
pub trait WdfLeaf {
    /// Port resistance seen looking into this element (Ω).
    fn port_resistance(&self) -> f64;

    /// Produce the reflected wave given the current state.
    fn reflected(&self) -> f64;

    /// Accept the incident wave after the scatter_down phase.
    ///
    /// Reactive elements (C, L) latch this value as state for next sample.
    fn set_incident(&mut self, a: f64);

    /// Update sample rate (for reactive elements C, L).
    fn set_sample_rate(&mut self, _sample_rate: f64) {}

    /// Reset internal state to zero.
    fn reset(&mut self) {}
}

/// Nonlinear root element that terminates the WDF tree.
///
/// The root resolves `b = a - 2*Rp*i(v)` with `v = (a+b)/2`. Implementations
/// must run in bounded, deterministic time per sample.
pub trait WdfRoot {
    /// Solve for the reflected wave given incident wave `a` and port
    /// resistance `rp`.
    fn process(&mut self, incident: f64, port_resistance: f64) -> f64;
}
