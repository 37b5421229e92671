//! Complete WDF circuit models.
//!
//! Each model is a static tree composed at construction; the per-sample
//! `process_sample` spells out the four scattering phases explicitly, and
//! knob changes retune leaf values in place so capacitor charge survives
//! (no click when the tree would otherwise be rebuilt).

mod mouse_drive;
mod tube_screamer;

pub use mouse_drive::MouseDrive;
pub use tube_screamer::TubeScreamer;

use crate::quantity::CircuitQuantityList;

/// A drive circuit emulation usable by the processing chain.
///
/// One instance per channel; a stereo pair shares a single quantity list
/// and receives identical values on both instances.
pub trait CircuitModel: Send {
    /// Re-derive sample-rate dependent ports and clear state.
    fn prepare(&mut self, sample_rate: f64);

    /// Clear wave and charge state without touching parameters.
    fn reset(&mut self);

    /// Run one input sample through the tree.
    fn process_sample(&mut self, input: f64) -> f64;

    /// Normalized drive amount in `[0, 1]`, mapped onto the drive pot.
    fn set_drive(&mut self, amount: f64);

    /// Apply a tunable component value by its index in the circuit's
    /// quantity list. Unknown indices are ignored.
    fn set_quantity(&mut self, index: usize, value: f64);

    /// Clipper diode saturation current (A).
    fn set_saturation_current(&mut self, is: f64);

    /// Clipper diode thermal voltage * ideality (V).
    fn set_thermal_voltage(&mut self, n_vt: f64);

    /// Series diodes per clipping direction.
    fn set_diode_count(&mut self, n: f64);
}

/// Selects which circuit a chain instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitKind {
    /// RAT-style op-amp drive with output diode clamp.
    #[default]
    MouseDrive,
    /// Clean-plus-clipped feedback screamer.
    TubeScreamer,
}

impl CircuitKind {
    /// Build one channel instance. Allocation happens here, off the audio
    /// thread.
    pub fn build(self, sample_rate: f64) -> Box<dyn CircuitModel> {
        match self {
            CircuitKind::MouseDrive => Box::new(MouseDrive::new(sample_rate)),
            CircuitKind::TubeScreamer => Box::new(TubeScreamer::new(sample_rate)),
        }
    }

    /// The circuit's tunable component registry. Indices line up with
    /// [`CircuitModel::set_quantity`].
    pub fn quantities(self) -> CircuitQuantityList {
        match self {
            CircuitKind::MouseDrive => MouseDrive::quantities(),
            CircuitKind::TubeScreamer => TubeScreamer::quantities(),
        }
    }
}
