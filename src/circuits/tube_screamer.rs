//! Screamer-style clean-plus-clipped drive circuit.
//!
//! The op-amp holds its inverting input at the incoming voltage, so the
//! current through the input leg (4.7k + 47nF to ground) is forced to
//! `vin / Zin` regardless of what the feedback network does. That same
//! current flows through the feedback network (drive pot, compensation
//! cap, and the clipping diodes, all between the inverting input and the
//! output), and the output is the clean input plus the voltage the
//! current develops across it.
//!
//! Two small trees per sample:
//!
//! ```text
//!  input loop (virtual ground)        feedback network
//!                                     [DiodePair root]
//!   [summing-node short]                     |
//!           |                         ParallelAdaptor
//!     SeriesAdaptor                    /           \
//!      /         \              i*Rdrive          51pF
//!  CapSource   Resistor         behind Rdrive
//!  (47nF,vin)    4.7k          (Thevenin source)
//! ```
//!
//! The input loop closes into a short (the summing node sits at the same
//! potential as the source reference), which yields the forced current.
//! Pushing that current through the drive pot and taking its Thevenin
//! equivalent turns the feedback network into an ordinary WDF tree with
//! the diode pair at the root.

use super::CircuitModel;
use crate::quantity::CircuitQuantityList;
use crate::wdf::{
    CapacitiveVoltageSource, Capacitor, DiodeModel, DiodePair, OmegaOrder, ParallelAdaptor,
    Resistor, ResistiveVoltageSource, SeriesAdaptor, WdfLeaf, WdfRoot,
};

const INPUT_RESISTANCE: f64 = 4700.0;
const INPUT_CAPACITANCE: f64 = 47e-9;
const FEEDBACK_CAPACITANCE: f64 = 51e-12;
const DRIVE_MIN: f64 = 51_000.0;
const DRIVE_SPAN: f64 = 500_000.0;
const DRIVE_DEFAULT: f64 = 151_000.0;

/// Quantity list indices.
pub const Q_DRIVE: usize = 0;
pub const Q_FEEDBACK_CAP: usize = 1;
pub const Q_INPUT_RESISTOR: usize = 2;

pub struct TubeScreamer {
    sample_rate: f64,
    // Input leg, solved against the virtual ground.
    input_vs: CapacitiveVoltageSource,
    in_r: Resistor,
    input: SeriesAdaptor,
    // Feedback network driven by the forced current.
    drive_resistance: f64,
    drive_vs: ResistiveVoltageSource,
    fb_c: Capacitor,
    zf: ParallelAdaptor,
    diode: DiodePair,
}

impl TubeScreamer {
    pub fn new(sample_rate: f64) -> Self {
        let input_vs = CapacitiveVoltageSource::new(INPUT_CAPACITANCE, sample_rate);
        let in_r = Resistor::new(INPUT_RESISTANCE);
        let drive_vs = ResistiveVoltageSource::new(DRIVE_DEFAULT);
        let fb_c = Capacitor::new(FEEDBACK_CAPACITANCE, sample_rate);

        let input = SeriesAdaptor::new(input_vs.port_resistance(), in_r.port_resistance());
        let zf = ParallelAdaptor::new(drive_vs.port_resistance(), fb_c.port_resistance());
        // TS808 clipping: two silicon diodes back to back.
        let diode = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);

        Self {
            sample_rate,
            input_vs,
            in_r,
            input,
            drive_resistance: DRIVE_DEFAULT,
            drive_vs,
            fb_c,
            zf,
            diode,
        }
    }

    /// Tunable components, in `Q_*` index order.
    pub fn quantities() -> CircuitQuantityList {
        let mut list = CircuitQuantityList::new();
        list.add_resistor(DRIVE_DEFAULT, "drive", DRIVE_MIN, DRIVE_MIN + DRIVE_SPAN);
        list.add_capacitor(FEEDBACK_CAPACITANCE, "feedback cap", 10e-12, 1e-9);
        list.add_resistor(INPUT_RESISTANCE, "input resistor", 470.0, 47_000.0);
        list
    }

    /// Swap the clipping diode model (silicon/germanium/LED presets).
    pub fn set_diode_model(&mut self, model: DiodeModel) {
        self.diode.set_model(model);
    }

    /// Set the drive pot resistance (Ω) in place.
    pub fn set_drive_resistance(&mut self, resistance: f64) {
        self.drive_resistance = resistance.clamp(DRIVE_MIN, DRIVE_MIN + DRIVE_SPAN);
        self.drive_vs.set_resistance(self.drive_resistance);
        self.refresh_ports();
    }

    fn refresh_ports(&mut self) {
        self.input
            .update_ports(self.input_vs.port_resistance(), self.in_r.port_resistance());
        self.zf
            .update_ports(self.drive_vs.port_resistance(), self.fb_c.port_resistance());
    }
}

impl CircuitModel for TubeScreamer {
    fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.input_vs.set_sample_rate(sample_rate);
        self.fb_c.set_sample_rate(sample_rate);
        self.refresh_ports();
        self.reset();
    }

    fn reset(&mut self) {
        self.input_vs.reset();
        self.fb_c.reset();
        self.input.reset();
        self.zf.reset();
    }

    #[inline]
    fn process_sample(&mut self, input: f64) -> f64 {
        // Input loop: source against the summing-node short. The loop
        // current is what the op-amp forces through the feedback network.
        self.input_vs.set_voltage(input);
        let b_in = self
            .input
            .scatter_up(self.input_vs.reflected(), self.in_r.reflected());
        let a_in = -b_in; // short: zero voltage at the summing node
        let (a_vs, a_ir) = self.input.scatter_down(a_in);
        self.input_vs.set_incident(a_vs);
        self.in_r.set_incident(a_ir);
        let feedback_current = -b_in / self.input.port_resistance;

        // Feedback network: Thevenin source i*Rdrive behind the pot,
        // compensation cap in parallel, diode pair at the root.
        self.drive_vs
            .set_voltage(feedback_current * self.drive_resistance);
        let b_top = self
            .zf
            .scatter_up(self.drive_vs.reflected(), self.fb_c.reflected());
        let a_root = self.diode.process(b_top, self.zf.port_resistance);
        let (a_dvs, a_fc) = self.zf.scatter_down(a_root);
        self.drive_vs.set_incident(a_dvs);
        self.fb_c.set_incident(a_fc);

        // Clean input plus the clipped feedback voltage.
        input + (a_root + b_top) / 2.0
    }

    fn set_drive(&mut self, amount: f64) {
        let d = amount.clamp(0.0, 1.0);
        self.set_drive_resistance(DRIVE_MIN + d * DRIVE_SPAN);
    }

    fn set_quantity(&mut self, index: usize, value: f64) {
        match index {
            Q_DRIVE => self.set_drive_resistance(value),
            Q_FEEDBACK_CAP => {
                self.fb_c.set_capacitance(value, self.sample_rate);
                self.refresh_ports();
            }
            Q_INPUT_RESISTOR => {
                self.in_r.set_resistance(value);
                self.refresh_ports();
            }
            _ => {}
        }
    }

    fn set_saturation_current(&mut self, is: f64) {
        self.diode.set_saturation_current(is);
    }

    fn set_thermal_voltage(&mut self, n_vt: f64) {
        self.diode.set_thermal_voltage(n_vt);
    }

    fn set_diode_count(&mut self, n: f64) {
        self.diode.set_diode_count(n);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
