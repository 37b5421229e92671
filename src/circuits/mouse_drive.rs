//! RAT-style op-amp drive circuit.
//!
//! Tree topology:
//!
//! ```text
//!                [DiodePair root]
//!                       |
//!                 SeriesAdaptor  (output loop)
//!                  /         \
//!      OpAmpRtypeAdaptor   Resistor 1k5
//!         /         \
//!       Zg           Zf
//!   Parallel      Parallel
//!    /     \       /     \
//! Series  Series  Rdist  100pF
//!  47R     560R
//! 2.2uF   4.7uF
//! ```
//!
//! The input drives the op-amp junction's internal source; the distortion
//! pot is the feedback resistance (1k5 fully counter-clockwise up to
//! 561k5), so the stage gain runs into the thousands and the output diode
//! pair clips hard. The output is tapped at the diode voltage.

use super::CircuitModel;
use crate::quantity::CircuitQuantityList;
use crate::wdf::{
    Capacitor, DiodeModel, DiodePair, OmegaOrder, OpAmpModel, OpAmpRtypeAdaptor, ParallelAdaptor,
    Resistor, SeriesAdaptor, WdfLeaf, WdfRoot,
};

const LEG1_RESISTANCE: f64 = 47.0;
const LEG1_CAPACITANCE: f64 = 2.2e-6;
const LEG2_RESISTANCE: f64 = 560.0;
const LEG2_CAPACITANCE: f64 = 4.7e-6;
const FEEDBACK_CAPACITANCE: f64 = 100e-12;
const OUTPUT_RESISTANCE: f64 = 1500.0;
const DISTORTION_MIN: f64 = 1500.0;
const DISTORTION_SPAN: f64 = 560_000.0;
const DISTORTION_DEFAULT: f64 = 101_500.0;

/// Quantity list indices.
pub const Q_DISTORTION: usize = 0;
pub const Q_FEEDBACK_CAP: usize = 1;
pub const Q_OUTPUT_RESISTOR: usize = 2;

pub struct MouseDrive {
    sample_rate: f64,
    // Ground-leg network Zg: two series-RC legs in parallel.
    leg1_r: Resistor,
    leg1_c: Capacitor,
    leg1: SeriesAdaptor,
    leg2_r: Resistor,
    leg2_c: Capacitor,
    leg2: SeriesAdaptor,
    zg: ParallelAdaptor,
    // Feedback network Zf: distortion pot parallel compensation cap.
    dist_r: Resistor,
    fb_c: Capacitor,
    zf: ParallelAdaptor,
    // Junction and output loop.
    opamp: OpAmpRtypeAdaptor,
    out_r: Resistor,
    out_ser: SeriesAdaptor,
    diode: DiodePair,
}

impl MouseDrive {
    pub fn new(sample_rate: f64) -> Self {
        let leg1_r = Resistor::new(LEG1_RESISTANCE);
        let leg1_c = Capacitor::new(LEG1_CAPACITANCE, sample_rate);
        let leg2_r = Resistor::new(LEG2_RESISTANCE);
        let leg2_c = Capacitor::new(LEG2_CAPACITANCE, sample_rate);
        let dist_r = Resistor::new(DISTORTION_DEFAULT);
        let fb_c = Capacitor::new(FEEDBACK_CAPACITANCE, sample_rate);
        let out_r = Resistor::new(OUTPUT_RESISTANCE);

        let leg1 = SeriesAdaptor::new(leg1_r.port_resistance(), leg1_c.port_resistance());
        let leg2 = SeriesAdaptor::new(leg2_r.port_resistance(), leg2_c.port_resistance());
        let zg = ParallelAdaptor::new(leg1.port_resistance, leg2.port_resistance);
        let zf = ParallelAdaptor::new(dist_r.port_resistance(), fb_c.port_resistance());
        let mut opamp =
            OpAmpRtypeAdaptor::new(OpAmpModel::lm308(), zg.port_resistance, zf.port_resistance);
        let out_ser = SeriesAdaptor::new(opamp.port_resistance(), out_r.port_resistance());
        let diode = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);

        Self {
            sample_rate,
            leg1_r,
            leg1_c,
            leg1,
            leg2_r,
            leg2_c,
            leg2,
            zg,
            dist_r,
            fb_c,
            zf,
            opamp,
            out_r,
            out_ser,
            diode,
        }
    }

    /// Tunable components, in `Q_*` index order.
    pub fn quantities() -> CircuitQuantityList {
        let mut list = CircuitQuantityList::new();
        list.add_resistor(
            DISTORTION_DEFAULT,
            "distortion",
            DISTORTION_MIN,
            DISTORTION_MIN + DISTORTION_SPAN,
        );
        list.add_capacitor(FEEDBACK_CAPACITANCE, "feedback cap", 10e-12, 1e-9);
        list.add_resistor(OUTPUT_RESISTANCE, "output resistor", 100.0, 10_000.0);
        list
    }

    /// Set the distortion pot resistance (Ω) in place, preserving
    /// capacitor charge.
    pub fn set_distortion_resistance(&mut self, resistance: f64) {
        self.dist_r
            .set_resistance(resistance.clamp(DISTORTION_MIN, DISTORTION_MIN + DISTORTION_SPAN));
        self.refresh_ports();
    }

    /// Re-derive every adaptor from current leaf values.
    fn refresh_ports(&mut self) {
        self.leg1
            .update_ports(self.leg1_r.port_resistance(), self.leg1_c.port_resistance());
        self.leg2
            .update_ports(self.leg2_r.port_resistance(), self.leg2_c.port_resistance());
        self.zg
            .update_ports(self.leg1.port_resistance, self.leg2.port_resistance);
        self.zf
            .update_ports(self.dist_r.port_resistance(), self.fb_c.port_resistance());
        self.opamp
            .set_port_resistances(self.zg.port_resistance, self.zf.port_resistance);
        let r3 = self.opamp.port_resistance();
        self.out_ser.update_ports(r3, self.out_r.port_resistance());
    }
}

impl CircuitModel for MouseDrive {
    fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.leg1_c.set_sample_rate(sample_rate);
        self.leg2_c.set_sample_rate(sample_rate);
        self.fb_c.set_sample_rate(sample_rate);
        self.refresh_ports();
        self.reset();
    }

    fn reset(&mut self) {
        self.leg1_c.reset();
        self.leg2_c.reset();
        self.fb_c.reset();
        self.leg1.reset();
        self.leg2.reset();
        self.zg.reset();
        self.zf.reset();
        self.opamp.reset();
        self.out_ser.reset();
    }

    #[inline]
    fn process_sample(&mut self, input: f64) -> f64 {
        self.opamp.set_voltage(input);

        // --- Phase 1: scatter_up (leaves -> root) ---
        let b_leg1 = self
            .leg1
            .scatter_up(self.leg1_r.reflected(), self.leg1_c.reflected());
        let b_leg2 = self
            .leg2
            .scatter_up(self.leg2_r.reflected(), self.leg2_c.reflected());
        let b_zg = self.zg.scatter_up(b_leg1, b_leg2);
        let b_zf = self
            .zf
            .scatter_up(self.dist_r.reflected(), self.fb_c.reflected());
        let b_op = self.opamp.scatter_up(b_zg, b_zf);
        let b_root = self.out_ser.scatter_up(b_op, self.out_r.reflected());

        // --- Phase 2: root solve ---
        let a_root = self.diode.process(b_root, self.out_ser.port_resistance);

        // --- Phase 3: scatter_down (root -> leaves) ---
        let (a_op, a_out_r) = self.out_ser.scatter_down(a_root);
        let (a_zg, a_zf) = self.opamp.scatter_down(a_op);
        let (a_leg1, a_leg2) = self.zg.scatter_down(a_zg);
        let (a_l1r, a_l1c) = self.leg1.scatter_down(a_leg1);
        let (a_l2r, a_l2c) = self.leg2.scatter_down(a_leg2);
        let (a_dr, a_fc) = self.zf.scatter_down(a_zf);

        // --- Phase 4: state update ---
        self.out_r.set_incident(a_out_r);
        self.leg1_r.set_incident(a_l1r);
        self.leg1_c.set_incident(a_l1c);
        self.leg2_r.set_incident(a_l2r);
        self.leg2_c.set_incident(a_l2c);
        self.dist_r.set_incident(a_dr);
        self.fb_c.set_incident(a_fc);

        // Output is the clipped voltage across the diode pair.
        (a_root + b_root) / 2.0
    }

    fn set_drive(&mut self, amount: f64) {
        let d = amount.clamp(0.0, 1.0);
        self.set_distortion_resistance(DISTORTION_MIN + d * DISTORTION_SPAN);
    }

    fn set_quantity(&mut self, index: usize, value: f64) {
        match index {
            Q_DISTORTION => self.set_distortion_resistance(value),
            Q_FEEDBACK_CAP => {
                self.fb_c.set_capacitance(value, self.sample_rate);
                self.refresh_ports();
            }
            Q_OUTPUT_RESISTOR => {
                self.out_r.set_resistance(value);
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
