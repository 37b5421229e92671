//! R-type adaptor for the non-inverting op-amp junction.
//!
//! A feedback op-amp stage is not decomposable into series/parallel
//! adaptors, so the three-way junction around the amplifier is handled as
//! a single R-type scattering node:
//!
//! ```text
//!          port 3 (adapted, to the output loop)
//!                      |
//!              [op-amp junction]  <- vin via internal VCVS
//!               /            \
//!        port 1 (Zg)      port 2 (Zf)
//!   (inverting input      (feedback network,
//!    to ground)            inverting input to output)
//! ```
//!
//! The op-amp is a finite-gain VCVS `E = A*(vin - u1)` with series output
//! resistance `Ro`. Writing KCL at the inverting input and the output
//! node in wave variables (port 2 oriented from input node to output
//! node) and eliminating the node voltages gives closed-form scattering:
//!
//! ```text
//! k  = 1 + R1/R2
//! R3 = k / (1/R2 + (A*R1/R2 + k)/Ro)        adapted port resistance
//! p1 = (R3/k) * ((A+1)/Ro + 1/R3)
//! p2 = (R3/k) * (1/Ro + 1/R3)
//! q  = (R3/k) * (A/Ro)
//!
//! e2_up = q*vin - p1*a1 - p2*a2             (feedback branch drive)
//! b3 = 2*(a1 + a2) + k*e2_up                scatter_up
//! e2 = e2_up + a3/k
//! b1 = a1 + (R1/R2)*e2                      scatter_down
//! b2 = a2 + e2
//! ```
//!
//! Limits anchor the derivation: with A = 0 the junction degrades to the
//! passive network `(R1 + R2) || Ro`, and for large A the Thevenin wave
//! at port 3 approaches `(1 + R2/R1) * vin` with R3 matching the
//! closed-loop output impedance.
//!
//! Coefficients are cached and re-derived lazily: any child resistance
//! change marks them dirty, and they are validated before the next wave
//! computation, so the matrix in use is always consistent with current
//! component values.

use super::checked_port_resistance;

/// Fixed op-amp model constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpAmpModel {
    /// Open-loop voltage gain A.
    pub gain: f64,
    /// Output resistance Ro (Ω).
    pub output_resistance: f64,
}

impl OpAmpModel {
    /// LM308-class op-amp, as found in RAT-style drive circuits.
    pub fn lm308() -> Self {
        Self {
            gain: 2.0e5,
            output_resistance: 75.0,
        }
    }
}

/// 3-port R-type adaptor around a finite-gain op-amp.
#[derive(Debug, Clone, Copy)]
pub struct OpAmpRtypeAdaptor {
    model: OpAmpModel,
    // Child port resistances.
    r1: f64,
    r2: f64,
    // Derived scattering coefficients, valid when `dirty` is false.
    port_resistance: f64,
    k: f64,
    inv_k: f64,
    r1_over_r2: f64,
    p1: f64,
    p2: f64,
    q: f64,
    dirty: bool,
    // Per-sample state.
    vin: f64,
    a1: f64,
    a2: f64,
    e2_up: f64,
}

impl OpAmpRtypeAdaptor {
    /// Create the junction for child port resistances `r1` (Zg) and `r2` (Zf).
    pub fn new(model: OpAmpModel, r1: f64, r2: f64) -> Self {
        let mut adaptor = Self {
            model,
            r1: checked_port_resistance(r1),
            r2: checked_port_resistance(r2),
            port_resistance: 0.0,
            k: 0.0,
            inv_k: 0.0,
            r1_over_r2: 0.0,
            p1: 0.0,
            p2: 0.0,
            q: 0.0,
            dirty: true,
            vin: 0.0,
            a1: 0.0,
            a2: 0.0,
            e2_up: 0.0,
        };
        adaptor.derive_coefficients();
        adaptor
    }

    /// Mark the scattering coefficients stale after a child resistance
    /// change. Re-derivation happens lazily before the next use.
    pub fn set_port_resistances(&mut self, r1: f64, r2: f64) {
        self.r1 = checked_port_resistance(r1);
        self.r2 = checked_port_resistance(r2);
        self.dirty = true;
    }

    /// Inject the input voltage for the current sample.
    #[inline]
    pub fn set_voltage(&mut self, v: f64) {
        self.vin = v;
    }

    /// Adapted (reflection-free) port resistance, re-derived if stale.
    pub fn port_resistance(&mut self) -> f64 {
        if self.dirty {
            self.derive_coefficients();
        }
        self.port_resistance
    }

    fn derive_coefficients(&mut self) {
        let a = self.model.gain;
        let ro = self.model.output_resistance;
        let k = 1.0 + self.r1 / self.r2;
        let r3 = checked_port_resistance(k / (1.0 / self.r2 + (a * self.r1 / self.r2 + k) / ro));
        let r3_over_k = r3 / k;

        self.k = k;
        self.inv_k = 1.0 / k;
        self.r1_over_r2 = self.r1 / self.r2;
        self.port_resistance = r3;
        self.p1 = r3_over_k * ((a + 1.0) / ro + 1.0 / r3);
        self.p2 = r3_over_k * (1.0 / ro + 1.0 / r3);
        self.q = r3_over_k * (a / ro);
        self.dirty = false;
    }

    /// Bottom-up: accept the child reflected waves, produce the wave
    /// toward the parent.
    #[inline]
    pub fn scatter_up(&mut self, a1: f64, a2: f64) -> f64 {
        if self.dirty {
            self.derive_coefficients();
        }
        self.a1 = a1;
        self.a2 = a2;
        self.e2_up = self.q * self.vin - self.p1 * a1 - self.p2 * a2;
        2.0 * (a1 + a2) + self.k * self.e2_up
    }

    /// Top-down: accept the parent incident wave, produce the child
    /// incident waves `(b1, b2)`.
    #[inline]
    pub fn scatter_down(&self, a3: f64) -> (f64, f64) {
        let e2 = self.e2_up + a3 * self.inv_k;
        let b1 = self.a1 + self.r1_over_r2 * e2;
        let b2 = self.a2 + e2;
        (b1, b2)
    }

    /// Full 3x3 scattering matrix (row-major, vin held at zero), for
    /// verification against a fresh derivation.
    pub fn scattering_matrix(&mut self) -> [[f64; 3]; 3] {
        if self.dirty {
            self.derive_coefficients();
        }
        let g = self.r1_over_r2;
        [
            [1.0 - g * self.p1, -g * self.p2, g * self.inv_k],
            [-self.p1, 1.0 - self.p2, self.inv_k],
            [2.0 - self.k * self.p1, 2.0 - self.k * self.p2, 0.0],
        ]
    }

    /// Clear cached waves and the input sample.
    pub fn reset(&mut self) {
        self.vin = 0.0;
        self.a1 = 0.0;
        self.a2 = 0.0;
        self.e2_up = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn passive_limit_with_dead_op_amp() {
        // A = 0: the junction is just R1 + R2 in parallel with Ro.
        let model = OpAmpModel {
            gain: 0.0,
            output_resistance: 500.0,
        };
        let mut j = OpAmpRtypeAdaptor::new(model, 470.0, 2200.0);
        let expected = (470.0 + 2200.0) * 500.0 / (470.0 + 2200.0 + 500.0);
        assert_relative_eq!(j.port_resistance(), expected, max_relative = 1e-12);
    }

    #[test]
    fn passive_limit_without_output_load() {
        // A = 0 and Ro huge: plain series junction resistance.
        let model = OpAmpModel {
            gain: 0.0,
            output_resistance: 1e12,
        };
        let mut j = OpAmpRtypeAdaptor::new(model, 470.0, 2200.0);
        assert_relative_eq!(j.port_resistance(), 2670.0, max_relative = 1e-6);
    }

    #[test]
    fn ideal_limit_recovers_noninverting_gain() {
        // Large open-loop gain: the Thevenin wave at the adapted port is
        // (1 + R2/R1) * vin.
        let model = OpAmpModel {
            gain: 1.0e7,
            output_resistance: 1.0,
        };
        let mut j = OpAmpRtypeAdaptor::new(model, 1000.0, 9000.0);
        j.set_voltage(0.1);
        let b3 = j.scatter_up(0.0, 0.0);
        assert_relative_eq!(b3 / 0.1, 10.0, max_relative = 1e-3);
    }

    #[test]
    fn matches_direct_nodal_analysis() {
        // Independent check: solve the amplifier circuit with nodal
        // analysis at finite gain, matched resistive load RL = R3, and
        // resistor children (which reflect nothing).
        let r1 = 470.0;
        let r2 = 22_000.0;
        let model = OpAmpModel {
            gain: 2.0e5,
            output_resistance: 75.0,
        };
        let vin = 0.1;

        let mut j = OpAmpRtypeAdaptor::new(model, r1, r2);
        let r3 = j.port_resistance();

        // u1 = uo * f with f = R1/(R1+R2); KCL at the output node:
        // (uo-u1)/R2 + uo/RL + (uo - A*(vin-u1))/Ro = 0
        let f = r1 / (r1 + r2);
        let uo = model.gain * vin / model.output_resistance
            / ((1.0 - f) / r2 + 1.0 / r3 + (1.0 + model.gain * f) / model.output_resistance);
        let u1 = f * uo;

        j.set_voltage(vin);
        let b3 = j.scatter_up(0.0, 0.0);
        let (b1, b2) = j.scatter_down(0.0);

        // Matched load: v3 = b3/2; children are matched resistors, so
        // v1 = b1/2 and v2 = b2/2.
        assert_relative_eq!(b3 / 2.0, uo, max_relative = 1e-9);
        assert_relative_eq!(b1 / 2.0, u1, max_relative = 1e-9);
        assert_relative_eq!(b2 / 2.0, uo - u1, max_relative = 1e-9);
    }

    #[test]
    fn adapted_port_is_reflection_free() {
        let mut j = OpAmpRtypeAdaptor::new(OpAmpModel::lm308(), 47.0, 51_000.0);
        let s = j.scattering_matrix();
        assert_eq!(s[2][2], 0.0);
    }

    #[test]
    fn matrix_consistent_after_resistance_change() {
        // Changing a child resistance must re-derive the matrix so it
        // matches a freshly constructed junction with the same values.
        let model = OpAmpModel::lm308();
        let mut j = OpAmpRtypeAdaptor::new(model, 47.0, 51_000.0);
        let _ = j.scattering_matrix();

        j.set_port_resistances(470.0, 220_000.0);
        let changed = j.scattering_matrix();

        let mut fresh = OpAmpRtypeAdaptor::new(model, 470.0, 220_000.0);
        let expected = fresh.scattering_matrix();

        for (row_c, row_e) in changed.iter().zip(expected.iter()) {
            for (c, e) in row_c.iter().zip(row_e.iter()) {
                assert!(
                    (c - e).abs() <= 1e-5 * e.abs().max(1.0),
                    "matrix entry diverged: {c} vs {e}"
                );
            }
        }
        assert_relative_eq!(
            j.port_resistance(),
            fresh.port_resistance(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn stale_coefficients_never_reach_the_waves() {
        // scatter_up must see the new resistances even when nothing
        // queried port_resistance() in between.
        let model = OpAmpModel::lm308();
        let mut j = OpAmpRtypeAdaptor::new(model, 47.0, 1500.0);
        j.set_voltage(0.2);
        let before = j.scatter_up(0.0, 0.0);

        j.set_port_resistances(47.0, 561_500.0);
        j.set_voltage(0.2);
        let after = j.scatter_up(0.0, 0.0);

        let mut fresh = OpAmpRtypeAdaptor::new(model, 47.0, 561_500.0);
        fresh.set_voltage(0.2);
        let expected = fresh.scatter_up(0.0, 0.0);

        assert_relative_eq!(after, expected, max_relative = 1e-12);
        assert!((after - before).abs() > 1.0, "gain change must be audible");
    }

    #[test]
    fn silence_in_silence_out() {
        let mut j = OpAmpRtypeAdaptor::new(OpAmpModel::lm308(), 47.0, 51_000.0);
        j.set_voltage(0.0);
        assert_eq!(j.scatter_up(0.0, 0.0), 0.0);
        let (b1, b2) = j.scatter_down(0.0);
        assert_eq!(b1, 0.0);
        assert_eq!(b2, 0.0);
    }
}
