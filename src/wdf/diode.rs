//! Antiparallel diode pair root element.
//!
//! The pair of Shockley diodes at the tree root yields the implicit wave
//! equation
//!
//! `b = a + 2*sign(a) * (R*Is - nVt * w(ln(R*Is/nVt) + |a|/nVt + R*Is/nVt))`
//!
//! where `w` is the Wright Omega function and `R` the port resistance.
//! With the closed-form omega approximations this is a fixed-cost solve,
//! no Newton iteration on the audio path.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::omega::OmegaOrder;
use super::{checked_port_resistance, WdfRoot};

// ---------------------------------------------------------------------------
// Diode models
// ---------------------------------------------------------------------------

/// Diode model parameters derived from the Shockley equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeModel {
    /// Saturation current (A).
    pub is: f64,
    /// Thermal voltage * ideality factor (V). Vt ~ 25.85 mV at 20 C.
    pub n_vt: f64,
}

impl DiodeModel {
    /// Generic silicon diode — averaged 1N914/1N4148 parameters.
    pub fn silicon() -> Self {
        // 1N4148 datasheet: Is ~ 2.52nA, n ~ 1.752 (fitted to Vf=0.62V @ 1mA)
        Self {
            is: 2.52e-9,
            n_vt: 1.752 * 25.85e-3,
        }
    }

    /// Generic germanium diode — averaged OA-series / 1N34A parameters.
    /// Lower forward voltage for earlier, softer clipping onset.
    pub fn germanium() -> Self {
        Self {
            is: 1e-6,
            n_vt: 1.3 * 25.85e-3,
        }
    }

    /// Generic red LED — higher forward voltage (~1.7V) for more headroom.
    pub fn led() -> Self {
        Self {
            is: 4.5e-17,
            n_vt: 2.0 * 25.85e-3,
        }
    }
}

/// Process-wide diode model table, addressable by name.
static DIODE_MODELS: LazyLock<HashMap<&'static str, DiodeModel>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("silicon", DiodeModel::silicon());
    m.insert("germanium", DiodeModel::germanium());
    m.insert("led", DiodeModel::led());
    m
});

/// Look up a diode model preset by name.
pub fn diode_model(name: &str) -> Option<DiodeModel> {
    DIODE_MODELS.get(name).copied()
}

// ---------------------------------------------------------------------------
// Diode pair root
// ---------------------------------------------------------------------------

/// Antiparallel diode pair at the tree root.
///
/// `n_diodes` stacks diodes in series per direction, scaling the effective
/// thermal voltage. Derived constants depend on the port resistance as
/// well, so they are re-derived whenever either the model or the incoming
/// impedance changes.
#[derive(Debug, Clone, Copy)]
pub struct DiodePair {
    model: DiodeModel,
    n_diodes: f64,
    order: OmegaOrder,
    // Derived constants, valid for `port_resistance`.
    port_resistance: f64,
    nvt: f64,
    r_is: f64,
    r_is_over_nvt: f64,
    log_r_is_over_nvt: f64,
}

impl DiodePair {
    pub fn new(model: DiodeModel, n_diodes: f64, order: OmegaOrder) -> Self {
        let mut pair = Self {
            model,
            n_diodes: n_diodes.max(1.0),
            order,
            port_resistance: 0.0,
            nvt: 0.0,
            r_is: 0.0,
            r_is_over_nvt: 0.0,
            log_r_is_over_nvt: 0.0,
        };
        pair.derive_constants(1.0);
        pair
    }

    pub fn model(&self) -> DiodeModel {
        self.model
    }

    pub fn set_model(&mut self, model: DiodeModel) {
        self.model = model;
        self.derive_constants(self.port_resistance);
    }

    /// Set saturation current (A).
    pub fn set_saturation_current(&mut self, is: f64) {
        self.model.is = is.clamp(1e-18, 1e-3);
        self.derive_constants(self.port_resistance);
    }

    /// Set thermal voltage * ideality per diode (V).
    pub fn set_thermal_voltage(&mut self, n_vt: f64) {
        self.model.n_vt = n_vt.clamp(1e-3, 0.2);
        self.derive_constants(self.port_resistance);
    }

    /// Set number of series diodes per direction.
    pub fn set_diode_count(&mut self, n: f64) {
        self.n_diodes = n.clamp(1.0, 4.0);
        self.derive_constants(self.port_resistance);
    }

    fn derive_constants(&mut self, port_resistance: f64) {
        let rp = checked_port_resistance(port_resistance.max(super::MIN_PORT_RESISTANCE));
        self.port_resistance = rp;
        self.nvt = self.n_diodes * self.model.n_vt;
        self.r_is = rp * self.model.is;
        self.r_is_over_nvt = self.r_is / self.nvt;
        self.log_r_is_over_nvt = self.r_is_over_nvt.ln();
    }
}

impl WdfRoot for DiodePair {
    #[inline]
    fn process(&mut self, a: f64, rp: f64) -> f64 {
        if rp != self.port_resistance {
            self.derive_constants(rp);
        }

        let lambda = if a < 0.0 { -1.0 } else { 1.0 };
        let x = self.log_r_is_over_nvt + lambda * a / self.nvt + self.r_is_over_nvt;
        let b = a + 2.0 * lambda * (self.r_is - self.nvt * self.order.eval(x));

        // The closed form cannot overflow for finite input, but a poisoned
        // upstream wave must not propagate back into the tree.
        if b.is_finite() {
            b
        } else {
            0.0
        }
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
    fn model_table_has_all_presets() {
        assert!(diode_model("silicon").is_some());
        assert!(diode_model("germanium").is_some());
        assert!(diode_model("led").is_some());
        assert!(diode_model("unobtainium").is_none());
    }

    #[test]
    fn zero_incident_reflects_near_zero() {
        // The exact solution gives b = 0 for a = 0. The omega3 left-branch
        // clamp leaves a residual of 2*Rp*Is, on the order of 1e-5 here,
        // which the DC blocker downstream absorbs.
        let mut d = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        let b = d.process(0.0, 2200.0);
        assert!(b.abs() < 1e-4, "silence must reflect near-silence, got {b}");
    }

    #[test]
    fn large_incident_clips_to_log_voltage() {
        let mut d = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        let rp = 2200.0;
        for &a in &[5.0, 20.0, 100.0] {
            let b = d.process(a, rp);
            let v = (a + b) / 2.0;
            // Forward voltage of a driven silicon diode: a few hundred mV,
            // growing only logarithmically with drive.
            assert!(v > 0.3 && v < 1.2, "a = {a}: clipped voltage {v}");
        }
    }

    #[test]
    fn reflection_is_odd_symmetric() {
        let mut d = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        let rp = 4700.0;
        for &a in &[0.05, 0.5, 3.0, 42.0] {
            let b_pos = d.process(a, rp);
            let b_neg = d.process(-a, rp);
            assert_relative_eq!(b_pos, -b_neg, epsilon = 1e-12);
        }
    }

    #[test]
    fn germanium_clips_earlier_than_silicon() {
        let rp = 2200.0;
        let a = 10.0;
        let mut si = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        let mut ge = DiodePair::new(DiodeModel::germanium(), 1.0, OmegaOrder::Order3);
        let v_si = (a + si.process(a, rp)) / 2.0;
        let v_ge = (a + ge.process(a, rp)) / 2.0;
        assert!(
            v_ge < v_si,
            "germanium forward voltage ({v_ge}) should sit below silicon ({v_si})"
        );
    }

    #[test]
    fn stacked_diodes_raise_clipping_threshold() {
        let rp = 2200.0;
        let a = 10.0;
        let mut single = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        let mut double = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        double.set_diode_count(2.0);
        let v1 = (a + single.process(a, rp)) / 2.0;
        let v2 = (a + double.process(a, rp)) / 2.0;
        assert!(
            v2 > 1.5 * v1,
            "two series diodes should roughly double the knee: {v1} vs {v2}"
        );
    }

    #[test]
    fn constants_follow_port_resistance_changes() {
        let mut d = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        let b_low = d.process(1.0, 100.0);
        let b_high = d.process(1.0, 100_000.0);
        // A stiffer source (higher Rp) drives the diode less current, so the
        // reflected wave differs; constants must have been re-derived.
        assert!((b_low - b_high).abs() > 1e-6);
    }

    #[test]
    fn parameter_setters_clamp_their_ranges() {
        let mut d = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order3);
        d.set_saturation_current(-1.0);
        assert!(d.model().is >= 1e-18);
        d.set_thermal_voltage(10.0);
        assert!(d.model().n_vt <= 0.2);
        d.set_diode_count(0.0);
        let b = d.process(0.5, 2200.0);
        assert!(b.is_finite());
    }

    #[test]
    fn order1_stays_bounded() {
        let mut d = DiodePair::new(DiodeModel::silicon(), 1.0, OmegaOrder::Order1);
        for i in 0..1000 {
            let a = 50.0 * (i as f64 * 0.1).sin();
            let b = d.process(a, 2200.0);
            assert!(b.is_finite());
            let v = (a + b) / 2.0;
            assert!(v.abs() < 2.0, "clipped voltage out of range: {v}");
        }
    }
}
