//! Linear one-port WDF elements.
//!
//! Wave relations (bilinear discretization, matched port resistances):
//! - Resistor:                  `b = 0`,              `Rp = R`
//! - Capacitor:                 `b = z^-1 a`,         `Rp = 1/(2 fs C)`
//! - Inductor:                  `b = -z^-1 a`,        `Rp = 2 fs L`
//! - VoltageSource (ideal):     `b = 2 Vs - a`
//! - ResistiveVoltageSource:    `b = Vs`,             `Rp = Rs`
//! - CapacitiveVoltageSource:   `b[n] = a[n-1] + Vs[n] - Vs[n-1]`,
//!                              `Rp = 1/(2 fs C)`

use super::{checked_port_resistance, WdfLeaf};

// ---------------------------------------------------------------------------
// Resistor
// ---------------------------------------------------------------------------

/// Ideal resistor — absorbs everything, reflects nothing.
#[derive(Debug, Clone, Copy)]
pub struct Resistor {
    resistance: f64,
}

impl Resistor {
    pub fn new(resistance: f64) -> Self {
        Self {
            resistance: checked_port_resistance(resistance),
        }
    }

    /// Change the resistance in place. Adaptors above this element must be
    /// re-derived afterwards.
    pub fn set_resistance(&mut self, resistance: f64) {
        self.resistance = checked_port_resistance(resistance);
    }
}

impl WdfLeaf for Resistor {
    #[inline]
    fn port_resistance(&self) -> f64 {
        self.resistance
    }

    #[inline]
    fn reflected(&self) -> f64 {
        0.0
    }

    #[inline]
    fn set_incident(&mut self, _a: f64) {
        // No state.
    }
}

// ---------------------------------------------------------------------------
// Capacitor
// ---------------------------------------------------------------------------

/// Capacitor — energy-storage element.
///
/// The previous incident wave becomes the current reflected wave.
#[derive(Debug, Clone, Copy)]
pub struct Capacitor {
    capacitance: f64,
    resistance: f64,
    state: f64, // z^-1 of incident wave
}

impl Capacitor {
    pub fn new(capacitance: f64, sample_rate: f64) -> Self {
        Self {
            capacitance,
            resistance: checked_port_resistance(1.0 / (2.0 * sample_rate * capacitance)),
            state: 0.0,
        }
    }

    /// Change the capacitance in place without clearing charge state.
    pub fn set_capacitance(&mut self, capacitance: f64, sample_rate: f64) {
        self.capacitance = capacitance;
        self.resistance = checked_port_resistance(1.0 / (2.0 * sample_rate * capacitance));
    }

    pub fn capacitance(&self) -> f64 {
        self.capacitance
    }
}

impl WdfLeaf for Capacitor {
    #[inline]
    fn port_resistance(&self) -> f64 {
        self.resistance
    }

    #[inline]
    fn reflected(&self) -> f64 {
        self.state
    }

    #[inline]
    fn set_incident(&mut self, a: f64) {
        self.state = a;
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.resistance = checked_port_resistance(1.0 / (2.0 * sample_rate * self.capacitance));
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Inductor
// ---------------------------------------------------------------------------

/// Inductor — energy-storage element.
#[derive(Debug, Clone, Copy)]
pub struct Inductor {
    inductance: f64,
    resistance: f64,
    state: f64,
}

impl Inductor {
    pub fn new(inductance: f64, sample_rate: f64) -> Self {
        Self {
            inductance,
            resistance: checked_port_resistance(2.0 * sample_rate * inductance),
            state: 0.0,
        }
    }

    pub fn set_inductance(&mut self, inductance: f64, sample_rate: f64) {
        self.inductance = inductance;
        self.resistance = checked_port_resistance(2.0 * sample_rate * inductance);
    }
}

impl WdfLeaf for Inductor {
    #[inline]
    fn port_resistance(&self) -> f64 {
        self.resistance
    }

    #[inline]
    fn reflected(&self) -> f64 {
        -self.state
    }

    #[inline]
    fn set_incident(&mut self, a: f64) {
        self.state = a;
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.resistance = checked_port_resistance(2.0 * sample_rate * self.inductance);
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

// ---------------------------------------------------------------------------
// VoltageSource
// ---------------------------------------------------------------------------

/// Ideal voltage source with a small series port resistance.
///
/// `b = 2 Vs - a`, using the incident wave latched on the previous
/// scatter_down.
#[derive(Debug, Clone, Copy)]
pub struct VoltageSource {
    voltage: f64,
    resistance: f64,
    incident: f64,
}

impl VoltageSource {
    pub fn new(port_resistance: f64) -> Self {
        Self {
            voltage: 0.0,
            resistance: checked_port_resistance(port_resistance),
            incident: 0.0,
        }
    }

    #[inline]
    pub fn set_voltage(&mut self, v: f64) {
        self.voltage = v;
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }
}

impl WdfLeaf for VoltageSource {
    #[inline]
    fn port_resistance(&self) -> f64 {
        self.resistance
    }

    #[inline]
    fn reflected(&self) -> f64 {
        2.0 * self.voltage - self.incident
    }

    #[inline]
    fn set_incident(&mut self, a: f64) {
        self.incident = a;
    }

    fn reset(&mut self) {
        self.incident = 0.0;
    }
}

// ---------------------------------------------------------------------------
// ResistiveVoltageSource
// ---------------------------------------------------------------------------

/// Voltage source with built-in series resistance, matched to its port.
///
/// With `Rp = Rs` the reflection is absorbed entirely: `b = Vs`.
#[derive(Debug, Clone, Copy)]
pub struct ResistiveVoltageSource {
    voltage: f64,
    resistance: f64,
}

impl ResistiveVoltageSource {
    pub fn new(series_resistance: f64) -> Self {
        Self {
            voltage: 0.0,
            resistance: checked_port_resistance(series_resistance),
        }
    }

    #[inline]
    pub fn set_voltage(&mut self, v: f64) {
        self.voltage = v;
    }

    pub fn set_resistance(&mut self, series_resistance: f64) {
        self.resistance = checked_port_resistance(series_resistance);
    }
}

impl WdfLeaf for ResistiveVoltageSource {
    #[inline]
    fn port_resistance(&self) -> f64 {
        self.resistance
    }

    #[inline]
    fn reflected(&self) -> f64 {
        self.voltage
    }

    #[inline]
    fn set_incident(&mut self, _a: f64) {
        // Matched source carries no wave state.
    }
}

// ---------------------------------------------------------------------------
// CapacitiveVoltageSource
// ---------------------------------------------------------------------------

/// Voltage source in series with a capacitor, folded into one port.
///
/// Discretizing `v_port = Vs + v_c` with the trapezoidal capacitor rule and
/// `Rp = 1/(2 fs C)` gives `b[n] = a[n-1] + Vs[n] - Vs[n-1]`. With a
/// constant source voltage this reduces to a plain capacitor, so the port
/// blocks DC while coupling signal changes.
#[derive(Debug, Clone, Copy)]
pub struct CapacitiveVoltageSource {
    capacitance: f64,
    resistance: f64,
    voltage: f64,
    prev_voltage: f64,
    state: f64, // z^-1 of incident wave
}

impl CapacitiveVoltageSource {
    pub fn new(capacitance: f64, sample_rate: f64) -> Self {
        Self {
            capacitance,
            resistance: checked_port_resistance(1.0 / (2.0 * sample_rate * capacitance)),
            voltage: 0.0,
            prev_voltage: 0.0,
            state: 0.0,
        }
    }

    /// Set the source voltage for the current sample. Call before the
    /// scatter_up phase.
    #[inline]
    pub fn set_voltage(&mut self, v: f64) {
        self.voltage = v;
    }
}

impl WdfLeaf for CapacitiveVoltageSource {
    #[inline]
    fn port_resistance(&self) -> f64 {
        self.resistance
    }

    #[inline]
    fn reflected(&self) -> f64 {
        self.state + self.voltage - self.prev_voltage
    }

    #[inline]
    fn set_incident(&mut self, a: f64) {
        self.state = a;
        self.prev_voltage = self.voltage;
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.resistance = checked_port_resistance(1.0 / (2.0 * sample_rate * self.capacitance));
    }

    fn reset(&mut self) {
        self.state = 0.0;
        self.voltage = 0.0;
        self.prev_voltage = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
