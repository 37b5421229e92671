//! Series and parallel 3-port adaptors with a reflection-free parent port.

use super::checked_port_resistance;

// ---------------------------------------------------------------------------
// Series adaptor
// ---------------------------------------------------------------------------

/// Series adaptor joining two sub-trees.
///
/// One loop current threads all three ports, so the port voltages sum to
/// zero around the junction. Making the parent port reflection-free gives
/// `Rp = R1 + R2` and `gamma = R1 / Rp`, and the scattering collapses to
///   up:   `b3 = -(b1 + b2)`
///   down: `a1 = b1 - gamma * (b1 + b2 + a3)`
///         `a2 = b2 - (1 - gamma) * (b1 + b2 + a3)`
#[derive(Debug)]
pub struct SeriesAdaptor {
    pub port_resistance: f64,
    gamma: f64,
    // Waves reflected by the children, held until scatter_down
    b1: f64,
    b2: f64,
}

impl SeriesAdaptor {
    pub fn new(r1: f64, r2: f64) -> Self {
        let rp = checked_port_resistance(r1 + r2);
        Self {
            port_resistance: rp,
            gamma: r1 / rp,
            b1: 0.0,
            b2: 0.0,
        }
    }

    /// Re-derive `Rp` and `gamma` after a child's port resistance moved.
    pub fn update_ports(&mut self, r1: f64, r2: f64) {
        self.port_resistance = checked_port_resistance(r1 + r2);
        self.gamma = r1 / self.port_resistance;
    }

    /// Upward pass: fold both child reflections into the wave sent to the
    /// parent.
    #[inline]
    pub fn scatter_up(&mut self, b1: f64, b2: f64) -> f64 {
        self.b1 = b1;
        self.b2 = b2;
        -(b1 + b2)
    }

    /// Downward pass: split the parent's incident wave back across the
    /// children. Returns `(a1, a2)`.
    #[inline]
    pub fn scatter_down(&self, a3: f64) -> (f64, f64) {
        let sum = self.b1 + self.b2 + a3;
        let a1 = self.b1 - self.gamma * sum;
        let a2 = self.b2 - (1.0 - self.gamma) * sum;
        (a1, a2)
    }

    /// Drop the held child waves.
    pub fn reset(&mut self) {
        self.b1 = 0.0;
        self.b2 = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Parallel adaptor
// ---------------------------------------------------------------------------

/// Parallel adaptor joining two sub-trees.
///
/// Port resistance: `Rp = R1 * R2 / (R1 + R2)`
/// Scattering coefficient: `gamma = R2 / (R1 + R2)`
///
/// 3-port parallel junction (port 3 = parent, reflection-free). The node
/// voltage is the conductance-weighted mean of the port waves, which gives
///   scatter_up:   `b3 = gamma * b1 + (1 - gamma) * b2`
///   scatter_down: `a1 = a3 + b3 - b1`
///                 `a2 = a3 + b3 - b2`
#[derive(Debug)]
pub struct ParallelAdaptor {
    pub port_resistance: f64,
    gamma: f64,
    b1: f64,
    b2: f64,
}

impl ParallelAdaptor {
    pub fn new(r1: f64, r2: f64) -> Self {
        let rp = checked_port_resistance(r1 * r2 / (r1 + r2));
        Self {
            port_resistance: rp,
            gamma: r2 / (r1 + r2),
            b1: 0.0,
            b2: 0.0,
        }
    }

    pub fn update_ports(&mut self, r1: f64, r2: f64) {
        self.port_resistance = checked_port_resistance(r1 * r2 / (r1 + r2));
        self.gamma = r2 / (r1 + r2);
    }

    /// Upward pass: conductance-weighted mix of the child reflections.
    #[inline]
    pub fn scatter_up(&mut self, b1: f64, b2: f64) -> f64 {
        self.b1 = b1;
        self.b2 = b2;
        b2 + self.gamma * (b1 - b2)
    }

    /// Downward pass: hand the parent's incident wave to both children,
    /// corrected for their reflection difference. Returns `(a1, a2)`.
    #[inline]
    pub fn scatter_down(&self, a3: f64) -> (f64, f64) {
        let diff = self.b1 - self.b2;
        let a1 = a3 + (self.gamma - 1.0) * diff;
        let a2 = a3 + self.gamma * diff;
        (a1, a2)
    }

    pub fn reset(&mut self) {
        self.b1 = 0.0;
        self.b2 = 0.0;
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
    fn series_adaptor_port_resistance() {
        let s = SeriesAdaptor::new(1000.0, 2000.0);
        assert_relative_eq!(s.port_resistance, 3000.0);
    }

    #[test]
    fn series_adaptor_scatter_up() {
        let mut s = SeriesAdaptor::new(1000.0, 2000.0);
        let b3 = s.scatter_up(0.5, 0.3);
        assert_relative_eq!(b3, -0.8, epsilon = 1e-12);
    }

    #[test]
    fn series_junction_satisfies_kvl() {
        // Voltages around the series loop must sum: v1 + v2 = v3.
        let mut s = SeriesAdaptor::new(1000.0, 2200.0);
        let b1 = 0.3;
        let b2 = 0.7;
        let b3 = s.scatter_up(b1, b2);
        let a3 = -b3; // matched termination at the parent
        let (a1, a2) = s.scatter_down(a3);

        let v1 = (a1 + b1) / 2.0;
        let v2 = (a2 + b2) / 2.0;
        let v3 = (a3 + b3) / 2.0;
        assert_relative_eq!(v1 + v2, v3, epsilon = 1e-12);
    }

    #[test]
    fn parallel_adaptor_port_resistance() {
        let p = ParallelAdaptor::new(1000.0, 2000.0);
        assert_relative_eq!(p.port_resistance, 1000.0 * 2000.0 / 3000.0);
    }

    #[test]
    fn parallel_adaptor_scatter_up() {
        // Equal resistances => gamma = 0.5 => b_up = (b1+b2)/2
        let mut p = ParallelAdaptor::new(1000.0, 1000.0);
        let b3 = p.scatter_up(1.0, -1.0);
        assert_relative_eq!(b3, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn parallel_junction_equalizes_voltages() {
        // All three ports of a parallel junction share one node voltage.
        let mut p = ParallelAdaptor::new(470.0, 3300.0);
        let b1 = -0.2;
        let b2 = 0.9;
        let b3 = p.scatter_up(b1, b2);
        let a3 = 0.15;
        let (a1, a2) = p.scatter_down(a3);

        let v1 = (a1 + b1) / 2.0;
        let v2 = (a2 + b2) / 2.0;
        let v3 = (a3 + b3) / 2.0;
        assert_relative_eq!(v1, v3, epsilon = 1e-12);
        assert_relative_eq!(v2, v3, epsilon = 1e-12);
    }

    #[test]
    fn update_ports_rederives_coefficients() {
        let mut s = SeriesAdaptor::new(100.0, 100.0);
        s.update_ports(300.0, 100.0);
        assert_relative_eq!(s.port_resistance, 400.0);

        let mut p = ParallelAdaptor::new(100.0, 100.0);
        p.update_ports(300.0, 100.0);
        assert_relative_eq!(p.port_resistance, 75.0);
    }
}
