//! Named physical component values shared between the control thread and
//! the audio thread.
//!
//! A `CircuitQuantity` is a resistance, capacitance, or inductance that a
//! knob (or host parameter) can retune at run time. The control thread is
//! the single writer: it stores a clamped value atomically and raises a
//! dirty flag. The audio thread drains dirty quantities at block
//! boundaries and pushes the values into every channel's WDF tree, so an
//! update is never applied mid-block or retroactively.

use atomic_float::AtomicF64;
use std::sync::atomic::{AtomicBool, Ordering};

/// Physical dimension of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityKind {
    /// Ohms.
    Resistance,
    /// Farads.
    Capacitance,
    /// Henries.
    Inductance,
}

/// One externally tunable component value.
#[derive(Debug)]
pub struct CircuitQuantity {
    name: String,
    kind: QuantityKind,
    value: AtomicF64,
    dirty: AtomicBool,
    default_value: f64,
    min_value: f64,
    max_value: f64,
}

impl CircuitQuantity {
    fn new(name: &str, kind: QuantityKind, default: f64, min: f64, max: f64) -> Self {
        debug_assert!(min <= max, "invalid bounds for {name}: {min} > {max}");
        let default_value = default.clamp(min, max);
        Self {
            name: name.to_owned(),
            kind,
            value: AtomicF64::new(default_value),
            dirty: AtomicBool::new(true),
            default_value,
            min_value: min,
            max_value: max,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> QuantityKind {
        self.kind
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Store a new value, clamped to the declared range. Control thread
    /// only. Returns the value actually stored.
    pub fn set(&self, value: f64) -> f64 {
        let v = if value.is_finite() {
            value.clamp(self.min_value, self.max_value)
        } else {
            self.default_value
        };
        self.value.store(v, Ordering::Release);
        self.dirty.store(true, Ordering::Release);
        v
    }

    /// Current value. Any thread.
    pub fn value(&self) -> f64 {
        self.value.load(Ordering::Acquire)
    }

    /// Consume the dirty flag. Audio thread, at block boundaries.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Restore the default value.
    pub fn reset(&self) {
        self.set(self.default_value);
    }
}

/// Registry of the tunable quantities of one circuit (shared by all
/// channels of a stereo pair).
///
/// Registration happens at construction, off the audio thread; afterwards
/// the list is structurally immutable.
#[derive(Debug, Default)]
pub struct CircuitQuantityList {
    items: Vec<CircuitQuantity>,
}

impl CircuitQuantityList {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Register a resistance (Ω). Returns the quantity index.
    pub fn add_resistor(&mut self, default: f64, name: &str, min: f64, max: f64) -> usize {
        self.push(CircuitQuantity::new(
            name,
            QuantityKind::Resistance,
            default,
            min,
            max,
        ))
    }

    /// Register a capacitance (F). Returns the quantity index.
    pub fn add_capacitor(&mut self, default: f64, name: &str, min: f64, max: f64) -> usize {
        self.push(CircuitQuantity::new(
            name,
            QuantityKind::Capacitance,
            default,
            min,
            max,
        ))
    }

    /// Register an inductance (H). Returns the quantity index.
    pub fn add_inductor(&mut self, default: f64, name: &str, min: f64, max: f64) -> usize {
        self.push(CircuitQuantity::new(
            name,
            QuantityKind::Inductance,
            default,
            min,
            max,
        ))
    }

    fn push(&mut self, q: CircuitQuantity) -> usize {
        debug_assert!(
            self.find_quantity(q.name()).is_none(),
            "duplicate quantity name {}",
            q.name()
        );
        self.items.push(q);
        self.items.len() - 1
    }

    /// Look up a quantity by name. Absence is not an error.
    pub fn find_quantity(&self, name: &str) -> Option<&CircuitQuantity> {
        self.items.iter().find(|q| q.name() == name)
    }

    pub fn get(&self, index: usize) -> Option<&CircuitQuantity> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CircuitQuantity> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> CircuitQuantityList {
        let mut l = CircuitQuantityList::new();
        l.add_resistor(47_000.0, "drive", 1000.0, 551_000.0);
        l.add_capacitor(100e-12, "feedback cap", 10e-12, 1e-9);
        l
    }

    #[test]
    fn values_clamp_to_declared_range() {
        let l = list();
        let q = l.find_quantity("drive").unwrap();
        assert_eq!(q.set(1e9), 551_000.0);
        assert_eq!(q.set(-4.0), 1000.0);
        assert_eq!(q.set(2000.0), 2000.0);
        assert_eq!(q.value(), 2000.0);
    }

    #[test]
    fn non_finite_stores_fall_back_to_default() {
        let l = list();
        let q = l.find_quantity("drive").unwrap();
        q.set(f64::NAN);
        assert_eq!(q.value(), 47_000.0);
        q.set(f64::INFINITY);
        assert_eq!(q.value(), 47_000.0);
    }

    #[test]
    fn dirty_flag_is_consumed_once() {
        let l = list();
        let q = l.find_quantity("drive").unwrap();
        assert!(q.take_dirty()); // initial value counts as pending
        assert!(!q.take_dirty());
        q.set(5000.0);
        assert!(q.take_dirty());
        assert!(!q.take_dirty());
    }

    #[test]
    fn lookup_by_name_and_index_agree() {
        let l = list();
        assert_eq!(l.len(), 2);
        assert_eq!(l.get(1).unwrap().name(), "feedback cap");
        assert!(l.find_quantity("tone").is_none());
        assert_eq!(
            l.find_quantity("feedback cap").unwrap().kind(),
            QuantityKind::Capacitance
        );
    }

    #[test]
    fn default_clamps_into_range() {
        let mut l = CircuitQuantityList::new();
        l.add_inductor(10.0, "choke", 1e-3, 1.0);
        assert_eq!(l.get(0).unwrap().value(), 1.0);
        assert_eq!(l.get(0).unwrap().default_value(), 1.0);
    }
}
