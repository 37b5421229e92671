//! Smoothed scalar parameters for gain-style controls.
//!
//! The control thread writes targets atomically; the audio thread owns the
//! current value and walks it toward the target one sample at a time, so
//! gain changes never step discontinuously.

use atomic_float::AtomicF64;
use std::sync::atomic::Ordering;

/// Linearly ramped parameter with an atomic target.
#[derive(Debug)]
pub struct SmoothedParam {
    target: AtomicF64,
    current: f64,
    step: f64,
    ramp_seconds: f64,
    span: f64,
    sample_rate: f64,
}

impl SmoothedParam {
    /// `span` is the magnitude of the largest expected jump; the ramp
    /// covers it in `ramp_seconds`.
    pub fn new(initial: f64, ramp_seconds: f64, span: f64) -> Self {
        Self {
            target: AtomicF64::new(initial),
            current: initial,
            step: 0.0,
            ramp_seconds,
            span,
            sample_rate: 0.0,
        }
    }

    /// Derive the per-sample step. Call from prepare.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.step = self.span / (self.ramp_seconds * sample_rate).max(1.0);
    }

    /// Change how long the ramp takes to cover the full span. Takes effect
    /// immediately if a sample rate has been set.
    pub fn set_ramp_time(&mut self, ramp_seconds: f64) {
        self.ramp_seconds = ramp_seconds.max(0.0);
        if self.sample_rate > 0.0 {
            self.step = self.span / (self.ramp_seconds * self.sample_rate).max(1.0);
        }
    }

    /// Set the ramp target. Control thread.
    pub fn set_target(&self, value: f64) {
        self.target.store(value, Ordering::Release);
    }

    pub fn target(&self) -> f64 {
        self.target.load(Ordering::Acquire)
    }

    /// Advance one sample toward the target and return the new current
    /// value. Audio thread.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        let target = self.target.load(Ordering::Relaxed);
        let delta = target - self.current;
        if delta.abs() <= self.step {
            self.current = target;
        } else if delta > 0.0 {
            self.current += self.step;
        } else {
            self.current -= self.step;
        }
        self.current
    }

    /// Jump straight to the target, skipping the ramp. Used on prepare and
    /// reset so stale ramps do not bleed into a fresh stream.
    pub fn snap_to_target(&mut self) {
        self.current = self.target.load(Ordering::Acquire);
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
