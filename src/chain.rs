//! The complete drive processing chain.
//!
//! Per channel: input gain, WDF circuit model, DC blocker, tone filter,
//! output volume, then the shared equaliser bank over the whole block.
//! All allocation happens in [`DriveChain::prepare`]; the block path only
//! reads atomics, runs the trees, and writes the buffers back in place.
//!
//! Control traffic arrives two ways. Gain-style parameters go through
//! [`DriveChain::set_parameter`] and ramp over a few milliseconds so they
//! never step audibly. Component values go through the shared
//! [`CircuitQuantityList`]; the audio thread drains the dirty flags once
//! per block and pushes changed values into every channel's tree, so a
//! quantity update lands exactly at a block boundary.

use std::sync::Arc;

use crate::circuits::{CircuitKind, CircuitModel};
use crate::diagnostics::EngineStats;
use crate::eq::{DcBlocker, Equaliser, EqualiserKind, ToneFilter};
use crate::params::SmoothedParam;
use crate::quantity::CircuitQuantityList;
use crate::PrepareError;

const INPUT_GAIN_MIN_DB: f64 = -24.0;
const INPUT_GAIN_MAX_DB: f64 = 24.0;
const VOLUME_MAX: f64 = 2.0;
const GAIN_RAMP_SECONDS: f64 = 0.005;
const TONE_CUTOFF_MIN: f64 = 500.0;

/// Chain parameters settable at run time. Values outside their range are
/// clamped and counted in [`EngineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamId {
    /// Pre-circuit gain in dB, `-24..=24`.
    InputGainDb,
    /// Post-circuit linear volume, `0..=2`.
    Volume,
    /// Normalized drive amount, `0..=1`, mapped onto the drive pot.
    Drive,
    /// Normalized tone knob, `0..=1`, mapped onto the tone lowpass cutoff.
    Tone,
    /// Clipper diode saturation current (A).
    DiodeIs,
    /// Clipper diode thermal voltage times ideality (V).
    DiodeVt,
    /// Series diodes per clipping direction, `1..=4`.
    DiodeCount,
}

pub struct DriveChain {
    kind: CircuitKind,
    sample_rate: f64,
    models: Vec<Box<dyn CircuitModel>>,
    quantities: Arc<CircuitQuantityList>,
    input_gain: SmoothedParam,
    output_gain: SmoothedParam,
    drive: f64,
    tone: f64,
    dc_blockers: Vec<DcBlocker>,
    tone_filters: Vec<ToneFilter>,
    equaliser: Equaliser,
    stats: Arc<EngineStats>,
}

impl DriveChain {
    /// Build an unprepared chain. Call [`prepare`](Self::prepare) before
    /// processing.
    pub fn new(kind: CircuitKind) -> Self {
        Self {
            kind,
            sample_rate: 0.0,
            models: Vec::new(),
            quantities: Arc::new(kind.quantities()),
            input_gain: SmoothedParam::new(1.0, GAIN_RAMP_SECONDS, 20.0),
            output_gain: SmoothedParam::new(1.0, GAIN_RAMP_SECONDS, VOLUME_MAX),
            drive: 0.2,
            tone: 1.0,
            dc_blockers: Vec::new(),
            tone_filters: Vec::new(),
            equaliser: Equaliser::instrument(),
            stats: Arc::new(EngineStats::new()),
        }
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    /// The circuit's tunable components. Share the `Arc` with a control
    /// thread; stores are picked up at the next block boundary.
    pub fn quantities(&self) -> Arc<CircuitQuantityList> {
        Arc::clone(&self.quantities)
    }

    /// Shared statistics handle for a UI or monitoring thread.
    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }

    pub fn equaliser(&self) -> &Equaliser {
        &self.equaliser
    }

    pub fn equaliser_mut(&mut self) -> &mut Equaliser {
        &mut self.equaliser
    }

    /// Swap the equaliser bank layout. Off the audio thread.
    pub fn set_equaliser_kind(&mut self, kind: EqualiserKind) {
        self.equaliser = Equaliser::of_kind(kind);
        if self.sample_rate > 0.0 {
            self.equaliser.prepare(self.sample_rate, self.models.len());
        }
    }

    /// Swap the emulated circuit. Rebuilds the per-channel trees and the
    /// quantity registry; off the audio thread.
    pub fn set_circuit_kind(&mut self, kind: CircuitKind) {
        self.kind = kind;
        self.quantities = Arc::new(kind.quantities());
        if self.sample_rate > 0.0 {
            let channels = self.models.len();
            self.build_models(channels);
        }
    }

    /// Allocate per-channel state and derive every sample-rate dependent
    /// coefficient. Must run off the audio thread.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        num_channels: usize,
        max_block_size: usize,
    ) -> Result<(), PrepareError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(PrepareError::InvalidSampleRate(sample_rate));
        }
        if num_channels == 0 {
            return Err(PrepareError::NoChannels);
        }
        if max_block_size == 0 {
            return Err(PrepareError::EmptyBlock);
        }

        self.sample_rate = sample_rate;
        self.build_models(num_channels);

        self.dc_blockers.clear();
        self.dc_blockers
            .resize_with(num_channels, || DcBlocker::new(sample_rate));
        let cutoff = tone_cutoff(self.tone, sample_rate);
        self.tone_filters.clear();
        self.tone_filters
            .resize_with(num_channels, || ToneFilter::new(cutoff, sample_rate));

        self.equaliser.prepare(sample_rate, num_channels);
        self.input_gain.set_sample_rate(sample_rate);
        self.output_gain.set_sample_rate(sample_rate);
        self.input_gain.snap_to_target();
        self.output_gain.snap_to_target();
        Ok(())
    }

    fn build_models(&mut self, num_channels: usize) {
        self.models.clear();
        for _ in 0..num_channels {
            let mut model = self.kind.build(self.sample_rate);
            model.set_drive(self.drive);
            for (index, q) in self.quantities.iter().enumerate() {
                model.set_quantity(index, q.value());
            }
            self.models.push(model);
        }
    }

    /// Clear all signal state without touching parameters.
    pub fn reset(&mut self) {
        for model in &mut self.models {
            model.reset();
        }
        for dc in &mut self.dc_blockers {
            dc.reset();
        }
        for tone in &mut self.tone_filters {
            tone.reset();
        }
        self.equaliser.reset();
        self.input_gain.snap_to_target();
        self.output_gain.snap_to_target();
    }

    /// Apply one parameter. Non-finite values are dropped; out-of-range
    /// values are clamped, and either case bumps the clamp counter.
    pub fn set_parameter(&mut self, id: ParamId, value: f64) {
        if !value.is_finite() {
            self.stats.record_clamped_parameter();
            return;
        }
        match id {
            ParamId::InputGainDb => {
                let db = self.clamped(value, INPUT_GAIN_MIN_DB, INPUT_GAIN_MAX_DB);
                self.input_gain.set_target(db_to_gain(db));
            }
            ParamId::Volume => {
                let v = self.clamped(value, 0.0, VOLUME_MAX);
                self.output_gain.set_target(v);
            }
            ParamId::Drive => {
                self.drive = self.clamped(value, 0.0, 1.0);
                for model in &mut self.models {
                    model.set_drive(self.drive);
                }
            }
            ParamId::Tone => {
                self.tone = self.clamped(value, 0.0, 1.0);
                if self.sample_rate > 0.0 {
                    let cutoff = tone_cutoff(self.tone, self.sample_rate);
                    for filter in &mut self.tone_filters {
                        filter.set_cutoff(cutoff);
                    }
                }
            }
            ParamId::DiodeIs => {
                let is = self.clamped(value, 1e-18, 1e-3);
                for model in &mut self.models {
                    model.set_saturation_current(is);
                }
            }
            ParamId::DiodeVt => {
                let n_vt = self.clamped(value, 1e-3, 0.2);
                for model in &mut self.models {
                    model.set_thermal_voltage(n_vt);
                }
            }
            ParamId::DiodeCount => {
                let n = self.clamped(value, 1.0, 4.0);
                for model in &mut self.models {
                    model.set_diode_count(n);
                }
            }
        }
    }

    fn clamped(&self, value: f64, min: f64, max: f64) -> f64 {
        let c = value.clamp(min, max);
        if c != value {
            self.stats.record_clamped_parameter();
        }
        c
    }

    /// Process one block in place. No-op before `prepare`.
    pub fn process_block(&mut self, buffers: &mut [&mut [f32]], num_samples: usize) {
        if self.models.is_empty() || buffers.is_empty() {
            return;
        }

        // Quantity updates land here, never mid-block.
        for (index, q) in self.quantities.iter().enumerate() {
            if q.take_dirty() {
                let value = q.value();
                for model in &mut self.models {
                    model.set_quantity(index, value);
                }
            }
        }

        let channels = self.models.len().min(buffers.len());
        let n = buffers[..channels]
            .iter()
            .map(|b| b.len())
            .min()
            .unwrap_or(0)
            .min(num_samples);

        let mut input_peak = 0.0f64;
        for i in 0..n {
            let gain = self.input_gain.advance();
            let volume = self.output_gain.advance();
            for ch in 0..channels {
                let raw = buffers[ch][i] as f64;
                let x = if raw.is_finite() {
                    raw
                } else {
                    self.stats.record_nan_scrub();
                    0.0
                };
                input_peak = input_peak.max(x.abs());

                let driven = self.models[ch].process_sample(gain * x);
                let blocked = self.dc_blockers[ch].process(driven);
                let toned = self.tone_filters[ch].process(blocked);
                let mut y = volume * toned;
                if !y.is_finite() {
                    self.stats.record_nan_scrub();
                    y = 0.0;
                }
                buffers[ch][i] = y as f32;
            }
        }

        self.equaliser.process_block(&mut buffers[..channels], n);

        let mut output_peak = 0.0f64;
        for buf in buffers[..channels].iter() {
            for &s in &buf[..n] {
                output_peak = output_peak.max((s as f64).abs());
            }
        }
        self.stats.record_block(input_peak, output_peak, n);
    }
}

fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Map the `0..=1` tone knob onto a cutoff from 500 Hz to 8 kHz, four
/// octaves on a log scale.
fn tone_cutoff(knob: f64, sample_rate: f64) -> f64 {
    let cutoff = TONE_CUTOFF_MIN * 2f64.powf(4.0 * knob.clamp(0.0, 1.0));
    cutoff.min(0.49 * sample_rate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
