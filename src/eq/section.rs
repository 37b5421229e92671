//! One filter section: a biquad design plus per-channel state.

use super::{BiquadCoeffs, FilterKind};

/// Transposed direct-form II state for one channel.
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    s1: f64,
    s2: f64,
}

/// A single band of a filter bank.
///
/// Holds the design parameters, the derived coefficients, and one state
/// pair per channel. Parameter setters redesign immediately but reject
/// degenerate requests, keeping the previous coefficients, so a bad host
/// value can never corrupt the running filter.
#[derive(Debug)]
pub struct FilterSection {
    kind: FilterKind,
    frequency: f64,
    q: f64,
    gain_db: f64,
    bypassed: bool,
    sample_rate: f64,
    coeffs: BiquadCoeffs,
    states: Vec<BiquadState>,
}

impl FilterSection {
    pub fn new(kind: FilterKind, frequency: f64, q: f64, gain_db: f64) -> Self {
        Self {
            kind,
            frequency,
            q,
            gain_db,
            bypassed: false,
            sample_rate: 0.0,
            coeffs: BiquadCoeffs::passthrough(),
            states: Vec::new(),
        }
    }

    /// Allocate channel states and derive coefficients. Off the audio
    /// thread.
    pub fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.states.clear();
        self.states
            .resize_with(num_channels, BiquadState::default);
        self.redesign();
    }

    /// Set the center/corner frequency (Hz). Zero or negative keeps the
    /// previous design.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.redesign();
    }

    /// Set the quality factor. Zero or negative keeps the previous design.
    pub fn set_quality(&mut self, q: f64) {
        self.q = q;
        self.redesign();
    }

    /// Set the band gain (dB). Ignored by kinds without a gain term.
    pub fn set_gain_db(&mut self, gain_db: f64) {
        self.gain_db = gain_db;
        self.redesign();
    }

    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn bypassed(&self) -> bool {
        self.bypassed
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    pub fn quality(&self) -> f64 {
        self.q
    }

    pub fn coeffs(&self) -> BiquadCoeffs {
        self.coeffs
    }

    fn redesign(&mut self) {
        if self.sample_rate <= 0.0 {
            return; // not prepared yet; prepare() will design
        }
        if let Some(coeffs) = BiquadCoeffs::design(
            self.kind,
            self.sample_rate,
            self.frequency,
            self.q,
            self.gain_db,
        ) {
            self.coeffs = coeffs;
        }
        // On rejection the previous coefficients stay in effect.
    }

    /// Filter one channel's block in place.
    #[inline]
    pub fn process_block(&mut self, channel: usize, buf: &mut [f32]) {
        debug_assert!(channel < self.states.len(), "channel {channel} unprepared");
        let Some(state) = self.states.get_mut(channel) else {
            return;
        };
        let c = self.coeffs;
        for sample in buf.iter_mut() {
            let x = *sample as f64;
            let y = c.b0 * x + state.s1;
            state.s1 = c.b1 * x - c.a1 * y + state.s2;
            state.s2 = c.b2 * x - c.a2 * y;
            *sample = y as f32;
        }
    }

    /// Clear channel states, keeping the design.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            *state = BiquadState::default();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin() as f32
            })
            .collect()
    }

    fn peak_after_settle(buf: &[f32]) -> f32 {
        buf.iter().skip(buf.len() / 2).fold(0.0f32, |m, &x| m.max(x.abs()))
    }

    #[test]
    fn lowpass_section_filters_a_block() {
        let mut section = FilterSection::new(FilterKind::Lowpass, 500.0, 0.707, 0.0);
        section.prepare(48000.0, 1);
        let mut buf = sine(8000.0, 48000.0, 4800);
        section.process_block(0, &mut buf);
        assert!(peak_after_settle(&buf) < 0.02);
    }

    #[test]
    fn degenerate_frequency_keeps_previous_coefficients() {
        let mut section = FilterSection::new(FilterKind::Peak, 1000.0, 0.707, 6.0);
        section.prepare(48000.0, 1);
        let before = section.coeffs();
        section.set_frequency(0.0);
        assert_eq!(section.coeffs(), before);
        section.set_quality(-1.0);
        assert_eq!(section.coeffs(), before);
    }

    #[test]
    fn valid_parameter_change_redesigns() {
        let mut section = FilterSection::new(FilterKind::Peak, 1000.0, 0.707, 6.0);
        section.prepare(48000.0, 1);
        let before = section.coeffs();
        section.set_gain_db(-6.0);
        assert_ne!(section.coeffs(), before);
    }

    #[test]
    fn channels_keep_independent_state() {
        let mut section = FilterSection::new(FilterKind::Lowpass, 500.0, 0.707, 0.0);
        section.prepare(48000.0, 2);
        let mut left = sine(100.0, 48000.0, 1000);
        let mut right = vec![0.0f32; 1000];
        section.process_block(0, &mut left);
        section.process_block(1, &mut right);
        // Silence on the right channel must stay silent even though the
        // left channel carried a signal.
        assert!(right.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn reset_clears_state_but_not_design() {
        let mut section = FilterSection::new(FilterKind::Lowpass, 500.0, 0.707, 0.0);
        section.prepare(48000.0, 1);
        let mut buf = sine(100.0, 48000.0, 1000);
        section.process_block(0, &mut buf);
        let coeffs = section.coeffs();
        section.reset();
        assert_eq!(section.coeffs(), coeffs);
        let mut silent = vec![0.0f32; 64];
        section.process_block(0, &mut silent);
        assert!(silent.iter().all(|&x| x == 0.0));
    }
}
