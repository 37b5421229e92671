//! Parametric IIR filtering: biquad designs, filter sections, and the
//! fixed filter banks built from them.
//!
//! Coefficients come from the audio-EQ cookbook closed forms and are a
//! pure function of their inputs — the same sample rate, frequency, Q,
//! and gain always produce bit-identical coefficient sets.

mod bank;
mod section;

pub use bank::{Equaliser, EqualiserKind};
pub use section::FilterSection;

use std::f64::consts::PI;

/// Frequencies are kept strictly below Nyquist; the cookbook tangent
/// forms blow up at fs/2.
const MAX_FREQUENCY_RATIO: f64 = 0.49;

/// Biquad response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Highpass,
    Lowpass,
    Bandpass,
    Peak,
    LowShelf,
    HighShelf,
}

/// Normalized biquad coefficients (a0 divided out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Identity filter.
    pub fn passthrough() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Design a biquad from the cookbook closed forms.
    ///
    /// Returns `None` when the request cannot yield a usable filter:
    /// frequency or Q of zero or below, non-finite inputs, or a design
    /// that produced non-finite coefficients. Frequencies at or above
    /// Nyquist are clamped below it rather than rejected.
    pub fn design(
        kind: FilterKind,
        sample_rate: f64,
        frequency: f64,
        q: f64,
        gain_db: f64,
    ) -> Option<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return None;
        }
        if !(frequency.is_finite() && frequency > 0.0) {
            return None;
        }
        if !(q.is_finite() && q > 0.0) {
            return None;
        }
        if !gain_db.is_finite() {
            return None;
        }

        let freq = frequency.min(MAX_FREQUENCY_RATIO * sample_rate);
        let w0 = 2.0 * PI * freq / sample_rate;
        let cw = w0.cos();
        let sw = w0.sin();
        let alpha = sw / (2.0 * q);
        let amp = 10f64.powf(gain_db / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterKind::Lowpass => {
                let b1 = 1.0 - cw;
                (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cw, 1.0 - alpha)
            }
            FilterKind::Highpass => {
                let b1 = -(1.0 + cw);
                (
                    -b1 / 2.0,
                    b1,
                    -b1 / 2.0,
                    1.0 + alpha,
                    -2.0 * cw,
                    1.0 - alpha,
                )
            }
            FilterKind::Bandpass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cw, 1.0 - alpha),
            FilterKind::Peak => (
                1.0 + alpha * amp,
                -2.0 * cw,
                1.0 - alpha * amp,
                1.0 + alpha / amp,
                -2.0 * cw,
                1.0 - alpha / amp,
            ),
            FilterKind::LowShelf => {
                let two_sqrt_a_alpha = 2.0 * amp.sqrt() * alpha;
                (
                    amp * ((amp + 1.0) - (amp - 1.0) * cw + two_sqrt_a_alpha),
                    2.0 * amp * ((amp - 1.0) - (amp + 1.0) * cw),
                    amp * ((amp + 1.0) - (amp - 1.0) * cw - two_sqrt_a_alpha),
                    (amp + 1.0) + (amp - 1.0) * cw + two_sqrt_a_alpha,
                    -2.0 * ((amp - 1.0) + (amp + 1.0) * cw),
                    (amp + 1.0) + (amp - 1.0) * cw - two_sqrt_a_alpha,
                )
            }
            FilterKind::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * amp.sqrt() * alpha;
                (
                    amp * ((amp + 1.0) + (amp - 1.0) * cw + two_sqrt_a_alpha),
                    -2.0 * amp * ((amp - 1.0) + (amp + 1.0) * cw),
                    amp * ((amp + 1.0) + (amp - 1.0) * cw - two_sqrt_a_alpha),
                    (amp + 1.0) - (amp - 1.0) * cw + two_sqrt_a_alpha,
                    2.0 * ((amp - 1.0) - (amp + 1.0) * cw),
                    (amp + 1.0) - (amp - 1.0) * cw - two_sqrt_a_alpha,
                )
            }
        };

        let coeffs = Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        };
        coeffs.is_finite().then_some(coeffs)
    }

    fn is_finite(&self) -> bool {
        self.b0.is_finite()
            && self.b1.is_finite()
            && self.b2.is_finite()
            && self.a1.is_finite()
            && self.a2.is_finite()
    }
}

// ---------------------------------------------------------------------------
// DC blocker
// ---------------------------------------------------------------------------

/// One-pole highpass removing the DC offset a clipping stage introduces.
///
/// `y[n] = x[n] - x[n-1] + r * y[n-1]`, with `r = 0.995` at 44.1 kHz and
/// the pole rescaled so the cutoff stays at the same frequency for other
/// sample rates.
#[derive(Debug, Clone, Copy)]
pub struct DcBlocker {
    r: f64,
    x1: f64,
    y1: f64,
}

impl DcBlocker {
    pub fn new(sample_rate: f64) -> Self {
        let mut blocker = Self {
            r: 0.995,
            x1: 0.0,
            y1: 0.0,
        };
        blocker.set_sample_rate(sample_rate);
        blocker
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.r = (1.0 - 0.005 * 44_100.0 / sample_rate.max(1.0)).clamp(0.9, 0.999_999);
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = x - self.x1 + self.r * self.y1;
        self.x1 = x;
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tone filter
// ---------------------------------------------------------------------------

/// Variable one-pole lowpass, the drive circuit's passive tone control.
#[derive(Debug, Clone, Copy)]
pub struct ToneFilter {
    cutoff: f64,
    coef: f64,
    sample_rate: f64,
    state: f64,
}

impl ToneFilter {
    pub fn new(cutoff: f64, sample_rate: f64) -> Self {
        let mut filter = Self {
            cutoff,
            coef: 1.0,
            sample_rate,
            state: 0.0,
        };
        filter.set_sample_rate(sample_rate);
        filter
    }

    pub fn set_cutoff(&mut self, cutoff: f64) {
        self.cutoff = cutoff.clamp(20.0, MAX_FREQUENCY_RATIO * self.sample_rate);
        self.coef = 1.0 - (-2.0 * PI * self.cutoff / self.sample_rate).exp();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate.max(1.0);
        self.set_cutoff(self.cutoff);
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        self.state += self.coef * (x - self.state);
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Magnitude response of a biquad at one frequency.
    fn magnitude(c: &BiquadCoeffs, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (re_n, im_n) = polynomial_response(c.b0, c.b1, c.b2, w);
        let (re_d, im_d) = polynomial_response(1.0, c.a1, c.a2, w);
        ((re_n * re_n + im_n * im_n) / (re_d * re_d + im_d * im_d)).sqrt()
    }

    fn polynomial_response(c0: f64, c1: f64, c2: f64, w: f64) -> (f64, f64) {
        let re = c0 + c1 * w.cos() + c2 * (2.0 * w).cos();
        let im = -c1 * w.sin() - c2 * (2.0 * w).sin();
        (re, im)
    }

    #[test]
    fn design_is_bit_deterministic() {
        let a = BiquadCoeffs::design(FilterKind::Peak, 48000.0, 1000.0, 0.707, 6.0).unwrap();
        let b = BiquadCoeffs::design(FilterKind::Peak, 48000.0, 1000.0, 0.707, 6.0).unwrap();
        assert_eq!(a.b0.to_bits(), b.b0.to_bits());
        assert_eq!(a.b1.to_bits(), b.b1.to_bits());
        assert_eq!(a.b2.to_bits(), b.b2.to_bits());
        assert_eq!(a.a1.to_bits(), b.a1.to_bits());
        assert_eq!(a.a2.to_bits(), b.a2.to_bits());
    }

    #[test]
    fn zero_frequency_or_q_is_rejected() {
        assert!(BiquadCoeffs::design(FilterKind::Lowpass, 48000.0, 0.0, 0.707, 0.0).is_none());
        assert!(BiquadCoeffs::design(FilterKind::Lowpass, 48000.0, -100.0, 0.707, 0.0).is_none());
        assert!(BiquadCoeffs::design(FilterKind::Lowpass, 48000.0, 1000.0, 0.0, 0.0).is_none());
        assert!(
            BiquadCoeffs::design(FilterKind::Peak, 48000.0, 1000.0, 0.707, f64::NAN).is_none()
        );
    }

    #[test]
    fn super_nyquist_frequency_is_clamped_not_rejected() {
        let c = BiquadCoeffs::design(FilterKind::Lowpass, 48000.0, 96000.0, 0.707, 0.0).unwrap();
        let clamped =
            BiquadCoeffs::design(FilterKind::Lowpass, 48000.0, 0.49 * 48000.0, 0.707, 0.0)
                .unwrap();
        assert_eq!(c, clamped);
    }

    #[test]
    fn peak_filter_hits_requested_gain_at_center() {
        let c = BiquadCoeffs::design(FilterKind::Peak, 48000.0, 1000.0, 1.0, 6.0).unwrap();
        let gain_db = 20.0 * magnitude(&c, 1000.0, 48000.0).log10();
        assert_relative_eq!(gain_db, 6.0, epsilon = 0.01);
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let c = BiquadCoeffs::design(FilterKind::Lowpass, 48000.0, 500.0, 0.707, 0.0).unwrap();
        assert_relative_eq!(magnitude(&c, 50.0, 48000.0), 1.0, epsilon = 0.01);
        assert!(magnitude(&c, 8000.0, 48000.0) < 0.01);
    }

    #[test]
    fn highpass_attenuates_low_frequencies() {
        let c = BiquadCoeffs::design(FilterKind::Highpass, 48000.0, 500.0, 0.707, 0.0).unwrap();
        assert!(magnitude(&c, 20.0, 48000.0) < 0.01);
        assert_relative_eq!(magnitude(&c, 8000.0, 48000.0), 1.0, epsilon = 0.01);
    }

    #[test]
    fn shelves_meet_their_plateau_gains() {
        let low = BiquadCoeffs::design(FilterKind::LowShelf, 48000.0, 200.0, 0.707, 9.0).unwrap();
        let low_db = 20.0 * magnitude(&low, 20.0, 48000.0).log10();
        assert_relative_eq!(low_db, 9.0, epsilon = 0.2);

        let high =
            BiquadCoeffs::design(FilterKind::HighShelf, 48000.0, 3000.0, 0.707, -6.0).unwrap();
        let high_db = 20.0 * magnitude(&high, 20000.0, 48000.0).log10();
        assert_relative_eq!(high_db, -6.0, epsilon = 0.3);
    }

    #[test]
    fn bandpass_peaks_at_unity() {
        let c = BiquadCoeffs::design(FilterKind::Bandpass, 48000.0, 1000.0, 2.0, 0.0).unwrap();
        assert_relative_eq!(magnitude(&c, 1000.0, 48000.0), 1.0, epsilon = 0.01);
        assert!(magnitude(&c, 100.0, 48000.0) < 0.3);
        assert!(magnitude(&c, 10000.0, 48000.0) < 0.3);
    }

    #[test]
    fn dc_blocker_removes_offset_keeps_signal() {
        let mut dc = DcBlocker::new(48000.0);
        // Constant input decays toward zero output.
        let mut last = 1.0;
        for _ in 0..48000 {
            last = dc.process(1.0);
        }
        assert!(last.abs() < 1e-3, "DC residue {last}");

        // A 1 kHz tone passes nearly unscathed.
        dc.reset();
        let mut peak = 0.0f64;
        for i in 0..4800 {
            let x = (2.0 * PI * 1000.0 * i as f64 / 48000.0).sin();
            let y = dc.process(x);
            if i > 1000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak > 0.95, "tone attenuated to {peak}");
    }

    #[test]
    fn tone_filter_darkens_highs() {
        let mut tone = ToneFilter::new(1000.0, 48000.0);
        let mut peak_high = 0.0f64;
        for i in 0..4800 {
            let x = (2.0 * PI * 10_000.0 * i as f64 / 48000.0).sin();
            let y = tone.process(x);
            if i > 1000 {
                peak_high = peak_high.max(y.abs());
            }
        }
        assert!(peak_high < 0.3, "10 kHz should be well attenuated: {peak_high}");

        tone.reset();
        let mut peak_low = 0.0f64;
        for i in 0..48000 {
            let x = (2.0 * PI * 100.0 * i as f64 / 48000.0).sin();
            let y = tone.process(x);
            if i > 10000 {
                peak_low = peak_low.max(y.abs());
            }
        }
        assert!(peak_low > 0.95, "100 Hz should pass: {peak_low}");
    }

    #[test]
    fn tone_filter_clamps_cutoff() {
        let mut tone = ToneFilter::new(1000.0, 48000.0);
        tone.set_cutoff(1e9);
        // Cutoff pinned below Nyquist keeps the coefficient stable.
        let y = tone.process(1.0);
        assert!(y.is_finite() && y <= 1.0);
    }
}
