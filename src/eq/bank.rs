//! Fixed filter banks: a declared order of sections applied sequentially.

use super::{FilterKind, FilterSection};

/// Which bank layout an [`Equaliser`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualiserKind {
    /// Low shelf, two peaks, high shelf.
    Parametric,
    /// Ten octave bands, gain-only.
    Graphic,
    /// Guitar voicing: rumble highpass, bass/mid/treble, presence.
    Instrument,
    /// Amp-style tone stack plus bright shelf.
    Amplifier,
}

/// A bank of filter sections with a fixed layout.
///
/// Section order is part of the voicing and never changes after
/// construction; per-section bypass is checked once per block.
#[derive(Debug)]
pub struct Equaliser {
    kind: EqualiserKind,
    sections: Vec<FilterSection>,
}

impl Equaliser {
    /// Four-band parametric: low shelf, two mid peaks, high shelf.
    pub fn parametric() -> Self {
        Self {
            kind: EqualiserKind::Parametric,
            sections: vec![
                FilterSection::new(FilterKind::LowShelf, 120.0, 0.707, 0.0),
                FilterSection::new(FilterKind::Peak, 400.0, 0.8, 0.0),
                FilterSection::new(FilterKind::Peak, 1600.0, 0.8, 0.0),
                FilterSection::new(FilterKind::HighShelf, 6000.0, 0.707, 0.0),
            ],
        }
    }

    /// Ten-band graphic equaliser on octave centers from 31 Hz to 16 kHz.
    pub fn graphic() -> Self {
        let sections = (0..10)
            .map(|i| {
                let freq = 31.25 * 2f64.powi(i);
                FilterSection::new(FilterKind::Peak, freq, 1.414, 0.0)
            })
            .collect();
        Self {
            kind: EqualiserKind::Graphic,
            sections,
        }
    }

    /// Guitar-voiced bank: rumble highpass, bass shelf, mid peak, treble
    /// shelf, presence peak.
    pub fn instrument() -> Self {
        Self {
            kind: EqualiserKind::Instrument,
            sections: vec![
                FilterSection::new(FilterKind::Highpass, 35.0, 0.707, 0.0),
                FilterSection::new(FilterKind::LowShelf, 110.0, 0.707, 0.0),
                FilterSection::new(FilterKind::Peak, 550.0, 0.7, 0.0),
                FilterSection::new(FilterKind::HighShelf, 2200.0, 0.707, 0.0),
                FilterSection::new(FilterKind::Peak, 4500.0, 1.0, 0.0),
            ],
        }
    }

    /// Amp-style stack: bass shelf, scooped mid peak, treble shelf, bright
    /// shelf.
    pub fn amplifier() -> Self {
        Self {
            kind: EqualiserKind::Amplifier,
            sections: vec![
                FilterSection::new(FilterKind::LowShelf, 80.0, 0.707, 0.0),
                FilterSection::new(FilterKind::Peak, 500.0, 0.6, 0.0),
                FilterSection::new(FilterKind::HighShelf, 2000.0, 0.707, 0.0),
                FilterSection::new(FilterKind::HighShelf, 5000.0, 0.707, 0.0),
            ],
        }
    }

    pub fn of_kind(kind: EqualiserKind) -> Self {
        match kind {
            EqualiserKind::Parametric => Self::parametric(),
            EqualiserKind::Graphic => Self::graphic(),
            EqualiserKind::Instrument => Self::instrument(),
            EqualiserKind::Amplifier => Self::amplifier(),
        }
    }

    pub fn kind(&self) -> EqualiserKind {
        self.kind
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, index: usize) -> Option<&FilterSection> {
        self.sections.get(index)
    }

    pub fn section_mut(&mut self, index: usize) -> Option<&mut FilterSection> {
        self.sections.get_mut(index)
    }

    /// Allocate channel states for every section. Off the audio thread.
    pub fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        for section in &mut self.sections {
            section.prepare(sample_rate, num_channels);
        }
    }

    /// Run every active section over every channel, in declared order.
    pub fn process_block(&mut self, buffers: &mut [&mut [f32]], num_samples: usize) {
        for section in &mut self.sections {
            if section.bypassed() {
                continue;
            }
            for (channel, buf) in buffers.iter_mut().enumerate() {
                let n = num_samples.min(buf.len());
                section.process_block(channel, &mut buf[..n]);
            }
        }
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
