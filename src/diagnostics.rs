//! Lock-free engine statistics.
//!
//! The audio thread publishes peaks and counters with relaxed atomics; a
//! UI or monitoring thread reads them at leisure. No console or file I/O
//! ever happens on the processing path — this is the crate's entire
//! observability surface.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Shared audio-thread statistics. Cheap to update, safe to read from any
/// thread.
#[derive(Debug, Default)]
pub struct EngineStats {
    input_peak_bits: AtomicU64,
    output_peak_bits: AtomicU64,
    samples_processed: AtomicU64,
    blocks_processed: AtomicU64,
    nan_scrub_count: AtomicU32,
    clamped_parameter_count: AtomicU32,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed block. Audio thread.
    pub fn record_block(&self, input_peak: f64, output_peak: f64, num_samples: usize) {
        self.input_peak_bits
            .store(input_peak.to_bits(), Ordering::Relaxed);
        self.output_peak_bits
            .store(output_peak.to_bits(), Ordering::Relaxed);
        self.samples_processed
            .fetch_add(num_samples as u64, Ordering::Relaxed);
        self.blocks_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one non-finite sample that was flushed to zero.
    pub fn record_nan_scrub(&self) {
        self.nan_scrub_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one out-of-range parameter value that was clamped.
    pub fn record_clamped_parameter(&self) {
        self.clamped_parameter_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn input_peak(&self) -> f64 {
        f64::from_bits(self.input_peak_bits.load(Ordering::Relaxed))
    }

    pub fn output_peak(&self) -> f64 {
        f64::from_bits(self.output_peak_bits.load(Ordering::Relaxed))
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed.load(Ordering::Relaxed)
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed.load(Ordering::Relaxed)
    }

    pub fn nan_scrubs(&self) -> u32 {
        self.nan_scrub_count.load(Ordering::Relaxed)
    }

    pub fn clamped_parameters(&self) -> u32 {
        self.clamped_parameter_count.load(Ordering::Relaxed)
    }

    /// Zero every counter and peak.
    pub fn reset(&self) {
        self.input_peak_bits.store(0, Ordering::Relaxed);
        self.output_peak_bits.store(0, Ordering::Relaxed);
        self.samples_processed.store(0, Ordering::Relaxed);
        self.blocks_processed.store(0, Ordering::Relaxed);
        self.nan_scrub_count.store(0, Ordering::Relaxed);
        self.clamped_parameter_count.store(0, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_round_trip_through_bits() {
        let stats = EngineStats::new();
        stats.record_block(0.75, 1.25, 64);
        assert_eq!(stats.input_peak(), 0.75);
        assert_eq!(stats.output_peak(), 1.25);
        assert_eq!(stats.samples_processed(), 64);
        assert_eq!(stats.blocks_processed(), 1);
    }

    #[test]
    fn counters_accumulate_and_reset() {
        let stats = EngineStats::new();
        stats.record_nan_scrub();
        stats.record_nan_scrub();
        stats.record_clamped_parameter();
        stats.record_block(0.1, 0.1, 128);
        assert_eq!(stats.nan_scrubs(), 2);
        assert_eq!(stats.clamped_parameters(), 1);

        stats.reset();
        assert_eq!(stats.nan_scrubs(), 0);
        assert_eq!(stats.clamped_parameters(), 0);
        assert_eq!(stats.samples_processed(), 0);
        assert_eq!(stats.input_peak(), 0.0);
    }

    #[test]
    fn stats_are_shareable_across_threads() {
        use std::sync::Arc;
        let stats = Arc::new(EngineStats::new());
        let writer = Arc::clone(&stats);
        let handle = std::thread::spawn(move || {
            for _ in 0..100 {
                writer.record_block(0.5, 0.5, 32);
            }
        });
        handle.join().unwrap();
        assert_eq!(stats.blocks_processed(), 100);
        assert_eq!(stats.samples_processed(), 3200);
    }
}
