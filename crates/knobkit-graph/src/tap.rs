//! Lock-free analysis tap between the render thread and a meter.
//!
//! The render thread pushes every block that reaches an analyser node into a
//! ring of bit-cast `f32` atomics. The control thread copies out the most
//! recent window. Reads may interleave with a block being written; the
//! window is then a mix of two consecutive blocks, never a torn sample.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Ring buffer holding the most recent samples seen by an analyser node.
#[derive(Debug)]
pub struct AnalyserTap {
    samples: Box<[AtomicU32]>,
    /// Total samples written; the next write lands at `written % capacity`.
    written: AtomicUsize,
}

impl AnalyserTap {
    /// Creates a silent tap holding `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            written: AtomicUsize::new(0),
        }
    }

    /// Number of samples retained.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Total samples pushed since creation.
    pub fn samples_written(&self) -> usize {
        self.written.load(Ordering::Acquire)
    }

    /// Appends a block (render thread). Allocation-free.
    #[inline]
    pub fn push(&self, block: &[f32]) {
        let capacity = self.samples.len();
        let start = self.written.load(Ordering::Relaxed);
        // Only the tail of an oversized block survives.
        let skip = block.len().saturating_sub(capacity);
        for (offset, &sample) in block.iter().enumerate().skip(skip) {
            let slot = (start + offset) % capacity;
            self.samples[slot].store(sample.to_bits(), Ordering::Relaxed);
        }
        self.written
            .store(start.wrapping_add(block.len()), Ordering::Release);
    }

    /// Copies the most recent `out.len()` samples into `out`, oldest first
    /// (control thread).
    ///
    /// Positions not yet written, or beyond the tap's capacity, read as `0.0`.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let capacity = self.samples.len();
        let written = self.written.load(Ordering::Acquire);
        let available = written.min(capacity).min(out.len());
        let silent = out.len() - available;

        out[..silent].fill(0.0);
        let first = written.wrapping_sub(available);
        for (i, slot) in out[silent..].iter_mut().enumerate() {
            let index = first.wrapping_add(i) % capacity;
            *slot = f32::from_bits(self.samples[index].load(Ordering::Relaxed));
        }
    }
}
