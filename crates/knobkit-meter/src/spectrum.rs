//! Windowed, smoothed magnitude spectrum in dB.
//!
//! Each analysis pass:
//!
//! 1. Multiplies the latest `fft_size` samples by a Blackman window
//! 2. Runs a forward FFT and keeps the first `fft_size / 2` bins
//! 3. Normalises each magnitude by `fft_size`
//! 4. Blends with the previous pass: `s = τ·s_prev + (1 - τ)·|X|`
//! 5. Converts to dB; a zero magnitude reads as negative infinity

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

/// Blackman window coefficients for `size` samples.
pub fn blackman_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let x = 2.0 * PI * i as f32 / size as f32;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

/// Reusable spectrum analyser; all buffers are allocated up front.
pub(crate) struct Spectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
}

impl Spectrum {
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();
        Self {
            fft,
            window: blackman_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            smoothed: vec![0.0; fft_size / 2],
            smoothing,
        }
    }

    /// Analyses `frame` (exactly `fft_size` samples) into `out` (`fft_size / 2` dB values).
    pub fn analyse(&mut self, frame: &[f32], out: &mut [f32]) {
        let n = self.buffer.len();
        for ((slot, &x), &w) in self.buffer.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex::new(x * w, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let tau = self.smoothing;
        let scale = 1.0 / n as f32;
        for ((s, bin), db) in self
            .smoothed
            .iter_mut()
            .zip(&self.buffer)
            .zip(out.iter_mut())
        {
            *s = tau * *s + (1.0 - tau) * bin.norm() * scale;
            *db = if *s > 0.0 {
                20.0 * s.log10()
            } else {
                f32::NEG_INFINITY
            };
        }
    }
}

impl std::fmt::Debug for Spectrum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spectrum")
            .field("fft_size", &self.buffer.len())
            .field("smoothing", &self.smoothing)
            .finish_non_exhaustive()
    }
}
