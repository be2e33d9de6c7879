//! Peak and RMS levels in decibels.
//!
//! Both functions follow the full-scale convention: an amplitude of `1.0`
//! is 0 dB. Silence (all zeros, or an empty buffer) is negative infinity,
//! which widgets are expected to clamp to their own floor.

use knobkit_core::gain_to_db;

/// Largest absolute sample value.
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}

/// Root mean square of the buffer; `0.0` when empty.
pub fn rms(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = buffer.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    (sum_sq / buffer.len() as f64).sqrt() as f32
}

/// Peak level in dB: `20·log10(max |x|)`.
pub fn peak_db(buffer: &[f32]) -> f32 {
    gain_to_db(f64::from(peak(buffer))) as f32
}

/// RMS level in dB: `20·log10(sqrt(mean(x²)))`.
pub fn rms_db(buffer: &[f32]) -> f32 {
    gain_to_db(f64::from(rms(buffer))) as f32
}
