//! Overlay threshold computation.
//!
//! The cutoff is either a literal value or an approximate percentile of the
//! overlay samples. Percentiles are taken over a strided subsample of at most
//! [`PERCENTILE_SAMPLES`] values, so the cost stays bounded on large
//! volumes.
//!
//! [`PERCENTILE_SAMPLES`]: constant.PERCENTILE_SAMPLES.html

use crate::volume::Volume;
use tracing::trace;

/// Upper bound on the number of samples used to estimate a percentile.
pub const PERCENTILE_SAMPLES: usize = 200_000;

/// Percentile used when the configured one is not a number.
pub const DEFAULT_PERCENTILE: f32 = 95.;

/// How the overlay cutoff is chosen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThresholdMode {
    /// Use the configured value as is
    Value,
    /// Use the configured percentile of the overlay samples
    Percentile,
}

/// Threshold settings of a viewer session.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdConfig {
    /// Which of the two settings below is in effect
    pub mode: ThresholdMode,
    /// Literal cutoff
    pub value: f32,
    /// Percentile in `[0, 100]`
    pub percentile: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            mode: ThresholdMode::Percentile,
            value: 0.,
            percentile: DEFAULT_PERCENTILE,
        }
    }
}

impl ThresholdConfig {
    /// A fixed cutoff.
    pub fn value(value: f32) -> Self {
        ThresholdConfig {
            mode: ThresholdMode::Value,
            value,
            ..Self::default()
        }
    }

    /// A percentile cutoff.
    pub fn percentile(percentile: f32) -> Self {
        ThresholdConfig {
            mode: ThresholdMode::Percentile,
            percentile,
            ..Self::default()
        }
    }

    /// Compute the cutoff for the given overlay. Without an overlay there is
    /// no cutoff at all.
    pub fn resolve(&self, overlay: Option<&Volume>) -> Option<f32> {
        let overlay = overlay?;
        let cutoff = match self.mode {
            ThresholdMode::Value => {
                if self.value.is_nan() {
                    0.
                } else {
                    self.value
                }
            }
            ThresholdMode::Percentile => {
                let p = if self.percentile.is_nan() {
                    DEFAULT_PERCENTILE
                } else {
                    self.percentile
                };
                percentile(overlay.data(), p.max(0.).min(100.))
            }
        };
        trace!(mode = ?self.mode, cutoff, "threshold resolved");
        Some(cutoff)
    }

    /// Clamp the literal value into `[min, max]`. Returns whether it
    /// changed.
    pub fn snap_value(&mut self, min: f32, max: f32) -> bool {
        if self.value < min || self.value > max {
            self.value = self.value.max(min).min(max);
            true
        } else {
            false
        }
    }
}

/// Approximate nearest-rank percentile `p` (in `[0, 100]`) of `data`.
///
/// Every `ceil(len / 200000)`-th value is sampled, the sample is sorted and
/// the value at rank `floor(p / 100 * (n - 1))` is returned. Empty data
/// yields 0.
pub fn percentile(data: &[f32], p: f32) -> f32 {
    if data.is_empty() {
        return 0.;
    }
    let stride = (data.len() + PERCENTILE_SAMPLES - 1) / PERCENTILE_SAMPLES;
    let mut sample: Vec<f32> = data.iter().step_by(stride).copied().collect();
    sample.sort_unstable_by(f32::total_cmp);
    let last = sample.len() - 1;
    let k = (f64::from(p) / 100. * last as f64).floor();
    let k = if k <= 0. { 0 } else { (k as usize).min(last) };
    sample[k]
}
