//! Core traits for PID weight lookup
//!
//! Likelihood combination only needs "a weight for this hypothesis, detector and
//! phase-space point". Keeping that behind a trait lets it be tested against fixed
//! weights without building calibration tables.

use crate::types::{ChargedStable, Detector};

/// Source of per-detector PID weights.
pub trait WeightSource: Send + Sync {
    /// Weight of `det` for hypothesis `hypo` at momentum `p` and polar angle `theta`.
    ///
    /// `None` means no calibrated weight exists for this point. Implementations must not
    /// substitute a default value.
    fn detector_weight(&self, hypo: ChargedStable, det: Detector, p: f64, theta: f64)
    -> Option<f64>;
}

impl<T: WeightSource + ?Sized> WeightSource for &T {
    fn detector_weight(
        &self,
        hypo: ChargedStable,
        det: Detector,
        p: f64,
        theta: f64,
    ) -> Option<f64> {
        (**self).detector_weight(hypo, det, p, theta)
    }
}
