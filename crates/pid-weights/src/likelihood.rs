//! Combination of per-detector PID log-likelihoods into probabilities.
//!
//! Log-likelihoods are summed over the requested detectors, optionally scaled by a
//! per-detector weight from a [`WeightSource`], and turned into a posterior probability
//! with the given priors.

use pid_core::{ChargedStable, Detector, DetectorSet, WeightSource};

/// What to do when a detector weight is not available for the candidate's phase-space point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingWeight {
    /// Use the detector's log-likelihood unweighted (weight 1).
    #[default]
    UnitWeight,
    /// Make the combined log-likelihood NaN.
    Propagate,
}

/// Detector weighting for one candidate.
#[derive(Clone, Copy)]
pub struct Weighting<'a> {
    /// Weight source, usually a [`crate::WeightLookup`].
    pub source: &'a dyn WeightSource,
    /// Candidate momentum.
    pub p: f64,
    /// Candidate polar angle.
    pub theta: f64,
    /// Missing-weight policy.
    pub missing: MissingWeight,
}

impl<'a> Weighting<'a> {
    /// Weighting at `(p, theta)` with the default missing-weight policy.
    pub fn new(source: &'a dyn WeightSource, p: f64, theta: f64) -> Self {
        Self { source, p, theta, missing: MissingWeight::default() }
    }

    /// Override the missing-weight policy.
    pub fn with_missing(mut self, missing: MissingWeight) -> Self {
        self.missing = missing;
        self
    }

    fn factor(&self, hypo: ChargedStable, det: Detector) -> f64 {
        match self.source.detector_weight(hypo, det, self.p, self.theta) {
            Some(w) if !w.is_nan() => w,
            _ => match self.missing {
                MissingWeight::UnitWeight => {
                    log::debug!(
                        "no {det} weight for {hypo} at p = {}, theta = {}; using unit weight",
                        self.p,
                        self.theta
                    );
                    1.0
                }
                MissingWeight::Propagate => f64::NAN,
            },
        }
    }
}

/// Per-detector log-likelihoods of one track for every charged hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidLikelihood {
    log_l: [[f64; ChargedStable::COUNT]; Detector::COUNT],
    detectors: DetectorSet,
}

/// `P(hyp)` for two hypotheses with prior ratio `ratio = prior_hyp / prior_test`.
///
/// Written to avoid overflow of `exp` for large log-likelihood differences.
pub fn pair_probability_from_log_l(log_l_hyp: f64, log_l_test: f64, ratio: f64) -> f64 {
    let dlogl = log_l_test - log_l_hyp;
    if dlogl < 0.0 {
        let elog = dlogl.exp();
        ratio / (ratio + elog)
    } else {
        let elog = (-dlogl).exp() * ratio;
        elog / (1.0 + elog)
    }
}

impl PidLikelihood {
    /// No detector information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the log-likelihoods of `det` for every hypothesis (indexed like
    /// [`ChargedStable::ALL`]) and mark the detector available.
    pub fn set_log_likelihoods(&mut self, det: Detector, log_l: [f64; ChargedStable::COUNT]) {
        self.log_l[det.index()] = log_l;
        self.detectors.insert(det);
    }

    /// Builder-style [`PidLikelihood::set_log_likelihoods`].
    pub fn with_detector(mut self, det: Detector, log_l: [f64; ChargedStable::COUNT]) -> Self {
        self.set_log_likelihoods(det, log_l);
        self
    }

    /// Detectors that provided information.
    pub fn detectors(&self) -> DetectorSet {
        self.detectors
    }

    /// True if every detector of `set` provided information.
    pub fn is_available(&self, set: DetectorSet) -> bool {
        set.iter().all(|det| self.detectors.contains(det))
    }

    /// Log-likelihood of `det` for `hypo` (0 when the detector is unavailable).
    pub fn detector_log_l(&self, hypo: ChargedStable, det: Detector) -> f64 {
        if self.detectors.contains(det) { self.log_l[det.index()][hypo.index()] } else { 0.0 }
    }

    /// Sum of log-likelihoods of `hypo` over the available detectors of `set`.
    pub fn log_l(&self, hypo: ChargedStable, set: DetectorSet) -> f64 {
        set.iter().map(|det| self.detector_log_l(hypo, det)).sum()
    }

    /// Weighted sum of log-likelihoods of `hypo` over the available detectors of `set`.
    pub fn weighted_log_l(
        &self,
        hypo: ChargedStable,
        set: DetectorSet,
        weighting: &Weighting<'_>,
    ) -> f64 {
        set.iter()
            .filter(|det| self.detectors.contains(*det))
            .map(|det| weighting.factor(hypo, det) * self.detector_log_l(hypo, det))
            .sum()
    }

    /// Combined log-likelihood, weighted if `weighting` is given.
    pub fn combined_log_l(
        &self,
        hypo: ChargedStable,
        set: DetectorSet,
        weighting: Option<&Weighting<'_>>,
    ) -> f64 {
        match weighting {
            Some(w) => self.weighted_log_l(hypo, set, w),
            None => self.log_l(hypo, set),
        }
    }

    /// Probability of `hyp` against `test` with equal priors.
    pub fn pair_probability(
        &self,
        hyp: ChargedStable,
        test: ChargedStable,
        set: DetectorSet,
        weighting: Option<&Weighting<'_>>,
    ) -> f64 {
        let l_hyp = self.combined_log_l(hyp, set, weighting);
        let l_test = self.combined_log_l(test, set, weighting);
        if l_hyp.is_nan() || l_test.is_nan() {
            return f64::NAN;
        }
        pair_probability_from_log_l(l_hyp, l_test, 1.0)
    }

    /// Posterior probability of `hyp` among all charged hypotheses.
    ///
    /// `priors` are indexed like [`ChargedStable::ALL`] and need not be normalised.
    /// Hypotheses with non-positive prior are excluded. Returns NaN if any combined
    /// log-likelihood is NaN or no hypothesis has a positive prior.
    pub fn probability(
        &self,
        hyp: ChargedStable,
        priors: &[f64; ChargedStable::COUNT],
        set: DetectorSet,
        weighting: Option<&Weighting<'_>>,
    ) -> f64 {
        let log_l = ChargedStable::ALL.map(|h| self.combined_log_l(h, set, weighting));
        if log_l.iter().any(|l| l.is_nan()) {
            return f64::NAN;
        }

        let max = ChargedStable::ALL
            .iter()
            .filter(|h| priors[h.index()] > 0.0)
            .map(|h| log_l[h.index()])
            .fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            return f64::NAN;
        }

        let mut norm = 0.0;
        let mut target = 0.0;
        for h in ChargedStable::ALL {
            let prior = priors[h.index()];
            if prior <= 0.0 {
                continue;
            }
            let term = prior * (log_l[h.index()] - max).exp();
            norm += term;
            if h == hyp {
                target = term;
            }
        }
        target / norm
    }
}
