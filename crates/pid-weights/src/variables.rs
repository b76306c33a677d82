//! Candidate-level PID variables.
//!
//! These are the scalar values handed to analysis code. They use NaN for "PID information
//! absent": no likelihood object for the candidate, no information from any detector in
//! the requested set, or an unknown hypothesis.

use crate::likelihood::{PidLikelihood, Weighting};
use pid_core::{ChargedStable, DetectorSet};

/// Flat priors over all charged hypotheses.
pub const FLAT_PRIORS: [f64; ChargedStable::COUNT] = [1.0; ChargedStable::COUNT];

/// `pid` if it carries information for `hypo` in `set`.
fn informative(
    pid: Option<&PidLikelihood>,
    hypo: ChargedStable,
    set: DetectorSet,
) -> Option<&PidLikelihood> {
    pid.filter(|pid| pid.log_l(hypo, set) != 0.0)
}

fn hypothesis(pdg: i32) -> Option<ChargedStable> {
    let hypo = ChargedStable::from_pdg_code(pdg);
    if hypo.is_none() {
        log::debug!("PDG code {pdg} is not a standard charged hypothesis");
    }
    hypo
}

/// Summed log-likelihood of `pdg` over `set`.
pub fn pid_log_likelihood_value(pid: Option<&PidLikelihood>, pdg: i32, set: DetectorSet) -> f64 {
    let Some(hypo) = hypothesis(pdg) else { return f64::NAN };
    informative(pid, hypo, set).map_or(f64::NAN, |pid| pid.log_l(hypo, set))
}

/// `logL(hyp) - logL(test)` over `set`.
pub fn pid_delta_log_likelihood_value(
    pid: Option<&PidLikelihood>,
    pdg_hyp: i32,
    pdg_test: i32,
    set: DetectorSet,
) -> f64 {
    let (Some(hyp), Some(test)) = (hypothesis(pdg_hyp), hypothesis(pdg_test)) else {
        return f64::NAN;
    };
    informative(pid, hyp, set).map_or(f64::NAN, |pid| pid.log_l(hyp, set) - pid.log_l(test, set))
}

/// Probability of `pdg_hyp` against `pdg_test` over `set`.
pub fn pid_pair_probability(
    pid: Option<&PidLikelihood>,
    pdg_hyp: i32,
    pdg_test: i32,
    set: DetectorSet,
) -> f64 {
    weighted_pid_pair_probability(pid, pdg_hyp, pdg_test, set, None)
}

/// Posterior probability of `pdg` among all charged hypotheses with flat priors.
pub fn pid_probability(pid: Option<&PidLikelihood>, pdg: i32, set: DetectorSet) -> f64 {
    weighted_pid_probability(pid, pdg, set, None)
}

/// 1 if some detector of `set` provided no information, 0 otherwise.
pub fn pid_missing_probability(pid: Option<&PidLikelihood>, set: DetectorSet) -> f64 {
    match pid {
        None => f64::NAN,
        Some(pid) if pid.is_available(set) => 0.0,
        Some(_) => 1.0,
    }
}

/// [`pid_pair_probability`] with detector weighting.
pub fn weighted_pid_pair_probability(
    pid: Option<&PidLikelihood>,
    pdg_hyp: i32,
    pdg_test: i32,
    set: DetectorSet,
    weighting: Option<&Weighting<'_>>,
) -> f64 {
    let (Some(hyp), Some(test)) = (hypothesis(pdg_hyp), hypothesis(pdg_test)) else {
        return f64::NAN;
    };
    informative(pid, hyp, set)
        .map_or(f64::NAN, |pid| pid.pair_probability(hyp, test, set, weighting))
}

/// [`pid_probability`] with detector weighting.
pub fn weighted_pid_probability(
    pid: Option<&PidLikelihood>,
    pdg: i32,
    set: DetectorSet,
    weighting: Option<&Weighting<'_>>,
) -> f64 {
    let Some(hypo) = hypothesis(pdg) else { return f64::NAN };
    informative(pid, hypo, set)
        .map_or(f64::NAN, |pid| pid.probability(hypo, &FLAT_PRIORS, set, weighting))
}

/// Global probability for the candidate's own species, using all detectors.
///
/// The sign of `pdg` is ignored. Species outside the standard charged set yield NaN.
pub fn particle_id(pid: Option<&PidLikelihood>, pdg: i32) -> f64 {
    pid_probability(pid, pdg, DetectorSet::all())
}

/// Binary probability of `pdg_hyp` against `pdg_test` using all detectors.
pub fn binary_pid(pid: Option<&PidLikelihood>, pdg_hyp: i32, pdg_test: i32) -> f64 {
    pid_pair_probability(pid, pdg_hyp, pdg_test, DetectorSet::all())
}

/// [`particle_id`] with detector weighting.
pub fn weighted_particle_id(
    pid: Option<&PidLikelihood>,
    pdg: i32,
    weighting: &Weighting<'_>,
) -> f64 {
    weighted_pid_probability(pid, pdg, DetectorSet::all(), Some(weighting))
}

/// [`binary_pid`] with detector weighting.
pub fn weighted_binary_pid(
    pid: Option<&PidLikelihood>,
    pdg_hyp: i32,
    pdg_test: i32,
    weighting: &Weighting<'_>,
) -> f64 {
    weighted_pid_pair_probability(pid, pdg_hyp, pdg_test, DetectorSet::all(), Some(weighting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pid_core::Detector;

    fn track() -> PidLikelihood {
        PidLikelihood::new()
            .with_detector(Detector::Cdc, [-2.0, -1.0, -1.0, -3.0, -3.0, -3.0])
            .with_detector(Detector::Top, [-1.0, -1.0, -1.0, -0.5, -3.0, -3.0])
    }

    #[test]
    fn test_no_likelihood_is_nan() {
        assert!(particle_id(None, 11).is_nan());
        assert!(binary_pid(None, 11, 211).is_nan());
        assert!(pid_missing_probability(None, DetectorSet::all()).is_nan());
    }

    #[test]
    fn test_no_information_in_set_is_nan() {
        let pid = track();
        let ecl = DetectorSet::from(Detector::Ecl);
        assert!(pid_log_likelihood_value(Some(&pid), 211, ecl).is_nan());
        assert!(pid_probability(Some(&pid), 211, ecl).is_nan());
        assert!(pid_pair_probability(Some(&pid), 211, 321, ecl).is_nan());
    }

    #[test]
    fn test_unknown_species_is_nan() {
        let pid = track();
        assert!(particle_id(Some(&pid), 22).is_nan());
        assert!(binary_pid(Some(&pid), 211, 3122).is_nan());
    }

    #[test]
    fn test_values() {
        let pid = track();
        let set = DetectorSet::parse(&["cdc", "top"]);
        assert_relative_eq!(pid_log_likelihood_value(Some(&pid), -211, set), -2.0);
        assert_relative_eq!(pid_delta_log_likelihood_value(Some(&pid), 321, 211, set), -1.5);
        assert_relative_eq!(
            binary_pid(Some(&pid), 211, 321),
            1.0 / (1.0 + (-1.5f64).exp()),
            epsilon = 1e-12
        );
        assert_eq!(pid_missing_probability(Some(&pid), set), 0.0);
        assert_eq!(pid_missing_probability(Some(&pid), DetectorSet::all()), 1.0);
    }

    #[test]
    fn test_particle_id_matches_pid_probability() {
        let pid = track();
        let expected = pid_probability(Some(&pid), 13, DetectorSet::all());
        assert_eq!(particle_id(Some(&pid), -13), expected);
    }
}
