//! Loading detector weights from a calibration payload and using them in PID.

use approx::assert_relative_eq;
use pid_core::{ChargedStable, Detector, DetectorSet, WeightSource};
use pid_weights::variables::{binary_pid, particle_id, weighted_binary_pid, weighted_particle_id};
use pid_weights::{CalibrationFrame, MissingWeight, PidLikelihood, WeightLookup, Weighting};

/// Electron and pion weights on a 2 (p) x 2 (theta) grid; no other hypothesis.
const PAYLOAD: &str = r#"{
    "pdg_id":        [11,   11,   11,   11,   211,  211,  211,  211],
    "p_min":         [0.1,  1.0,  0.1,  1.0,  0.1,  1.0,  0.1,  1.0],
    "p_max":         [1.0,  5.0,  1.0,  5.0,  1.0,  5.0,  1.0,  5.0],
    "p_bin_idx":     [1,    2,    1,    2,    1,    2,    1,    2],
    "theta_min":     [0.3,  0.3,  1.6,  1.6,  0.3,  0.3,  1.6,  1.6],
    "theta_max":     [1.6,  1.6,  2.6,  2.6,  1.6,  1.6,  2.6,  2.6],
    "theta_bin_idx": [1,    1,    2,    2,    1,    1,    2,    2],
    "ablat_s_SVD":   [0.0,  0.0,  0.0,  0.0,  0.1,  0.1,  0.1,  0.1],
    "ablat_s_CDC":   [1.0,  0.9,  0.8,  0.7,  1.0,  1.0,  1.0,  1.0],
    "ablat_s_TOP":   [1.0,  1.0,  1.0,  1.0,  0.5,  0.6,  0.7,  0.8],
    "ablat_s_ARICH": [1.0,  1.0,  1.0,  1.0,  1.0,  1.0,  1.0,  1.0],
    "ablat_s_ECL":   [0.25, 0.5,  0.75, 1.0,  1.0,  1.0,  1.0,  1.0],
    "ablat_s_KLM":   [1.0,  1.0,  1.0,  1.0,  1.0,  1.0,  1.0,  1.0]
}"#;

fn lookup() -> WeightLookup {
    let frame = CalibrationFrame::from_json_str(PAYLOAD).unwrap();
    WeightLookup::from_frame(&frame).unwrap()
}

#[test]
fn every_hypothesis_gets_a_table() {
    let lookup = lookup();
    let mut expected: Vec<i32> = ChargedStable::ALL.iter().map(|h| h.pdg_code()).collect();
    expected.sort_unstable();
    assert_eq!(lookup.hypotheses(), expected);

    assert!(!lookup.table(11).unwrap().is_empty());
    assert!(!lookup.table(211).unwrap().is_empty());
    assert!(lookup.table(321).unwrap().is_empty());
}

#[test]
fn detector_weights_per_bin() {
    let lookup = lookup();
    let e = ChargedStable::Electron;
    assert_eq!(lookup.weight(e, Detector::Ecl, 0.5, 1.0), 0.25);
    assert_eq!(lookup.weight(e, Detector::Ecl, 2.0, 1.0), 0.5);
    assert_eq!(lookup.weight(e, Detector::Ecl, 0.5, 2.0), 0.75);
    assert_eq!(lookup.weight(e, Detector::Ecl, 2.0, 2.0), 1.0);
    assert_eq!(lookup.weight(ChargedStable::Pion, Detector::Top, 2.0, 2.0), 0.8);

    assert_eq!(lookup.get(11, 2.0, 2.0, "ablat_s_CDC"), 0.7);
}

#[test]
fn missing_calibration_is_nan_not_error() {
    let lookup = lookup();
    assert!(lookup.weight(ChargedStable::Kaon, Detector::Ecl, 2.0, 1.0).is_nan());
    assert_eq!(lookup.detector_weight(ChargedStable::Proton, Detector::Cdc, 2.0, 1.0), None);
    assert!(lookup.weight(ChargedStable::Electron, Detector::Ecl, 6.0, 1.0).is_nan());
}

#[test]
fn reload_replaces_all_tables() {
    let mut lookup = lookup();
    let kaons_only = PAYLOAD.replace("211,  211,  211,  211", "321,  321,  321,  321");
    lookup.load_frame(&CalibrationFrame::from_json_str(&kaons_only).unwrap()).unwrap();

    assert!(lookup.table(211).unwrap().is_empty());
    assert_eq!(lookup.weight(ChargedStable::Kaon, Detector::Top, 2.0, 2.0), 0.8);
}

#[test]
fn payload_without_detector_column_is_rejected() {
    let no_klm = PAYLOAD.replace(
        ",\n    \"ablat_s_KLM\":   [1.0,  1.0,  1.0,  1.0,  1.0,  1.0,  1.0,  1.0]",
        "",
    );
    assert_ne!(no_klm, PAYLOAD);
    let frame = CalibrationFrame::from_json_str(&no_klm).unwrap();

    let mut lookup = WeightLookup::new();
    assert!(lookup.load_frame(&frame).is_err());
    assert!(lookup.hypotheses().is_empty());
}

#[test]
fn payload_from_file() {
    let file_name = format!("pid_weights_payload_{}.json", std::process::id());
    let path = std::env::temp_dir().join(file_name);
    std::fs::write(&path, PAYLOAD).unwrap();
    let frame = CalibrationFrame::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(frame.n_rows(), 8);
}

#[test]
fn weighted_pid_uses_calibrated_weights() {
    let lookup = lookup();
    // Electron-like in ECL, pion-like in CDC.
    let pid = PidLikelihood::new()
        .with_detector(Detector::Cdc, [-3.0, -2.0, -1.0, -4.0, -5.0, -6.0])
        .with_detector(Detector::Ecl, [-1.0, -6.0, -5.0, -6.0, -6.0, -6.0]);

    let (p, theta) = (0.5, 1.0);
    let w = Weighting::new(&lookup, p, theta);

    // Electron: 1.0 * -3 + 0.25 * -1 ; pion: 1.0 * -1 + 1.0 * -5.
    let all = DetectorSet::all();
    assert_relative_eq!(pid.weighted_log_l(ChargedStable::Electron, all, &w), -3.25);
    assert_relative_eq!(pid.weighted_log_l(ChargedStable::Pion, all, &w), -6.0);

    let weighted = weighted_binary_pid(Some(&pid), 11, 211, &w);
    assert_relative_eq!(weighted, 1.0 / (1.0 + (-2.75f64).exp()), epsilon = 1e-12);
    // Unweighted: electron -4, pion -6.
    assert_relative_eq!(
        binary_pid(Some(&pid), 11, 211),
        1.0 / (1.0 + (-2.0f64).exp()),
        epsilon = 1e-12
    );
}

#[test]
fn weighted_pid_missing_weights() {
    let lookup = lookup();
    let pid =
        PidLikelihood::new().with_detector(Detector::Ecl, [-1.0, -2.0, -2.0, -2.0, -2.0, -2.0]);

    // Kaon/proton/muon/deuteron tables are empty, so their weights are missing.
    let unit = Weighting::new(&lookup, 0.5, 1.0);
    assert!(weighted_particle_id(Some(&pid), 11, &unit).is_finite());
    assert_ne!(weighted_particle_id(Some(&pid), 11, &unit), particle_id(Some(&pid), 11));

    let propagate = unit.with_missing(MissingWeight::Propagate);
    assert!(weighted_particle_id(Some(&pid), 11, &propagate).is_nan());
    assert!(weighted_binary_pid(Some(&pid), 11, 211, &propagate).is_finite());
}
