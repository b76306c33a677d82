#![no_main]

use libfuzzer_sys::fuzz_target;
use pid_weights::{CalibrationFrame, WeightLookup};

fuzz_target!(|data: &[u8]| {
    if data.len() < 16 {
        return;
    }

    // First 16 bytes: lookup point. Rest: JSON payload.
    let x = f64::from_le_bytes(data[0..8].try_into().unwrap_or([0; 8]));
    let y = f64::from_le_bytes(data[8..16].try_into().unwrap_or([0; 8]));

    let Ok(frame) = CalibrationFrame::from_json_reader(&data[16..]) else {
        return;
    };
    let Ok(lookup) = WeightLookup::from_frame(&frame) else {
        return;
    };
    for pdg in lookup.hypotheses() {
        let _ = lookup.get(pdg, x, y, "ablat_s_ECL");
    }
});
