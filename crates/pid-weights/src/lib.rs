//! # pid-weights
//!
//! Binned detector-weight lookup for particle identification.
//!
//! This crate provides:
//! - [`BinTable`]: a 2D non-uniform bin table built once from calibration rows, with
//!   named value columns and NaN/`None` for points outside the calibrated phase space.
//! - [`WeightLookup`]: per-hypothesis dispatch over bin tables, loaded from a
//!   [`CalibrationFrame`] and swapped wholesale on recalibration.
//! - [`PidLikelihood`] and the [`variables`] module: combination of per-detector
//!   log-likelihoods into (optionally weighted) PID probabilities.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bin_table;
pub mod calibration;
pub mod likelihood;
pub mod lookup;
pub mod variables;

pub use bin_table::{BinTable, BuildReport};
pub use calibration::{
    BinSpan, CalibrationFrame, CalibrationRow, DETECTOR_COLUMN_PREFIX, detector_column,
    detector_columns,
};
pub use likelihood::{MissingWeight, PidLikelihood, Weighting, pair_probability_from_log_l};
pub use lookup::WeightLookup;
