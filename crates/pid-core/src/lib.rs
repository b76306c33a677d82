//! # pid-core
//!
//! Shared building blocks for particle-identification (PID) weight lookup:
//! the error type, charged-particle hypotheses, PID detectors and the
//! [`WeightSource`] trait consumed by likelihood combination.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::WeightSource;
pub use types::{ChargedStable, Detector, DetectorSet};
