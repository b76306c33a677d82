//! Calibration payload ingestion.
//!
//! The calibration source delivers one flat table for all hypotheses: a `pdg_id` column,
//! the lower/upper edges and 1-based bin indices of both phase-space dimensions, and one
//! weight column per PID detector (`ablat_s_<DETECTOR>`). [`CalibrationFrame`] holds that
//! table column-wise; [`CalibrationFrame::rows_for`] flattens the rows of one hypothesis
//! into [`CalibrationRow`]s for [`crate::BinTable::build`].

use pid_core::{Detector, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Prefix of per-detector weight columns in calibration payloads.
pub const DETECTOR_COLUMN_PREFIX: &str = "ablat_s_";

/// Name of the weight column for `det`.
pub fn detector_column(det: Detector) -> String {
    format!("{DETECTOR_COLUMN_PREFIX}{}", det.name())
}

/// Weight column names of every PID detector, in canonical detector order.
pub fn detector_columns() -> Vec<String> {
    Detector::ALL.into_iter().map(detector_column).collect()
}

/// One dimension of a calibration bin.
///
/// `index` is the 1-based bin index assigned by the calibration producer. It is kept as a
/// float because that is how the payload stores it; it is not checked against the edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSpan {
    /// Lower bin edge.
    pub lower: f64,
    /// Upper bin edge.
    pub upper: f64,
    /// 1-based bin index.
    pub index: f64,
}

impl BinSpan {
    /// Construct a span.
    pub fn new(lower: f64, upper: f64, index: f64) -> Self {
        Self { lower, upper, index }
    }
}

/// A single calibration row: one 2D bin and its named values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    /// Dimension 1 (momentum).
    pub dim1: BinSpan,
    /// Dimension 2 (polar angle).
    pub dim2: BinSpan,
    /// Named values (detector weights).
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

impl CalibrationRow {
    /// Row without values.
    pub fn new(dim1: BinSpan, dim2: BinSpan) -> Self {
        Self { dim1, dim2, values: BTreeMap::new() }
    }

    /// Builder-style value insertion.
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Value of column `name`, if present.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Serialized column layout of a calibration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FrameColumns {
    pdg_id: Vec<f64>,
    p_min: Vec<f64>,
    p_max: Vec<f64>,
    p_bin_idx: Vec<f64>,
    theta_min: Vec<f64>,
    theta_max: Vec<f64>,
    theta_bin_idx: Vec<f64>,
    #[serde(flatten)]
    values: BTreeMap<String, Vec<f64>>,
}

/// Column-wise calibration table covering all hypotheses.
///
/// All columns are guaranteed to have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameColumns", into = "FrameColumns")]
pub struct CalibrationFrame {
    pdg_id: Vec<f64>,
    dim1: [Vec<f64>; 3],
    dim2: [Vec<f64>; 3],
    values: BTreeMap<String, Vec<f64>>,
}

impl CalibrationFrame {
    /// Create a frame from already materialized columns.
    ///
    /// `dim1`/`dim2` are `[lower, upper, bin_index]` columns.
    pub fn from_columns(
        pdg_id: Vec<f64>,
        dim1: [Vec<f64>; 3],
        dim2: [Vec<f64>; 3],
        values: impl IntoIterator<Item = (String, Vec<f64>)>,
    ) -> Result<Self> {
        let n = pdg_id.len();
        let binning = [
            ("p_min", &dim1[0]),
            ("p_max", &dim1[1]),
            ("p_bin_idx", &dim1[2]),
            ("theta_min", &dim2[0]),
            ("theta_max", &dim2[1]),
            ("theta_bin_idx", &dim2[2]),
        ];
        for (name, col) in binning {
            if col.len() != n {
                return Err(Error::Validation(format!(
                    "calibration column length mismatch for '{name}': expected {n}, got {}",
                    col.len()
                )));
            }
            if let Some(i) = col.iter().position(|x| !x.is_finite()) {
                return Err(Error::Validation(format!(
                    "calibration column '{name}' has non-finite value at row {i}: {}",
                    col[i]
                )));
            }
        }

        let values: BTreeMap<String, Vec<f64>> = values.into_iter().collect();
        for (name, col) in &values {
            if col.len() != n {
                return Err(Error::Validation(format!(
                    "calibration column length mismatch for '{name}': expected {n}, got {}",
                    col.len()
                )));
            }
        }

        Ok(Self { pdg_id, dim1, dim2, values })
    }

    /// Parse a JSON payload.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a JSON payload from a reader.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read a JSON payload from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    /// Number of rows (all hypotheses).
    pub fn n_rows(&self) -> usize {
        self.pdg_id.len()
    }

    /// Names of the value columns.
    pub fn value_column_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Value column `name`, if present.
    pub fn value_column(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Rows whose `pdg_id` equals `pdg`, in payload order.
    pub fn rows_for(&self, pdg: i32) -> Vec<CalibrationRow> {
        let target = f64::from(pdg);
        self.pdg_id
            .iter()
            .enumerate()
            .filter(|(_, id)| **id == target)
            .map(|(i, _)| self.row(i))
            .collect()
    }

    fn row(&self, i: usize) -> CalibrationRow {
        let span = |cols: &[Vec<f64>; 3]| BinSpan::new(cols[0][i], cols[1][i], cols[2][i]);
        CalibrationRow {
            dim1: span(&self.dim1),
            dim2: span(&self.dim2),
            values: self.values.iter().map(|(name, col)| (name.clone(), col[i])).collect(),
        }
    }
}

impl TryFrom<FrameColumns> for CalibrationFrame {
    type Error = Error;

    fn try_from(raw: FrameColumns) -> Result<Self> {
        Self::from_columns(
            raw.pdg_id,
            [raw.p_min, raw.p_max, raw.p_bin_idx],
            [raw.theta_min, raw.theta_max, raw.theta_bin_idx],
            raw.values,
        )
    }
}

impl From<CalibrationFrame> for FrameColumns {
    fn from(frame: CalibrationFrame) -> Self {
        let [p_min, p_max, p_bin_idx] = frame.dim1;
        let [theta_min, theta_max, theta_bin_idx] = frame.dim2;
        Self {
            pdg_id: frame.pdg_id,
            p_min,
            p_max,
            p_bin_idx,
            theta_min,
            theta_max,
            theta_bin_idx,
            values: frame.values,
        }
    }
}
