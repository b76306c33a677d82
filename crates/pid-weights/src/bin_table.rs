//! Two-dimensional non-uniform bin table with named value columns.
//!
//! A [`BinTable`] is built once from calibration rows and then only read. Edges of each
//! dimension are the exact union of every row's lower and upper edge. Rows are addressed
//! by a linearised bin index
//!
//! `key = (bin1 - 1) + (bin2 - 1) * n_bins1`
//!
//! where `bin1`/`bin2` are the 1-based indices carried by the row itself. At lookup time
//! the indices are recomputed from the edges with a lower-bound search (first edge
//! `>= x`), whose 0-based position is used directly as the 1-based bin index. Bins
//! therefore behave as `(lo, hi]`: a point on an interior edge belongs to the bin below
//! and a point on the lowest edge is out of range. Points outside the edge range of either
//! dimension are rejected before linearisation.

use crate::calibration::CalibrationRow;
use pid_core::{Error, Result};
use std::collections::HashMap;

/// Summary of a table build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildReport {
    /// Number of input rows.
    pub n_rows: usize,
    /// Number of bins in dimension 1.
    pub n_bins1: usize,
    /// Number of bins in dimension 2.
    pub n_bins2: usize,
    /// Rows whose linearised bin index replaced an earlier row's.
    pub collisions: usize,
}

/// Immutable binned lookup table for one hypothesis.
#[derive(Debug, Clone, Default)]
pub struct BinTable {
    dim1_edges: Vec<f64>,
    dim2_edges: Vec<f64>,
    n_bins1: usize,
    linear_index_to_row: HashMap<u64, usize>,
    columns: HashMap<String, Vec<f64>>,
    is_empty: bool,
    report: BuildReport,
}

/// Hash key of a linearised bin index. `-0.0` and `0.0` map to the same key.
fn linear_key(bin1: f64, bin2: f64, n_bins1: usize) -> u64 {
    let key = (bin1 - 1.0) + (bin2 - 1.0) * n_bins1 as f64;
    (key + 0.0).to_bits()
}

fn sorted_unique_edges(
    rows: &[CalibrationRow],
    span: impl Fn(&CalibrationRow) -> [f64; 2],
    dim: &str,
) -> Result<Vec<f64>> {
    let mut edges = Vec::with_capacity(rows.len() * 2);
    for (i, row) in rows.iter().enumerate() {
        for e in span(row) {
            if !e.is_finite() {
                return Err(Error::Validation(format!(
                    "BinTable {dim} edge must be finite, got {e} in row {i}"
                )));
            }
            edges.push(e + 0.0);
        }
    }
    edges.sort_by(f64::total_cmp);
    edges.dedup();
    Ok(edges)
}

impl BinTable {
    /// Table for a hypothesis without calibration. Every lookup yields `None`.
    pub fn empty() -> Self {
        Self { is_empty: true, ..Self::default() }
    }

    /// Build a table from calibration rows.
    ///
    /// Each name in `column_names` becomes a value column; every row must carry a value for
    /// it. Extra row values are ignored. No rows yields [`BinTable::empty`].
    ///
    /// Rows with the same linearised bin index overwrite earlier ones; the number of such
    /// overwrites is reported in [`BuildReport::collisions`].
    pub fn build<S: AsRef<str>>(rows: &[CalibrationRow], column_names: &[S]) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Self::empty());
        }

        let dim1_edges = sorted_unique_edges(rows, |r| [r.dim1.lower, r.dim1.upper], "dim1")?;
        let dim2_edges = sorted_unique_edges(rows, |r| [r.dim2.lower, r.dim2.upper], "dim2")?;
        let n_bins1 = dim1_edges.len() - 1;
        let n_bins2 = dim2_edges.len() - 1;

        let mut linear_index_to_row = HashMap::with_capacity(rows.len());
        let mut collisions = 0usize;
        for (i, row) in rows.iter().enumerate() {
            let key = linear_key(row.dim1.index, row.dim2.index, n_bins1);
            if let Some(prev) = linear_index_to_row.insert(key, i) {
                collisions += 1;
                log::debug!(
                    "BinTable: row {i} (bins {}, {}) overwrites row {prev}",
                    row.dim1.index,
                    row.dim2.index
                );
            }
        }

        let mut columns = HashMap::with_capacity(column_names.len());
        for name in column_names {
            let name: &str = name.as_ref();
            let col = rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    row.value(name).ok_or_else(|| {
                        Error::Validation(format!(
                            "BinTable row {i} has no value for column '{name}'"
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            columns.insert(name.to_string(), col);
        }

        let report = BuildReport { n_rows: rows.len(), n_bins1, n_bins2, collisions };
        Ok(Self {
            dim1_edges,
            dim2_edges,
            n_bins1,
            linear_index_to_row,
            columns,
            is_empty: false,
            report,
        })
    }

    /// True when built without calibration rows.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Sorted unique edges of dimension 1.
    pub fn dim1_edges(&self) -> &[f64] {
        &self.dim1_edges
    }

    /// Sorted unique edges of dimension 2.
    pub fn dim2_edges(&self) -> &[f64] {
        &self.dim2_edges
    }

    /// Number of bins in dimension 1 (linearisation stride).
    pub fn n_bins1(&self) -> usize {
        self.n_bins1
    }

    /// Number of bins in dimension 2.
    pub fn n_bins2(&self) -> usize {
        self.report.n_bins2
    }

    /// Build summary.
    pub fn report(&self) -> BuildReport {
        self.report
    }

    /// Number of build rows.
    pub fn n_rows(&self) -> usize {
        self.report.n_rows
    }

    /// Registered value column names (unordered).
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Value column `name`, indexed by row.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Bin indices of a point as used for lookup.
    ///
    /// Each index is the position of the first edge `>= x` and is interpreted as 1-based.
    pub fn bin_indices(&self, dim1: f64, dim2: f64) -> (usize, usize) {
        (
            self.dim1_edges.partition_point(|e| *e < dim1),
            self.dim2_edges.partition_point(|e| *e < dim2),
        )
    }

    /// Row index for the point `(dim1, dim2)`, if the point falls in a calibrated bin.
    pub fn row_at(&self, dim1: f64, dim2: f64) -> Option<usize> {
        let (idx1, idx2) = self.bin_indices(dim1, dim2);
        // Outside the edges the linearised key would alias a bin of the next/previous row.
        if idx1 == 0 || idx1 > self.n_bins1 || idx2 == 0 || idx2 > self.report.n_bins2 {
            return None;
        }
        self.linear_index_to_row.get(&linear_key(idx1 as f64, idx2 as f64, self.n_bins1)).copied()
    }

    /// Value of `column` at `(dim1, dim2)`.
    ///
    /// Returns `Ok(None)` for a table without calibration or a point outside the
    /// calibrated bins, and [`Error::UnregisteredColumn`] if `column` was not built.
    pub fn try_lookup(&self, dim1: f64, dim2: f64, column: &str) -> Result<Option<f64>> {
        if self.is_empty {
            return Ok(None);
        }
        let values = self
            .columns
            .get(column)
            .ok_or_else(|| Error::UnregisteredColumn { column: column.to_string() })?;

        match self.row_at(dim1, dim2) {
            Some(row) => Ok(Some(values[row])),
            None => {
                let (idx1, idx2) = self.bin_indices(dim1, dim2);
                log::warn!(
                    "dim1 = {dim1}, dim2 = {dim2} - Either is outside of bin range. \
                     Bin indexes: ({idx1}, {idx2})."
                );
                Ok(None)
            }
        }
    }

    /// Value of `column` at `(dim1, dim2)`, `None` when not available.
    ///
    /// Requesting an unregistered column is a caller bug: it panics in debug builds and
    /// yields `None` otherwise.
    pub fn lookup(&self, dim1: f64, dim2: f64, column: &str) -> Option<f64> {
        match self.try_lookup(dim1, dim2, column) {
            Ok(v) => v,
            Err(e) => {
                if cfg!(debug_assertions) {
                    panic!("BinTable lookup contract violation: {e}");
                }
                log::error!("BinTable lookup contract violation: {e}");
                None
            }
        }
    }

    /// Like [`BinTable::lookup`] with NaN as the "not available" sentinel.
    pub fn value(&self, dim1: f64, dim2: f64, column: &str) -> f64 {
        self.lookup(dim1, dim2, column).unwrap_or(f64::NAN)
    }
}
