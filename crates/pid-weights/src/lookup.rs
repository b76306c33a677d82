//! Per-hypothesis dispatch over [`BinTable`]s.

use crate::bin_table::{BinTable, BuildReport};
use crate::calibration::{CalibrationFrame, CalibrationRow, detector_column, detector_columns};
use pid_core::{ChargedStable, Detector, Error, Result, WeightSource};
use std::collections::HashMap;
use std::sync::Arc;

/// Detector weight lookup keyed by hypothesis (PDG code).
///
/// Tables are shared as `Arc<BinTable>` and replaced wholesale on recalibration; a reader
/// holding a table keeps a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct WeightLookup {
    tables: HashMap<i32, Arc<BinTable>>,
}

impl WeightLookup {
    /// Lookup without any registered table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh table for `hypothesis` and swap it in.
    ///
    /// On error the previously registered table (if any) stays in place.
    pub fn rebuild<S: AsRef<str>>(
        &mut self,
        hypothesis: i32,
        rows: &[CalibrationRow],
        column_names: &[S],
    ) -> Result<BuildReport> {
        let table = BinTable::build(rows, column_names)?;
        let report = table.report();
        if report.collisions > 0 {
            log::debug!(
                "hypothesis {hypothesis}: {} calibration rows overwrote an earlier row \
                 with the same bin index",
                report.collisions
            );
        }
        self.insert_table(hypothesis, table);
        Ok(report)
    }

    /// Register an already built table for `hypothesis`, replacing any previous one.
    pub fn insert_table(&mut self, hypothesis: i32, table: BinTable) -> Option<Arc<BinTable>> {
        self.tables.insert(hypothesis, Arc::new(table))
    }

    /// Replace all tables with per-hypothesis tables built from a calibration frame.
    ///
    /// One table is built for every standard charged hypothesis, using the detector weight
    /// columns. A hypothesis without rows gets an empty table and a warning. Nothing is
    /// replaced unless every table builds.
    pub fn load_frame(&mut self, frame: &CalibrationFrame) -> Result<()> {
        let columns = detector_columns();
        let mut tables = HashMap::with_capacity(ChargedStable::COUNT);
        for hypo in ChargedStable::ALL {
            let pdg = hypo.pdg_code();
            let rows = frame.rows_for(pdg);
            if rows.is_empty() {
                log::warn!(
                    "Couldn't find detector weights in calibration payload \
                     for std charged particle hypothesis: {pdg}"
                );
            }
            let table = BinTable::build(&rows, &columns)?;
            log::debug!(
                "{hypo}: {} rows, {}x{} bins, {} collisions",
                table.n_rows(),
                table.n_bins1(),
                table.n_bins2(),
                table.report().collisions
            );
            tables.insert(pdg, Arc::new(table));
        }
        self.tables = tables;
        Ok(())
    }

    /// Build a lookup from a calibration frame.
    pub fn from_frame(frame: &CalibrationFrame) -> Result<Self> {
        let mut lookup = Self::new();
        lookup.load_frame(frame)?;
        Ok(lookup)
    }

    /// Table registered for `hypothesis`.
    pub fn table(&self, hypothesis: i32) -> Option<&Arc<BinTable>> {
        self.tables.get(&hypothesis)
    }

    /// Registered hypothesis keys, sorted.
    pub fn hypotheses(&self) -> Vec<i32> {
        let mut keys: Vec<i32> = self.tables.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Value of `column` for `hypothesis` at `(dim1, dim2)`, `None` when not available.
    pub fn lookup(&self, hypothesis: i32, dim1: f64, dim2: f64, column: &str) -> Option<f64> {
        self.tables.get(&hypothesis)?.lookup(dim1, dim2, column)
    }

    /// Value of `column` for `hypothesis` at `(dim1, dim2)`; NaN when not available.
    pub fn get(&self, hypothesis: i32, dim1: f64, dim2: f64, column: &str) -> f64 {
        self.lookup(hypothesis, dim1, dim2, column).unwrap_or(f64::NAN)
    }

    /// Weight of detector `det` for `hypo` at momentum `p` and polar angle `theta`; NaN
    /// when not available.
    pub fn weight(&self, hypo: ChargedStable, det: Detector, p: f64, theta: f64) -> f64 {
        self.get(hypo.pdg_code(), p, theta, &detector_column(det))
    }
}

impl WeightSource for WeightLookup {
    fn detector_weight(
        &self,
        hypo: ChargedStable,
        det: Detector,
        p: f64,
        theta: f64,
    ) -> Option<f64> {
        let table = self.tables.get(&hypo.pdg_code())?;
        match table.try_lookup(p, theta, &detector_column(det)) {
            Ok(w) => w,
            // A table built without this detector's column has no weight for it.
            Err(Error::UnregisteredColumn { column }) => {
                log::debug!("{hypo}: no weight column '{column}'");
                None
            }
            Err(e) => {
                log::error!("{hypo}: {det} weight lookup failed: {e}");
                None
            }
        }
    }
}
