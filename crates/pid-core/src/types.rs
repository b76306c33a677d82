//! Common data types for PID weight lookup

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard long-lived charged particle hypotheses.
///
/// The hypothesis key of a weight table is the (positive) PDG code of the species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargedStable {
    /// e
    Electron,
    /// mu
    Muon,
    /// pi
    Pion,
    /// K
    Kaon,
    /// p
    Proton,
    /// d
    Deuteron,
}

impl ChargedStable {
    /// Number of standard charged hypotheses.
    pub const COUNT: usize = 6;

    /// All hypotheses in canonical order.
    pub const ALL: [ChargedStable; Self::COUNT] = [
        ChargedStable::Electron,
        ChargedStable::Muon,
        ChargedStable::Pion,
        ChargedStable::Kaon,
        ChargedStable::Proton,
        ChargedStable::Deuteron,
    ];

    /// Positive PDG code of the species.
    pub fn pdg_code(self) -> i32 {
        match self {
            ChargedStable::Electron => 11,
            ChargedStable::Muon => 13,
            ChargedStable::Pion => 211,
            ChargedStable::Kaon => 321,
            ChargedStable::Proton => 2212,
            ChargedStable::Deuteron => 1_000_010_020,
        }
    }

    /// Resolve a PDG code, ignoring its sign (charge).
    pub fn from_pdg_code(pdg: i32) -> Option<Self> {
        let abs = pdg.checked_abs()?;
        Self::ALL.into_iter().find(|h| h.pdg_code() == abs)
    }

    /// Position in [`ChargedStable::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ChargedStable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChargedStable::Electron => "electron",
            ChargedStable::Muon => "muon",
            ChargedStable::Pion => "pion",
            ChargedStable::Kaon => "kaon",
            ChargedStable::Proton => "proton",
            ChargedStable::Deuteron => "deuteron",
        };
        write!(f, "{name} ({})", self.pdg_code())
    }
}

/// Sub-detectors providing PID likelihoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Detector {
    /// Silicon vertex detector (dE/dx)
    Svd,
    /// Central drift chamber (dE/dx)
    Cdc,
    /// Time-of-propagation counter
    Top,
    /// Aerogel RICH
    Arich,
    /// Electromagnetic calorimeter
    Ecl,
    /// K-long and muon detector
    Klm,
}

impl Detector {
    /// Number of PID detectors.
    pub const COUNT: usize = 6;

    /// All PID detectors in canonical order.
    pub const ALL: [Detector; Self::COUNT] = [
        Detector::Svd,
        Detector::Cdc,
        Detector::Top,
        Detector::Arich,
        Detector::Ecl,
        Detector::Klm,
    ];

    /// Upper-case detector name, as used in calibration column names.
    pub fn name(self) -> &'static str {
        match self {
            Detector::Svd => "SVD",
            Detector::Cdc => "CDC",
            Detector::Top => "TOP",
            Detector::Arich => "ARICH",
            Detector::Ecl => "ECL",
            Detector::Klm => "KLM",
        }
    }

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name().eq_ignore_ascii_case(name))
    }

    /// Position in [`Detector::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of PID detectors (bit mask over [`Detector::ALL`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DetectorSet(u8);

impl DetectorSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All PID detectors.
    pub fn all() -> Self {
        Detector::ALL.into_iter().collect()
    }

    /// Parse a list of detector names.
    ///
    /// Matching is case-insensitive and `"all"` short-circuits to the full set. Unknown
    /// names are reported via `log::error!` and skipped.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Self {
        let mut set = Self::empty();
        for name in names {
            let name: &str = name.as_ref();
            let name = name.trim();
            if name.eq_ignore_ascii_case("all") {
                return Self::all();
            }
            match Detector::from_name(name) {
                Some(det) => set.insert(det),
                None => log::error!("Unknown detector component: {name}"),
            }
        }
        set
    }

    /// Add a detector.
    pub fn insert(&mut self, det: Detector) {
        self.0 |= det.bit();
    }

    /// Set without `det`.
    pub fn without(self, det: Detector) -> Self {
        Self(self.0 & !det.bit())
    }

    /// Membership test.
    pub fn contains(self, det: Detector) -> bool {
        self.0 & det.bit() != 0
    }

    /// True if no detector is in the set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of detectors in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Detector> {
        Detector::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Detector> for DetectorSet {
    fn from_iter<I: IntoIterator<Item = Detector>>(iter: I) -> Self {
        let mut set = Self::empty();
        for det in iter {
            set.insert(det);
        }
        set
    }
}

impl From<Detector> for DetectorSet {
    fn from(det: Detector) -> Self {
        Self(det.bit())
    }
}
