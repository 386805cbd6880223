use std::fmt;

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Level – the aggregation unit an SSD was estimated for
// ---------------------------------------------------------------------------

/// Aggregation unit of an observation, curve point or HC estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Species,
    Genus,
}

impl Level {
    /// Fixed choice list, in the order the estimation-unit selector offers it.
    pub const ALL: [Level; 2] = [Level::Species, Level::Genus];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Species => "species",
            Level::Genus => "genus",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Species
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rows of the three input tables
// ---------------------------------------------------------------------------

/// Rows that carry the shared (Antibiotic, level) key.
pub trait Keyed {
    fn antibiotic(&self) -> &str;
    fn level(&self) -> Level;
}

/// One organism observation (a row of `MSC.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(rename = "Antibiotic")]
    pub antibiotic: String,
    #[serde(rename = "CASRN")]
    pub casrn: String,
    pub level: Level,
    /// Minimum selective concentration (mg/L); NaN when the cell is missing.
    #[serde(rename = "MSC", deserialize_with = "number_or_missing")]
    pub msc: f64,
    /// Potentially affected fraction.
    #[serde(rename = "PAF", deserialize_with = "number_or_missing")]
    pub paf: f64,
    pub name: String,
    #[serde(rename = "Genus", default, deserialize_with = "category_or_missing")]
    pub genus: Option<String>,
}

/// One point of a fitted SSD curve (a row of `curvedata.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    #[serde(rename = "Antibiotic")]
    pub antibiotic: String,
    pub level: Level,
    #[serde(rename = "MSC")]
    pub msc: f64,
    #[serde(rename = "PAF")]
    pub paf: f64,
}

/// One hazardous-concentration estimate (a row of `HC.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardConcentration {
    #[serde(rename = "Antibiotic")]
    pub antibiotic: String,
    pub level: Level,
    /// Affected fraction the HC belongs to, e.g. `0.05` for HC5.
    pub cutoff: f64,
    #[serde(rename = "HC")]
    pub hc: f64,
}

// ---------------------------------------------------------------------------
// Missing cells
// ---------------------------------------------------------------------------

/// Cell texts that mean "no value", as in pandas' default `na_values`.
const MISSING_MARKERS: [&str; 9] = ["", "NA", "N/A", "n/a", "<NA>", "NaN", "nan", "NULL", "null"];

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Optional text column; empty and NA cells become `None`.
fn category_or_missing<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<String>::deserialize(deserializer)?;
    Ok(cell.filter(|c| !is_missing(c)))
}

/// Numeric column that tolerates missing cells, read as NaN. Rows with a
/// NaN coordinate are dropped when drawn.
fn number_or_missing<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a missing value")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            if is_missing(v) {
                return Ok(f64::NAN);
            }
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(f64::NAN)
        }

        fn visit_none<E: de::Error>(self) -> Result<f64, E> {
            Ok(f64::NAN)
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn antibiotic(&self) -> &str {
                &self.antibiotic
            }
            fn level(&self) -> Level {
                self.level
            }
        })*
    };
}

impl_keyed!(Measurement, CurvePoint, HazardConcentration);

// ---------------------------------------------------------------------------
// Tables – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The three input tables, loaded once and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub measurements: Vec<Measurement>,
    pub curves: Vec<CurvePoint>,
    pub hazards: Vec<HazardConcentration>,
}

impl Tables {
    /// Distinct antibiotics of the measurement table, in first-seen order.
    pub fn antibiotics(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for m in &self.measurements {
            if !seen.contains(&m.antibiotic.as_str()) {
                seen.push(&m.antibiotic);
            }
        }
        seen
    }

    /// CASRN of the first measurement row for `antibiotic`.
    pub fn casrn(&self, antibiotic: &str) -> Option<&str> {
        self.measurements
            .iter()
            .find(|m| m.antibiotic == antibiotic)
            .map(|m| m.casrn.as_str())
    }

    /// Row counts as (measurements, curve points, hazard estimates).
    pub fn row_counts(&self) -> (usize, usize, usize) {
        (self.measurements.len(), self.curves.len(), self.hazards.len())
    }

    /// Soft consistency checks. Each finding is a human readable message;
    /// none of them prevents the data from being shown.
    pub fn validate(&self) -> Vec<String> {
        let mut findings = Vec::new();

        for antibiotic in self.antibiotics() {
            let Some(first) = self.casrn(antibiotic) else {
                continue;
            };
            let other = self
                .measurements
                .iter()
                .filter(|m| m.antibiotic == antibiotic)
                .find(|m| m.casrn != first);
            if let Some(m) = other {
                findings.push(format!(
                    "{antibiotic}: CASRN differs between rows ({first} vs {})",
                    m.casrn
                ));
            }
        }

        let bad_msc = self
            .measurements
            .iter()
            .filter(|m| m.msc.is_nan() || m.msc <= 0.0)
            .count();
        if bad_msc > 0 {
            findings.push(format!(
                "{bad_msc} measurement rows have a missing or non-positive MSC and cannot be placed on the log axis"
            ));
        }
        let bad_paf = self
            .measurements
            .iter()
            .filter(|m| !(0.0..=1.0).contains(&m.paf))
            .count();
        if bad_paf > 0 {
            findings.push(format!("{bad_paf} measurement rows have a PAF outside [0, 1]"));
        }
        let bad_hc = self.hazards.iter().filter(|h| h.hc <= 0.0).count();
        if bad_hc > 0 {
            findings.push(format!("{bad_hc} HC rows have a non-positive concentration"));
        }

        findings
    }
}
