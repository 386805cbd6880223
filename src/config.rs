use std::path::{Path, PathBuf};

use clap::{Parser, ValueHint};

// ---------------------------------------------------------------------------
// Default file names
// ---------------------------------------------------------------------------

pub const MSC_FILE: &str = "MSC.csv";
pub const CURVES_FILE: &str = "curvedata.csv";
pub const HC_FILE: &str = "HC.csv";

// ---------------------------------------------------------------------------
// DataPaths – the key the table cache is memoized on
// ---------------------------------------------------------------------------

/// Locations of the measurement, curve and hazard-concentration tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPaths {
    pub msc: PathBuf,
    pub curves: PathBuf,
    pub hc: PathBuf,
}

impl DataPaths {
    /// The default file names resolved inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            msc: dir.join(MSC_FILE),
            curves: dir.join(CURVES_FILE),
            hc: dir.join(HC_FILE),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            msc: PathBuf::from(MSC_FILE),
            curves: PathBuf::from(CURVES_FILE),
            hc: PathBuf::from(HC_FILE),
        }
    }
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(author, version, about = "Explore species sensitivity distributions of antibiotics", long_about = None)]
pub struct Cli {
    /// Directory holding MSC.csv, curvedata.csv and HC.csv
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Measurement table (overrides --data-dir)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub msc: Option<PathBuf>,

    /// Curve point table (overrides --data-dir)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub curves: Option<PathBuf>,

    /// Hazardous concentration table (overrides --data-dir)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub hc: Option<PathBuf>,
}

impl Cli {
    pub fn data_paths(&self) -> DataPaths {
        let base = match &self.data_dir {
            Some(dir) => DataPaths::in_dir(dir),
            None => DataPaths::default(),
        };
        DataPaths {
            msc: self.msc.clone().unwrap_or(base.msc),
            curves: self.curves.clone().unwrap_or(base.curves),
            hc: self.hc.clone().unwrap_or(base.hc),
        }
    }
}
