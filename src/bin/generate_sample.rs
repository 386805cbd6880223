use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const CUTOFFS: [f64; 3] = [0.05, 0.1, 0.5];
const CURVE_POINTS: usize = 120;

/// (antibiotic, CASRN, mean log2 MSC, sd log2 MSC)
const ANTIBIOTICS: [(&str, &str, f64, f64); 4] = [
    ("AMX", "26787-78-0", -1.0, 2.5),
    ("CIP", "85721-33-1", -6.0, 3.0),
    ("TET", "60-54-8", 0.5, 2.0),
    ("ERY", "114-07-8", 1.5, 2.8),
];

const ORGANISMS: [(&str, &[&str]); 6] = [
    ("Escherichia", &["Escherichia coli", "Escherichia albertii", "Escherichia fergusonii"]),
    ("Klebsiella", &["Klebsiella pneumoniae", "Klebsiella oxytoca"]),
    ("Pseudomonas", &["Pseudomonas aeruginosa", "Pseudomonas putida", "Pseudomonas fluorescens"]),
    ("Staphylococcus", &["Staphylococcus aureus", "Staphylococcus epidermidis"]),
    ("Enterococcus", &["Enterococcus faecalis", "Enterococcus faecium"]),
    ("Acinetobacter", &["Acinetobacter baumannii"]),
];

#[derive(Parser, Debug)]
#[command(about = "Write a synthetic SSD dataset (CSV and Parquet)")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "sample_data")]
    out: PathBuf,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Serialize)]
struct MscRow {
    #[serde(rename = "Antibiotic")]
    antibiotic: &'static str,
    #[serde(rename = "CASRN")]
    casrn: &'static str,
    level: &'static str,
    #[serde(rename = "MSC")]
    msc: f64,
    #[serde(rename = "PAF")]
    paf: f64,
    name: String,
    #[serde(rename = "Genus")]
    genus: &'static str,
}

#[derive(Serialize)]
struct CurveRow {
    #[serde(rename = "Antibiotic")]
    antibiotic: &'static str,
    level: &'static str,
    #[serde(rename = "MSC")]
    msc: f64,
    #[serde(rename = "PAF")]
    paf: f64,
}

#[derive(Serialize)]
struct HcRow {
    #[serde(rename = "Antibiotic")]
    antibiotic: &'static str,
    level: &'static str,
    cutoff: f64,
    #[serde(rename = "HC")]
    hc: f64,
}

// ---------------------------------------------------------------------------
// Normal distribution helpers
// ---------------------------------------------------------------------------

/// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7.
fn erf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.3275911 * x.abs());
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let y = 1.0 - poly * (-x * x).exp();
    if x >= 0.0 { y } else { -y }
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Inverse of [`normal_cdf`] by bisection.
fn normal_quantile(p: f64) -> f64 {
    let (mut lo, mut hi) = (-10.0, 10.0);
    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        if normal_cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// SSD fitting
// ---------------------------------------------------------------------------

/// Log2-normal SSD fitted to a set of (name, genus, MSC) observations.
struct Fit {
    mean: f64,
    sd: f64,
}

impl Fit {
    fn new(mscs: &[f64]) -> Self {
        let logs: Vec<f64> = mscs.iter().map(|m| m.log2()).collect();
        let n = logs.len() as f64;
        let mean = logs.iter().sum::<f64>() / n;
        let var = logs.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
        Fit {
            mean,
            sd: var.sqrt().max(0.1),
        }
    }

    fn paf(&self, concentration: f64) -> f64 {
        normal_cdf((concentration.log2() - self.mean) / self.sd)
    }

    fn hc(&self, cutoff: f64) -> f64 {
        (self.mean + self.sd * normal_quantile(cutoff)).exp2()
    }
}

/// Plotting positions (Hazen) of observations ranked by MSC.
fn ranked_paf(observations: &mut [(String, &'static str, f64)]) -> Vec<f64> {
    observations.sort_by(|a, b| a.2.total_cmp(&b.2));
    let n = observations.len() as f64;
    (0..observations.len()).map(|i| (i as f64 + 0.5) / n).collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let mut msc_rows = Vec::new();
    let mut curve_rows = Vec::new();
    let mut hc_rows = Vec::new();

    for &(antibiotic, casrn, mu, sigma) in &ANTIBIOTICS {
        // Species observations; genus observations are the geometric mean of their species.
        let mut species: Vec<(String, &'static str, f64)> = Vec::new();
        let mut genera: Vec<(String, &'static str, f64)> = Vec::new();
        for &(genus, members) in &ORGANISMS {
            let shift = rng.gauss(0.0, sigma * 0.6);
            let logs: Vec<f64> = members
                .iter()
                .map(|_| mu + shift + rng.gauss(0.0, sigma * 0.4))
                .collect();
            for (name, log_msc) in members.iter().zip(&logs) {
                species.push((name.to_string(), genus, log_msc.exp2()));
            }
            let mean_log = logs.iter().sum::<f64>() / logs.len() as f64;
            genera.push((genus.to_string(), genus, mean_log.exp2()));
        }

        for (level, observations) in [("species", &mut species), ("genus", &mut genera)] {
            let pafs = ranked_paf(observations);
            let mscs: Vec<f64> = observations.iter().map(|o| o.2).collect();
            let fit = Fit::new(&mscs);

            for ((name, genus, msc), paf) in observations.iter().zip(pafs) {
                msc_rows.push(MscRow {
                    antibiotic,
                    casrn,
                    level,
                    msc: *msc,
                    paf,
                    name: name.clone(),
                    genus: *genus,
                });
            }

            let lo = fit.mean - 4.0 * fit.sd;
            let hi = fit.mean + 4.0 * fit.sd;
            for i in 0..CURVE_POINTS {
                let log_x = lo + (hi - lo) * i as f64 / (CURVE_POINTS - 1) as f64;
                let msc = log_x.exp2();
                curve_rows.push(CurveRow {
                    antibiotic,
                    level,
                    msc,
                    paf: fit.paf(msc),
                });
            }

            for cutoff in CUTOFFS {
                hc_rows.push(HcRow {
                    antibiotic,
                    level,
                    cutoff,
                    hc: fit.hc(cutoff),
                });
            }
        }
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    write_csv(&args.out.join("MSC.csv"), &msc_rows)?;
    write_csv(&args.out.join("curvedata.csv"), &curve_rows)?;
    write_csv(&args.out.join("HC.csv"), &hc_rows)?;

    write_parquet(
        &args.out.join("MSC.parquet"),
        vec![
            ("Antibiotic", strings(msc_rows.iter().map(|r| r.antibiotic))),
            ("CASRN", strings(msc_rows.iter().map(|r| r.casrn))),
            ("level", strings(msc_rows.iter().map(|r| r.level))),
            ("MSC", floats(msc_rows.iter().map(|r| r.msc))),
            ("PAF", floats(msc_rows.iter().map(|r| r.paf))),
            ("name", strings(msc_rows.iter().map(|r| r.name.as_str()))),
            ("Genus", strings(msc_rows.iter().map(|r| r.genus))),
        ],
    )?;
    write_parquet(
        &args.out.join("curvedata.parquet"),
        vec![
            ("Antibiotic", strings(curve_rows.iter().map(|r| r.antibiotic))),
            ("level", strings(curve_rows.iter().map(|r| r.level))),
            ("MSC", floats(curve_rows.iter().map(|r| r.msc))),
            ("PAF", floats(curve_rows.iter().map(|r| r.paf))),
        ],
    )?;
    write_parquet(
        &args.out.join("HC.parquet"),
        vec![
            ("Antibiotic", strings(hc_rows.iter().map(|r| r.antibiotic))),
            ("level", strings(hc_rows.iter().map(|r| r.level))),
            ("cutoff", floats(hc_rows.iter().map(|r| r.cutoff))),
            ("HC", floats(hc_rows.iter().map(|r| r.hc))),
        ],
    )?;

    println!(
        "Wrote {} observations, {} curve points and {} HC estimates to {}",
        msc_rows.len(),
        curve_rows.len(),
        hc_rows.len(),
        args.out.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn strings<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<_>>()))
}

fn floats(values: impl Iterator<Item = f64>) -> ArrayRef {
    Arc::new(Float64Array::from(values.collect::<Vec<_>>()))
}

fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) -> Result<()> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_quantile_inverts_cdf() {
        for p in CUTOFFS {
            assert!((normal_cdf(normal_quantile(p)) - p).abs() < 1e-6);
        }
        assert!(normal_quantile(0.5).abs() < 1e-6);
    }

    #[test]
    fn test_fit_hc_matches_paf() {
        let fit = Fit::new(&[0.25, 0.5, 1.0, 2.0, 4.0]);
        assert!((fit.mean - 0.0).abs() < 1e-12);
        for cutoff in CUTOFFS {
            assert!((fit.paf(fit.hc(cutoff)) - cutoff).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ranked_paf_hazen() {
        let mut obs = vec![
            ("b".to_string(), "G", 2.0),
            ("a".to_string(), "G", 1.0),
        ];
        assert_eq!(ranked_paf(&mut obs), vec![0.25, 0.75]);
        assert_eq!(obs[0].0, "a");
    }
}
