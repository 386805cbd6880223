use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use super::error::DataError;
use super::model::Tables;
use crate::config::DataPaths;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the measurement, curve and hazard-concentration tables.
///
/// Every failure is fatal for the path set: there is no partial load.
pub fn load_tables(paths: &DataPaths) -> Result<Tables> {
    let measurements = load_table(&paths.msc)
        .with_context(|| format!("loading measurement table {}", paths.msc.display()))?;
    let curves = load_table(&paths.curves)
        .with_context(|| format!("loading curve table {}", paths.curves.display()))?;
    let hazards = load_table(&paths.hc)
        .with_context(|| format!("loading HC table {}", paths.hc.display()))?;

    let tables = Tables {
        measurements,
        curves,
        hazards,
    };
    if tables.measurements.is_empty() {
        return Err(DataError::NoMeasurements(paths.msc.clone()).into());
    }

    for finding in tables.validate() {
        log::warn!("{finding}");
    }
    let (n_msc, n_curves, n_hc) = tables.row_counts();
    log::info!(
        "Loaded {n_msc} measurements, {n_curves} curve points and {n_hc} HC estimates for {} antibiotics",
        tables.antibiotics().len()
    );

    Ok(tables)
}

/// Load one table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line
/// * `.json`    – `[{ "Antibiotic": "AMX", "level": "species", ... }, ...]`
/// * `.parquet` – flat columns named like the CSV header
pub fn load_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::UnsupportedFormat(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    reader
        .deserialize()
        .enumerate()
        // Header is line 1, so the first record sits on line 2.
        .map(|(row_no, record)| record.with_context(|| format!("CSV line {}", row_no + 2)))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = match root {
        JsonValue::Array(records) => records,
        _ => bail!("Expected top-level JSON array"),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| serde_json::from_value(rec).with_context(|| format!("JSON record {i}")))
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Each row is turned into a JSON object keyed by column name and then
/// deserialized, so the row types need a single set of serde attributes.
fn load_parquet<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut record = Map::with_capacity(schema.fields().len());
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = cell_to_json(batch.column(col_idx), row, field.name())?;
                record.insert(field.name().clone(), value);
            }
            let parsed = serde_json::from_value(JsonValue::Object(record))
                .with_context(|| format!("parquet row {}", rows.len()))?;
            rows.push(parsed);
        }
    }

    Ok(rows)
}

/// Extract a single cell from an Arrow column as a JSON scalar.
fn cell_to_json(col: &Arc<dyn Array>, row: usize, name: &str) -> Result<JsonValue> {
    if col.is_null(row) {
        return Ok(JsonValue::Null);
    }

    let unsupported = || DataError::UnsupportedColumn {
        column: name.to_string(),
        data_type: format!("{:?}", col.data_type()),
    };

    let value = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>().ok_or_else(unsupported)?;
            JsonValue::String(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<LargeStringArray>()
                .ok_or_else(unsupported)?;
            JsonValue::String(arr.value(row).to_string())
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().ok_or_else(unsupported)?;
            JsonValue::from(arr.value(row))
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().ok_or_else(unsupported)?;
            JsonValue::from(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().ok_or_else(unsupported)?;
            float_to_json(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().ok_or_else(unsupported)?;
            float_to_json(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().ok_or_else(unsupported)?;
            JsonValue::Bool(arr.value(row))
        }
        _ => return Err(unsupported().into()),
    };
    Ok(value)
}

// NaN has no JSON form; pandas writes missing floats as NaN.
fn float_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CurvePoint, HazardConcentration, Level, Measurement};
    use std::fs;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    const MSC_CSV: &str = "\
Antibiotic,CASRN,level,MSC,PAF,name,Genus
AMX,26787-78-0,species,0.25,0.1,Escherichia coli,Escherichia
AMX,26787-78-0,genus,0.5,0.5,Escherichia,
CIP,85721-33-1,species,0.004,0.3,Klebsiella oxytoca,Klebsiella
";
    const CURVES_CSV: &str = "\
Antibiotic,level,MSC,PAF
AMX,species,0.1,0.01
AMX,genus,0.1,0.02
";
    const HC_CSV: &str = "\
Antibiotic,level,cutoff,HC,method
AMX,species,0.05,0.031,lognormal
AMX,genus,0.05,0.044,lognormal
";

    fn write_csv_dir(dir: &Path) -> DataPaths {
        let paths = DataPaths::in_dir(dir);
        fs::write(&paths.msc, MSC_CSV).unwrap();
        fs::write(&paths.curves, CURVES_CSV).unwrap();
        fs::write(&paths.hc, HC_CSV).unwrap();
        paths
    }

    #[test]
    fn test_load_csv_tables() {
        let dir = tempdir().unwrap();
        let paths = write_csv_dir(dir.path());

        let tables = load_tables(&paths).unwrap();
        assert_eq!(tables.row_counts(), (3, 2, 2));

        let first = &tables.measurements[0];
        assert_eq!(first.antibiotic, "AMX");
        assert_eq!(first.casrn, "26787-78-0");
        assert_eq!(first.level, Level::Species);
        assert_eq!(first.msc, 0.25);
        assert_eq!(first.genus.as_deref(), Some("Escherichia"));
        // Empty Genus cell
        assert_eq!(tables.measurements[1].genus, None);

        assert_eq!(tables.hazards[1].level, Level::Genus);
        assert_eq!(tables.hazards[1].hc, 0.044);
    }

    #[test]
    fn test_na_cells_are_missing() {
        let dir = tempdir().unwrap();
        let paths = write_csv_dir(dir.path());
        fs::write(
            &paths.msc,
            "\
Antibiotic,CASRN,level,MSC,PAF,name,Genus
AMX,26787-78-0,species,0.25,0.1,Escherichia coli,NA
AMX,26787-78-0,species,NA,0.2,Klebsiella oxytoca,Klebsiella
AMX,26787-78-0,species,1,0.3,Pseudomonas putida,N/A
",
        )
        .unwrap();

        let tables = load_tables(&paths).unwrap();
        let genera: Vec<Option<&str>> = tables
            .measurements
            .iter()
            .map(|m| m.genus.as_deref())
            .collect();
        assert_eq!(genera, vec![None, Some("Klebsiella"), None]);
        assert!(tables.measurements[1].msc.is_nan());
        assert_eq!(tables.measurements[2].msc, 1.0);
        assert_eq!(tables.validate().len(), 1);
    }

    #[test]
    fn test_non_numeric_msc_is_error() {
        let dir = tempdir().unwrap();
        let paths = write_csv_dir(dir.path());
        fs::write(
            &paths.msc,
            "Antibiotic,CASRN,level,MSC,PAF,name,Genus\nAMX,26787-78-0,species,high,0.1,E. coli,Escherichia\n",
        )
        .unwrap();
        assert!(load_tables(&paths).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::in_dir(dir.path());
        let err = load_tables(&paths).unwrap_err();
        assert!(format!("{err:#}").contains("loading measurement table"));
    }

    #[test]
    fn test_missing_column_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curves.csv");
        fs::write(&path, "Antibiotic,level,MSC\nAMX,species,0.1\n").unwrap();
        assert!(load_table::<CurvePoint>(&path).is_err());
    }

    #[test]
    fn test_unknown_level_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hc.csv");
        fs::write(&path, "Antibiotic,level,cutoff,HC\nAMX,family,0.05,0.1\n").unwrap();
        let err = load_table::<HazardConcentration>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("CSV line 2"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_table::<CurvePoint>(Path::new("curves.xlsx")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_empty_measurement_table_is_error() {
        let dir = tempdir().unwrap();
        let paths = write_csv_dir(dir.path());
        fs::write(&paths.msc, "Antibiotic,CASRN,level,MSC,PAF,name,Genus\n").unwrap();
        let err = load_tables(&paths).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::NoMeasurements(_))
        ));
    }

    #[test]
    fn test_load_json_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MSC.json");
        fs::write(
            &path,
            r#"[{"Antibiotic":"AMX","CASRN":"26787-78-0","level":"genus","MSC":2,"PAF":0.5,"name":"Klebsiella","Genus":null}]"#,
        )
        .unwrap();
        let rows: Vec<Measurement> = load_table(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].msc, 2.0);
        assert_eq!(rows[0].genus, None);
    }

    #[test]
    fn test_load_parquet_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("HC.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Antibiotic", DataType::Utf8, false),
            Field::new("level", DataType::Utf8, false),
            Field::new("cutoff", DataType::Float64, false),
            Field::new("HC", DataType::Float32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["AMX", "AMX"])),
                Arc::new(StringArray::from(vec!["species", "genus"])),
                Arc::new(Float64Array::from(vec![0.05, 0.1])),
                Arc::new(Float32Array::from(vec![0.5f32, 0.25])),
            ],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let rows: Vec<HazardConcentration> = load_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].level, Level::Species);
        assert_eq!(rows[1].cutoff, 0.1);
        assert_eq!(rows[1].hc, 0.25);
    }
}
