//! Exports: fit reports (JSON) and datasets (CSV).
//!
//! Both are meant to be easy to consume from notebooks or downstream scripts.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Dataset, FitResult, Values};
use crate::error::AppError;

/// JSON fit report.
#[derive(Debug, Clone, Serialize)]
pub struct FitReport<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub data: Option<&'a Path>,
    pub result: &'a FitResult,
}

/// Write a fit result as pretty-printed JSON.
pub fn write_fit_report(path: &Path, result: &FitResult, data: Option<&Path>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    let report = FitReport {
        tool: "qfit",
        generated_at: Utc::now(),
        data,
        result,
    };

    serde_json::to_writer_pretty(file, &report)
        .map_err(|e| AppError::new(4, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Write a dataset as `x,y` or `x,re,im` CSV (the ingest format).
pub fn write_dataset_csv(path: &Path, data: &Dataset) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create CSV '{}': {e}", path.display())))?;
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write CSV row: {e}"));

    match &data.y {
        Values::Real(y) => {
            writer.write_record(["x", "y"]).map_err(write_err)?;
            for (x, y) in data.x.iter().zip(y) {
                writer
                    .write_record([x.to_string(), y.to_string()])
                    .map_err(write_err)?;
            }
        }
        Values::Complex(y) => {
            writer.write_record(["x", "re", "im"]).map_err(write_err)?;
            for (x, z) in data.x.iter().zip(y) {
                writer
                    .write_record([x.to_string(), z.re.to_string(), z.im.to_string()])
                    .map_err(write_err)?;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Default report path next to the data file (`sweep.csv` -> `sweep.fit.json`).
pub fn default_report_path(data_path: &Path) -> PathBuf {
    data_path.with_extension("fit.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, Parameter, Parameters};
    use crate::io::ingest::load_dataset;
    use num_complex::Complex64;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("qfit-{}-{name}", std::process::id()))
    }

    #[test]
    fn dataset_csv_reads_back() {
        let path = scratch("complex.csv");
        let data = Dataset::complex(
            vec![7.0e9, 7.1e9],
            vec![Complex64::new(0.5, -0.25), Complex64::new(1.0, 0.0)],
        );
        write_dataset_csv(&path, &data).unwrap();
        let back = load_dataset(&path, true).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, data);
    }

    #[test]
    fn report_contains_result_and_timestamp() {
        let path = scratch("report.json");
        let params = Parameters::new("CosFunc", vec![Parameter::new("amplitude", 1.0)]);
        let mut result = FitResult::failed("CosFunc", &params, 0, "empty dataset");
        result.quality = FitQuality {
            chi_square: 0.5,
            reduced_chi_square: 0.5,
            rmse: 0.1,
            aic: 1.0,
            bic: 2.0,
            n_data: 10,
            n_free: 1,
            nfev: 7,
        };
        write_fit_report(&path, &result, Some(Path::new("sweep.csv"))).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["tool"], "qfit");
        assert_eq!(json["data"], "sweep.csv");
        assert_eq!(json["result"]["model"], "CosFunc");
        assert_eq!(json["result"]["quality"]["nfev"], 7);
        assert!(json["generated_at"].as_str().is_some());
    }

    #[test]
    fn default_report_path_replaces_extension() {
        assert_eq!(
            default_report_path(Path::new("runs/sweep.csv")),
            PathBuf::from("runs/sweep.fit.json")
        );
    }
}
