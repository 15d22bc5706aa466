//! CSV ingest.
//!
//! Measurement files are plain CSV with a header row:
//! - real sweeps: `x,y`
//! - complex sweeps: `x,re,im`
//! - waveforms (for spectra): `t,i` or `t,i,q`
//!
//! Headers are matched case-insensitively after trimming (a UTF-8 BOM on the
//! first header is ignored); extra columns are ignored. Ingest is strict: the
//! first malformed row aborts with an error naming its line.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use num_complex::Complex64;

use crate::domain::Dataset;
use crate::error::AppError;

/// Time-domain waveform: in-phase channel plus optional quadrature.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub t: Vec<f64>,
    pub i: Vec<f64>,
    pub q: Option<Vec<f64>>,
}

/// Load a real (`x,y`) or complex (`x,re,im`) dataset.
pub fn load_dataset(path: &Path, complex: bool) -> Result<Dataset, AppError> {
    let file = open(path)?;
    read_dataset(file, complex)
}

/// Parse a dataset from any CSV source.
pub fn read_dataset<R: Read>(source: R, complex: bool) -> Result<Dataset, AppError> {
    let table = Table::read(source)?;
    let x_col = table.require(&["x", "f", "freq", "frequency", "t", "time"], "x")?;

    let mut x = Vec::with_capacity(table.rows.len());
    let dataset = if complex {
        let re_col = table.require(&["re", "real", "i"], "re")?;
        let im_col = table.require(&["im", "imag", "q"], "im")?;
        let mut y = Vec::with_capacity(table.rows.len());
        for (line, record) in &table.rows {
            x.push(field(record, x_col, *line, "x")?);
            let re = field(record, re_col, *line, "re")?;
            let im = field(record, im_col, *line, "im")?;
            y.push(Complex64::new(re, im));
        }
        Dataset::complex(x, y)
    } else {
        let y_col = table.require(&["y"], "y")?;
        let mut y = Vec::with_capacity(table.rows.len());
        for (line, record) in &table.rows {
            x.push(field(record, x_col, *line, "x")?);
            y.push(field(record, y_col, *line, "y")?);
        }
        Dataset::real(x, y)
    };

    if dataset.is_empty() {
        return Err(AppError::new(3, "CSV contains no data rows."));
    }
    Ok(dataset)
}

/// Load a waveform (`t,i` or `t,i,q`).
pub fn load_waveform(path: &Path) -> Result<Waveform, AppError> {
    let file = open(path)?;
    read_waveform(file)
}

pub fn read_waveform<R: Read>(source: R) -> Result<Waveform, AppError> {
    let table = Table::read(source)?;
    let t_col = table.require(&["t", "time", "x"], "t")?;
    let i_col = table.require(&["i", "y", "re"], "i")?;
    let q_col = table.find(&["q", "im"]);

    let mut t = Vec::with_capacity(table.rows.len());
    let mut i = Vec::with_capacity(table.rows.len());
    let mut q = q_col.map(|_| Vec::with_capacity(table.rows.len()));
    for (line, record) in &table.rows {
        t.push(field(record, t_col, *line, "t")?);
        i.push(field(record, i_col, *line, "i")?);
        if let (Some(col), Some(q)) = (q_col, q.as_mut()) {
            q.push(field(record, col, *line, "q")?);
        }
    }

    if t.is_empty() {
        return Err(AppError::new(3, "CSV contains no data rows."));
    }
    Ok(Waveform { t, i, q })
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path)
        .map_err(|e| AppError::new(3, format!("Failed to open CSV '{}': {e}", path.display())))
}

/// Header lookup plus records tagged with their 1-based line numbers.
struct Table {
    headers: HashMap<String, usize>,
    rows: Vec<(usize, StringRecord)>,
}

impl Table {
    fn read<R: Read>(source: R) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| AppError::new(3, format!("Failed to read CSV headers: {e}")))?
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result
                .map_err(|e| AppError::new(3, format!("line {}: CSV parse error: {e}", idx + 2)))?;
            // Header is line 1.
            let line = record
                .position()
                .map_or(idx + 2, |p| p.line() as usize);
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push((line, record));
        }
        Ok(Self { headers, rows })
    }

    fn find(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.headers.get(*n).copied())
    }

    fn require(&self, names: &[&str], label: &str) -> Result<usize, AppError> {
        self.find(names)
            .ok_or_else(|| AppError::new(3, format!("Missing required column: `{label}`")))
    }
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn field(record: &StringRecord, col: usize, line: usize, label: &str) -> Result<f64, AppError> {
    let raw = record
        .get(col)
        .ok_or_else(|| AppError::new(3, format!("line {line}: missing `{label}` value")))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| AppError::new(3, format!("line {line}: invalid `{label}` value '{raw}'")))?;
    if !value.is_finite() {
        return Err(AppError::new(3, format!("line {line}: non-finite `{label}` value '{raw}'")));
    }
    Ok(value)
}
