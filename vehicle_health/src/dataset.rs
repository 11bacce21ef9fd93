//! CSV dataset loaders for the offline training step.
//!
//! Each loader owns one fixed schema. The maintenance dataset is
//! positional (the upstream file ships verbose column titles), the bike
//! listing and salary datasets are looked up by header name.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};
use crate::features::FEATURE_NAMES;

/// Minimal row-major table of f32 features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    data: Vec<f32>,
    n_rows: usize,
    n_cols: usize,
}

impl FeatureTable {
    #[must_use]
    pub fn new(n_cols: usize) -> Self {
        Self {
            data: Vec::new(),
            n_rows: 0,
            n_cols,
        }
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row width does not match the table.
    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.n_cols {
            return Err(HealthError::Dataset(format!(
                "row has {} values, table expects {}",
                row.len(),
                self.n_cols
            )));
        }
        self.data.extend_from_slice(row);
        self.n_rows += 1;
        Ok(())
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.n_cols + col]
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// Copies the given rows into a new table of the same width.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            data,
            n_rows: indices.len(),
            n_cols: self.n_cols,
        }
    }
}

/// Predictive-maintenance training data: 5 features plus a binary target.
#[derive(Debug, Clone)]
pub struct MaintenanceDataset {
    pub features: FeatureTable,
    pub targets: Vec<usize>,
}

// Upstream column order: UDI, ID, Type, Air, Process, RPM, Torque, Wear,
// Target, FailType. Features are columns 3..8, target is column 8.
const MAINTENANCE_COLUMNS: usize = 10;
const FEATURE_RANGE: std::ops::Range<usize> = 3..8;
const TARGET_COLUMN: usize = 8;

/// Loads the maintenance CSV with its fixed positional schema.
///
/// # Errors
///
/// Returns a [`HealthError::Dataset`] for a short row or a non-numeric
/// feature/target cell, naming the offending line.
pub fn load_maintenance<P: AsRef<Path>>(path: P) -> Result<MaintenanceDataset> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;

    let mut features = FeatureTable::new(FEATURE_NAMES.len());
    let mut targets = Vec::new();
    let mut line = 2; // first data row, after the header

    for record in reader.records() {
        let record = record?;
        if record.len() < MAINTENANCE_COLUMNS {
            return Err(HealthError::Dataset(format!(
                "line {line}: expected {MAINTENANCE_COLUMNS} columns, found {}",
                record.len()
            )));
        }

        let mut row = [0.0f32; FEATURE_NAMES.len()];
        for (slot, col) in FEATURE_RANGE.enumerate() {
            row[slot] = parse_cell(&record, col, line)?;
        }
        features.push_row(&row)?;

        let target = parse_cell(&record, TARGET_COLUMN, line)?;
        targets.push(if target != 0.0 { 1 } else { 0 });
        line += 1;
    }

    if targets.is_empty() {
        return Err(HealthError::Dataset(
            "maintenance dataset has no rows".to_string(),
        ));
    }

    Ok(MaintenanceDataset { features, targets })
}

fn parse_cell(record: &csv::StringRecord, col: usize, line: usize) -> Result<f32> {
    let raw = record.get(col).unwrap_or("");
    raw.trim().parse().map_err(|_| {
        HealthError::Dataset(format!("line {line}: column {col} value {raw:?} is not numeric"))
    })
}

/// One row of the vehicle listing dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct BikeRecord {
    pub brand: String,
    pub model: String,
    pub year: i32,
}

/// Loads the vehicle listing, keeping only rows with a parseable year.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a required column is
/// missing from the header.
pub fn load_bike_listing<P: AsRef<Path>>(path: P) -> Result<Vec<BikeRecord>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let brand_idx = column_index(&headers, "Brand")?;
    let model_idx = column_index(&headers, "Model")?;
    let year_idx = column_index(&headers, "Year")?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let brand = record.get(brand_idx).unwrap_or("").to_string();
        let model = record.get(model_idx).unwrap_or("").to_string();
        if brand.trim().is_empty() || model.trim().is_empty() {
            continue;
        }
        let Ok(year) = record.get(year_idx).unwrap_or("").trim().parse::<i32>() else {
            continue;
        };
        records.push(BikeRecord { brand, model, year });
    }

    Ok(records)
}

/// Salary training data: years of experience against salary.
#[derive(Debug, Clone)]
pub struct SalaryDataset {
    pub years: Vec<f32>,
    pub salaries: Vec<f32>,
}

/// Loads the salary CSV by header name.
///
/// # Errors
///
/// Returns an error for missing columns or non-numeric cells.
pub fn load_salary<P: AsRef<Path>>(path: P) -> Result<SalaryDataset> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let years_idx = column_index(&headers, "YearsExperience")?;
    let salary_idx = column_index(&headers, "Salary")?;

    let mut years = Vec::new();
    let mut salaries = Vec::new();
    let mut line = 2;

    for record in reader.records() {
        let record = record?;
        years.push(parse_cell(&record, years_idx, line)?);
        salaries.push(parse_cell(&record, salary_idx, line)?);
        line += 1;
    }

    if years.is_empty() {
        return Err(HealthError::Dataset("salary dataset has no rows".to_string()));
    }

    Ok(SalaryDataset { years, salaries })
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| {
            HealthError::Dataset(format!(
                "missing column {name:?}, available: {:?}",
                headers.iter().collect::<Vec<_>>()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn feature_table_round_trips_rows() {
        let mut table = FeatureTable::new(3);
        table.push_row(&[1.0, 2.0, 3.0]).unwrap();
        table.push_row(&[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(table.get(0, 2), 3.0);
    }

    #[test]
    fn feature_table_rejects_wrong_width() {
        let mut table = FeatureTable::new(3);
        assert!(table.push_row(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn feature_table_subset_copies_rows() {
        let mut table = FeatureTable::new(2);
        for i in 0..4 {
            table.push_row(&[i as f32, i as f32 * 10.0]).unwrap();
        }
        let sub = table.subset(&[3, 1, 1]);
        assert_eq!(sub.shape(), (3, 2));
        assert_eq!(sub.row(0), &[3.0, 30.0]);
        assert_eq!(sub.row(2), &[1.0, 10.0]);
    }

    #[test]
    fn maintenance_loader_reads_features_and_target() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "UDI,Product ID,Type,Air,Process,RPM,Torque,Wear,Target,Failure Type")
            .unwrap();
        writeln!(file, "1,M14860,M,298.1,308.6,1551,42.8,0,0,No Failure").unwrap();
        writeln!(file, "2,L47181,L,298.2,308.7,1408,46.3,3,1,Power Failure").unwrap();

        let data = load_maintenance(file.path()).unwrap();
        assert_eq!(data.features.shape(), (2, 5));
        assert_eq!(data.targets, vec![0, 1]);
        assert_eq!(data.features.row(0), &[298.1, 308.6, 1551.0, 42.8, 0.0]);
    }

    #[test]
    fn maintenance_loader_names_bad_line() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "UDI,Product ID,Type,Air,Process,RPM,Torque,Wear,Target,Failure Type")
            .unwrap();
        writeln!(file, "1,M14860,M,298.1,bad,1551,42.8,0,0,No Failure").unwrap();

        let err = load_maintenance(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "got: {err}");
    }

    #[test]
    fn bike_listing_skips_rows_without_year() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "Brand,Model,Year,Category").unwrap();
        writeln!(file, "yamaha ,MT-07,2023,Naked").unwrap();
        writeln!(file, "Honda,CB500F,,Naked").unwrap();
        writeln!(file, ",Ghost,2020,Naked").unwrap();

        let records = load_bike_listing(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].brand, "yamaha ");
        assert_eq!(records[0].year, 2023);
    }

    #[test]
    fn salary_loader_finds_columns_by_name() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, ",YearsExperience,Salary").unwrap();
        writeln!(file, "0,1.2,39344").unwrap();
        writeln!(file, "1,1.4,46206").unwrap();

        let data = load_salary(file.path()).unwrap();
        assert_eq!(data.years, vec![1.2, 1.4]);
        assert_eq!(data.salaries.len(), 2);
    }

    #[test]
    fn salary_loader_reports_missing_column() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "Years,Pay").unwrap();
        writeln!(file, "1.2,39344").unwrap();

        let err = load_salary(file.path()).unwrap_err();
        assert!(err.to_string().contains("YearsExperience"));
    }
}
