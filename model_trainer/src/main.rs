//! Offline training step.
//!
//! Three independent fit-and-serialize jobs. Each one logs and moves on
//! when its dataset is missing or malformed, so a single bad CSV never
//! blocks the other artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use vehicle_health::catalog;
use vehicle_health::dataset;
use vehicle_health::linreg::LinearRegression;
use vehicle_health::{RandomForestClassifier, Result};

const CLASSIFIER_FILE: &str = "vehicle_model.bin";
const CATALOG_FILE: &str = "bike_list.json";
const INCOME_FILE: &str = "salary_model.bin";

const N_ESTIMATORS: usize = 100;
const RANDOM_STATE: u64 = 42;

#[derive(Parser, Debug)]
#[command(about = "Train the vehicle health models from CSV datasets")]
struct Args {
    /// Machine telemetry with binary failure targets
    #[arg(long, default_value = "predictive_maintenance.csv")]
    maintenance_csv: PathBuf,

    /// Vehicle listing used to build the bike catalog
    #[arg(long, default_value = "all_bikez_curated.csv")]
    bikes_csv: PathBuf,

    /// Years-of-experience salary data for the income model
    #[arg(long, default_value = "Salary_dataset.csv")]
    salary_csv: PathBuf,

    /// Directory the serialized artifacts are written to
    #[arg(long, default_value = "artifacts")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    fs::create_dir_all(&args.out_dir)?;

    match train_classifier(&args.maintenance_csv, &args.out_dir) {
        Ok(n) => tracing::info!("classifier trained on {n} samples"),
        Err(e) => tracing::warn!("classifier job skipped: {e}"),
    }

    match build_bike_catalog(&args.bikes_csv, &args.out_dir) {
        Ok(n) => tracing::info!("bike catalog written ({n} entries)"),
        Err(e) => {
            tracing::warn!("bike catalog job failed: {e}; writing placeholder list");
            if let Err(e) = write_fallback_catalog(&args.out_dir) {
                tracing::warn!("placeholder catalog could not be written: {e}");
            }
        }
    }

    match train_income_model(&args.salary_csv, &args.out_dir) {
        Ok(()) => tracing::info!("income model trained"),
        Err(e) => tracing::warn!("income model job skipped: {e}"),
    }

    Ok(())
}

fn train_classifier(csv_path: &Path, out_dir: &Path) -> Result<usize> {
    let data = dataset::load_maintenance(csv_path)?;

    let mut forest = RandomForestClassifier::new(N_ESTIMATORS).with_random_state(RANDOM_STATE);
    forest.fit(&data.features, &data.targets)?;
    forest.save(out_dir.join(CLASSIFIER_FILE))?;

    Ok(data.targets.len())
}

fn build_bike_catalog(csv_path: &Path, out_dir: &Path) -> Result<usize> {
    let records = dataset::load_bike_listing(csv_path)?;
    let list = catalog::build_catalog(&records);
    if list.is_empty() {
        return Err(vehicle_health::HealthError::Dataset(
            "no allow-listed brands found in listing".to_string(),
        ));
    }
    catalog::save_catalog(out_dir.join(CATALOG_FILE), &list)?;
    Ok(list.len())
}

fn write_fallback_catalog(out_dir: &Path) -> Result<()> {
    catalog::save_catalog(out_dir.join(CATALOG_FILE), &catalog::fallback_catalog())
}

fn train_income_model(csv_path: &Path, out_dir: &Path) -> Result<()> {
    let data = dataset::load_salary(csv_path)?;

    let mut model = LinearRegression::new();
    model.fit(&data.years, &data.salaries)?;
    model.save(out_dir.join(INCOME_FILE))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn classifier_job_trains_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = String::from(
            "UDI,Product ID,Type,Air,Process,RPM,Torque,Wear,Target,Failure Type\n",
        );
        for i in 0..8 {
            rows.push_str(&format!("{i},M{i},M,300,360.{i},3000,45,30,0,No Failure\n"));
            rows.push_str(&format!("{i},L{i},L,300,390.{i},1400,10,95,1,Heat Failure\n"));
        }
        let csv = write_csv(dir.path(), "maint.csv", &rows);

        let n = train_classifier(&csv, dir.path()).unwrap();
        assert_eq!(n, 16);

        let forest = RandomForestClassifier::load(dir.path().join(CLASSIFIER_FILE)).unwrap();
        let p = forest
            .fail_probability(&[300.0, 390.5, 1400.0, 10.0, 95.0])
            .unwrap();
        assert!(p > 0.5);
    }

    #[test]
    fn missing_maintenance_csv_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(train_classifier(&missing, dir.path()).is_err());
    }

    #[test]
    fn catalog_job_writes_allow_listed_brands() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(
            dir.path(),
            "bikes.csv",
            "Brand,Model,Year\nyamaha ,MT-07,2023\nDucati,Panigale,2023\nHonda,CB500F,2022\n",
        );

        let n = build_bike_catalog(&csv, dir.path()).unwrap();
        assert_eq!(n, 2);

        let list = catalog::load_catalog(dir.path().join(CATALOG_FILE)).unwrap();
        assert_eq!(list[0], "Yamaha - MT-07");
        assert_eq!(list[1], "Honda - CB500F");
    }

    #[test]
    fn fallback_catalog_is_written_when_job_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_fallback_catalog(dir.path()).unwrap();

        let list = catalog::load_catalog(dir.path().join(CATALOG_FILE)).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].starts_with("Yamaha"));
    }

    #[test]
    fn income_job_fits_the_salary_line() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(
            dir.path(),
            "salary.csv",
            ",YearsExperience,Salary\n0,1.0,2000\n1,2.0,2500\n2,3.0,3000\n",
        );

        train_income_model(&csv, dir.path()).unwrap();

        let model = LinearRegression::load(dir.path().join(INCOME_FILE)).unwrap();
        assert!((model.slope().unwrap() - 500.0).abs() < 1.0);
    }

    #[test]
    fn jobs_are_isolated() {
        // A missing salary CSV must not affect the catalog job and
        // vice versa; each job only touches its own input and output.
        let dir = tempfile::tempdir().unwrap();
        let bikes = write_csv(
            dir.path(),
            "bikes.csv",
            "Brand,Model,Year\nSuzuki,GSX-R750,2022\n",
        );

        assert!(train_income_model(&dir.path().join("missing.csv"), dir.path()).is_err());
        assert!(build_bike_catalog(&bikes, dir.path()).is_ok());
        assert!(train_classifier(&dir.path().join("missing.csv"), dir.path()).is_err());
        assert!(dir.path().join(CATALOG_FILE).exists());
    }
}
