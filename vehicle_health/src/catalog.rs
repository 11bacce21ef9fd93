//! Bike catalog derivation from the vehicle listing dataset.
//!
//! The form's selection control is populated from a flat list of
//! `"Brand - Model"` strings: seven allow-listed brands, each contributing
//! its ten most-recent-year distinct models.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::dataset::BikeRecord;
use crate::error::{HealthError, Result};

/// Brands kept in the catalog, in display order.
pub const TARGET_BRANDS: [&str; 7] = [
    "Yamaha",
    "Honda",
    "Royal Enfield",
    "Kawasaki",
    "Ktm",
    "Suzuki",
    "Harley-Davidson",
];

const MODELS_PER_BRAND: usize = 10;

/// Title-cases a string: uppercase after any non-letter, lowercase
/// otherwise. `"royal enfield"` becomes `"Royal Enfield"`,
/// `"harley-davidson"` becomes `"Harley-Davidson"`.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Builds the catalog from listing records.
///
/// Brand names are trimmed and title-cased before matching the allow-list.
/// Within a brand, records are ordered by year descending (stable, so
/// equal years keep file order) and the first occurrence of each distinct
/// model wins, capped at ten per brand.
#[must_use]
pub fn build_catalog(records: &[BikeRecord]) -> Vec<String> {
    let mut catalog = Vec::new();

    for brand in TARGET_BRANDS {
        let mut rows: Vec<&BikeRecord> = records
            .iter()
            .filter(|r| title_case(r.brand.trim()) == brand)
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.year));

        let mut seen = HashSet::new();
        for row in rows {
            if seen.insert(row.model.as_str()) {
                catalog.push(format!("{brand} - {}", row.model));
                if seen.len() == MODELS_PER_BRAND {
                    break;
                }
            }
        }
    }

    catalog
}

/// Placeholder catalog written when the bike training job fails, so the
/// serving step never starts with an empty selection control.
#[must_use]
pub fn fallback_catalog() -> Vec<String> {
    vec![
        "Yamaha - Generic Sport".to_string(),
        "Honda - Generic Cruiser".to_string(),
    ]
}

/// Saves the catalog as a JSON artifact.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn save_catalog<P: AsRef<Path>>(path: P, catalog: &[String]) -> Result<()> {
    let json = serde_json::to_string_pretty(catalog)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads a catalog artifact.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or empty.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let json = fs::read_to_string(path)?;
    let catalog: Vec<String> = serde_json::from_str(&json)?;
    if catalog.is_empty() {
        return Err(HealthError::Artifact(
            "catalog artifact is empty".to_string(),
        ));
    }
    Ok(catalog)
}
