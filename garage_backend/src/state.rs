//! Artifact loading and shared request state.

use std::path::Path;
use std::sync::Arc;

use vehicle_health::catalog;
use vehicle_health::RandomForestClassifier;

pub const CLASSIFIER_FILE: &str = "vehicle_model.bin";
pub const CATALOG_FILE: &str = "bike_list.json";

const CATALOG_LOAD_ERROR: &str = "Error Loading Data";

/// Immutable per-process dependencies, loaded once at startup and shared
/// by every request.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Option<RandomForestClassifier>>,
    pub catalog: Arc<Vec<String>>,
}

impl AppState {
    /// Loads both artifacts, degrading gracefully: a missing classifier
    /// leaves the fallback probability in play, a missing catalog leaves a
    /// single placeholder entry. The service starts either way.
    pub fn load(artifact_dir: &Path) -> Self {
        let classifier = match RandomForestClassifier::load(artifact_dir.join(CLASSIFIER_FILE)) {
            Ok(model) => {
                tracing::info!("classifier artifact loaded");
                Some(model)
            }
            Err(e) => {
                tracing::warn!("failed to load classifier: {e}; did you run model_trainer?");
                None
            }
        };

        let catalog = match catalog::load_catalog(artifact_dir.join(CATALOG_FILE)) {
            Ok(list) => {
                tracing::info!("bike catalog loaded ({} entries)", list.len());
                list
            }
            Err(e) => {
                tracing::warn!("failed to load bike catalog: {e}");
                vec![CATALOG_LOAD_ERROR.to_string()]
            }
        };

        Self {
            classifier: Arc::new(classifier),
            catalog: Arc::new(catalog),
        }
    }
}
