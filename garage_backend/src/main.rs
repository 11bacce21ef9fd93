use std::path::PathBuf;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use serde::Deserialize;

use vehicle_health::report::{financial_impact, FALLBACK_FAIL_PROBABILITY};
use vehicle_health::{derive_features, diagnose, health_score, HealthError, SensorReadings};

mod page;
mod state;

use page::ReportView;
use state::AppState;

// ---------- Request types ----------

// All numeric fields arrive as raw strings; validation happens in
// SensorReadings::from_form before any business logic runs.
#[derive(Deserialize, Debug)]
struct PredictForm {
    bike_model: String,
    temp: String,
    voltage: String,
    chain: String,
    vibe: String,
    rpm: String,
    work_exp: String,
}

// ---------- Handlers ----------

async fn home(State(state): State<AppState>) -> Html<String> {
    Html(page::render_page(&state.catalog, None))
}

async fn predict(
    State(state): State<AppState>,
    Form(form): Form<PredictForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let readings = SensorReadings::from_form(
        &form.temp,
        &form.voltage,
        &form.chain,
        &form.vibe,
        &form.rpm,
        &form.work_exp,
    )
    .map_err(error_response)?;

    let features = derive_features(&readings);

    let fail_prob = match state.classifier.as_ref() {
        Some(model) => model
            .fail_probability(features.as_slice())
            .map_err(error_response)?,
        None => FALLBACK_FAIL_PROBABILITY,
    };

    let score = health_score(fail_prob);
    let report = diagnose(score, &readings);
    let impact_pct =
        financial_impact(report.total_cost, readings.work_experience_years).map_err(error_response)?;

    tracing::info!(
        "predict bike={} score={} status={} issues={} cost={}",
        form.bike_model,
        report.score,
        report.status.label(),
        report.issues.len(),
        report.total_cost
    );

    let view = ReportView {
        report,
        bike: form.bike_model,
        impact_pct,
    };
    Ok(Html(page::render_page(&state.catalog, Some(&view))))
}

// Typed errors map to a plain-text body; bad input is the caller's fault,
// everything else is ours.
fn error_response(e: HealthError) -> (StatusCode, String) {
    let status = match e {
        HealthError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, format!("Error: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let artifact_dir: PathBuf = std::env::var("ARTIFACT_DIR")
        .unwrap_or_else(|_| "artifacts".to_string())
        .into();
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let state = AppState::load(&artifact_dir);

    let app = axum::Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_unprocessable_entity() {
        let err = SensorReadings::from_form("abc", "12.6", "22", "3", "4500", "2").unwrap_err();
        let (status, body) = error_response(err);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.starts_with("Error: "));
        assert!(body.contains("temp"));
    }

    #[test]
    fn other_errors_map_to_internal_server_error() {
        let err = HealthError::Computation("estimated income 0 is not positive".to_string());
        let (status, _) = error_response(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
