//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, LoadResponse, SampleQuery, StateResponse};
use crate::sim::types::Sample;

/// Returns run info and the KPI report.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        run: state.run.clone(),
        kpi: state.kpi.clone(),
    })
}

/// Returns SOC samples.
///
/// `GET /soc?agent=Commuter%230&from=..&to=..` → 200 + `Vec<Sample>` JSON
/// `GET /soc?from=<later>&to=<earlier>` → 400 + `ErrorResponse`
pub async fn get_soc(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SampleQuery>,
) -> impl IntoResponse {
    filtered(&state.soc, &query)
}

/// Returns power-draw samples, filtered like `/soc`.
pub async fn get_power(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SampleQuery>,
) -> impl IntoResponse {
    filtered(&state.power, &query)
}

/// Returns the fleet load series and hourly energy.
///
/// `GET /load` → 200 + `LoadResponse` JSON
pub async fn get_load(State(state): State<Arc<AppState>>) -> Json<LoadResponse> {
    Json(LoadResponse {
        points: state.load.clone(),
        hourly_energy: state.hourly_energy.clone(),
    })
}

fn filtered(
    samples: &[Sample],
    query: &SampleQuery,
) -> Result<Json<Vec<Sample>>, (StatusCode, Json<ErrorResponse>)> {
    match (query.from, query.to) {
        (Some(from), Some(to)) if from > to => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        )),
        _ => Ok(Json(query.apply(samples))),
    }
}
