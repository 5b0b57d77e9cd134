use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use credit_metrics::TracingService;
use credit_models::{
    ErrorShape, HealthResponse, LoanApplication, PredictionResponse, RiskError, StatusResponse,
};
use std::time::Instant;
use tracing::{error, instrument};

use crate::AppState;

type ApiError = (StatusCode, Json<ErrorShape>);

fn error_response(e: &RiskError) -> ApiError {
    (
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(e.to_error_shape()),
    )
}

/// Returns the code book so clients know which numbers to send.
#[instrument(skip(state))]
pub async fn get_mappings(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::online(state.engine.code_book().clone()))
}

#[instrument(skip(state, payload))]
pub async fn predict_risk(
    State(state): State<AppState>,
    payload: Result<Json<LoanApplication>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let result = payload
        .map_err(|rejection| RiskError::InvalidApplication {
            reason: rejection.body_text(),
        })
        .and_then(|Json(application)| {
            let started = Instant::now();
            let (response, score) = state.engine.assess(&application)?;
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            state
                .metrics
                .record_prediction(response.decision, score.calibrated, duration_ms);
            TracingService::log_prediction(
                response.decision,
                score.raw,
                score.calibrated,
                duration_ms,
            );
            Ok(response)
        });

    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            state.metrics.record_error();
            TracingService::log_prediction_failed(&e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        model_loaded: state.engine.is_loaded(),
        model_version: state.engine.model_version().map(str::to_string),
    })
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match state.metrics.render() {
        Ok(body) => Ok((
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            Err(error_response(&e))
        }
    }
}
