use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::AppState;
use crate::domain::ParsedRate;
use crate::error::AppError;
use crate::fxql;

#[derive(Debug, Deserialize)]
pub struct CreateFxqlRequest {
    #[serde(rename = "FXQL")]
    pub fxql: String,
}

#[derive(Debug, Serialize)]
pub struct FxqlStatementsResponse {
    pub data: Vec<ParsedRate>,
}

/// `POST /fxql-statements`: parse, validate and store a batch of rates.
pub async fn create_fxql_statements(
    State(state): State<AppState>,
    payload: Result<Json<CreateFxqlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FxqlStatementsResponse>), AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    if request.fxql.trim().is_empty() {
        return Err(AppError::BadRequest("FXQL must not be empty".into()));
    }
    let length = request.fxql.chars().count();
    if length > state.config.max_fxql_length {
        return Err(AppError::BadRequest(format!(
            "FXQL must be at most {} characters, got {}",
            state.config.max_fxql_length, length
        )));
    }

    let rates = fxql::parse(&request.fxql).map_err(|err| {
        warn!(code = err.code(), position = ?err.position, error = %err, "Rejected FXQL payload");
        err
    })?;

    let stored = state.repo.upsert_rates(&rates).await?;
    info!(rates = stored.len(), "Stored FXQL rates");

    Ok((StatusCode::CREATED, Json(FxqlStatementsResponse { data: stored })))
}
