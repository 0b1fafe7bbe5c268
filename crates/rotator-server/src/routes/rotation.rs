use axum::extract::State;
use axum::Json;
use rotator_core::RotationStatus;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/status: snapshot of the rotation engine.
pub async fn get_status(State(app): State<AppState>) -> Result<Json<RotationStatus>, AppError> {
    Ok(Json(app.rotator.status().await?))
}

/// POST /api/toggle: start if idle, stop if active.
pub async fn toggle(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let active = app.rotator.toggle().await?;
    Ok(Json(serde_json::json!({ "active": active })))
}
