use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rotator_core::{AvatarApi, AvatarClient};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OutfitsBody {
    #[serde(default)]
    cookie: String,
}

/// POST /api/outfits: list the avatar outfits visible to `cookie`.
///
/// Uses a throwaway client so previewing a cookie never touches the session
/// the rotation engine is using. That cookie only changes on save.
pub async fn list_outfits(
    State(app): State<AppState>,
    body: Result<Json<OutfitsBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = body.map_err(AppError::from_rejection)?;
    let cookie = body.cookie.trim();
    if cookie.is_empty() {
        return Err(AppError::bad_request("Cookie is required"));
    }

    let client = AvatarClient::new(app.endpoints.clone(), cookie)?;
    let user = match client.authenticated_user().await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "cookie did not authenticate");
            return Err(AppError::unauthorized(
                "Invalid cookie. Could not authenticate.",
            ));
        }
    };
    tracing::info!(user_id = user.id, "fetching outfits");

    let outfits = client.list_outfits().await?;
    Ok(Json(serde_json::json!({ "outfits": outfits })))
}
