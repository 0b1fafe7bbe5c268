use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rotator_core::config::DEFAULT_INTERVAL;
use rotator_core::{Config, OutfitRef};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Config as the settings page sees it: the file contents plus the
/// auto-start flag read from the OS entry.
#[derive(Debug, Serialize)]
pub struct ConfigView {
    cookie: String,
    outfits: Vec<OutfitRef>,
    interval: u64,
    startup: bool,
}

/// GET /api/config: current settings. A broken config file reads as defaults.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<ConfigView>, AppError> {
    let store = app.store.clone();
    let config = tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Config Load Error");
            Config::default()
        });

    Ok(Json(ConfigView {
        cookie: config.cookie,
        outfits: config.outfits,
        interval: config.interval,
        startup: app.startup_enabled(),
    }))
}

#[derive(Deserialize)]
pub struct SaveBody {
    #[serde(default)]
    cookie: String,
    #[serde(default)]
    outfits: Vec<OutfitRef>,
    #[serde(default = "default_interval")]
    interval: i64,
    #[serde(default)]
    startup: bool,
}

fn default_interval() -> i64 {
    DEFAULT_INTERVAL as i64
}

/// POST /api/save: persist settings, sync the auto-start entry, and push
/// the new values into the running rotation.
pub async fn save_config(
    State(app): State<AppState>,
    body: Result<Json<SaveBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = body.map_err(AppError::from_rejection)?;
    let config = Config {
        cookie: body.cookie.trim().to_string(),
        outfits: body.outfits,
        interval: u64::try_from(body.interval).unwrap_or(0),
    };
    config
        .validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let store = app.store.clone();
    let autostart = app.autostart.clone();
    let startup = body.startup;
    let saved = config.clone();
    tokio::task::spawn_blocking(move || {
        store.save(&saved)?;
        match autostart {
            Some(entry) => {
                if let Err(e) = entry.set_enabled(startup) {
                    tracing::error!(error = %e, "Startup Toggle Error");
                }
            }
            None => tracing::warn!("auto-start is not available on this platform"),
        }
        Ok::<_, rotator_core::RotatorError>(())
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.rotator.update_config(config).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
