//! Local control server: the settings page and its JSON API.

pub mod embed;
pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use rotator_core::paths::control_url;
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        // Rotation
        .route("/api/status", get(routes::rotation::get_status))
        .route("/api/toggle", post(routes::rotation::toggle))
        // Settings
        .route("/api/config", get(routes::config::get_config))
        .route("/api/save", post(routes::config::save_config))
        .route("/api/outfits", post(routes::outfits::list_outfits))
        .fallback(embed::static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Bind the control server on loopback. Binding is separate from serving so
/// callers can report a busy port before detaching the server task.
pub async fn bind(port: u16) -> anyhow::Result<tokio::net::TcpListener> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    Ok(listener)
}

/// Serve on a pre-bound listener until the process exits.
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("Settings server listening on {}", control_url(actual_port));

    if open_browser {
        open_settings_page(actual_port);
    }

    axum::serve(listener, app).await?;
    Ok(())
}

/// Open the settings page in the default browser. Failures are logged only.
pub fn open_settings_page(port: u16) {
    let url = control_url(port);
    match open::that(&url) {
        Ok(()) => tracing::info!("Settings opened in browser."),
        Err(e) => tracing::warn!(error = %e, url, "could not open browser"),
    }
}
