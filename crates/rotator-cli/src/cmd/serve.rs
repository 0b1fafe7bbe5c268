use crate::app::{App, Settings};
use anyhow::Result;
use rotator_core::paths::control_url;
use std::sync::Arc;

pub fn run(settings: Settings, open: bool, no_rotate: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_headless(settings, open, no_rotate))
}

async fn run_headless(settings: Settings, open: bool, no_rotate: bool) -> Result<()> {
    let app = App::new(settings)?;
    crate::notify::spawn_forwarder(app.rotator.subscribe());
    tracing::info!("Application Started.");
    if !no_rotate {
        app.auto_start().await?;
    }
    headless(app, open).await
}

/// Serve the settings page eagerly and run until Ctrl-C.
pub async fn headless(app: Arc<App>, open: bool) -> Result<()> {
    let port = app.ensure_server().await?;
    println!("Settings: {}", control_url(port));
    if open {
        rotator_server::open_settings_page(port);
    }

    tokio::signal::ctrl_c().await?;
    app.shutdown().await;
    Ok(())
}
