use crate::app::{App, Settings};
use anyhow::Result;

/// Tray mode. Falls back to headless serving when no tray host is available.
pub fn run(settings: Settings) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_tray(settings))
}

async fn run_tray(settings: Settings) -> Result<()> {
    let app = App::new(settings)?;
    crate::notify::spawn_forwarder(app.rotator.subscribe());
    tracing::info!("Application Started.");
    app.auto_start().await?;

    #[cfg(target_os = "linux")]
    match crate::tray::run(app.clone()).await {
        Ok(()) => return Ok(()),
        Err(e) => tracing::warn!("tray unavailable, running headless: {e:#}"),
    }

    crate::cmd::serve::headless(app, false).await
}
