use anyhow::{Context, Result};
use rotator_core::autostart::current_exe_command;
use rotator_core::{paths, Autostart, AvatarClient, ConfigStore, Endpoints, RotatorHandle};
use rotator_server::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

// ---------------------------------------------------------------------------
// Settings (global flags)
// ---------------------------------------------------------------------------

/// Values from the global command-line flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub port: u16,
    pub autostart_dir: Option<PathBuf>,
    pub api_base: Option<String>,
}

impl Settings {
    pub fn store(&self) -> Result<ConfigStore> {
        match &self.config {
            Some(path) => Ok(ConfigStore::new(path)),
            None => ConfigStore::default_location().context("could not locate config file"),
        }
    }

    pub fn autostart(&self) -> Result<Autostart> {
        match &self.autostart_dir {
            Some(dir) => Ok(Autostart::desktop_entry(dir, current_exe_command()?)),
            None => Autostart::for_current_exe().context("could not locate auto-start entry"),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        match &self.api_base {
            Some(base) => Endpoints::single(base),
            None => Endpoints::default(),
        }
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| paths::default_log_path().ok())
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Everything the tray, the notifier, and the settings server share.
pub struct App {
    pub settings: Settings,
    pub store: ConfigStore,
    pub rotator: RotatorHandle,
    pub autostart: Option<Autostart>,
    server_port: OnceCell<u16>,
}

impl App {
    /// Build the context and spawn the rotation owner. Must run inside the runtime.
    pub fn new(settings: Settings) -> Result<Arc<Self>> {
        let store = settings.store()?;
        let autostart = match settings.autostart() {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("auto-start unavailable: {e:#}");
                None
            }
        };
        let client = AvatarClient::new(settings.endpoints(), "")
            .context("could not build HTTP client")?;
        let rotator = rotator_core::rotation::spawn(client, store.clone());

        Ok(Arc::new(Self {
            settings,
            store,
            rotator,
            autostart,
            server_port: OnceCell::new(),
        }))
    }

    fn server_state(&self) -> AppState {
        AppState::new(
            self.store.clone(),
            self.rotator.clone(),
            self.autostart.clone(),
            self.settings.endpoints(),
        )
    }

    /// Start the settings server on first use. Returns the bound port.
    pub async fn ensure_server(&self) -> Result<u16> {
        let port = self
            .server_port
            .get_or_try_init(|| async {
                let listener = rotator_server::bind(self.settings.port)
                    .await
                    .with_context(|| format!("could not bind port {}", self.settings.port))?;
                let port = listener.local_addr()?.port();
                let state = self.server_state();
                tokio::spawn(async move {
                    if let Err(e) = rotator_server::serve_on(state, listener, false).await {
                        tracing::error!("settings server stopped: {e:#}");
                    }
                });
                Ok::<_, anyhow::Error>(port)
            })
            .await?;
        Ok(*port)
    }

    /// Open the settings page. Ignored while rotation is active.
    pub async fn open_settings(&self) -> Result<()> {
        if self.rotator.status().await?.active {
            tracing::info!("Stop rotation before opening Settings.");
            return Ok(());
        }
        let port = self.ensure_server().await?;
        rotator_server::open_settings_page(port);
        Ok(())
    }

    pub fn open_logs(&self) {
        let Some(path) = self.settings.log_path() else {
            tracing::warn!("no log file location");
            return;
        };
        if let Err(e) = open::that(&path) {
            tracing::warn!(path = %path.display(), error = %e, "could not open log file");
        }
    }

    /// Start rotating if the saved config is ready; otherwise prompt for setup.
    pub async fn auto_start(&self) -> Result<()> {
        let ready = match self.store.load() {
            Ok(config) => config.is_ready(),
            Err(e) => {
                tracing::error!(error = %e, "Could not load configuration");
                false
            }
        };
        if ready {
            self.rotator.start().await?;
        } else {
            let (title, body) = crate::notify::SETUP_REQUIRED;
            crate::notify::toast(title, body).await;
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        tracing::info!("Program terminated by user.");
        if let Err(e) = self.rotator.shutdown().await {
            tracing::debug!(error = %e, "rotation already stopped");
        }
    }
}
