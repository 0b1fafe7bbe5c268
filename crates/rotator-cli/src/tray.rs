//! StatusNotifierItem tray icon.
//!
//! Menu callbacks run on ksni's service task and must not block, so they only
//! queue a [`TrayAction`]. [`run`] drains the queue, talks to the rotator, and
//! redraws the icon whenever a rotation event arrives.

use crate::app::App;
use anyhow::{Context, Result};
use ksni::menu::StandardItem;
use ksni::{MenuItem, Tray, TrayMethods};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

const ICON_SIZE: i32 = 64;
const BACKGROUND: [u8; 3] = [30, 30, 30];
const ACTIVE: [u8; 3] = [0, 255, 100];
const IDLE: [u8; 3] = [255, 50, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrayAction {
    Toggle,
    Settings,
    ViewLogs,
    Quit,
}

struct RotatorTray {
    active: bool,
    actions: mpsc::UnboundedSender<TrayAction>,
}

impl RotatorTray {
    fn item(&self, label: &str, enabled: bool, action: TrayAction) -> MenuItem<Self> {
        StandardItem {
            label: label.to_string(),
            enabled,
            activate: Box::new(move |tray: &mut Self| {
                let _ = tray.actions.send(action);
            }),
            ..Default::default()
        }
        .into()
    }
}

impl Tray for RotatorTray {
    fn id(&self) -> String {
        "avatar-rotator".into()
    }

    fn title(&self) -> String {
        crate::notify::APP_NAME.into()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: crate::notify::APP_NAME.into(),
            description: if self.active { "Rotating" } else { "Paused" }.into(),
            ..Default::default()
        }
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![status_icon(self.active)]
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let toggle = if self.active { "Stop" } else { "Start" };
        vec![
            self.item(toggle, true, TrayAction::Toggle),
            self.item("Settings", !self.active, TrayAction::Settings),
            self.item("View Logs", true, TrayAction::ViewLogs),
            MenuItem::Separator,
            self.item("End Program", true, TrayAction::Quit),
        ]
    }
}

/// Dark square with a centered disc: green while rotating, red while idle.
/// Pixels are ARGB32 in network byte order.
fn status_icon(active: bool) -> ksni::Icon {
    let [r, g, b] = if active { ACTIVE } else { IDLE };
    let center = ICON_SIZE as f32 / 2.0;
    let radius = ICON_SIZE as f32 / 4.0;

    let mut data = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let [pr, pg, pb] = if dx * dx + dy * dy <= radius * radius {
                [r, g, b]
            } else {
                BACKGROUND
            };
            data.extend_from_slice(&[0xff, pr, pg, pb]);
        }
    }

    ksni::Icon {
        width: ICON_SIZE,
        height: ICON_SIZE,
        data,
    }
}

/// Register the tray icon and run until End Program (or Ctrl-C).
/// Errors if no StatusNotifier host is reachable.
pub async fn run(app: Arc<App>) -> Result<()> {
    let (tx, mut actions) = mpsc::unbounded_channel();
    let active = app.rotator.status().await?.active;
    let handle = RotatorTray { active, actions: tx }
        .spawn()
        .await
        .context("could not register tray icon")?;
    let mut events = app.rotator.subscribe();

    loop {
        tokio::select! {
            action = actions.recv() => match action {
                Some(TrayAction::Toggle) => {
                    if let Err(e) = app.rotator.toggle().await {
                        tracing::error!(error = %e, "toggle failed");
                    }
                }
                Some(TrayAction::Settings) => {
                    if let Err(e) = app.open_settings().await {
                        tracing::error!("could not open settings: {e:#}");
                    }
                }
                Some(TrayAction::ViewLogs) => app.open_logs(),
                Some(TrayAction::Quit) | None => break,
            },
            event = events.recv() => match event {
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    let active = app.rotator.status().await.is_ok_and(|s| s.active);
                    handle.update(|tray: &mut RotatorTray| tray.active = active).await;
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    app.shutdown().await;
    handle.shutdown().await;
    Ok(())
}
