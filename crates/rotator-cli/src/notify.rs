//! Desktop notifications for rotation state changes.
//!
//! Linux goes through the freedesktop notification service on the session
//! bus. Elsewhere toasts are only logged. Delivery failures are never fatal.

use rotator_core::RotationEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

pub const APP_NAME: &str = "Avatar Rotator";

pub const SETUP_REQUIRED: (&str, &str) = (
    "Setup Required",
    "Right-click tray -> Settings to configure.",
);

/// Title and body for events that warrant a toast.
pub fn toast_for(event: &RotationEvent) -> Option<(&'static str, String)> {
    match event {
        RotationEvent::Started { interval } => {
            Some(("Started", format!("Rotation active ({interval}s).")))
        }
        RotationEvent::Stopped => Some(("Stopped", "Rotation paused.".to_string())),
        RotationEvent::StartRejected => Some(("Cannot Start", "Check Settings.".to_string())),
        RotationEvent::Equipped { .. }
        | RotationEvent::Skipped { .. }
        | RotationEvent::CycleFailed { .. } => None,
    }
}

pub async fn toast(title: &str, body: &str) {
    tracing::debug!(title, body, "toast");
    #[cfg(target_os = "linux")]
    if let Err(e) = dbus::notify(title, body).await {
        tracing::debug!(error = %e, "notification not delivered");
    }
}

/// Turn rotation events into toasts until the engine goes away.
pub fn spawn_forwarder(mut events: broadcast::Receiver<RotationEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some((title, body)) = toast_for(&event) {
                        toast(title, &body).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "notification forwarder lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(target_os = "linux")]
mod dbus {
    use std::collections::HashMap;
    use zbus::zvariant::Value;

    const EXPIRE_MS: i32 = 5000;

    #[zbus::proxy(
        interface = "org.freedesktop.Notifications",
        default_service = "org.freedesktop.Notifications",
        default_path = "/org/freedesktop/Notifications"
    )]
    trait Notifications {
        #[allow(clippy::too_many_arguments)]
        fn notify(
            &self,
            app_name: &str,
            replaces_id: u32,
            app_icon: &str,
            summary: &str,
            body: &str,
            actions: &[&str],
            hints: HashMap<&str, Value<'_>>,
            expire_timeout: i32,
        ) -> zbus::Result<u32>;
    }

    pub async fn notify(summary: &str, body: &str) -> zbus::Result<()> {
        let connection = zbus::Connection::session().await?;
        let proxy = NotificationsProxy::new(&connection).await?;
        proxy
            .notify(
                super::APP_NAME,
                0,
                "",
                summary,
                body,
                &[],
                HashMap::new(),
                EXPIRE_MS,
            )
            .await?;
        Ok(())
    }
}
