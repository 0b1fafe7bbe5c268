use rotator_core::{Autostart, ConfigStore, Endpoints, RotatorHandle};

/// Shared, cheaply cloneable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: ConfigStore,
    pub rotator: RotatorHandle,
    /// `None` when the platform has no resolvable auto-start location.
    pub autostart: Option<Autostart>,
    /// Used to build the throwaway client behind `POST /api/outfits`.
    pub endpoints: Endpoints,
}

impl AppState {
    pub fn new(
        store: ConfigStore,
        rotator: RotatorHandle,
        autostart: Option<Autostart>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            store,
            rotator,
            autostart,
            endpoints,
        }
    }

    pub fn startup_enabled(&self) -> bool {
        self.autostart.as_ref().is_some_and(Autostart::is_enabled)
    }
}
