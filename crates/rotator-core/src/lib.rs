//! Core library for avatar-rotator.
//!
//! Holds everything that does not depend on a UI surface: the persisted config,
//! the launch-at-login entry, the avatar API client, and the rotation engine
//! that cycles through outfits on a timer.

pub mod api;
pub mod autostart;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod rotation;
pub mod types;

pub use api::{AvatarApi, AvatarClient, Endpoints};
pub use autostart::Autostart;
pub use config::{Config, ConfigStore};
pub use error::{ApiError, Result, RotatorError};
pub use rotation::{RotationEvent, RotationStatus, RotatorHandle};
pub use types::OutfitRef;
