//! The rotation engine.
//!
//! A single owner task holds all rotation state (active flag, index, interval,
//! outfit list, details cache). Everything else talks to it through a
//! [`RotatorHandle`]: commands go in on an mpsc channel, answers come back on
//! oneshot channels, and [`RotationEvent`]s fan out on a broadcast channel for
//! the tray and notification layers.
//!
//! Cache warming runs inside the owner too. After a start, one uncached outfit
//! is fetched per [`WARM_SPACING`] tick, so an id already in the cache is never
//! requested again until the next start clears it.

use crate::api::AvatarApi;
use crate::config::{Config, ConfigStore, MAX_INTERVAL};
use crate::error::{ApiError, Result, RotatorError};
use crate::types::{AvatarType, OutfitDetails, OutfitRef};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub const WARM_SPACING: Duration = Duration::from_secs(1);

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Snapshot of the engine, as served by `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationStatus {
    pub active: bool,
    pub index: usize,
    pub interval: u64,
    pub outfit_count: usize,
    pub current: Option<OutfitRef>,
    pub last_equipped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationEvent {
    Started { interval: u64 },
    Stopped,
    /// A start was requested without a cookie or outfits.
    StartRejected,
    Equipped { outfit: OutfitRef },
    /// Details for this outfit could not be fetched; the index moved on.
    Skipped { outfit: OutfitRef },
    /// The cycle was cut short by a connection failure; the index did not move.
    CycleFailed { error: String },
}

enum Command {
    Start(oneshot::Sender<bool>),
    Stop(oneshot::Sender<bool>),
    Toggle(oneshot::Sender<bool>),
    Status(oneshot::Sender<RotationStatus>),
    UpdateConfig(Config, oneshot::Sender<()>),
    Shutdown,
}

// ---------------------------------------------------------------------------
// RotatorHandle
// ---------------------------------------------------------------------------

/// Cheap, cloneable access to the owner task.
#[derive(Debug, Clone)]
pub struct RotatorHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<RotationEvent>,
}

impl RotatorHandle {
    /// Reload config from disk and start rotating. Returns the new active
    /// flag; `false` means the config was not ready.
    pub async fn start(&self) -> Result<bool> {
        self.request(Command::Start).await
    }

    /// Returns the new active flag (always `false`).
    pub async fn stop(&self) -> Result<bool> {
        self.request(Command::Stop).await
    }

    /// Start if inactive, stop if active. Returns the new active flag.
    pub async fn toggle(&self) -> Result<bool> {
        self.request(Command::Toggle).await
    }

    pub async fn status(&self) -> Result<RotationStatus> {
        self.request(Command::Status).await
    }

    /// Push freshly saved settings into the running engine. Keeps the cache.
    pub async fn update_config(&self, config: Config) -> Result<()> {
        self.request(|tx| Command::UpdateConfig(config, tx)).await
    }

    /// Ask the owner task to exit. Pending commands behind this one are dropped.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RotatorError::RotatorGone)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RotationEvent> {
        self.events.subscribe()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(make(tx))
            .await
            .map_err(|_| RotatorError::RotatorGone)?;
        rx.await.map_err(|_| RotatorError::RotatorGone)
    }
}

/// Load config from `store`, spawn the owner task, and return its handle.
/// The engine starts inactive.
pub fn spawn<A: AvatarApi>(api: A, store: ConfigStore) -> RotatorHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let (events, _) = broadcast::channel(EVENT_BUFFER);

    let mut rotator = Rotator {
        api,
        store,
        rx,
        events: events.clone(),
        active: false,
        index: 0,
        interval: crate::config::DEFAULT_INTERVAL,
        cookie: String::new(),
        outfits: Vec::new(),
        cache: HashMap::new(),
        warm_queue: VecDeque::new(),
        next_cycle: None,
        next_warm: None,
        last_equipped_at: None,
    };
    match rotator.store.load() {
        Ok(config) => rotator.apply_config(config),
        Err(e) => error!(error = %e, "Could not load configuration"),
    }
    tokio::spawn(rotator.run());

    RotatorHandle { tx, events }
}

// ---------------------------------------------------------------------------
// Owner task
// ---------------------------------------------------------------------------

struct Rotator<A> {
    api: A,
    store: ConfigStore,
    rx: mpsc::Receiver<Command>,
    events: broadcast::Sender<RotationEvent>,

    active: bool,
    index: usize,
    interval: u64,
    cookie: String,
    outfits: Vec<OutfitRef>,

    cache: HashMap<u64, OutfitDetails>,
    warm_queue: VecDeque<u64>,

    next_cycle: Option<Instant>,
    next_warm: Option<Instant>,
    last_equipped_at: Option<DateTime<Utc>>,
}

impl<A: AvatarApi> Rotator<A> {
    async fn run(mut self) {
        loop {
            let cycle_at = self.next_cycle;
            let warm_at = self.next_warm;

            tokio::select! {
                biased;

                cmd = self.rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = tokio::time::sleep_until(cycle_at.unwrap_or_else(Instant::now)),
                    if cycle_at.is_some() => self.tick().await,
                _ = tokio::time::sleep_until(warm_at.unwrap_or_else(Instant::now)),
                    if warm_at.is_some() => self.warm_one().await,
            }
        }
        info!("Rotation engine stopped.");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start(reply) => {
                let _ = reply.send(self.start());
            }
            Command::Stop(reply) => {
                self.stop();
                let _ = reply.send(false);
            }
            Command::Toggle(reply) => {
                let active = if self.active {
                    self.stop();
                    false
                } else {
                    self.start()
                };
                let _ = reply.send(active);
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::UpdateConfig(config, reply) => {
                self.apply_config(config);
                let _ = reply.send(());
            }
            Command::Shutdown => {}
        }
    }

    fn emit(&self, event: RotationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn status(&self) -> RotationStatus {
        RotationStatus {
            active: self.active,
            index: self.index,
            interval: self.interval,
            outfit_count: self.outfits.len(),
            current: self.outfits.get(self.index).cloned(),
            last_equipped_at: self.last_equipped_at,
        }
    }

    fn apply_config(&mut self, config: Config) {
        if config.cookie != self.cookie {
            self.api.set_cookie(&config.cookie);
            self.cookie = config.cookie;
        }
        self.outfits = config.outfits;
        self.interval = config.interval.clamp(1, MAX_INTERVAL);
        if self.index >= self.outfits.len() {
            self.index = 0;
        }
        debug!(
            outfits = self.outfits.len(),
            interval = self.interval,
            "configuration applied"
        );
    }

    fn start(&mut self) -> bool {
        let config = match self.store.load() {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Could not load configuration");
                Config::default()
            }
        };
        if !config.is_ready() {
            warn!("Cannot start: cookie or outfits missing.");
            self.emit(RotationEvent::StartRejected);
            return self.active;
        }

        self.apply_config(config);
        self.cache.clear();
        info!("Cache cleared. Fetching fresh outfit data...");
        self.warm_queue = self.outfits.iter().map(|o| o.id).collect();

        let now = Instant::now();
        self.active = true;
        self.next_cycle = Some(now);
        self.next_warm = Some(now + WARM_SPACING);

        info!(interval = self.interval, "Rotation started.");
        self.emit(RotationEvent::Started {
            interval: self.interval,
        });
        true
    }

    fn stop(&mut self) {
        let was_active = self.active;
        self.active = false;
        self.next_cycle = None;
        self.next_warm = None;
        self.warm_queue.clear();
        if was_active {
            info!("Rotation paused.");
            self.emit(RotationEvent::Stopped);
        }
    }

    async fn tick(&mut self) {
        let started = Instant::now();
        let interval = Duration::from_secs(self.interval);

        if !self.active || self.outfits.is_empty() {
            self.next_cycle = self.active.then(|| started + interval);
            return;
        }

        self.next_cycle = Some(match self.run_cycle().await {
            // Sleep the remainder of the interval; an overrun fires at once.
            Ok(()) => started + interval,
            Err(e) => {
                error!(error = %e, "Cycle failed");
                self.emit(RotationEvent::CycleFailed {
                    error: e.to_string(),
                });
                Instant::now() + interval
            }
        });
    }

    /// Equip the outfit at the current index and advance. An outfit whose
    /// details cannot be fetched is skipped. A transport failure while
    /// equipping returns early without advancing.
    async fn run_cycle(&mut self) -> std::result::Result<(), ApiError> {
        let outfit = self.outfits[self.index].clone();

        let details = match self.cache.get(&outfit.id) {
            Some(details) => Some(details.clone()),
            None => match self.api.outfit_details(outfit.id).await {
                Ok(details) => {
                    self.cache.insert(outfit.id, details.clone());
                    Some(details)
                }
                Err(e) => {
                    warn!(outfit = outfit.id, error = %e, "Could not fetch outfit details");
                    None
                }
            },
        };

        match details {
            Some(details) => {
                info!(outfit = outfit.id, name = %outfit.name, "Equipping outfit");
                equip(&self.api, &details).await?;
                self.last_equipped_at = Some(Utc::now());
                self.emit(RotationEvent::Equipped {
                    outfit: outfit.clone(),
                });
            }
            None => {
                warn!(outfit = outfit.id, "Skipping outfit (could not fetch details)");
                self.emit(RotationEvent::Skipped { outfit });
            }
        }

        self.index = (self.index + 1) % self.outfits.len();
        Ok(())
    }

    /// Fetch the next uncached outfit in the warm queue.
    async fn warm_one(&mut self) {
        self.next_warm = None;
        if !self.active {
            return;
        }
        while let Some(id) = self.warm_queue.pop_front() {
            if self.cache.contains_key(&id) {
                continue;
            }
            match self.api.outfit_details(id).await {
                Ok(details) => {
                    self.cache.insert(id, details);
                    debug!(outfit = id, "cached outfit details");
                }
                Err(e) => debug!(outfit = id, error = %e, "warm fetch failed"),
            }
            break;
        }
        if !self.warm_queue.is_empty() {
            self.next_warm = Some(Instant::now() + WARM_SPACING);
        }
    }
}

/// Apply avatar type, body colors, and assets, in that order. Rejected
/// requests are logged and skipped; a transport failure stops the sequence.
///
/// The caller treats that failure as a failed cycle: the index stays put, so
/// the same outfit is tried again after a full interval instead of being
/// counted as equipped.
async fn equip<A: AvatarApi>(api: &A, details: &OutfitDetails) -> std::result::Result<(), ApiError> {
    if let Some(raw) = details.player_avatar_type.as_deref() {
        match AvatarType::parse(raw) {
            Some(avatar_type) => tolerate(api.set_avatar_type(avatar_type).await, "avatar type")?,
            None => debug!(avatar_type = raw, "unknown avatar type, skipped"),
        }
    }
    if let Some(colors) = &details.body_colors {
        tolerate(api.set_body_colors(colors).await, "body colors")?;
    }
    if let Some(assets) = &details.assets {
        tolerate(api.set_wearing_assets(assets).await, "assets")?;
    }
    Ok(())
}

fn tolerate(result: std::result::Result<(), ApiError>, what: &str) -> std::result::Result<(), ApiError> {
    match result {
        Err(e) if e.is_transport() => Err(e),
        Err(e) => {
            warn!(error = %e, "Failed to set {what}.");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}
