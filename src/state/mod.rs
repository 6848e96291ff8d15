mod feed;
mod gate;
/// Seat, turn and status rules.
pub mod session;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::game_store::{GameReader, GameStore, StorageHandles},
    error::ServiceError,
};

pub use self::feed::{GameFeeds, SseHub};
pub use self::gate::{GameGates, GateGuard};

/// State handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, storage handles and per-game coordination.
pub struct AppState {
    config: AppConfig,
    storage: RwLock<Option<StorageHandles>>,
    degraded: watch::Sender<bool>,
    feeds: GameFeeds,
    gates: GameGates,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until storage handles are installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let feeds = GameFeeds::new(config.feed_capacity);
        Arc::new(Self {
            config,
            storage: RwLock::new(None),
            degraded: degraded_tx,
            feeds,
            gates: GameGates::new(),
        })
    }

    /// Build a state with `handles` already installed (local runs and tests).
    pub async fn with_storage(config: AppConfig, handles: StorageHandles) -> SharedState {
        let state = Self::new(config);
        state.install_storage(handles).await;
        state
    }

    /// Tunables loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Storage handles currently installed, if any.
    pub async fn storage(&self) -> Option<StorageHandles> {
        let guard = self.storage.read().await;
        guard.as_ref().cloned()
    }

    /// Service-role store, or [`ServiceError::Degraded`] when storage is down.
    pub async fn require_privileged(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.storage()
            .await
            .map(|handles| handles.privileged)
            .ok_or(ServiceError::Degraded)
    }

    /// Public reader, or [`ServiceError::Degraded`] when storage is down.
    pub async fn require_public(&self) -> Result<Arc<dyn GameReader>, ServiceError> {
        self.storage()
            .await
            .map(|handles| handles.public)
            .ok_or(ServiceError::Degraded)
    }

    /// Install new storage handles and leave degraded mode.
    pub async fn install_storage(&self, handles: StorageHandles) {
        {
            let mut guard = self.storage.write().await;
            *guard = Some(handles);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage handles and enter degraded mode.
    pub async fn clear_storage(&self) {
        {
            let mut guard = self.storage.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Per-game change feeds.
    pub fn feeds(&self) -> &GameFeeds {
        &self.feeds
    }

    /// Per-game move gates.
    pub fn gates(&self) -> &GameGates {
        &self.gates
    }
}
