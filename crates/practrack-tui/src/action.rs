//! All UI actions. Actions are the only way state changes.

use std::sync::Arc;

use practrack_core::{Entity, EntityKind, Practice, PracticeSession, Route, SliceState};

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A toast shown in the bottom-right corner for a few seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// A new state of one store slice.
#[derive(Debug, Clone)]
pub enum SliceUpdate {
    Sessions(SliceState<PracticeSession>),
    Practices(SliceState<Practice>),
}

/// An entity returned by a screen's own `get_one`, as opposed to
/// whatever the slice happened to cache.
#[derive(Debug, Clone)]
pub enum FetchedEntity {
    Session(Arc<PracticeSession>),
    Practice(Arc<Practice>),
}

/// Maps an entity type to its [`SliceUpdate`] and [`FetchedEntity`]
/// variants, so screens can stay generic.
pub trait SliceEntity: Entity {
    fn wrap(state: SliceState<Self>) -> SliceUpdate;

    fn unwrap(update: &SliceUpdate) -> Option<&SliceState<Self>>;

    fn fetched(entity: Self) -> FetchedEntity;

    fn unwrap_fetched(fetched: &FetchedEntity) -> Option<&Self>;
}

impl SliceEntity for PracticeSession {
    fn wrap(state: SliceState<Self>) -> SliceUpdate {
        SliceUpdate::Sessions(state)
    }

    fn unwrap(update: &SliceUpdate) -> Option<&SliceState<Self>> {
        match update {
            SliceUpdate::Sessions(state) => Some(state),
            SliceUpdate::Practices(_) => None,
        }
    }

    fn fetched(entity: Self) -> FetchedEntity {
        FetchedEntity::Session(Arc::new(entity))
    }

    fn unwrap_fetched(fetched: &FetchedEntity) -> Option<&Self> {
        match fetched {
            FetchedEntity::Session(entity) => Some(entity.as_ref()),
            FetchedEntity::Practice(_) => None,
        }
    }
}

impl SliceEntity for Practice {
    fn wrap(state: SliceState<Self>) -> SliceUpdate {
        SliceUpdate::Practices(state)
    }

    fn unwrap(update: &SliceUpdate) -> Option<&SliceState<Self>> {
        match update {
            SliceUpdate::Practices(state) => Some(state),
            SliceUpdate::Sessions(_) => None,
        }
    }

    fn fetched(entity: Self) -> FetchedEntity {
        FetchedEntity::Practice(Arc::new(entity))
    }

    fn unwrap_fetched(fetched: &FetchedEntity) -> Option<&Self> {
        match fetched {
            FetchedEntity::Practice(entity) => Some(entity.as_ref()),
            FetchedEntity::Session(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,

    // ── Navigation ────────────────────────────────────────────────
    Navigate(Route),

    // ── Data (from the data bridge) ───────────────────────────────
    SliceChanged(SliceUpdate),
    EntityFetched(FetchedEntity),
    /// A form save returned an error, possibly without touching the slice.
    SaveFailed(EntityKind),

    // ── Connection ────────────────────────────────────────────────
    Connecting,
    Connected,
    Disconnected(String),

    // ── Overlays ──────────────────────────────────────────────────
    ToggleHelp,
    Notify(Notification),
}
