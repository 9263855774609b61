// ── Generic entity slice ──
//
// One reactive state cell per entity type. Every transition goes through
// `send_modify`, so subscribers see each flag change and the last
// resolved operation wins.

use std::sync::Arc;

use tokio::sync::watch;

/// Observable state of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceState<E> {
    /// A read (`list` / `get_one`) is in flight.
    pub loading: bool,
    /// A mutation (`create` / `update` / `delete`) is in flight.
    pub updating: bool,
    /// The last mutation succeeded. Survives the background re-list.
    pub update_success: bool,
    pub error_message: Option<String>,
    /// Last fetched collection.
    pub entities: Arc<Vec<Arc<E>>>,
    /// Last fetched or saved single entity.
    pub entity: Arc<E>,
}

impl<E: Default> Default for SliceState<E> {
    fn default() -> Self {
        Self {
            loading: false,
            updating: false,
            update_success: false,
            error_message: None,
            entities: Arc::new(Vec::new()),
            entity: Arc::new(E::default()),
        }
    }
}

/// Coarse view state derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlicePhase {
    /// Nothing fetched yet.
    Idle,
    Loading,
    /// Data on hand, nothing in flight.
    Ready,
    Updating,
    /// A mutation just succeeded; views navigate away.
    Succeeded,
    Failed,
}

impl<E: Default + PartialEq> SliceState<E> {
    pub fn phase(&self) -> SlicePhase {
        if self.updating {
            SlicePhase::Updating
        } else if self.update_success {
            SlicePhase::Succeeded
        } else if self.loading {
            SlicePhase::Loading
        } else if self.error_message.is_some() {
            SlicePhase::Failed
        } else if self.entities.is_empty() && *self.entity == E::default() {
            SlicePhase::Idle
        } else {
            SlicePhase::Ready
        }
    }
}

/// Reactive holder for one entity type's [`SliceState`].
pub struct EntitySlice<E> {
    state: watch::Sender<SliceState<E>>,
}

impl<E: Default> EntitySlice<E> {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(SliceState::default());
        Self { state }
    }

    /// Restore the initial state.
    pub(crate) fn reset(&self) {
        self.state.send_modify(|s| *s = SliceState::default());
    }

    /// A mutation succeeded. `saved` replaces the entity; `None` (delete)
    /// resets it to the default.
    pub(crate) fn mutation_succeeded(&self, saved: Option<E>) {
        self.state.send_modify(|s| {
            s.updating = false;
            s.loading = false;
            s.update_success = true;
            s.entity = Arc::new(saved.unwrap_or_default());
        });
    }
}

impl<E> EntitySlice<E> {
    /// Current state (cloned; entities are shared through `Arc`).
    pub fn snapshot(&self) -> SliceState<E>
    where
        E: Clone,
    {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SliceState<E>> {
        self.state.subscribe()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// A user-initiated read starts.
    pub(crate) fn begin_fetch(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error_message = None;
            s.update_success = false;
        });
    }

    /// The re-list that follows a mutation starts; `update_success` stays.
    pub(crate) fn begin_refresh(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error_message = None;
        });
    }

    pub(crate) fn begin_mutation(&self) {
        self.state.send_modify(|s| {
            s.updating = true;
            s.error_message = None;
            s.update_success = false;
        });
    }

    pub(crate) fn list_fulfilled(&self, entities: Vec<E>) {
        let entities: Vec<Arc<E>> = entities.into_iter().map(Arc::new).collect();
        self.state.send_modify(|s| {
            s.loading = false;
            s.entities = Arc::new(entities);
        });
    }

    pub(crate) fn entity_fulfilled(&self, entity: E) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.entity = Arc::new(entity);
        });
    }

    /// The post-mutation re-list failed. The mutation itself still
    /// succeeded, so `update_success` is kept.
    pub(crate) fn refresh_failed(&self, message: String) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.error_message = Some(message);
        });
    }

    /// Any operation failed. Cached data is left alone.
    pub(crate) fn rejected(&self, message: String) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.updating = false;
            s.update_success = false;
            s.error_message = Some(message);
        });
    }
}
