// ── Reactive entity store ──
//
// One `EntitySlice` per entity type. Reads are snapshot clones, writes
// are broadcast to subscribers through `watch` channels.

mod slice;

pub use slice::{EntitySlice, SlicePhase, SliceState};

use practrack_api::{Practice, PracticeSession};

use crate::model::Entity;

/// Holds the state of every entity type.
pub struct DataStore {
    pub(crate) practice_sessions: EntitySlice<PracticeSession>,
    pub(crate) practices: EntitySlice<Practice>,
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            practice_sessions: EntitySlice::new(),
            practices: EntitySlice::new(),
        }
    }

    /// The slice for `E`.
    pub fn slice<E: Entity>(&self) -> &EntitySlice<E> {
        E::slice(self)
    }

    /// Restore every slice to its initial state.
    pub fn reset_all(&self) {
        self.practice_sessions.reset();
        self.practices.reset();
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
