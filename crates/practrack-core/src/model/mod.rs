// ── Domain model ──
//
// The wire types live in practrack-api; this module attaches the
// metadata that lets one generic CRUD layer drive both of them.

mod entity_id;
mod meta;
mod practice;
mod practice_session;

pub use entity_id::EntityId;
pub use meta::{Entity, EntityKind, FieldKind, FieldSpec, FieldValue};
pub use practrack_api::{Practice, PracticeResult, PracticeSession};
