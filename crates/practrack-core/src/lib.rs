//! Reactive CRUD layer between `practrack-api` and the CLI / TUI.
//!
//! - **[`Controller`]**: facade owning the API client. Every operation
//!   (`list`, `get_one`, `create`, `update`, `partial_update`, `delete`)
//!   is generic over [`Entity`], updates the entity's store slice and
//!   re-lists in the background after a successful mutation.
//!
//! - **[`DataStore`]**: one [`EntitySlice`] per entity type, each a
//!   `tokio::sync::watch` cell holding a [`SliceState`] (`loading`,
//!   `updating`, `update_success`, `error_message`, the list and the
//!   current entity).
//!
//! - **Metadata** ([`model`]): [`Entity`] describes each type's fields so
//!   forms, tables and detail views are written once. [`EntityForm`]
//!   holds typed-in text, validates it and converts dates through
//!   [`datetime`].
//!
//! - **[`Route`]**: the `/practice-session/...` and `/practice/...` URL
//!   scheme shared by the TUI and CLI.

pub mod config;
pub mod controller;
pub mod datetime;
pub mod error;
pub mod form;
pub mod model;
pub mod router;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use form::{EntityForm, FormMode, ReferenceOption, ReferenceOptions, sparse_entity};
pub use router::{Route, RouteError};
pub use store::{DataStore, EntitySlice, SlicePhase, SliceState};
pub use stream::SliceStream;

pub use model::{
    Entity, EntityId, EntityKind, FieldKind, FieldSpec, FieldValue, Practice, PracticeResult,
    PracticeSession,
};
pub use practrack_api::{Credentials, ListParams};
