// ── Entity metadata ──
//
// Every screen, form and CLI handler is written once against these
// descriptions. An entity declares its fields (wire name, label, kind)
// and typed accessors; everything else is derived.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use practrack_api::Resource;
use serde_json::Value;
use strum::{EnumIter, EnumString, IntoStaticStr};

use super::EntityId;
use crate::datetime;
use crate::error::CoreError;
use crate::store::{DataStore, EntitySlice};

// ── EntityKind ──────────────────────────────────────────────────────

/// The entity types the client knows about.
///
/// The strum serialization is the route segment (`/practice-session/...`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr,
)]
pub enum EntityKind {
    #[strum(serialize = "practice-session")]
    PracticeSession,
    #[strum(serialize = "practice")]
    Practice,
}

impl EntityKind {
    /// Route segment, e.g. `practice-session`.
    pub fn segment(self) -> &'static str {
        self.into()
    }

    /// REST collection below `/api/`.
    pub fn api_path(self) -> &'static str {
        match self {
            Self::PracticeSession => "practice-sessions",
            Self::Practice => "practices",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PracticeSession => "Practice Session",
            Self::Practice => "Practice",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::PracticeSession => "Practice Sessions",
            Self::Practice => "Practices",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::PracticeSession => <practrack_api::PracticeSession as Entity>::FIELDS,
            Self::Practice => <practrack_api::Practice as Entity>::FIELDS,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Field descriptions ──────────────────────────────────────────────

/// What kind of input a field takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    DateTime,
    /// One of a fixed set of wire values; the first is the form default.
    Choice(&'static [&'static str]),
    /// Many-to-one link to another entity, sent as a nested `{id}` object.
    Reference(EntityKind),
}

/// One editable field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// camelCase wire name.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            required: false,
        }
    }

    pub const fn datetime(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::DateTime,
            required: false,
        }
    }

    pub const fn choice(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Choice(options),
            required: false,
        }
    }

    pub const fn reference(name: &'static str, label: &'static str, target: EntityKind) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Reference(target),
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A field's current value, typed by its [`FieldKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    DateTime(Option<DateTime<Utc>>),
    Choice(Option<String>),
    /// The full referenced object as JSON (at least `{"id": ..}`).
    Reference(Option<Value>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(v) | Self::Choice(v) => v.as_deref().is_none_or(str::is_empty),
            Self::DateTime(v) => v.is_none(),
            Self::Reference(v) => v.is_none(),
        }
    }

    /// Id of the referenced entity, for `Reference` values.
    pub fn reference_id(&self) -> Option<EntityId> {
        match self {
            Self::Reference(Some(v)) => v.get("id").and_then(Value::as_i64).map(EntityId::from),
            _ => None,
        }
    }

    /// Human-readable rendering for tables and detail views.
    pub fn display<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            Self::Text(v) | Self::Choice(v) => v.clone().unwrap_or_default(),
            Self::DateTime(v) => v
                .map(|dt| datetime::format_for_list(&dt, tz))
                .unwrap_or_default(),
            Self::Reference(_) => self
                .reference_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

// ── Entity trait ────────────────────────────────────────────────────

/// A CRUD entity: a REST resource plus the metadata to edit it.
pub trait Entity: Resource + Clone + Default + fmt::Debug + PartialEq + 'static {
    const KIND: EntityKind;
    const FIELDS: &'static [FieldSpec];

    fn entity_id(&self) -> Option<EntityId> {
        self.id().map(EntityId::from)
    }

    /// Read a field by wire name. Unknown names read as empty text.
    fn field(&self, name: &str) -> FieldValue;

    /// Write a field by wire name.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CoreError>;

    /// This entity's slice of the store.
    fn slice(store: &DataStore) -> &EntitySlice<Self>;

    fn field_spec(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }
}

pub(crate) fn unknown_field(kind: EntityKind, name: &str) -> CoreError {
    CoreError::Internal(format!("{} has no field '{name}'", kind.label()))
}

pub(crate) fn mismatched(name: &str, value: &FieldValue) -> CoreError {
    CoreError::Internal(format!("field '{name}' cannot hold {value:?}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kind_round_trips_through_segment() {
        for kind in EntityKind::iter() {
            assert_eq!(kind.segment().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn reference_id_reads_nested_object() {
        let value = FieldValue::Reference(Some(json!({ "id": 4, "start": null })));
        assert_eq!(value.reference_id(), Some(EntityId::new(4)));
        assert_eq!(value.display(&Utc), "4");
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(FieldValue::Text(Some(String::new())).is_empty());
        assert!(!FieldValue::Choice(Some("PASS".into())).is_empty());
    }
}
