// ── Create/edit form model ──
//
// Text-backed form state for any `Entity`, independent of how it is
// rendered. Values are held as the strings the user typed, parallel to
// `E::FIELDS`, and only become typed values on `submit`.

use std::collections::HashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use serde_json::{Value, json};

use crate::datetime;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityKind, FieldKind, FieldSpec, FieldValue};
use crate::store::DataStore;

pub const REQUIRED_MESSAGE: &str = "This field is required.";

// ── Reference options ───────────────────────────────────────────────

/// One selectable target for a reference field.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceOption {
    pub id: EntityId,
    /// The full entity as JSON; sent as the nested reference object.
    pub value: Value,
}

impl ReferenceOption {
    pub fn from_entity<E: Entity>(entity: &E) -> Option<Self> {
        Some(Self {
            id: entity.entity_id()?,
            value: serde_json::to_value(entity).ok()?,
        })
    }
}

/// Loaded choices for every reference field of a form, by target kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceOptions {
    by_kind: HashMap<EntityKind, Vec<ReferenceOption>>,
}

impl ReferenceOptions {
    pub fn insert(&mut self, kind: EntityKind, options: Vec<ReferenceOption>) {
        self.by_kind.insert(kind, options);
    }

    pub fn get(&self, kind: EntityKind) -> &[ReferenceOption] {
        self.by_kind.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Build options for `kinds` from whatever lists the store holds.
    pub fn from_store(store: &DataStore, kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        let mut options = Self::default();
        for kind in kinds {
            let list = match kind {
                EntityKind::PracticeSession => collect(&store.practice_sessions.snapshot().entities),
                EntityKind::Practice => collect(&store.practices.snapshot().entities),
            };
            options.insert(kind, list);
        }
        options
    }

    fn find(&self, kind: EntityKind, id: EntityId) -> Option<&ReferenceOption> {
        self.get(kind).iter().find(|o| o.id == id)
    }
}

fn collect<E: Entity>(entities: &[Arc<E>]) -> Vec<ReferenceOption> {
    entities
        .iter()
        .filter_map(|e| ReferenceOption::from_entity(e.as_ref()))
        .collect()
}

/// Target kinds of `E`'s reference fields.
pub fn reference_kinds<E: Entity>() -> impl Iterator<Item = EntityKind> {
    E::FIELDS.iter().filter_map(|f| match f.kind {
        FieldKind::Reference(target) => Some(target),
        _ => None,
    })
}

// ── Form ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(EntityId),
}

/// Editable text state for one entity.
#[derive(Debug, Clone)]
pub struct EntityForm<E> {
    mode: FormMode,
    values: Vec<String>,
    errors: Vec<Option<String>>,
    _entity: PhantomData<E>,
}

impl<E: Entity> EntityForm<E> {
    /// Blank form for a new entity. Dates start at the beginning of
    /// `now`'s day and choices at their first option.
    pub fn create<Tz>(now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let values = E::FIELDS
            .iter()
            .map(|f| match f.kind {
                FieldKind::DateTime => datetime::default_display(now),
                FieldKind::Choice(options) => first_option(options),
                FieldKind::Text | FieldKind::Reference(_) => String::new(),
            })
            .collect();
        Self::with_values(FormMode::Create, values)
    }

    /// Form pre-filled from a fetched entity.
    pub fn edit<Tz>(id: EntityId, entity: &E, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let values = E::FIELDS
            .iter()
            .map(|f| edit_text(f, entity.field(f.name), tz))
            .collect();
        Self::with_values(FormMode::Edit(id), values)
    }

    fn with_values(mode: FormMode, values: Vec<String>) -> Self {
        Self {
            mode,
            errors: vec![None; values.len()],
            values,
            _entity: PhantomData,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        E::FIELDS
    }

    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map_or("", String::as_str)
    }

    pub fn value_of(&self, name: &str) -> Option<&str> {
        let index = E::FIELDS.iter().position(|f| f.name == name)?;
        Some(self.value(index))
    }

    pub fn error(&self, index: usize) -> Option<&str> {
        self.errors.get(index).and_then(Option::as_deref)
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(Option::is_some)
    }

    /// Replace a value; clears that field's error.
    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.into();
            self.errors[index] = None;
        }
    }

    /// Set a value by wire name. Unknown names are ignored.
    pub fn set_named(&mut self, name: &str, value: impl Into<String>) -> bool {
        match E::FIELDS.iter().position(|f| f.name == name) {
            Some(index) => {
                self.set_value(index, value);
                true
            }
            None => false,
        }
    }

    /// Step a choice or reference field to its next (or previous) option.
    pub fn cycle(&mut self, index: usize, options: &ReferenceOptions, forward: bool) {
        let Some(field) = E::FIELDS.get(index) else {
            return;
        };
        let choices: Vec<String> = match field.kind {
            FieldKind::Choice(values) => values.iter().map(|v| (*v).to_owned()).collect(),
            FieldKind::Reference(target) => options
                .get(target)
                .iter()
                .map(|o| o.id.to_string())
                .collect(),
            FieldKind::Text | FieldKind::DateTime => return,
        };
        if choices.is_empty() {
            return;
        }

        let current = choices.iter().position(|c| c == self.value(index));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => choices.len() - 1,
            (Some(i), true) => (i + 1) % choices.len(),
            (Some(i), false) => (i + choices.len() - 1) % choices.len(),
        };
        self.set_value(index, choices[next].clone());
    }

    /// Check every field, recording per-field messages. Returns `true`
    /// when the form may be submitted.
    pub fn validate<Tz: TimeZone>(&mut self, options: &ReferenceOptions, tz: &Tz) -> bool {
        for (index, field) in E::FIELDS.iter().enumerate() {
            self.errors[index] = check(field, self.value(index), options, tz);
        }
        !self.has_errors()
    }

    /// Validate and merge the form over `base`, producing the entity to
    /// send. Reference ids are resolved to the full loaded object.
    ///
    /// A date whose text still reads as `base`'s value keeps that value,
    /// seconds included; the display format only has minutes.
    pub fn submit<Tz>(
        &mut self,
        base: &E,
        options: &ReferenceOptions,
        tz: &Tz,
    ) -> Result<E, CoreError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if !self.validate(options, tz) {
            let (field, message) = E::FIELDS
                .iter()
                .zip(&self.errors)
                .find_map(|(f, e)| e.as_ref().map(|m| (f.label, m.clone())))
                .unwrap_or(("form", REQUIRED_MESSAGE.to_owned()));
            return Err(CoreError::validation(field, message));
        }

        let mut entity = base.clone();
        for (index, field) in E::FIELDS.iter().enumerate() {
            let raw = self.value(index);
            if field.kind == FieldKind::DateTime
                && raw.trim() == edit_text(field, base.field(field.name), tz)
            {
                continue;
            }
            let value = convert(field, raw, options, tz)?;
            entity.set_field(field.name, value)?;
        }
        Ok(entity)
    }
}

// ── Partial updates ─────────────────────────────────────────────────

/// Entity carrying only `id` and the named fields, for `PATCH`.
///
/// Values are parsed like form input, except that references are sent as
/// a bare `{"id": ..}` object without checking that the target exists.
pub fn sparse_entity<E, Tz>(
    id: EntityId,
    assignments: &[(&str, &str)],
    tz: &Tz,
) -> Result<E, CoreError>
where
    E: Entity,
    Tz: TimeZone,
{
    let mut entity: E = serde_json::from_value(json!({ "id": id.get() }))
        .map_err(|e| CoreError::Internal(format!("cannot build {}: {e}", E::KIND.label())))?;

    let none = ReferenceOptions::default();
    for (name, raw) in assignments {
        let field = E::field_spec(name)
            .ok_or_else(|| CoreError::validation(*name, format!("unknown {} field", E::KIND.label())))?;
        let value = match field.kind {
            FieldKind::Reference(_) => {
                let target: EntityId = raw
                    .trim()
                    .parse()
                    .map_err(|_| CoreError::validation(field.label, "Invalid id."))?;
                FieldValue::Reference(Some(json!({ "id": target.get() })))
            }
            _ => {
                if let Some(message) = check(field, raw, &none, tz) {
                    return Err(CoreError::validation(field.label, message));
                }
                convert(field, raw, &none, tz)?
            }
        };
        entity.set_field(field.name, value)?;
    }
    Ok(entity)
}

/// How `value` reads in an edit form.
fn edit_text<Tz>(field: &FieldSpec, value: FieldValue, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match (field.kind, value) {
        (FieldKind::DateTime, FieldValue::DateTime(v)) => v
            .map(|dt| datetime::to_display(&dt, tz))
            .unwrap_or_default(),
        (FieldKind::Choice(options), FieldValue::Choice(v)) => {
            v.unwrap_or_else(|| first_option(options))
        }
        (_, value @ FieldValue::Reference(_)) => value
            .reference_id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        (_, FieldValue::Text(v)) => v.unwrap_or_default(),
        _ => String::new(),
    }
}

fn first_option(options: &[&str]) -> String {
    options.first().copied().unwrap_or_default().to_owned()
}

fn check<Tz: TimeZone>(
    field: &FieldSpec,
    raw: &str,
    options: &ReferenceOptions,
    tz: &Tz,
) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return field.required.then(|| REQUIRED_MESSAGE.to_owned());
    }

    match field.kind {
        FieldKind::Text => None,
        FieldKind::DateTime => datetime::from_display(raw, tz)
            .is_none()
            .then(|| "Invalid date, expected YYYY-MM-DDTHH:MM.".to_owned()),
        FieldKind::Choice(values) => (!values.contains(&raw))
            .then(|| format!("Must be one of {}.", values.join(", "))),
        FieldKind::Reference(target) => match raw.parse::<EntityId>() {
            Err(_) => Some(format!("'{raw}' is not a valid id.")),
            Ok(id) if options.find(target, id).is_none() => {
                Some(format!("{} {id} does not exist.", target.label()))
            }
            Ok(_) => None,
        },
    }
}

/// Text to typed value. Assumes `check` passed.
fn convert<Tz: TimeZone>(
    field: &FieldSpec,
    raw: &str,
    options: &ReferenceOptions,
    tz: &Tz,
) -> Result<FieldValue, CoreError> {
    let raw = raw.trim();
    let present = (!raw.is_empty()).then(|| raw.to_owned());

    Ok(match field.kind {
        FieldKind::Text => FieldValue::Text(present),
        FieldKind::Choice(_) => FieldValue::Choice(present),
        FieldKind::DateTime => FieldValue::DateTime(match present {
            None => None,
            Some(text) => Some(
                datetime::from_display(&text, tz)
                    .ok_or_else(|| CoreError::validation(field.label, "Invalid date."))?,
            ),
        }),
        FieldKind::Reference(target) => FieldValue::Reference(match present {
            None => None,
            Some(text) => {
                let id: EntityId = text
                    .parse()
                    .map_err(|_| CoreError::validation(field.label, "Invalid id."))?;
                let option = options.find(target, id).ok_or_else(|| {
                    CoreError::validation(field.label, format!("{} {id} does not exist.", target.label()))
                })?;
                Some(option.value.clone())
            }
        }),
    })
}
