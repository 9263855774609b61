// ── PracticeSession metadata ──

use practrack_api::PracticeSession;

use super::meta::{self, Entity, EntityKind, FieldSpec, FieldValue};
use crate::error::CoreError;
use crate::store::{DataStore, EntitySlice};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::datetime("start", "Start"),
    FieldSpec::datetime("end", "End"),
];

impl Entity for PracticeSession {
    const KIND: EntityKind = EntityKind::PracticeSession;
    const FIELDS: &'static [FieldSpec] = FIELDS;

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "start" => FieldValue::DateTime(self.start),
            "end" => FieldValue::DateTime(self.end),
            _ => FieldValue::Text(None),
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CoreError> {
        let slot = match name {
            "start" => &mut self.start,
            "end" => &mut self.end,
            _ => return Err(meta::unknown_field(Self::KIND, name)),
        };
        match value {
            FieldValue::DateTime(v) => {
                *slot = v;
                Ok(())
            }
            other => Err(meta::mismatched(name, &other)),
        }
    }

    fn slice(store: &DataStore) -> &EntitySlice<Self> {
        &store.practice_sessions
    }
}
