// ── Practice metadata ──

use practrack_api::{Practice, PracticeResult, PracticeSession};

use super::meta::{self, Entity, EntityKind, FieldSpec, FieldValue};
use crate::error::CoreError;
use crate::store::{DataStore, EntitySlice};

const RESULT_OPTIONS: &[&str] = &["PASS", "FAIL"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("problemName", "Problem Name").required(),
    FieldSpec::text("problemLink", "Problem Link").required(),
    FieldSpec::datetime("start", "Start"),
    FieldSpec::datetime("end", "End"),
    FieldSpec::choice("result", "Result", RESULT_OPTIONS),
    FieldSpec::reference("practiceSession", "Practice Session", EntityKind::PracticeSession)
        .required(),
];

impl Entity for Practice {
    const KIND: EntityKind = EntityKind::Practice;
    const FIELDS: &'static [FieldSpec] = FIELDS;

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "problemName" => FieldValue::Text(Some(self.problem_name.clone())),
            "problemLink" => FieldValue::Text(Some(self.problem_link.clone())),
            "start" => FieldValue::DateTime(self.start),
            "end" => FieldValue::DateTime(self.end),
            "result" => FieldValue::Choice(self.result.map(|r| r.as_str().to_owned())),
            "practiceSession" => FieldValue::Reference(
                self.practice_session
                    .as_ref()
                    .and_then(|s| serde_json::to_value(s).ok()),
            ),
            _ => FieldValue::Text(None),
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CoreError> {
        match (name, value) {
            ("problemName", FieldValue::Text(v)) => self.problem_name = v.unwrap_or_default(),
            ("problemLink", FieldValue::Text(v)) => self.problem_link = v.unwrap_or_default(),
            ("start", FieldValue::DateTime(v)) => self.start = v,
            ("end", FieldValue::DateTime(v)) => self.end = v,
            ("result", FieldValue::Choice(v)) => {
                self.result = v
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<PracticeResult>)
                    .transpose()
                    .map_err(|e| CoreError::validation("result", e))?;
            }
            ("practiceSession", FieldValue::Reference(v)) => {
                self.practice_session = v
                    .map(serde_json::from_value::<PracticeSession>)
                    .transpose()
                    .map_err(|e| CoreError::validation("practiceSession", e.to_string()))?;
            }
            (name, value) if Self::field_spec(name).is_some() => {
                return Err(meta::mismatched(name, &value));
            }
            (name, _) => return Err(meta::unknown_field(Self::KIND, name)),
        }
        Ok(())
    }

    fn slice(store: &DataStore) -> &EntitySlice<Self> {
        &store.practices
    }
}
