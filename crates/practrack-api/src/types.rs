// Wire types for the practice-tracker REST API.
//
// Field names are camelCase on the wire. Absent optional fields are
// omitted rather than sent as `null`, so the same structs serve full
// replacement (PUT) and merge-patch (PATCH) bodies.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::Resource;

// ── PracticeSession ──────────────────────────────────────────────────

/// A block of time spent practising.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Child attempts. Only populated by the server on some reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practices: Option<Vec<Practice>>,
}

impl PracticeSession {
    /// A bare `{id}` reference, the minimum the server needs for a foreign key.
    pub fn reference(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

impl Resource for PracticeSession {
    const COLLECTION: &'static str = "practice-sessions";
    const NAME: &'static str = "practiceSession";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

// ── Practice ─────────────────────────────────────────────────────────

/// A single attempt at a coding problem, owned by one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub problem_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub problem_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PracticeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_session: Option<PracticeSession>,
}

impl Resource for Practice {
    const COLLECTION: &'static str = "practices";
    const NAME: &'static str = "practice";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

// ── PracticeResult ───────────────────────────────────────────────────

/// Outcome of a practice attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PracticeResult {
    Pass,
    Fail,
}

impl PracticeResult {
    pub const ALL: [Self; 2] = [Self::Pass, Self::Fail];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for PracticeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PracticeResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Ok(Self::Pass),
            "FAIL" => Ok(Self::Fail),
            other => Err(format!("expected PASS or FAIL, got '{other}'")),
        }
    }
}
