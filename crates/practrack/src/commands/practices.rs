//! Table layout for practice attempts.

use chrono::Local;
use tabled::Tabled;

use practrack_core::Practice;
use practrack_core::datetime::format_for_list;

use super::crud::Listing;

#[derive(Tabled)]
pub struct PracticeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Problem")]
    problem_name: String,
    #[tabled(rename = "Link")]
    problem_link: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Session")]
    session: String,
}

impl Listing for Practice {
    type Row = PracticeRow;

    fn row(&self) -> PracticeRow {
        PracticeRow {
            id: self.id.map(|id| id.to_string()).unwrap_or_default(),
            problem_name: self.problem_name.clone(),
            problem_link: self.problem_link.clone(),
            start: self
                .start
                .map(|dt| format_for_list(&dt, &Local))
                .unwrap_or_default(),
            end: self
                .end
                .map(|dt| format_for_list(&dt, &Local))
                .unwrap_or_default(),
            result: self.result.map(|r| r.as_str().to_owned()).unwrap_or_default(),
            session: self
                .practice_session
                .as_ref()
                .and_then(|s| s.id)
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use practrack_core::{PracticeResult, PracticeSession};

    use super::*;

    #[test]
    fn row_shows_referenced_session_id() {
        let practice = Practice {
            id: Some(56),
            problem_name: "Landing Hills Bacon".into(),
            problem_link: "deposit Account".into(),
            result: Some(PracticeResult::Fail),
            practice_session: Some(PracticeSession::reference(1001)),
            ..Practice::default()
        };
        let row = practice.row();
        assert_eq!(row.id, "56");
        assert_eq!(row.result, "FAIL");
        assert_eq!(row.session, "1001");
        assert_eq!(row.start, "");
    }
}
