//! Table layout for practice sessions.

use chrono::Local;
use tabled::Tabled;

use practrack_core::PracticeSession;
use practrack_core::datetime::format_for_list;

use super::crud::Listing;

#[derive(Tabled)]
pub struct SessionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Practices")]
    practices: String,
}

impl Listing for PracticeSession {
    type Row = SessionRow;

    fn row(&self) -> SessionRow {
        SessionRow {
            id: self.id.map(|id| id.to_string()).unwrap_or_default(),
            start: self
                .start
                .map(|dt| format_for_list(&dt, &Local))
                .unwrap_or_default(),
            end: self
                .end
                .map(|dt| format_for_list(&dt, &Local))
                .unwrap_or_default(),
            practices: self
                .practices
                .as_ref()
                .map(|p| p.len().to_string())
                .unwrap_or_default(),
        }
    }
}
