//! List screen: the cached collection as a table, one column per field.

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::UnboundedSender;

use practrack_core::{Controller, EntityId, ListParams, Route, SliceState};

use crate::action::{Action, SliceEntity};
use crate::component::Component;
use crate::theme;

use super::{frame_block, hints, render_error, render_spinner, spawn_request};

pub struct ListScreen<E: SliceEntity> {
    controller: Controller,
    action_tx: Option<UnboundedSender<Action>>,
    state: SliceState<E>,
    table_state: TableState,
    throbber: ThrobberState,
}

impl<E: SliceEntity> ListScreen<E> {
    pub fn new(controller: Controller) -> Self {
        let state = controller.state::<E>();
        let mut table_state = TableState::default();
        table_state.select((!state.entities.is_empty()).then_some(0));
        Self {
            controller,
            action_tx: None,
            state,
            table_state,
            throbber: ThrobberState::default(),
        }
    }

    fn refresh(&self) {
        let Some(tx) = &self.action_tx else {
            return;
        };
        let controller = self.controller.clone();
        spawn_request(tx, "list", async move {
            controller.list::<E>(&ListParams::default()).await.map(drop)
        });
    }

    fn selected_id(&self) -> Option<EntityId> {
        let index = self.table_state.selected()?;
        self.state.entities.get(index)?.entity_id()
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.state.entities.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.table_state.select(Some(next));
    }

    /// Route for the selected row, if any.
    fn row_route(&self, to: impl Fn(EntityId) -> Route) -> Option<Action> {
        self.selected_id().map(|id| Action::Navigate(to(id)))
    }

    fn table(&self) -> Table<'static> {
        let mut header = vec![Cell::from("ID").style(theme::table_header())];
        header.extend(
            E::FIELDS
                .iter()
                .map(|f| Cell::from(f.label).style(theme::table_header())),
        );

        let rows = self.state.entities.iter().map(|entity| {
            let mut cells = vec![Cell::from(
                entity.entity_id().map(|id| id.to_string()).unwrap_or_default(),
            )];
            cells.extend(
                E::FIELDS
                    .iter()
                    .map(|f| Cell::from(entity.field(f.name).display(&Local))),
            );
            Row::new(cells).style(theme::text())
        });

        let mut widths = vec![Constraint::Length(8)];
        widths.extend(E::FIELDS.iter().map(|_| Constraint::Min(10)));

        Table::new(rows, widths)
            .header(Row::new(header))
            .row_highlight_style(theme::selected())
            .highlight_symbol("▸")
    }
}

impl<E: SliceEntity> Component for ListScreen<E> {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        self.refresh();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let kind = E::KIND;
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.move_selection(isize::MIN);
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.move_selection(isize::MAX);
                None
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(10);
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-10);
                None
            }
            KeyCode::Char('r') => {
                self.refresh();
                None
            }
            KeyCode::Char('n') => Some(Action::Navigate(Route::New(kind))),
            KeyCode::Enter => self.row_route(|id| Route::Detail(kind, id)),
            KeyCode::Char('e') => self.row_route(|id| Route::Edit(kind, id)),
            KeyCode::Char('d') => self.row_route(|id| Route::Delete(kind, id)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SliceChanged(update) => {
                if let Some(state) = E::unwrap(update) {
                    self.state = state.clone();
                    let len = self.state.entities.len();
                    let selected = match self.table_state.selected() {
                        _ if len == 0 => None,
                        Some(i) => Some(i.min(len - 1)),
                        None => Some(0),
                    };
                    self.table_state.select(selected);
                }
            }
            Action::Tick if self.state.loading => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" {} ({}) ", E::KIND.plural(), self.state.entities.len());
        let block = frame_block(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [status, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        if self.state.loading {
            render_spinner(frame, status, &self.throbber, "Loading...");
        } else if let Some(message) = &self.state.error_message {
            render_error(frame, status, message);
        }

        if self.state.entities.is_empty() {
            if !self.state.loading {
                let empty = Paragraph::new(format!("No {} found", E::KIND.plural()))
                    .alignment(Alignment::Center)
                    .style(theme::key_hint());
                frame.render_widget(empty, body);
            }
        } else {
            let mut table_state = self.table_state;
            frame.render_stateful_widget(self.table(), body, &mut table_state);
        }

        frame.render_widget(
            hints(&[
                ("j/k", "navigate"),
                ("Enter", "view"),
                ("n", "create"),
                ("e", "edit"),
                ("d", "delete"),
                ("r", "refresh"),
            ]),
            footer,
        );
    }

    fn id(&self) -> &'static str {
        "list"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use practrack_core::{EntityKind, Practice, PracticeSession};

    use super::*;
    use crate::screens::testing::{offline_controller, render_text};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded(ids: &[i64]) -> Action {
        let state = SliceState {
            entities: Arc::new(
                ids.iter()
                    .map(|id| {
                        Arc::new(PracticeSession {
                            id: Some(*id),
                            ..PracticeSession::default()
                        })
                    })
                    .collect(),
            ),
            ..SliceState::default()
        };
        Action::SliceChanged(PracticeSession::wrap(state))
    }

    #[test]
    fn empty_collection_shows_message() {
        let screen = ListScreen::<Practice>::new(offline_controller());
        assert!(render_text(&screen, 100, 10).contains("No Practices found"));
    }

    #[test]
    fn loading_hides_empty_message() {
        let mut screen = ListScreen::<Practice>::new(offline_controller());
        let state = SliceState {
            loading: true,
            ..SliceState::default()
        };
        screen
            .update(&Action::SliceChanged(Practice::wrap(state)))
            .unwrap();
        let text = render_text(&screen, 100, 10);
        assert!(!text.contains("No Practices found"));
        assert!(text.contains("Loading..."));
    }

    #[test]
    fn rows_link_to_their_routes() {
        let mut screen = ListScreen::<PracticeSession>::new(offline_controller());
        screen.update(&loaded(&[1001, 1002])).unwrap();
        screen.handle_key_event(key(KeyCode::Down)).unwrap();

        let kind = EntityKind::PracticeSession;
        let id = EntityId::new(1002);
        let navigate = |screen: &mut ListScreen<PracticeSession>, code| {
            match screen.handle_key_event(key(code)).unwrap() {
                Some(Action::Navigate(route)) => route,
                other => panic!("expected navigation, got {other:?}"),
            }
        };
        assert_eq!(navigate(&mut screen, KeyCode::Enter), Route::Detail(kind, id));
        assert_eq!(navigate(&mut screen, KeyCode::Char('e')), Route::Edit(kind, id));
        assert_eq!(navigate(&mut screen, KeyCode::Char('d')), Route::Delete(kind, id));
        assert_eq!(navigate(&mut screen, KeyCode::Char('n')), Route::New(kind));
    }

    #[test]
    fn other_slices_are_ignored() {
        let mut screen = ListScreen::<Practice>::new(offline_controller());
        screen.update(&loaded(&[1])).unwrap();
        assert!(screen.state.entities.is_empty());
        assert_eq!(screen.handle_key_event(key(KeyCode::Enter)).unwrap().map(|_| ()), None);
    }

    #[test]
    fn selection_clamps_when_list_shrinks() {
        let mut screen = ListScreen::<PracticeSession>::new(offline_controller());
        screen.update(&loaded(&[1, 2, 3])).unwrap();
        screen.handle_key_event(key(KeyCode::Char('G'))).unwrap();
        assert_eq!(screen.selected_id(), Some(EntityId::new(3)));

        screen.update(&loaded(&[1])).unwrap();
        assert_eq!(screen.selected_id(), Some(EntityId::new(1)));
    }

    #[test]
    fn table_shows_id_and_field_columns() {
        let mut screen = ListScreen::<PracticeSession>::new(offline_controller());
        screen.update(&loaded(&[1001])).unwrap();
        let text = render_text(&screen, 100, 10);
        assert!(text.contains("Practice Sessions (1)"));
        assert!(text.contains("ID"));
        assert!(text.contains("Start"));
        assert!(text.contains("1001"));
    }
}
