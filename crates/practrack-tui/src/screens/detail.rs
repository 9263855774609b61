//! Detail screen: one entity, read-only.

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::UnboundedSender;

use practrack_core::{Controller, Entity, EntityId, Route, SliceState};

use crate::action::{Action, SliceEntity};
use crate::component::Component;
use crate::theme;

use super::{frame_block, hints, render_error, render_spinner, spawn_request};

pub struct DetailScreen<E: SliceEntity> {
    controller: Controller,
    id: EntityId,
    state: SliceState<E>,
    throbber: ThrobberState,
}

impl<E: SliceEntity> DetailScreen<E> {
    pub fn new(controller: Controller, id: EntityId) -> Self {
        let state = controller.state::<E>();
        Self {
            controller,
            id,
            state,
            throbber: ThrobberState::default(),
        }
    }

    /// The slice entity, once it is the one this screen shows.
    fn entity(&self) -> Option<&E> {
        let entity = self.state.entity.as_ref();
        (entity.entity_id() == Some(self.id)).then_some(entity)
    }
}

/// `Label  value` lines for every field, labels padded to one width.
pub(crate) fn field_lines<E: Entity>(entity: &E) -> Vec<Line<'static>> {
    let width = E::FIELDS
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let id = entity.entity_id().map(|id| id.to_string()).unwrap_or_default();
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("  {:<width$}  ", "ID"), theme::field_label()),
        Span::styled(id, theme::field_value()),
    ])];
    lines.extend(E::FIELDS.iter().map(|f| {
        Line::from(vec![
            Span::styled(format!("  {:<width$}  ", f.label), theme::field_label()),
            Span::styled(entity.field(f.name).display(&Local), theme::field_value()),
        ])
    }));
    lines
}

impl<E: SliceEntity> Component for DetailScreen<E> {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        let controller = self.controller.clone();
        let id = self.id;
        spawn_request(&action_tx, "get", async move {
            controller.get_one::<E>(id).await.map(drop)
        });
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let (kind, id) = (E::KIND, self.id);
        Ok(match key.code {
            KeyCode::Esc | KeyCode::Backspace => Some(Action::Navigate(Route::List(kind))),
            KeyCode::Char('e') => Some(Action::Navigate(Route::Edit(kind, id))),
            KeyCode::Char('d') => Some(Action::Navigate(Route::Delete(kind, id))),
            _ => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SliceChanged(update) => {
                if let Some(state) = E::unwrap(update) {
                    self.state = state.clone();
                }
            }
            Action::Tick if self.state.loading => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = frame_block(format!(" {} {} ", E::KIND.label(), self.id));
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

        if let Some(entity) = self.entity() {
            frame.render_widget(Paragraph::new(field_lines(entity)), body);
        }

        frame.render_widget(
            hints(&[("Esc", "back"), ("e", "edit"), ("d", "delete")]),
            footer,
        );
    }

    fn id(&self) -> &'static str {
        "detail"
    }
}
