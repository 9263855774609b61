//! Delete confirmation dialog.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Wrap};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::UnboundedSender;

use practrack_core::{Controller, EntityId, Route, SlicePhase, SliceState};

use crate::action::{Action, Notification, SliceEntity};
use crate::component::Component;
use crate::theme;

use super::detail::field_lines;
use super::{frame_block, hints, render_error, render_spinner, spawn_request};

pub struct DeleteScreen<E: SliceEntity> {
    controller: Controller,
    action_tx: Option<UnboundedSender<Action>>,
    id: EntityId,
    state: SliceState<E>,
    /// Delete was confirmed and sent.
    confirmed: bool,
    throbber: ThrobberState,
}

impl<E: SliceEntity> DeleteScreen<E> {
    pub fn new(controller: Controller, id: EntityId) -> Self {
        let state = controller.state::<E>();
        Self {
            controller,
            action_tx: None,
            id,
            state,
            confirmed: false,
            throbber: ThrobberState::default(),
        }
    }

    fn prompt(&self) -> String {
        format!("Are you sure you want to delete {} {}?", E::KIND.label(), self.id)
    }

    fn confirm(&mut self) {
        if self.confirmed {
            return;
        }
        let Some(tx) = &self.action_tx else {
            return;
        };
        self.confirmed = true;
        let controller = self.controller.clone();
        let id = self.id;
        spawn_request(tx, "delete", async move { controller.delete::<E>(id).await });
    }
}

impl<E: SliceEntity> Component for DeleteScreen<E> {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        let controller = self.controller.clone();
        let id = self.id;
        spawn_request(&action_tx, "get", async move {
            controller.get_one::<E>(id).await.map(drop)
        });
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
                self.confirm();
                None
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc if !self.confirmed => {
                Some(Action::Navigate(Route::List(E::KIND)))
            }
            _ => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SliceChanged(update) => {
                let Some(state) = E::unwrap(update) else {
                    return Ok(None);
                };
                self.state = state.clone();

                if self.confirmed {
                    match self.state.phase() {
                        SlicePhase::Succeeded => {
                            if let Some(tx) = &self.action_tx {
                                let _ = tx.send(Action::Notify(Notification::success(format!(
                                    "{} {} deleted",
                                    E::KIND.label(),
                                    self.id
                                ))));
                            }
                            return Ok(Some(Action::Navigate(Route::List(E::KIND))));
                        }
                        SlicePhase::Failed => self.confirmed = false,
                        _ => {}
                    }
                }
            }
            Action::Tick if self.state.loading || self.state.updating => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [dialog] = Layout::horizontal([Constraint::Max(72)])
            .flex(Flex::Center)
            .areas(area);
        let [dialog] = Layout::vertical([Constraint::Max(16)])
            .flex(Flex::Center)
            .areas(dialog);

        frame.render_widget(Clear, dialog);
        let block = frame_block(" Confirm delete operation ".into());
        let inner = block.inner(dialog);
        frame.render_widget(block, dialog);

        let [status, prompt, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        if self.state.updating {
            render_spinner(frame, status, &self.throbber, "Deleting...");
        } else if self.state.loading {
            render_spinner(frame, status, &self.throbber, "Loading...");
        } else if let Some(message) = &self.state.error_message {
            render_error(frame, status, message);
        }

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(format!(" {}", self.prompt()), theme::title())))
                .wrap(Wrap { trim: false }),
            prompt,
        );

        let entity = self.state.entity.as_ref();
        if entity.entity_id() == Some(self.id) {
            frame.render_widget(Paragraph::new(field_lines(entity)), body);
        }

        frame.render_widget(hints(&[("y", "delete"), ("n/Esc", "cancel")]), footer);
    }

    fn id(&self) -> &'static str {
        "delete"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use practrack_core::{EntityKind, Practice};

    use super::*;
    use crate::screens::testing::{offline_controller, render_text};

    #[test]
    fn asks_for_confirmation_with_label_and_id() {
        let screen = DeleteScreen::<Practice>::new(offline_controller(), EntityId::new(55));
        assert!(render_text(&screen, 100, 20).contains("Are you sure you want to delete Practice 55?"));
    }

    #[test]
    fn cancel_returns_to_list_without_request() {
        let mut screen = DeleteScreen::<Practice>::new(offline_controller(), EntityId::new(55));
        let follow_up = screen.handle_key_event(KeyEvent::from(KeyCode::Char('n'))).unwrap();
        assert!(matches!(
            follow_up,
            Some(Action::Navigate(Route::List(EntityKind::Practice)))
        ));
        assert!(!screen.confirmed);
    }

    #[tokio::test]
    async fn confirmed_delete_on_offline_controller_raises_toast() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut screen = DeleteScreen::<Practice>::new(offline_controller(), EntityId::new(55));
        screen.init(tx).unwrap();
        screen.handle_key_event(KeyEvent::from(KeyCode::Char('y'))).unwrap();
        assert!(screen.confirmed);

        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                Action::Notify(n) => assert_eq!(n.level, crate::action::NotificationLevel::Error),
                other => panic!("expected a toast, got {other:?}"),
            }
        }
    }

    #[test]
    fn success_navigates_to_list() {
        let mut screen = DeleteScreen::<Practice>::new(offline_controller(), EntityId::new(55));
        screen.confirmed = true;
        let state = SliceState {
            update_success: true,
            ..SliceState::default()
        };
        let follow_up = screen
            .update(&Action::SliceChanged(Practice::wrap(state)))
            .unwrap();
        assert!(matches!(
            follow_up,
            Some(Action::Navigate(Route::List(EntityKind::Practice)))
        ));
    }
}
