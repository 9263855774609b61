//! Create/edit form screen.
//!
//! Wraps an [`EntityForm`] with focus handling and manual text editing.
//! Reference fields cycle through the loaded targets with ←/→, or take a
//! typed id. After a successful save the screen navigates back to the
//! list.

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::UnboundedSender;

use practrack_core::{
    Controller, EntityForm, EntityId, FieldKind, FormMode, ReferenceOptions, Route, SlicePhase,
    SliceState,
};

use crate::action::{Action, Notification, SliceEntity};
use crate::component::Component;
use crate::theme;

use super::{frame_block, hints, render_error, render_spinner, spawn_request};

pub struct FormScreen<E: SliceEntity> {
    controller: Controller,
    action_tx: Option<UnboundedSender<Action>>,
    form: EntityForm<E>,
    /// Edit forms start blank until this screen's own fetch returns.
    filled: bool,
    focus: usize,
    options: ReferenceOptions,
    state: SliceState<E>,
    /// A save is in flight or just finished.
    submitted: bool,
    throbber: ThrobberState,
}

impl<E: SliceEntity> FormScreen<E> {
    /// `id` is `None` for a create form.
    pub fn new(controller: Controller, id: Option<EntityId>) -> Self {
        let state = controller.state::<E>();
        let (form, filled) = match id {
            None => (EntityForm::create(&Local::now()), true),
            Some(id) => (EntityForm::edit(id, &E::default(), &Local), false),
        };
        let options = controller.reference_options::<E>();
        Self {
            controller,
            action_tx: None,
            form,
            filled,
            focus: 0,
            options,
            state,
            submitted: false,
            throbber: ThrobberState::default(),
        }
    }

    fn field_count(&self) -> usize {
        self.form.fields().len()
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_count();
    }

    fn focus_prev(&mut self) {
        self.focus = (self.focus + self.field_count() - 1) % self.field_count();
    }

    fn focused_kind(&self) -> Option<FieldKind> {
        self.form.fields().get(self.focus).map(|f| f.kind)
    }

    fn type_char(&mut self, c: char) {
        match self.focused_kind() {
            Some(FieldKind::Choice(_)) if c == ' ' => {
                self.form.cycle(self.focus, &self.options, true);
            }
            Some(FieldKind::Text | FieldKind::DateTime | FieldKind::Reference(_)) => {
                let mut value = self.form.value(self.focus).to_owned();
                value.push(c);
                self.form.set_value(self.focus, value);
            }
            _ => {}
        }
    }

    fn backspace(&mut self) {
        let mut value = self.form.value(self.focus).to_owned();
        if value.pop().is_some() {
            self.form.set_value(self.focus, value);
        }
    }

    /// Validate locally; only a valid form is sent.
    fn submit(&mut self) {
        if self.state.updating || self.submitted {
            return;
        }
        self.options = self.controller.reference_options::<E>();
        if !self.form.validate(&self.options, &Local) {
            return;
        }
        let Some(tx) = &self.action_tx else {
            return;
        };

        self.submitted = true;
        let controller = self.controller.clone();
        let mut form = self.form.clone();
        let failed_tx = tx.clone();
        spawn_request(tx, "save", async move {
            let saved = controller.save(&mut form, &Local).await;
            if saved.is_err() {
                let _ = failed_tx.send(Action::SaveFailed(E::KIND));
            }
            saved.map(drop)
        });
    }

    fn title(&self) -> String {
        match self.form.mode() {
            FormMode::Create => format!(" Create a new {} ", E::KIND.label()),
            FormMode::Edit(id) => format!(" Edit {} {id} ", E::KIND.label()),
        }
    }

    fn field_lines(&self) -> Vec<Line<'static>> {
        let fields = self.form.fields();
        let width = fields.iter().map(|f| f.label.len() + 1).max().unwrap_or(0);

        let mut lines = Vec::with_capacity(fields.len() * 2);
        for (index, field) in fields.iter().enumerate() {
            let focused = index == self.focus;
            let marker = if focused { "▸" } else { " " };
            let required = if field.required { "*" } else { "" };
            let name = [field.label, required].concat();
            let label = format!("{marker} {name:<width$}  ");
            let value = self.form.value(index);
            let shown = match field.kind {
                FieldKind::Choice(_) => format!("◂ {value} ▸"),
                FieldKind::Reference(target) => {
                    let loaded = self.options.get(target).len();
                    format!("◂ {value} ▸  ({loaded} {} loaded)", target.plural())
                }
                FieldKind::DateTime if value.is_empty() && focused => "YYYY-MM-DDTHH:MM".into(),
                _ => value.to_owned(),
            };
            let mut value_style = if focused {
                theme::selected()
            } else {
                theme::field_value()
            };
            if field.kind == FieldKind::DateTime && value.is_empty() {
                value_style = value_style.add_modifier(Modifier::DIM);
            }

            let mut spans = vec![
                Span::styled(label, theme::field_label()),
                Span::styled(shown, value_style),
            ];
            if focused && matches!(field.kind, FieldKind::Text | FieldKind::DateTime) {
                spans.push(Span::styled("▏", theme::border()));
            }
            lines.push(Line::from(spans));

            if let Some(error) = self.form.error(index) {
                lines.push(Line::from(Span::styled(
                    format!("  {:width$}  {error}", ""),
                    theme::error(),
                )));
            }
        }
        lines
    }
}

impl<E: SliceEntity> Component for FormScreen<E> {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        let controller = self.controller.clone();
        let edit_id = match self.form.mode() {
            FormMode::Create => {
                controller.reset::<E>();
                None
            }
            FormMode::Edit(id) => Some(id),
        };
        let tx = action_tx.clone();
        spawn_request(&action_tx, "load form", async move {
            if let Some(id) = edit_id {
                let entity = controller.get_one::<E>(id).await?;
                let _ = tx.send(Action::EntityFetched(E::fetched(entity)));
            }
            controller.preload_references::<E>().await.map(drop)
        });
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Esc {
            return Ok(Some(Action::Navigate(Route::List(E::KIND))));
        }
        if self.submitted {
            return Ok(None);
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Right => self.form.cycle(self.focus, &self.options, true),
            KeyCode::Left => self.form.cycle(self.focus, &self.options, false),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Enter => self.submit(),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => self.submit(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.type_char(c);
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SliceChanged(update) => {
                self.options = self.controller.reference_options::<E>();
                let Some(state) = E::unwrap(update) else {
                    return Ok(None);
                };
                self.state = state.clone();

                if self.submitted {
                    match self.state.phase() {
                        SlicePhase::Succeeded => {
                            self.submitted = false;
                            if let Some(tx) = &self.action_tx {
                                let _ = tx.send(Action::Notify(Notification::success(format!(
                                    "{} saved",
                                    E::KIND.label()
                                ))));
                            }
                            return Ok(Some(Action::Navigate(Route::List(E::KIND))));
                        }
                        SlicePhase::Failed => self.submitted = false,
                        _ => {}
                    }
                }
            }
            Action::EntityFetched(fetched) => {
                if let (FormMode::Edit(id), Some(entity)) =
                    (self.form.mode(), E::unwrap_fetched(fetched))
                {
                    if !self.filled && entity.entity_id() == Some(id) {
                        self.form = EntityForm::edit(id, entity, &Local);
                        self.filled = true;
                    }
                }
            }
            Action::SaveFailed(kind) if *kind == E::KIND && self.submitted => {
                self.submitted = false;
                self.options = self.controller.reference_options::<E>();
                self.form.validate(&self.options, &Local);
            }
            Action::Tick if self.state.loading || self.state.updating => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = frame_block(self.title());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [status, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        if self.state.updating {
            render_spinner(frame, status, &self.throbber, "Saving...");
        } else if self.state.loading {
            render_spinner(frame, status, &self.throbber, "Loading...");
        } else if let Some(message) = &self.state.error_message {
            render_error(frame, status, message);
        }

        frame.render_widget(Paragraph::new(self.field_lines()), body);
        frame.render_widget(
            hints(&[
                ("Tab", "next field"),
                ("←/→", "choose"),
                ("Enter", "save"),
                ("Esc", "cancel"),
            ]),
            footer,
        );
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn id(&self) -> &'static str {
        "form"
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

    fn press(screen: &mut impl Component, code: KeyCode) -> Option<Action> {
        screen.handle_key_event(KeyEvent::from(code)).unwrap()
    }

    fn type_text(screen: &mut impl Component, text: &str) {
        for c in text.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    fn practice_state(practice: Practice) -> Action {
        Action::SliceChanged(Practice::wrap(SliceState {
            entity: Arc::new(practice),
            ..SliceState::default()
        }))
    }

    fn fetched(practice: Practice) -> Action {
        Action::EntityFetched(Practice::fetched(practice))
    }

    #[test]
    fn create_form_starts_with_defaults() {
        let screen = FormScreen::<Practice>::new(offline_controller(), None);
        assert!(screen.form.value_of("start").unwrap().ends_with("T00:00"));
        assert_eq!(screen.form.value_of("result"), Some("PASS"));
        assert_eq!(screen.form.value_of("problemName"), Some(""));
        assert!(render_text(&screen, 100, 20).contains("Create a new Practice"));
    }

    #[test]
    fn typing_edits_the_focused_field() {
        let mut screen = FormScreen::<Practice>::new(offline_controller(), None);
        type_text(&mut screen, "two-sup");
        press(&mut screen, KeyCode::Backspace);
        type_text(&mut screen, "m");
        press(&mut screen, KeyCode::Tab);
        type_text(&mut screen, "q");

        assert_eq!(screen.form.value_of("problemName"), Some("two-sum"));
        assert_eq!(screen.form.value_of("problemLink"), Some("q"));
    }

    #[test]
    fn choice_cycles_with_arrows() {
        let mut screen = FormScreen::<Practice>::new(offline_controller(), None);
        screen.focus = 4;
        press(&mut screen, KeyCode::Right);
        assert_eq!(screen.form.value_of("result"), Some("FAIL"));
        type_text(&mut screen, "x");
        assert_eq!(screen.form.value_of("result"), Some("FAIL"));
        press(&mut screen, KeyCode::Left);
        assert_eq!(screen.form.value_of("result"), Some("PASS"));
    }

    #[test]
    fn invalid_form_shows_errors_and_sends_nothing() {
        let mut screen = FormScreen::<Practice>::new(offline_controller(), None);
        press(&mut screen, KeyCode::Enter);

        assert!(!screen.submitted);
        assert!(screen.form.has_errors());
        assert!(render_text(&screen, 100, 24).contains("This field is required."));
    }

    #[test]
    fn edit_form_fills_once_from_fetched_entity() {
        let mut screen = FormScreen::<Practice>::new(offline_controller(), Some(EntityId::new(7)));
        assert_eq!(screen.form.value_of("problemName"), Some(""));

        screen
            .update(&fetched(Practice {
                id: Some(7),
                problem_name: "two-sum".into(),
                practice_session: Some(PracticeSession {
                    id: Some(1001),
                    ..PracticeSession::default()
                }),
                ..Practice::default()
            }))
            .unwrap();
        assert_eq!(screen.form.value_of("problemName"), Some("two-sum"));
        assert_eq!(screen.form.value_of("practiceSession"), Some("1001"));
        assert_eq!(screen.form.value_of("result"), Some("PASS"));

        type_text(&mut screen, "!");
        screen
            .update(&fetched(Practice {
                id: Some(7),
                problem_name: "refetched".into(),
                ..Practice::default()
            }))
            .unwrap();
        assert_eq!(screen.form.value_of("problemName"), Some("two-sum!"));
    }

    #[test]
    fn edit_form_ignores_cached_entity_until_its_fetch_returns() {
        let mut screen = FormScreen::<Practice>::new(offline_controller(), Some(EntityId::new(7)));

        screen
            .update(&practice_state(Practice {
                id: Some(7),
                problem_name: "old-name".into(),
                ..Practice::default()
            }))
            .unwrap();
        assert_eq!(screen.form.value_of("problemName"), Some(""));

        screen
            .update(&fetched(Practice {
                id: Some(7),
                problem_name: "fresh-name".into(),
                ..Practice::default()
            }))
            .unwrap();
        assert_eq!(screen.form.value_of("problemName"), Some("fresh-name"));
    }

    #[test]
    fn fetched_entity_for_another_id_is_ignored() {
        let mut screen = FormScreen::<Practice>::new(offline_controller(), Some(EntityId::new(7)));
        screen
            .update(&fetched(Practice {
                id: Some(8),
                problem_name: "other".into(),
                ..Practice::default()
            }))
            .unwrap();
        assert_eq!(screen.form.value_of("problemName"), Some(""));
        assert!(!screen.filled);
    }

    #[tokio::test]
    async fn failed_save_unlocks_the_form() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut screen = FormScreen::<PracticeSession>::new(offline_controller(), None);
        screen.init(tx).unwrap();

        press(&mut screen, KeyCode::Enter);
        assert!(screen.submitted);
        type_text(&mut screen, "x");
        assert!(screen.form.value_of("start").unwrap().ends_with("T00:00"));

        loop {
            let action = rx.recv().await.unwrap();
            if matches!(action, Action::SaveFailed(_)) {
                screen.update(&action).unwrap();
                break;
            }
        }
        assert!(!screen.submitted);

        press(&mut screen, KeyCode::Backspace);
        assert!(screen.form.value_of("start").unwrap().ends_with("T00:0"));
    }

    #[test]
    fn save_failure_for_another_kind_is_ignored() {
        let mut screen = FormScreen::<PracticeSession>::new(offline_controller(), None);
        screen.submitted = true;
        screen.update(&Action::SaveFailed(EntityKind::Practice)).unwrap();
        assert!(screen.submitted);
    }

    #[test]
    fn success_navigates_back_to_list() {
        let mut screen = FormScreen::<PracticeSession>::new(offline_controller(), None);
        screen.submitted = true;

        let state = SliceState {
            update_success: true,
            ..SliceState::default()
        };
        let follow_up = screen
            .update(&Action::SliceChanged(PracticeSession::wrap(state)))
            .unwrap();
        assert!(matches!(
            follow_up,
            Some(Action::Navigate(Route::List(EntityKind::PracticeSession)))
        ));
        assert!(!screen.submitted);
    }

    #[test]
    fn failure_allows_resubmit() {
        let mut screen = FormScreen::<PracticeSession>::new(offline_controller(), None);
        screen.submitted = true;

        let state = SliceState {
            error_message: Some("Bad Request".into()),
            ..SliceState::default()
        };
        let follow_up = screen
            .update(&Action::SliceChanged(PracticeSession::wrap(state)))
            .unwrap();
        assert!(follow_up.is_none());
        assert!(!screen.submitted);
        assert!(render_text(&screen, 100, 12).contains("Bad Request"));
    }

    #[test]
    fn escape_cancels_to_list() {
        let mut screen = FormScreen::<Practice>::new(offline_controller(), None);
        assert!(matches!(
            press(&mut screen, KeyCode::Esc),
            Some(Action::Navigate(Route::List(EntityKind::Practice)))
        ));
    }
}
