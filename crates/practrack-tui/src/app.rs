//! Application core: event loop, route mounting, action dispatch.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, BorderType, Clear, Paragraph, Tabs},
};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use practrack_core::{Controller, EntityKind, Route};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screens;
use crate::theme;
use crate::tui::Tui;

const TOAST_TTL: Duration = Duration::from_secs(3);

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

pub struct App {
    controller: Controller,
    route: Route,
    /// Screen for `route`; mounted once the controller is connected.
    screen: Option<Box<dyn Component>>,
    running: bool,
    connection_status: ConnectionStatus,
    /// Last connection failure, shown until the next connect.
    connection_error: Option<String>,
    help_visible: bool,
    notification: Option<(Notification, Instant)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(controller: Controller, route: Route) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            route,
            screen: None,
            running: true,
            connection_status: ConnectionStatus::default(),
            connection_error: None,
            help_visible: false,
            notification: None,
            action_tx,
            action_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            self.controller.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        ));

        let mut tui = Tui::enter()?;
        let mut events = EventReader::new(Duration::from_millis(250), Duration::from_millis(33));
        info!("event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            let action = match event {
                Event::Key(key) => self.handle_key_event(key)?,
                Event::Resize | Event::Render => Some(Action::Render),
                Event::Tick => Some(Action::Tick),
            };
            if let Some(action) = action {
                self.action_tx.send(action)?;
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if matches!(action, Action::Render) {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        cancel.cancel();
        let _ = bridge.await;
        info!("event loop ended");
        Ok(())
    }

    /// Global keys first, then the active screen. Screens that capture
    /// input only leave Ctrl+C global.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        let capturing = self.screen.as_ref().is_some_and(|s| s.captures_input());
        if !capturing {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                KeyCode::Char(c @ '1'..='9') => {
                    let index = usize::from(u8::try_from(c).unwrap_or(b'1') - b'1');
                    if let Some(kind) = EntityKind::iter().nth(index) {
                        return Ok(Some(Action::Navigate(Route::List(kind))));
                    }
                }
                KeyCode::Tab => return Ok(Some(Action::Navigate(self.cycle_tab(true)))),
                KeyCode::BackTab => return Ok(Some(Action::Navigate(self.cycle_tab(false)))),
                _ => {}
            }
        }

        match self.screen.as_mut() {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    fn cycle_tab(&self, forward: bool) -> Route {
        let kinds: Vec<EntityKind> = EntityKind::iter().collect();
        let current = kinds
            .iter()
            .position(|k| *k == self.route.kind())
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % kinds.len()
        } else {
            (current + kinds.len() - 1) % kinds.len()
        };
        Route::List(kinds[next])
    }

    /// Replace the active screen with a fresh one for `route`.
    fn mount(&mut self, route: Route) -> Result<()> {
        debug!(from = %self.route, to = %route, "navigate");
        self.route = route;
        let mut screen = screens::mount(route, self.controller.clone());
        screen.init(self.action_tx.clone())?;
        debug!(screen = screen.id(), "mounted");
        self.screen = Some(screen);
        Ok(())
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Navigate(route) => {
                if self.connection_status == ConnectionStatus::Connected {
                    self.mount(*route)?;
                } else {
                    self.route = *route;
                }
            }

            Action::Connecting => self.connection_status = ConnectionStatus::Connecting,

            Action::Connected => {
                self.connection_status = ConnectionStatus::Connected;
                self.connection_error = None;
                if self.screen.is_none() {
                    self.mount(self.route)?;
                }
            }

            Action::Disconnected(reason) => {
                self.connection_status = ConnectionStatus::Disconnected;
                self.connection_error = Some(reason.clone());
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),

            Action::Render => {}

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > TOAST_TTL)
                {
                    self.notification = None;
                }
                self.forward(action)?;
            }

            Action::SliceChanged(_) | Action::EntityFetched(_) | Action::SaveFailed(_) => {
                self.forward(action)?;
            }
        }
        Ok(())
    }

    /// Hand an action to the active screen and queue its follow-up.
    fn forward(&mut self, action: &Action) -> Result<()> {
        if let Some(screen) = self.screen.as_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [tabs, content, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_tab_bar(frame, tabs);
        match &self.screen {
            Some(screen) => screen.render(frame, content),
            None => self.render_connecting(frame, content),
        }
        self.render_status_bar(frame, status);

        if let Some((notification, _)) = &self.notification {
            render_notification(frame, content, notification);
        }
        if self.help_visible {
            render_help(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = EntityKind::iter()
            .enumerate()
            .map(|(i, kind)| {
                let style = if kind == self.route.kind() {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", i + 1, kind.plural()), style))
            })
            .collect();
        let selected = EntityKind::iter()
            .position(|k| k == self.route.kind())
            .unwrap_or(0);

        let tabs = Tabs::new(titles)
            .divider(Span::styled("│", theme::key_hint()))
            .select(selected);
        frame.render_widget(tabs, area);
    }

    fn render_connecting(&self, frame: &mut Frame, area: Rect) {
        let text = match (&self.connection_status, &self.connection_error) {
            (_, Some(reason)) => Line::from(Span::styled(
                format!("Cannot reach {}: {reason}", self.controller.config().url),
                theme::error(),
            )),
            _ => Line::from(Span::styled(
                format!("Connecting to {}...", self.controller.config().url),
                theme::text(),
            )),
        };
        let [middle] = Layout::vertical([Constraint::Length(1)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), middle);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let indicator = match self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::GREEN))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::YELLOW))
            }
            ConnectionStatus::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::RED))
            }
        };

        let line = Line::from(vec![
            Span::raw(" "),
            indicator,
            Span::styled(" │ ", theme::key_hint()),
            Span::styled(self.route.path(), theme::field_value()),
            Span::styled(" │ ? help  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Toast in the bottom-right corner of `area`.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::GREEN, "✓"),
        NotificationLevel::Error => (theme::RED, "✗"),
    };
    let width = u16::try_from(notification.message.chars().count() + 6)
        .unwrap_or(u16::MAX)
        .clamp(20, 60)
        .min(area.width);
    let height = 3.min(area.height);
    let toast = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height),
        width,
        height,
    );

    frame.render_widget(Clear, toast);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast);
    frame.render_widget(block, toast);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(notification.message.clone(), theme::text()),
        ])),
        inner,
    );
}

fn render_help(frame: &mut Frame, area: Rect) {
    let [column] = Layout::horizontal([Constraint::Length(52)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::vertical([Constraint::Length(20)])
        .flex(Flex::Center)
        .areas(column);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let section = |name: &'static str| Line::from(Span::styled(format!("  {name}"), theme::title()));
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let lines = vec![
        section("Global"),
        entry("1-2 Tab", "Switch entity list"),
        entry("?", "This help"),
        entry("q Ctrl+C", "Quit"),
        Line::from(""),
        section("Lists"),
        entry("j/k ↑/↓", "Move"),
        entry("Enter", "View"),
        entry("n e d", "Create / edit / delete"),
        entry("r", "Refresh"),
        Line::from(""),
        section("Forms"),
        entry("Tab ↑/↓", "Next / previous field"),
        entry("←/→", "Choose option"),
        entry("Enter", "Save"),
        entry("Esc", "Cancel"),
        Line::from(""),
        Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use practrack_core::EntityId;

    use super::*;
    use crate::screens::testing::offline_controller;

    fn app(route: &str) -> App {
        App::new(offline_controller(), route.parse().unwrap())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn number_keys_open_entity_lists() {
        let mut app = app("/practice-session");
        assert!(matches!(
            app.handle_key_event(key(KeyCode::Char('2'))).unwrap(),
            Some(Action::Navigate(Route::List(EntityKind::Practice)))
        ));
        assert!(app.handle_key_event(key(KeyCode::Char('3'))).unwrap().is_none());
    }

    #[test]
    fn tab_cycles_entity_lists() {
        let app = app("/practice/3/edit");
        assert_eq!(app.cycle_tab(true), Route::List(EntityKind::PracticeSession));
        assert_eq!(app.cycle_tab(false), Route::List(EntityKind::PracticeSession));
    }

    #[test]
    fn navigation_before_connect_only_records_route() {
        let mut app = app("/practice-session");
        app.process_action(&Action::Navigate(Route::Detail(
            EntityKind::Practice,
            EntityId::new(4),
        )))
        .unwrap();
        assert!(app.screen.is_none());
        assert_eq!(app.route.path(), "/practice/4");
    }

    #[tokio::test]
    async fn connect_mounts_the_start_route() {
        let mut app = app("/practice/new");
        app.process_action(&Action::Connected).unwrap();
        assert_eq!(app.screen.as_ref().map(|s| s.id()), Some("form"));
    }

    #[tokio::test]
    async fn form_keeps_plain_keys_from_global_bindings() {
        let mut app = app("/practice/new");
        app.process_action(&Action::Connected).unwrap();

        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        assert!(app.running);
        assert!(matches!(
            app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
                .unwrap(),
            Some(Action::Quit)
        ));
    }

    #[test]
    fn toast_expires_on_tick() {
        let mut app = app("/practice");
        app.process_action(&Action::Notify(Notification::success("saved")))
            .unwrap();
        assert!(app.notification.is_some());

        let stale = Instant::now().checked_sub(TOAST_TTL * 2).unwrap();
        if let Some((_, shown)) = app.notification.as_mut() {
            *shown = stale;
        }
        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_none());
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut app = app("/practice");
        app.process_action(&Action::ToggleHelp).unwrap();
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        assert!(matches!(
            app.handle_key_event(key(KeyCode::Esc)).unwrap(),
            Some(Action::ToggleHelp)
        ));
    }
}
