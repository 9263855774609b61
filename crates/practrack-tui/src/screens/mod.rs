//! Route screens. Each is generic over the entity and mounted fresh
//! whenever the route changes.

pub mod delete;
pub mod detail;
pub mod form;
pub mod list;

use std::future::Future;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use practrack_core::{Controller, CoreError, EntityKind, Practice, PracticeSession, Route};

use crate::action::{Action, Notification, SliceEntity};
use crate::component::Component;
use crate::theme;

use self::delete::DeleteScreen;
use self::detail::DetailScreen;
use self::form::FormScreen;
use self::list::ListScreen;

/// Build the screen for `route`. Nothing is requested until `init`.
pub fn mount(route: Route, controller: Controller) -> Box<dyn Component> {
    match route.kind() {
        EntityKind::PracticeSession => mount_for::<PracticeSession>(route, controller),
        EntityKind::Practice => mount_for::<Practice>(route, controller),
    }
}

fn mount_for<E: SliceEntity>(route: Route, controller: Controller) -> Box<dyn Component> {
    match route {
        Route::List(_) => Box::new(ListScreen::<E>::new(controller)),
        Route::New(_) => Box::new(FormScreen::<E>::new(controller, None)),
        Route::Detail(_, id) => Box::new(DetailScreen::<E>::new(controller, id)),
        Route::Edit(_, id) => Box::new(FormScreen::<E>::new(controller, Some(id))),
        Route::Delete(_, id) => Box::new(DeleteScreen::<E>::new(controller, id)),
    }
}

/// Run a controller call in the background. The slice reflects progress;
/// failures are also raised as a toast.
pub(crate) fn spawn_request<F>(tx: &UnboundedSender<Action>, what: &'static str, request: F)
where
    F: Future<Output = Result<(), CoreError>> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Err(e) = request.await {
            warn!(error = %e, "{what} failed");
            let _ = tx.send(Action::Notify(Notification::error(e.to_string())));
        }
    });
}

// ── Shared rendering ────────────────────────────────────────────────

pub(crate) fn frame_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(theme::title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
}

/// One line of `key action` pairs.
pub(crate) fn hints(pairs: &[(&'static str, &'static str)]) -> Paragraph<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (key, action) in pairs {
        spans.push(Span::styled(format!(" {key} "), theme::key_hint_key()));
        spans.push(Span::styled(format!("{action} "), theme::key_hint()));
    }
    Paragraph::new(Line::from(spans))
}

pub(crate) fn render_spinner(frame: &mut Frame, area: Rect, state: &ThrobberState, label: &str) {
    let throbber = Throbber::default()
        .label(label.to_owned())
        .style(theme::text())
        .throbber_style(Style::default().fg(theme::ACCENT));
    frame.render_stateful_widget(throbber, area, &mut state.clone());
}

pub(crate) fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(format!(" ✗ {message}"), theme::error()))),
        area,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use ratatui::{Terminal, backend::TestBackend};

    use practrack_core::{Controller, ControllerConfig};

    use crate::component::Component;

    /// A controller that was never connected; every request fails fast.
    pub fn offline_controller() -> Controller {
        Controller::new(ControllerConfig::new("http://127.0.0.1:9".parse().unwrap()))
    }

    /// Render into an in-memory terminal and return the screen text.
    pub fn render_text(component: &dyn Component, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| component.render(frame, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(usize::from(width))
            .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
