//! Component trait implemented by every screen.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;

/// Lifecycle: `init` once on mount, then any mix of `handle_key_event`,
/// `update` and `render` until the route changes.
pub trait Component: Send {
    /// Called once when the screen is mounted. Screens issue their
    /// initial requests here.
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect);

    /// While `true`, plain keys go to the screen instead of the global
    /// bindings (`q`, `?`, `1`-`2`, Tab).
    fn captures_input(&self) -> bool {
        false
    }

    /// Short name for logs.
    fn id(&self) -> &'static str;
}
