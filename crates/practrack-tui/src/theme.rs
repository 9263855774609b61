//! Palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(225, 53, 255);
pub const CYAN: Color = Color::Rgb(128, 255, 234);
pub const YELLOW: Color = Color::Rgb(241, 250, 140);
pub const GREEN: Color = Color::Rgb(80, 250, 123);
pub const RED: Color = Color::Rgb(255, 99, 99);

pub const TEXT: Color = Color::Rgb(189, 193, 207);
pub const MUTED: Color = Color::Rgb(98, 114, 164);
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54);
pub const BG_DARK: Color = Color::Rgb(30, 31, 41);

pub fn title() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

pub fn border() -> Style {
    Style::default().fg(ACCENT)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT)
}

pub fn selected() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn field_label() -> Style {
    Style::default().fg(MUTED)
}

pub fn field_value() -> Style {
    Style::default().fg(CYAN)
}

pub fn error() -> Style {
    Style::default().fg(RED)
}

pub fn tab_active() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(TEXT)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}
