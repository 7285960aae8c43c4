//! Colors and styles for the terminal front-end

use ratatui::style::{Color, Modifier, Style};

/// Color palette. Hardcoded colors elsewhere are a bug.
pub struct Colors;

impl Colors {
    pub const BG_PRIMARY: Color = Color::Rgb(20, 20, 30);
    pub const FG_PRIMARY: Color = Color::White;
    pub const FG_MUTED: Color = Color::DarkGray;

    pub const PRIMARY: Color = Color::Cyan;
    pub const ERROR: Color = Color::Red;
    pub const PROGRESS: Color = Color::Green;

    pub const BORDER_ACTIVE: Color = Color::Cyan;
    pub const NAV_HINT: Color = Color::DarkGray;
}

/// Pre-built styles
pub struct Styles;

impl Styles {
    pub fn text() -> Style {
        Style::default().fg(Colors::FG_PRIMARY)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Colors::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    pub fn hint() -> Style {
        Style::default().fg(Colors::NAV_HINT)
    }

    pub fn border_active() -> Style {
        Style::default().fg(Colors::BORDER_ACTIVE)
    }

    pub fn panel_bg() -> Style {
        Style::default().bg(Colors::BG_PRIMARY)
    }

    pub fn progress() -> Style {
        Style::default().fg(Colors::PROGRESS).bg(Colors::FG_MUTED)
    }
}
