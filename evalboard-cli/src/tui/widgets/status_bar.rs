//! Status bar widget showing keybinding hints and the last message.

use crate::tui::theme::Theme;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

/// What kind of panel has focus; decides which hints are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusKind {
    Empty,
    Plot,
    Embedding,
    Gated,
    Explain,
}

impl FocusKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "BROWSE",
            Self::Plot => "PLOT",
            Self::Embedding => "EMBED",
            Self::Gated => "COUNTS",
            Self::Explain => "EXPLAIN",
        }
    }

    fn hints(&self) -> &'static str {
        match self {
            Self::Empty => "[↑↓] Move │ [←→] Change │ [Space] Toggle │ [s] Sidebar │ [q] Quit",
            Self::Plot => "[Tab] Next │ [x/y] Log axis │ [j/k] Item │ [o] Open image │ [q] Quit",
            Self::Embedding => "[Tab] Next │ [[/]] View point │ [,/.] Point │ [j/k] Item │ [Enter] Show │ [q] Quit",
            Self::Gated => "[Tab] Next │ [j/k] Item │ [Enter] Show count │ [q] Quit",
            Self::Explain => "[Tab] Next │ [j/k] Data point │ [q] Quit",
        }
    }
}

impl std::fmt::Display for FocusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Render the status bar.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    focus: FocusKind,
    message: Option<&str>,
    theme: &Theme,
) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", focus.label()),
            theme
                .status_bar_style()
                .fg(theme.bg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ", theme.status_bar_style()),
    ];
    match message {
        Some(msg) => spans.push(Span::styled(msg.to_string(), theme.warning_style())),
        None => spans.push(Span::styled(focus.hints(), theme.status_bar_style())),
    }

    let bar = Paragraph::new(Line::from(spans)).style(theme.status_bar_style());
    frame.render_widget(bar, area);
}
