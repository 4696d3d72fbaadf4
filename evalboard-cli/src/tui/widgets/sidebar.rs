//! Sidebar widget listing the dashboard controls: dashboard choice,
//! comparison axis, pinned models, feature slices and section toggles.

use crate::tui::theme::Theme;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use unicode_width::UnicodeWidthStr;

/// Current value shown next to a sidebar label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    /// Group title; not selectable.
    Heading,
    /// A value cycled with ←→.
    Choice(String),
    /// A checkbox toggled with Space.
    Toggle(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub label: String,
    pub value: EntryValue,
}

impl SidebarEntry {
    pub fn heading(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: EntryValue::Heading,
        }
    }

    pub fn choice(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: EntryValue::Choice(value.into()),
        }
    }

    pub fn toggle(label: impl Into<String>, on: bool) -> Self {
        Self {
            label: label.into(),
            value: EntryValue::Toggle(on),
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.value != EntryValue::Heading
    }
}

/// Cut `text` to at most `width` display columns, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if out.width() + ch.to_string().width() + 1 > width {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

/// Render the sidebar with `cursor` highlighted.
pub fn render_sidebar(
    frame: &mut Frame,
    area: Rect,
    entries: &[SidebarEntry],
    cursor: usize,
    theme: &Theme,
) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::RIGHT)
        .border_style(theme.border_style())
        .style(theme.sidebar_style());
    let width = block.inner(area).width as usize;

    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let line = match &entry.value {
                EntryValue::Heading => Line::from(Span::styled(
                    truncate(&entry.label, width),
                    theme.title_style(),
                )),
                EntryValue::Choice(value) => {
                    let label = truncate(&entry.label, width / 2);
                    let rest = width.saturating_sub(label.width() + 4);
                    Line::from(vec![
                        Span::styled(format!(" {label}: "), theme.sidebar_style()),
                        Span::styled(
                            format!("‹{}›", truncate(value, rest)),
                            theme.sidebar_style().fg(theme.accent),
                        ),
                    ])
                }
                EntryValue::Toggle(on) => {
                    let mark = if *on { "[x]" } else { "[ ]" };
                    Line::from(vec![
                        Span::styled(
                            format!(" {mark} "),
                            if *on {
                                theme.success_style()
                            } else {
                                theme.muted_style()
                            },
                        ),
                        Span::styled(
                            truncate(&entry.label, width.saturating_sub(5)),
                            theme.sidebar_style(),
                        ),
                    ])
                }
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selection_style());
    let mut state = ListState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}
