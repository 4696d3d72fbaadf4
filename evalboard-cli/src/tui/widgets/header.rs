//! Header bar widget showing the log folder, dashboard, comparison axis and
//! active filters.

use crate::tui::theme::Theme;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

/// Data needed to render the header bar.
#[derive(Debug, Clone, Default)]
pub struct HeaderData {
    pub log_folder: String,
    pub dashboard: Option<String>,
    pub comparison: Option<String>,
    pub num_views: usize,
    pub filters: String,
}

impl HeaderData {
    pub fn views_display(&self) -> String {
        match &self.comparison {
            Some(axis) => format!("{} views by {axis}", self.num_views),
            None => "single view".to_string(),
        }
    }
}

/// Render the header bar.
pub fn render_header(frame: &mut Frame, area: Rect, data: &HeaderData, theme: &Theme) {
    let sep = || Span::styled(" │ ", theme.header_style().fg(theme.border_color));
    let spans = vec![
        Span::styled(
            " ● evalboard",
            theme
                .header_style()
                .add_modifier(Modifier::BOLD)
                .fg(theme.accent),
        ),
        sep(),
        Span::styled(data.log_folder.clone(), theme.header_style()),
        sep(),
        Span::styled(
            data.dashboard.clone().unwrap_or_else(|| "no dashboards".into()),
            theme.header_style().add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(data.views_display(), theme.header_style()),
        sep(),
        Span::styled(data.filters.clone(), theme.header_style().fg(theme.muted_fg)),
    ];

    let header = Paragraph::new(Line::from(spans)).style(theme.header_style());
    frame.render_widget(header, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_display() {
        let data = HeaderData {
            comparison: Some("model_type".into()),
            num_views: 3,
            ..Default::default()
        };
        assert_eq!(data.views_display(), "3 views by model_type");
        assert_eq!(HeaderData::default().views_display(), "single view");
    }

    #[test]
    fn test_render_header_shows_dashboard() {
        let backend = ratatui::backend::TestBackend::new(100, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let data = HeaderData {
            log_folder: "/logs".into(),
            dashboard: Some("performance".into()),
            comparison: Some("model_type".into()),
            num_views: 2,
            filters: "signal=s1".into(),
        };
        let theme = Theme::dark();
        terminal
            .draw(|frame| {
                render_header(frame, frame.area(), &data, &theme);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("performance"));
        assert!(text.contains("signal=s1"));
    }
}
