//! Text panels: alerts, the per-section item strip, and the explainability
//! panel.

use crate::tui::theme::Theme;
use crate::tui::widgets::charts::{format_tick, render_note};
use evalboard_core::ExplainOutcome;
use evalboard_core::artifacts::Alert;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState};

/// Maximum number of features drawn in the importance chart.
const MAX_IMPORTANCE_BARS: usize = 15;
/// Attributions are scaled to integer bar heights.
const IMPORTANCE_SCALE: f64 = 1000.0;

/// Render every alert as a warning line.
pub fn render_alerts(frame: &mut Frame, area: Rect, alerts: &[Alert], theme: &Theme) {
    let items: Vec<ListItem> = alerts
        .iter()
        .map(|alert| {
            ListItem::new(Line::from(vec![
                Span::styled(" ⚠ ", theme.warning_style()),
                Span::styled(format!("{}: ", alert.name), theme.title_style()),
                Span::styled(alert.message.clone(), theme.warning_style()),
            ]))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style()),
    );
    frame.render_widget(list, area);
}

/// A selectable entry below a section: an opt-in count or an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelItem {
    Count { label: String, enabled: bool },
    Image { name: String },
}

impl PanelItem {
    fn line(&self, theme: &Theme) -> Line<'static> {
        match self {
            Self::Count { label, enabled } => {
                let (mark, style) = if *enabled {
                    ("[x]", theme.success_style())
                } else {
                    ("[ ]", theme.muted_style())
                };
                Line::from(vec![
                    Span::styled(format!(" {mark} "), style),
                    Span::raw(format!("For count {label}")),
                ])
            }
            Self::Image { name } => Line::from(vec![
                Span::styled(" ▣ ", theme.title_style()),
                Span::raw(name.clone()),
            ]),
        }
    }
}

/// Render the item strip with `cursor` highlighted.
pub fn render_items(
    frame: &mut Frame,
    area: Rect,
    items: &[PanelItem],
    cursor: usize,
    theme: &Theme,
) {
    let list = List::new(items.iter().map(|i| ListItem::new(i.line(theme))))
        .block(
            Block::default()
                .title(" Items ")
                .borders(Borders::TOP)
                .border_style(theme.border_style()),
        )
        .highlight_style(theme.selection_style());
    let mut state = ListState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render feature importance and the waterfall of data point `row`.
pub fn render_explain(
    frame: &mut Frame,
    area: Rect,
    outcome: &ExplainOutcome,
    row: usize,
    theme: &Theme,
) {
    let explanation = match outcome {
        ExplainOutcome::Insufficient {
            available,
            required,
        } => {
            let note = format!("Not sufficient data points: {available} available, {required} required.");
            render_note(frame, area, Some("Explainability"), &note, theme);
            return;
        }
        ExplainOutcome::Ready(explanation) => explanation,
    };
    let attributions = &explanation.attributions;

    let [importance_area, waterfall_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let importance = attributions.importance();
    let max = importance.first().map_or(0.0, |(_, v)| *v);
    let scale = if max > 0.0 { IMPORTANCE_SCALE / max } else { 0.0 };
    let bars: Vec<Bar> = importance
        .iter()
        .take(MAX_IMPORTANCE_BARS)
        .map(|(name, value)| {
            Bar::default()
                .value((value * scale).round() as u64)
                .text_value(format_tick(*value))
                .label(Line::from(name.clone()))
                .style(Style::default().fg(theme.accent))
        })
        .collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .title(Line::styled(" Feature importance ", theme.title_style()))
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, importance_area);

    let Some(waterfall) = attributions.waterfall(row) else {
        render_note(frame, waterfall_area, Some("Waterfall"), "No data point selected.", theme);
        return;
    };
    let id = explanation.ids.get(row).map_or("?", String::as_str);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(" base value ", theme.muted_style()),
            Span::raw(format_tick(waterfall.base_value)),
        ]),
    ];
    lines.extend(waterfall.contributions.iter().map(|c| {
        Line::from(vec![
            Span::styled(
                format!(" {:+.3} ", c.attribution),
                Style::default().fg(theme.attribution_color(c.attribution)),
            ),
            Span::raw(format!("{} = {}", c.feature, format_tick(c.value))),
        ])
    }));
    lines.push(Line::from(vec![
        Span::styled(" prediction ", theme.title_style()),
        Span::raw(format_tick(waterfall.prediction)),
    ]));
    let list = List::new(lines).block(
        Block::default()
            .title(Line::styled(
                format!(" Waterfall for id {id} ({}/{}) ", row + 1, attributions.len()),
                theme.title_style(),
            ))
            .borders(Borders::ALL)
            .border_style(theme.border_style()),
    );
    frame.render_widget(list, waterfall_area);
}
