//! Chart widgets: line plots, histograms, embedding scatters and bar graphs.

use crate::tui::theme::Theme;
use evalboard_core::artifacts::{BarGraph, ScatterPoint};
use evalboard_core::views::{HistogramView, LineView, ScatterSet, bin_series};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
};

/// Split `area` into a grid of `n` cells laid out across `columns`.
pub fn grid(area: Rect, n: usize, columns: usize) -> Vec<Rect> {
    if n == 0 {
        return Vec::new();
    }
    let columns = columns.clamp(1, n);
    let rows = n.div_ceil(columns);
    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);
    row_areas
        .iter()
        .flat_map(|row| {
            Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns])
                .split(*row)
                .to_vec()
        })
        .take(n)
        .collect()
}

/// Compact tick label.
pub fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e5).contains(&a) {
        format!("{v:.1e}")
    } else if a >= 100.0 || v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Apply log10 to the requested axes; points that cannot be logged are dropped.
pub fn log_transform(points: &[(f64, f64)], log_x: bool, log_y: bool) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .filter(|(x, y)| (!log_x || *x > 0.0) && (!log_y || *y > 0.0))
        .map(|&(x, y)| {
            (
                if log_x { x.log10() } else { x },
                if log_y { y.log10() } else { y },
            )
        })
        .collect()
}

/// `[min, max]` of `values`, widened when degenerate.
pub fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        [0.0, 1.0]
    } else if lo == hi {
        [lo - 0.5, hi + 0.5]
    } else {
        [lo, hi]
    }
}

fn axis_labels(b: [f64; 2], log: bool) -> Vec<Line<'static>> {
    let mid = (b[0] + b[1]) / 2.0;
    [b[0], mid, b[1]]
        .into_iter()
        .map(|v| {
            let v = if log { 10f64.powf(v) } else { v };
            Line::from(format_tick(v))
        })
        .collect()
}

fn axis_title(name: &str, log: bool) -> String {
    if log {
        format!("{name} (log)")
    } else {
        name.to_string()
    }
}

fn view_block(title: Option<&str>, theme: &Theme) -> Block<'static> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style());
    match title {
        Some(t) => block.title(Line::styled(format!(" {t} "), theme.title_style())),
        None => block,
    }
}

/// Short note inside a bordered view.
pub fn render_note(frame: &mut Frame, area: Rect, title: Option<&str>, note: &str, theme: &Theme) {
    let paragraph = Paragraph::new(note.to_string())
        .style(theme.muted_style())
        .block(view_block(title, theme));
    frame.render_widget(paragraph, area);
}

/// One line-plot view: every series as a line.
pub fn render_line_view(
    frame: &mut Frame,
    area: Rect,
    view: &LineView,
    axes: (&str, &str),
    log: (bool, bool),
    theme: &Theme,
) {
    let data: Vec<Vec<(f64, f64)>> = view
        .series
        .iter()
        .map(|s| log_transform(&s.points, log.0, log.1))
        .collect();
    if data.iter().all(Vec::is_empty) {
        render_note(frame, area, view.label.as_deref(), "No rows match the current filters.", theme);
        return;
    }
    let x_bounds = bounds(data.iter().flatten().map(|p| p.0));
    let y_bounds = bounds(data.iter().flatten().map(|p| p.1));

    let datasets: Vec<Dataset> = view
        .series
        .iter()
        .zip(&data)
        .enumerate()
        .map(|(i, (series, points))| {
            Dataset::default()
                .name(series.name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(theme.series_color(i)))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(view_block(view.label.as_deref(), theme))
        .x_axis(
            Axis::default()
                .title(axis_title(axes.0, log.0))
                .style(theme.muted_style())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, log.0)),
        )
        .y_axis(
            Axis::default()
                .title(axis_title(axes.1, log.1))
                .style(theme.muted_style())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, log.1)),
        );
    frame.render_widget(chart, area);
}

/// One histogram view: series binned over a shared range, grouped per bin.
pub fn render_histogram_view(
    frame: &mut Frame,
    area: Rect,
    view: &HistogramView,
    bins: usize,
    theme: &Theme,
) {
    let binned = bin_series(&view.series, bins);
    let Some(first) = binned.iter().find(|b| !b.is_empty()) else {
        render_note(frame, area, view.label.as_deref(), "No rows match the current filters.", theme);
        return;
    };

    let bars: Vec<Vec<Bar>> = (0..first.len())
        .map(|b| {
            binned
                .iter()
                .enumerate()
                .map(|(i, series)| {
                    let count = series.get(b).map_or(0, |bin| bin.count);
                    Bar::default()
                        .value(count)
                        .text_value(String::new())
                        .style(Style::default().fg(theme.series_color(i)))
                })
                .collect()
        })
        .collect();

    let mut chart = BarChart::default()
        .block(view_block(view.label.as_deref(), theme))
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);
    for (bin, group) in first.iter().zip(&bars) {
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(format_tick(bin.lo)))
                .bars(group),
        );
    }
    frame.render_widget(chart, area);
}

/// Cluster and hover fields of one point, e.g. `cluster 1 │ id: 7, city: sf`.
pub fn hover_line(point: &ScatterPoint) -> String {
    let fields: Vec<String> = point
        .hover
        .iter()
        .map(|(field, text)| format!("{field}: {text}"))
        .collect();
    if fields.is_empty() {
        format!("cluster {}", point.cluster)
    } else {
        format!("cluster {} │ {}", point.cluster, fields.join(", "))
    }
}

/// One embedding snapshot, one dataset per cluster. `highlight` picks the
/// point whose hover text is shown below the chart (wrapping around).
pub fn render_scatter(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    set: &ScatterSet,
    highlight: Option<usize>,
    theme: &Theme,
) {
    if set.points.is_empty() {
        render_note(frame, area, Some(title), "No rows match the current filters.", theme);
        return;
    }
    let clusters = set.clusters();
    let data: Vec<Vec<(f64, f64)>> = clusters
        .iter()
        .map(|c| {
            set.points
                .iter()
                .filter(|p| &p.cluster == c)
                .map(|p| (p.x, p.y))
                .collect()
        })
        .collect();
    let x_bounds = bounds(set.points.iter().map(|p| p.x));
    let y_bounds = bounds(set.points.iter().map(|p| p.y));

    let mut datasets: Vec<Dataset> = clusters
        .iter()
        .zip(&data)
        .enumerate()
        .map(|(i, (cluster, points))| {
            Dataset::default()
                .name(format!("cluster {cluster}"))
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme.series_color(i)))
                .data(points)
        })
        .collect();

    let selected = highlight.map(|i| (i % set.points.len(), &set.points[i % set.points.len()]));
    let marked = selected.map(|(_, p)| [(p.x, p.y)]);
    if let Some(marked) = &marked {
        datasets.push(
            Dataset::default()
                .marker(Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme.accent))
                .data(marked),
        );
    }

    let title = if set.dims == 3 {
        format!("{title} (x/y of 3-D)")
    } else {
        title.to_string()
    };
    let (chart_area, detail_area) = match selected {
        Some(_) => {
            let [chart, detail] =
                Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
            (chart, Some(detail))
        }
        None => (area, None),
    };
    let chart = Chart::new(datasets)
        .block(view_block(Some(&title), theme))
        .x_axis(
            Axis::default()
                .style(theme.muted_style())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, false)),
        )
        .y_axis(
            Axis::default()
                .style(theme.muted_style())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, false)),
        );
    frame.render_widget(chart, chart_area);

    if let (Some((i, point)), Some(detail_area)) = (selected, detail_area) {
        let line = format!(" ◆ {}/{} {}", i + 1, set.points.len(), hover_line(point));
        frame.render_widget(Paragraph::new(line).style(theme.title_style()), detail_area);
    }
}

/// Bar heights are integers; values are scaled to this range and the real
/// value is printed on the bar.
const BAR_SCALE: f64 = 1000.0;

/// One bar-graph snapshot, one group per top-level key.
pub fn render_bar_graph(frame: &mut Frame, area: Rect, title: &str, graph: &BarGraph, theme: &Theme) {
    let max = graph
        .groups
        .iter()
        .flat_map(|g| g.bars.iter().map(|(_, v)| v.abs()))
        .fold(0.0, f64::max);
    let scale = if max > 0.0 { BAR_SCALE / max } else { 0.0 };

    let bars: Vec<Vec<Bar>> = graph
        .groups
        .iter()
        .map(|group| {
            group
                .bars
                .iter()
                .enumerate()
                .map(|(i, (category, value))| {
                    let label = match group.hover.get(i).filter(|h| !h.is_empty()) {
                        Some(hover) => format!("{category} ({hover})"),
                        None => category.clone(),
                    };
                    Bar::default()
                        .value((value.max(0.0) * scale).round() as u64)
                        .text_value(format_tick(*value))
                        .label(Line::from(label))
                        .style(Style::default().fg(theme.series_color(i)))
                })
                .collect()
        })
        .collect();

    let mut chart = BarChart::default()
        .block(view_block(Some(title), theme))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);
    for (group, group_bars) in graph.groups.iter().zip(&bars) {
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(group.name.clone()))
                .bars(group_bars),
        );
    }
    frame.render_widget(chart, area);
}
