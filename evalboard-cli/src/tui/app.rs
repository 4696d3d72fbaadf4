//! Main TUI application: state, event loop, and top-level draw function.

use crate::tui::event::{Action, EventHandler, map_key};
use crate::tui::theme::Theme;
use crate::tui::widgets::charts::{
    grid, render_bar_graph, render_histogram_view, render_line_view, render_note, render_scatter,
};
use crate::tui::widgets::header::{HeaderData, render_header};
use crate::tui::widgets::panels::{PanelItem, render_alerts, render_explain, render_items};
use crate::tui::widgets::sidebar::{SidebarEntry, render_sidebar};
use crate::tui::widgets::status_bar::{FocusKind, render_status_bar};
use crossterm::event::{Event, KeyEventKind};
use evalboard_core::artifacts::file_stem;
use evalboard_core::views::{EmbeddingContent, EmbeddingPanel};
use evalboard_core::{
    BoardConfig, Dashboard, ExplainCache, ExplainOutcome, Metadata, Sampler, SectionContent,
    SectionOptions, Selection, Session, build_section, list_dashboards, scan_dashboard,
};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Something shown in the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// Index into the current dashboard's sections.
    Section(usize),
    Explain,
}

/// What a sidebar row controls.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Control {
    Heading,
    Dashboard,
    Comparison,
    Model(String),
    Feature(String),
    Section(usize),
    Explain,
}

/// Built content of the focused panel.
#[derive(Debug)]
enum Focused {
    Section {
        index: usize,
        content: Result<SectionContent, String>,
    },
    Explain(Result<ExplainOutcome, String>),
}

/// The main TUI application state.
pub struct App {
    log_folder: PathBuf,
    config: BoardConfig,
    pub session: Session,

    dashboards: Vec<String>,
    dashboard_idx: usize,
    pub dashboard: Option<Dashboard>,

    // Per-section UI state, keyed by section directory
    enabled: HashSet<PathBuf>,
    options: HashMap<PathBuf, SectionOptions>,
    log_scale: HashMap<PathBuf, (bool, bool)>,

    // Explainability
    explain_enabled: bool,
    explain_row: usize,
    explain_cache: ExplainCache,

    sampler: Sampler,

    // UI state
    pub theme: Theme,
    pub show_sidebar: bool,
    sidebar_cursor: usize,
    panel_idx: usize,
    item_cursor: usize,
    /// Highlighted point of each embedding cell, wrapped per cell.
    point_cursor: usize,
    focused: Option<Focused>,
    message: Option<String>,
    pub should_quit: bool,
}

fn cycle(len: usize, current: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (current + 1) % len
    } else {
        (current + len - 1) % len
    }
}

impl App {
    /// Create a new TUI application for `log_folder`.
    pub fn new(log_folder: PathBuf, config: BoardConfig, metadata: Metadata) -> Self {
        let session = Session::new(metadata, &config);
        let (dashboards, message) = match list_dashboards(&log_folder) {
            Ok(d) if d.is_empty() => (d, Some("No dashboards in the log folder".to_string())),
            Ok(d) => (d, None),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list dashboards");
                (Vec::new(), Some(format!("Failed to list dashboards: {e}")))
            }
        };

        let mut app = Self {
            theme: Theme::from_name(&config.ui.theme),
            show_sidebar: config.ui.show_sidebar,
            sampler: Sampler::new(config.sampling.seed),
            log_folder,
            config,
            session,
            dashboards,
            dashboard_idx: 0,
            dashboard: None,
            enabled: HashSet::new(),
            options: HashMap::new(),
            log_scale: HashMap::new(),
            explain_enabled: false,
            explain_row: 0,
            explain_cache: ExplainCache::new(),
            sidebar_cursor: 0,
            panel_idx: 0,
            item_cursor: 0,
            point_cursor: 0,
            focused: None,
            message,
            should_quit: false,
        };
        app.load_dashboard(0);
        app
    }

    /// Run the main event loop.
    pub async fn run(
        &mut self,
        terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_handler = EventHandler::new();
        let tick_rate = std::time::Duration::from_millis(250);

        loop {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                event = event_handler.next() => {
                    match event {
                        Some(event) => self.handle_terminal_event(event),
                        None => self.should_quit = true,
                    }
                }
                // Tick keeps the screen fresh after resizes
                _ = tokio::time::sleep(tick_rate) => {}
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_terminal_event(&mut self, event: Event) {
        if let Event::Key(key) = event
            && key.kind == KeyEventKind::Press
            && let Some(action) = map_key(&key)
        {
            self.handle_action(action);
        }
    }

    /// Apply one user action.
    pub fn handle_action(&mut self, action: Action) {
        self.message = None;
        match action {
            Action::Quit => self.should_quit = true,
            Action::Up => self.move_cursor(false),
            Action::Down => self.move_cursor(true),
            Action::Prev => self.change_value(false),
            Action::Next => self.change_value(true),
            Action::Toggle => self.toggle_control(),
            Action::NextPanel | Action::PrevPanel => {
                let n = self.visible_panels().len();
                self.panel_idx = cycle(n, self.panel_idx, action == Action::NextPanel);
                self.item_cursor = 0;
                self.point_cursor = 0;
                self.refresh();
            }
            Action::ItemUp | Action::ItemDown => self.move_item(action == Action::ItemDown),
            Action::Activate => self.activate_item(),
            Action::ToggleLogX | Action::ToggleLogY => {
                if let Some(dir) = self.focused_section().map(|s| s.dir.clone()) {
                    let scale = self.log_scale.entry(dir).or_default();
                    if action == Action::ToggleLogX {
                        scale.0 = !scale.0;
                    } else {
                        scale.1 = !scale.1;
                    }
                }
            }
            Action::PrevViewPoint | Action::NextViewPoint => {
                self.step_view_point(action == Action::NextViewPoint)
            }
            Action::PrevPoint | Action::NextPoint => self.step_point(action == Action::NextPoint),
            Action::ToggleSidebar => self.show_sidebar = !self.show_sidebar,
            Action::Reload => {
                // Keep the enabled sections across a rescan
                let enabled = std::mem::take(&mut self.enabled);
                let panel = self.panel_idx;
                self.load_dashboard(self.dashboard_idx);
                self.enabled = enabled;
                self.panel_idx = panel;
                self.refresh();
                self.message = Some("Reloaded".to_string());
            }
        }
    }

    // -- Dashboard and panels --

    fn load_dashboard(&mut self, idx: usize) {
        self.dashboard_idx = idx;
        self.dashboard = None;
        self.enabled.clear();
        self.options.clear();
        self.log_scale.clear();
        self.panel_idx = 0;
        self.item_cursor = 0;
        self.point_cursor = 0;

        if let Some(name) = self.dashboards.get(idx) {
            match scan_dashboard(&self.log_folder, name) {
                Ok(dashboard) => {
                    tracing::info!(dashboard = %name, sections = dashboard.sections.len(), "Opened dashboard");
                    self.dashboard = Some(dashboard);
                }
                Err(e) => {
                    tracing::warn!(dashboard = %name, error = %e, "Failed to scan dashboard");
                    self.message = Some(format!("Failed to read dashboard {name}: {e}"));
                }
            }
        }
        self.clamp_sidebar_cursor();
        self.refresh();
    }

    /// Panels shown in the main area: always-visible sections, enabled
    /// sections, and explainability when enabled.
    pub fn visible_panels(&self) -> Vec<Panel> {
        let mut panels: Vec<Panel> = self
            .dashboard
            .iter()
            .flat_map(|d| d.sections.iter().enumerate())
            .filter(|(_, s)| s.kind.always_visible() || self.enabled.contains(&s.dir))
            .map(|(i, _)| Panel::Section(i))
            .collect();
        if self.explain_enabled {
            panels.push(Panel::Explain);
        }
        panels
    }

    fn focused_section(&self) -> Option<&evalboard_core::Section> {
        match self.focused {
            Some(Focused::Section { index, .. }) => {
                self.dashboard.as_ref().and_then(|d| d.sections.get(index))
            }
            _ => None,
        }
    }

    /// Rebuild the focused panel from disk.
    fn refresh(&mut self) {
        let panels = self.visible_panels();
        if panels.is_empty() {
            self.focused = None;
            return;
        }
        self.panel_idx = self.panel_idx.min(panels.len() - 1);

        self.focused = Some(match panels[self.panel_idx] {
            Panel::Section(index) => {
                let content = match self.dashboard.as_ref().and_then(|d| d.sections.get(index)) {
                    Some(section) => {
                        let options = self.options.get(&section.dir).cloned().unwrap_or_default();
                        build_section(
                            section,
                            &self.session,
                            &options,
                            &self.config.sampling,
                            &mut self.sampler,
                        )
                        .map_err(|e| {
                            tracing::warn!(section = %section.name, error = %e, "Failed to build section");
                            e.to_string()
                        })
                    }
                    None => Err("Section no longer exists".to_string()),
                };
                Focused::Section { index, content }
            }
            Panel::Explain => Focused::Explain(
                self.explain_cache
                    .explain(self.session.metadata(), &self.log_folder)
                    .map_err(|e| {
                        tracing::warn!(error = %e, "Explainability failed");
                        e.to_string()
                    }),
            ),
        });

        let items = self.panel_items().len();
        self.item_cursor = self.item_cursor.min(items.saturating_sub(1));
    }

    // -- Sidebar --

    fn controls(&self) -> Vec<(Control, SidebarEntry)> {
        let mut controls = vec![(
            Control::Dashboard,
            SidebarEntry::choice(
                "Dashboard",
                self.dashboards
                    .get(self.dashboard_idx)
                    .cloned()
                    .unwrap_or_else(|| "-".into()),
            ),
        )];

        let metadata = self.session.metadata();
        if let Some(axis) = self.session.comparison() {
            controls.push((Control::Heading, SidebarEntry::heading("Models")));
            controls.push((
                Control::Comparison,
                SidebarEntry::choice("Compare by", axis.feature_name.clone()),
            ));
            for model in &metadata.model_args {
                if let Some(value) = self.session.other_models().get(&model.feature_name) {
                    controls.push((
                        Control::Model(model.feature_name.clone()),
                        SidebarEntry::choice(model.feature_name.clone(), value.clone()),
                    ));
                }
            }
        }

        if !metadata.feature_args.is_empty() {
            controls.push((Control::Heading, SidebarEntry::heading("Features")));
            for feature in &metadata.feature_args {
                let selection = self.session.feature_selection(&feature.feature_name);
                controls.push((
                    Control::Feature(feature.feature_name.clone()),
                    SidebarEntry::choice(feature.feature_name.clone(), selection.to_string()),
                ));
            }
        }

        if let Some(dashboard) = &self.dashboard {
            controls.push((Control::Heading, SidebarEntry::heading("Sections")));
            for (i, section) in dashboard.sections.iter().enumerate() {
                if !section.kind.always_visible() {
                    controls.push((
                        Control::Section(i),
                        SidebarEntry::toggle(section.title(), self.enabled.contains(&section.dir)),
                    ));
                }
            }
        }

        if metadata.has_explainability() {
            controls.push((
                Control::Explain,
                SidebarEntry::toggle("Explainability", self.explain_enabled),
            ));
        }
        controls
    }

    fn move_cursor(&mut self, down: bool) {
        let controls = self.controls();
        if controls.is_empty() {
            return;
        }
        let mut cursor = self.sidebar_cursor.min(controls.len() - 1);
        for _ in 0..controls.len() {
            cursor = cycle(controls.len(), cursor, down);
            if controls[cursor].1.is_selectable() {
                break;
            }
        }
        self.sidebar_cursor = cursor;
    }

    /// Keep the cursor on a selectable row after the control list shrinks.
    fn clamp_sidebar_cursor(&mut self) {
        let controls = self.controls();
        let Some(last) = controls.len().checked_sub(1) else {
            self.sidebar_cursor = 0;
            return;
        };
        let cursor = self.sidebar_cursor.min(last);
        self.sidebar_cursor = (0..=cursor)
            .rev()
            .chain(cursor + 1..=last)
            .find(|&i| controls[i].1.is_selectable())
            .unwrap_or(0);
    }

    fn current_control(&self) -> Option<Control> {
        self.controls()
            .into_iter()
            .nth(self.sidebar_cursor)
            .map(|(c, _)| c)
    }

    fn change_value(&mut self, forward: bool) {
        let result = match self.current_control() {
            Some(Control::Dashboard) => {
                let next = cycle(self.dashboards.len(), self.dashboard_idx, forward);
                self.load_dashboard(next);
                return;
            }
            Some(Control::Comparison) => {
                let names: Vec<String> = self
                    .session
                    .metadata()
                    .model_args
                    .iter()
                    .map(|m| m.feature_name.clone())
                    .collect();
                let current = self
                    .session
                    .comparison()
                    .and_then(|c| names.iter().position(|n| *n == c.feature_name))
                    .unwrap_or(0);
                let next = cycle(names.len(), current, forward);
                match names.get(next) {
                    Some(name) => self.session.set_comparison(name),
                    None => return,
                }
            }
            Some(Control::Model(name)) => {
                let Some(spec) = self.session.metadata().model(&name).cloned() else {
                    return;
                };
                let current = self
                    .session
                    .other_models()
                    .get(&name)
                    .and_then(|v| spec.allowed_values.iter().position(|a| a == v))
                    .unwrap_or(0);
                match spec
                    .allowed_values
                    .get(cycle(spec.allowed_values.len(), current, forward))
                {
                    Some(value) => self.session.pin_model(&name, value),
                    None => return,
                }
            }
            Some(Control::Feature(name)) => {
                let Some(spec) = self.session.metadata().feature(&name).cloned() else {
                    return;
                };
                // Position 0 is "All", then every allowed value.
                let current = match self.session.feature_selection(&name) {
                    Selection::All => 0,
                    Selection::Value(v) => spec
                        .allowed_values
                        .iter()
                        .position(|a| a == v)
                        .map_or(0, |p| p + 1),
                };
                let next = cycle(spec.allowed_values.len() + 1, current, forward);
                let selection = match next {
                    0 => Selection::All,
                    n => Selection::Value(spec.allowed_values[n - 1].clone()),
                };
                self.session.select_feature(&name, selection)
            }
            _ => return,
        };

        match result {
            Ok(()) => {
                tracing::debug!(filters = %self.session.describe_filters(), "Selection changed");
                self.refresh();
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn toggle_control(&mut self) {
        match self.current_control() {
            Some(Control::Section(i)) => {
                let Some(dir) = self
                    .dashboard
                    .as_ref()
                    .and_then(|d| d.sections.get(i))
                    .map(|s| s.dir.clone())
                else {
                    return;
                };
                if !self.enabled.remove(&dir) {
                    self.enabled.insert(dir);
                    // Focus the section just enabled
                    if let Some(pos) = self
                        .visible_panels()
                        .iter()
                        .position(|p| *p == Panel::Section(i))
                    {
                        self.panel_idx = pos;
                        self.item_cursor = 0;
                    }
                }
                self.refresh();
            }
            Some(Control::Explain) => {
                self.explain_enabled = !self.explain_enabled;
                if self.explain_enabled {
                    self.panel_idx = self.visible_panels().len() - 1;
                }
                self.refresh();
            }
            _ => self.change_value(true),
        }
    }

    // -- Focused panel items --

    fn embedding_panel(&self) -> Option<&EmbeddingPanel> {
        match &self.focused {
            Some(Focused::Section {
                content: Ok(SectionContent::Embeddings(panel)),
                ..
            }) => Some(panel),
            _ => None,
        }
    }

    /// Count gates and images of the focused section.
    pub fn panel_items(&self) -> Vec<PanelItem> {
        let Some(section) = self.focused_section() else {
            return Vec::new();
        };
        let options = self.options.get(&section.dir);
        let enabled = |label: &str| options.is_some_and(|o| o.enabled_counts.contains(label));

        let mut items: Vec<PanelItem> = match &self.focused {
            Some(Focused::Section {
                content: Ok(SectionContent::Embeddings(panel)),
                ..
            }) => panel
                .cells
                .iter()
                .filter_map(|c| c.gate.as_ref())
                .map(|label| PanelItem::Count {
                    label: label.clone(),
                    enabled: enabled(label.as_str()),
                })
                .collect(),
            Some(Focused::Section {
                content: Ok(SectionContent::Bars(cells)),
                ..
            }) => cells
                .iter()
                .filter(|c| !c.gate.always_visible)
                .map(|c| PanelItem::Count {
                    label: c.gate.label.clone(),
                    enabled: enabled(c.gate.label.as_str()),
                })
                .collect(),
            _ => Vec::new(),
        };
        items.extend(section.images.iter().map(|p| PanelItem::Image {
            name: p
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file_stem(p)),
        }));
        items
    }

    fn move_item(&mut self, down: bool) {
        if let Some(Focused::Explain(Ok(ExplainOutcome::Ready(explanation)))) = &self.focused {
            let n = explanation.attributions.len();
            self.explain_row = cycle(n, self.explain_row, down);
            return;
        }
        let n = self.panel_items().len();
        self.item_cursor = cycle(n, self.item_cursor, down);
    }

    fn activate_item(&mut self) {
        let items = self.panel_items();
        let Some(item) = items.get(self.item_cursor) else {
            return;
        };
        let Some(section) = self.focused_section() else {
            return;
        };
        let dir = section.dir.clone();
        match item {
            PanelItem::Count { label, .. } => {
                let options = self.options.entry(dir).or_default();
                if !options.enabled_counts.remove(label) {
                    options.enabled_counts.insert(label.clone());
                }
                self.refresh();
            }
            PanelItem::Image { name } => {
                let path = dir.join(name);
                self.message = Some(open_image(&path));
            }
        }
    }

    fn step_view_point(&mut self, forward: bool) {
        let Some(panel) = self.embedding_panel() else {
            return;
        };
        let points = &panel.view_points;
        let current = panel
            .selected
            .and_then(|s| points.iter().position(|p| *p == s))
            .unwrap_or(0);
        let Some(&next) = points.get(cycle(points.len(), current, forward)) else {
            return;
        };
        if let Some(dir) = self.focused_section().map(|s| s.dir.clone()) {
            self.options.entry(dir).or_default().view_point = Some(next);
            self.refresh();
        }
    }

    fn step_point(&mut self, forward: bool) {
        let Some(panel) = self.embedding_panel() else {
            return;
        };
        let n = panel
            .cells
            .iter()
            .filter_map(|c| match &c.content {
                EmbeddingContent::Points(set) => Some(set.points.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        self.point_cursor = cycle(n, self.point_cursor, forward);
    }

    // -- Drawing --

    fn focus_kind(&self) -> FocusKind {
        match &self.focused {
            None => FocusKind::Empty,
            Some(Focused::Explain(_)) => FocusKind::Explain,
            Some(Focused::Section { content, .. }) => match content {
                Ok(SectionContent::Embeddings(_)) => FocusKind::Embedding,
                Ok(SectionContent::Bars(_)) => FocusKind::Gated,
                Ok(_) => FocusKind::Plot,
                Err(_) => FocusKind::Empty,
            },
        }
    }

    /// Draw the full UI.
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(Block::default().style(self.theme.base_style()), frame.area());

        let [header_area, main_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let header = HeaderData {
            log_folder: self.log_folder.display().to_string(),
            dashboard: self.dashboards.get(self.dashboard_idx).cloned(),
            comparison: self.session.comparison().map(|c| c.feature_name.clone()),
            num_views: self.session.num_views(),
            filters: self.session.describe_filters(),
        };
        render_header(frame, header_area, &header, &self.theme);

        let content_area = if self.show_sidebar {
            let [sidebar_area, content_area] =
                Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)])
                    .areas(main_area);
            let entries: Vec<SidebarEntry> = self.controls().into_iter().map(|(_, e)| e).collect();
            render_sidebar(frame, sidebar_area, &entries, self.sidebar_cursor, &self.theme);
            content_area
        } else {
            main_area
        };
        self.draw_content(frame, content_area);

        render_status_bar(
            frame,
            status_area,
            self.focus_kind(),
            self.message.as_deref(),
            &self.theme,
        );
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let panels = self.visible_panels();
        let Some(focused) = &self.focused else {
            render_note(
                frame,
                area,
                None,
                "Select sections in the sidebar with Space.",
                &self.theme,
            );
            return;
        };

        let title = match focused {
            Focused::Section { index, .. } => self
                .dashboard
                .as_ref()
                .and_then(|d| d.sections.get(*index))
                .map(|s| s.title())
                .unwrap_or_default(),
            Focused::Explain(_) => "Explainability".to_string(),
        };
        let block = Block::default()
            .title(Line::styled(
                format!(" [{}/{}] {title} ", self.panel_idx + 1, panels.len()),
                self.theme.title_style(),
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let items = self.panel_items();
        let strip = if items.is_empty() {
            0
        } else {
            items.len().min(6) as u16 + 1
        };
        let [body_area, items_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(strip)]).areas(inner);
        if !items.is_empty() {
            render_items(frame, items_area, &items, self.item_cursor, &self.theme);
        }

        match focused {
            Focused::Explain(Ok(outcome)) => {
                render_explain(frame, body_area, outcome, self.explain_row, &self.theme)
            }
            Focused::Explain(Err(e)) => self.draw_error(frame, body_area, e),
            Focused::Section { content: Err(e), .. } => self.draw_error(frame, body_area, e),
            Focused::Section {
                content: Ok(content),
                ..
            } => self.draw_section(frame, body_area, content),
        }
    }

    fn draw_error(&self, frame: &mut Frame, area: Rect, error: &str) {
        let paragraph = Paragraph::new(format!("Failed to load: {error}"))
            .style(self.theme.error_style())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_section(&self, frame: &mut Frame, area: Rect, content: &SectionContent) {
        let columns = self.session.display_columns();
        let section_dir = self.focused_section().map(|s| s.dir.as_path());
        let theme = &self.theme;

        match content {
            SectionContent::Alerts(alerts) => render_alerts(frame, area, alerts, theme),
            SectionContent::Lines(plot) => {
                let log = section_dir
                    .and_then(|d| self.log_scale.get(d).copied())
                    .unwrap_or_default();
                for (view, cell) in plot.views.iter().zip(grid(area, plot.views.len(), columns)) {
                    render_line_view(
                        frame,
                        cell,
                        view,
                        (plot.x_axis.as_str(), plot.y_axis.as_str()),
                        log,
                        theme,
                    );
                }
            }
            SectionContent::Histograms(views) => {
                for (view, cell) in views.iter().zip(grid(area, views.len(), columns)) {
                    render_histogram_view(
                        frame,
                        cell,
                        view,
                        self.config.sampling.histogram_bins,
                        theme,
                    );
                }
            }
            SectionContent::Embeddings(panel) => {
                let area = if panel.view_points.is_empty() {
                    area
                } else {
                    let [selector, rest] =
                        Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).areas(area);
                    let points: Vec<String> =
                        panel.view_points.iter().map(|p| p.to_string()).collect();
                    let line = format!(
                        " View point: {}   [{}]",
                        panel.selected.map_or("-".to_string(), |p| p.to_string()),
                        points.join(", ")
                    );
                    frame.render_widget(Paragraph::new(line).style(theme.title_style()), selector);
                    rest
                };
                for (cell, rect) in panel.cells.iter().zip(grid(area, panel.cells.len(), columns)) {
                    match &cell.content {
                        EmbeddingContent::Points(set) => render_scatter(
                            frame,
                            rect,
                            &cell.title,
                            set,
                            Some(self.point_cursor),
                            theme,
                        ),
                        EmbeddingContent::NotSufficientData => {
                            render_note(frame, rect, Some(cell.title.as_str()), "Not sufficient data.", theme)
                        }
                        EmbeddingContent::Hidden => render_note(
                            frame,
                            rect,
                            Some(cell.title.as_str()),
                            "Hidden. Select it below and press Enter.",
                            theme,
                        ),
                    }
                }
            }
            SectionContent::Bars(cells) => {
                let visible: Vec<_> = cells
                    .iter()
                    .filter_map(|c| c.graph.as_ref().map(|g| (c, g)))
                    .collect();
                if visible.is_empty() {
                    render_note(
                        frame,
                        area,
                        None,
                        "No counts shown. Select one below and press Enter.",
                        theme,
                    );
                }
                for ((cell, graph), rect) in visible.iter().zip(grid(area, visible.len(), columns)) {
                    let title = format!("For count {}", cell.gate.label);
                    render_bar_graph(frame, rect, &title, graph, theme);
                }
            }
            SectionContent::Images => render_note(
                frame,
                area,
                None,
                "Select an image below and press o to open it.",
                theme,
            ),
        }
    }
}

/// Open an image in the system viewer; returns the status message.
fn open_image(path: &Path) -> String {
    match open::that(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Opened image");
            format!("Opened {}", path.display())
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to open image");
            format!("Failed to open {}: {e}", path.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::metadata::DimensionSpec;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn log_folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let dash = dir.path().join("perf");
        write(&dash.join("alerts/drift.json"), r#""Drift detected""#);
        write(
            &dash.join("line_plots/accuracy/0.csv"),
            "x_count,y_acc,model_model_type,feature_city\n1,0.5,a,sf\n2,0.6,b,ny\n",
        );
        write(&dash.join("bar_graphs/counts/-1.json"), r#"{"g": {"a": 1}}"#);
        write(&dash.join("bar_graphs/counts/10.json"), r#"{"g": {"a": 2}}"#);
        write(&dash.join("bar_graphs/counts/plot.png"), "");
        write(
            &dash.join("histograms/umap_and_clusters/5_a.json"),
            r#"{"umap": [[0, 0], [1, 1]], "clusters": [1, 2], "model_model_type": "a",
                "hover_texts": [{"id": "p1"}, {"id": "p2"}]}"#,
        );
        write(
            &dash.join("histograms/umap_and_clusters/9_a.json"),
            r#"{"umap": [[0, 0]], "clusters": [1]}"#,
        );
        std::fs::create_dir(dir.path().join("reports")).unwrap();
        dir
    }

    fn metadata() -> Metadata {
        Metadata {
            model_args: vec![DimensionSpec::new("model_type", &["a", "b"])],
            feature_args: vec![DimensionSpec::new("city", &["sf", "ny"])],
            ..Default::default()
        }
    }

    fn app(dir: &Path) -> App {
        App::new(dir.to_path_buf(), BoardConfig::default(), metadata())
    }

    /// Move the sidebar cursor to the row whose label contains `label`.
    fn focus_control(app: &mut App, label: &str) {
        let pos = app
            .controls()
            .iter()
            .position(|(_, e)| e.label.contains(label))
            .unwrap();
        app.sidebar_cursor = pos;
    }

    #[test]
    fn test_alerts_visible_by_default() {
        let dir = log_folder();
        let app = app(dir.path());
        assert_eq!(app.dashboard.as_ref().unwrap().name, "perf");
        let panels = app.visible_panels();
        assert_eq!(panels.len(), 1);
        assert!(matches!(
            app.focused,
            Some(Focused::Section {
                content: Ok(SectionContent::Alerts(_)),
                ..
            })
        ));
    }

    #[test]
    fn test_toggle_section_focuses_it() {
        let dir = log_folder();
        let mut app = app(dir.path());
        focus_control(&mut app, "Line-plot for accuracy");
        app.handle_action(Action::Toggle);
        assert_eq!(app.visible_panels().len(), 2);
        let Some(Focused::Section {
            content: Ok(SectionContent::Lines(plot)),
            ..
        }) = &app.focused
        else {
            panic!("expected line plot");
        };
        assert_eq!(plot.views.len(), 2);
        app.handle_action(Action::Toggle);
        assert_eq!(app.visible_panels().len(), 1);
    }

    #[test]
    fn test_feature_cycle_refreshes_plot() {
        let dir = log_folder();
        let mut app = app(dir.path());
        focus_control(&mut app, "Line-plot for accuracy");
        app.handle_action(Action::Toggle);
        focus_control(&mut app, "city");
        app.handle_action(Action::Next);
        assert_eq!(app.session.feature_selection("city").value(), Some("sf"));
        let Some(Focused::Section {
            content: Ok(SectionContent::Lines(plot)),
            ..
        }) = &app.focused
        else {
            panic!("expected line plot");
        };
        assert_eq!(plot.views[0].series[0].points, vec![(1.0, 0.5)]);
        assert!(plot.views[1].series[0].points.is_empty());

        app.handle_action(Action::Prev);
        assert_eq!(app.session.feature_selection("city"), &Selection::All);
    }

    #[test]
    fn test_bar_counts_are_opt_in() {
        let dir = log_folder();
        let mut app = app(dir.path());
        focus_control(&mut app, "Bar graph for counts");
        app.handle_action(Action::Toggle);
        let items = app.panel_items();
        assert_eq!(
            items,
            vec![
                PanelItem::Count {
                    label: "10".into(),
                    enabled: false
                },
                PanelItem::Image {
                    name: "plot.png".into()
                },
            ]
        );
        app.handle_action(Action::Activate);
        let Some(Focused::Section {
            content: Ok(SectionContent::Bars(cells)),
            ..
        }) = &app.focused
        else {
            panic!("expected bars");
        };
        assert!(cells.iter().all(|c| c.graph.is_some()));
    }

    #[test]
    fn test_view_point_stepping() {
        let dir = log_folder();
        let mut app = app(dir.path());
        focus_control(&mut app, "UMAP for umap_and_clusters");
        app.handle_action(Action::Toggle);
        assert_eq!(app.embedding_panel().unwrap().selected, Some(5));
        app.handle_action(Action::NextViewPoint);
        assert_eq!(app.embedding_panel().unwrap().selected, Some(9));
        app.handle_action(Action::NextViewPoint);
        assert_eq!(app.embedding_panel().unwrap().selected, Some(5));
    }

    #[test]
    fn test_point_stepping_shows_hover_text() {
        let dir = log_folder();
        let mut app = app(dir.path());
        focus_control(&mut app, "UMAP for umap_and_clusters");
        app.handle_action(Action::Toggle);
        app.handle_action(Action::NextPoint);
        assert_eq!(app.point_cursor, 1);

        let mut terminal = Terminal::new(TestBackend::new(160, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("cluster 2 │ id: p2"));

        app.handle_action(Action::NextPoint);
        assert_eq!(app.point_cursor, 0);
        app.handle_action(Action::PrevPoint);
        assert_eq!(app.point_cursor, 1);
    }

    #[test]
    fn test_sidebar_cursor_clamped_when_controls_shrink() {
        let dir = log_folder();
        let mut app = app(dir.path());
        app.sidebar_cursor = app.controls().len() - 1;
        app.load_dashboard(1);
        assert_eq!(app.dashboard.as_ref().unwrap().name, "reports");
        assert!(app.sidebar_cursor < app.controls().len());
        assert_eq!(
            app.current_control(),
            Some(Control::Feature("city".into()))
        );
        app.handle_action(Action::Next);
        assert_eq!(app.session.feature_selection("city").value(), Some("sf"));
    }

    #[test]
    fn test_dashboard_switch_resets_sections() {
        let dir = log_folder();
        let mut app = app(dir.path());
        focus_control(&mut app, "Line-plot for accuracy");
        app.handle_action(Action::Toggle);
        focus_control(&mut app, "Dashboard");
        app.handle_action(Action::Prev);
        assert_eq!(app.dashboard.as_ref().unwrap().name, "reports");
        assert!(app.visible_panels().is_empty());
        assert!(app.focused.is_none());
    }

    #[test]
    fn test_sidebar_cursor_skips_headings() {
        let dir = log_folder();
        let mut app = app(dir.path());
        app.sidebar_cursor = 0;
        app.handle_action(Action::Down);
        let controls = app.controls();
        assert_ne!(controls[app.sidebar_cursor].0, Control::Heading);
        assert_eq!(controls[app.sidebar_cursor].0, Control::Comparison);
    }

    #[test]
    fn test_quit() {
        let dir = log_folder();
        let mut app = app(dir.path());
        app.handle_action(Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_draw_does_not_panic() {
        let dir = log_folder();
        let mut app = app(dir.path());
        for label in [
            "Line-plot for accuracy",
            "Bar graph for counts",
            "UMAP for umap_and_clusters",
        ] {
            focus_control(&mut app, label);
            app.handle_action(Action::Toggle);
        }
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for _ in 0..app.visible_panels().len() {
            terminal.draw(|frame| app.draw(frame)).unwrap();
            app.handle_action(Action::NextPanel);
        }
        app.handle_action(Action::ToggleSidebar);
        terminal.draw(|frame| app.draw(frame)).unwrap();
    }
}
