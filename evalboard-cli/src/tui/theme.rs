//! Colour palettes for the dashboard, chosen with `ui.theme`.

use ratatui::style::{Color, Modifier, Style};

/// Named palette selectable from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    Dark,
    Light,
}

impl ThemeKind {
    /// Unknown names fall back to dark.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("light") {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

const DARK_SERIES: &[Color] = &[
    Color::Rgb(94, 129, 172),
    Color::Rgb(208, 135, 112),
    Color::Rgb(163, 190, 140),
    Color::Rgb(180, 142, 173),
    Color::Rgb(235, 203, 139),
    Color::Rgb(136, 192, 208),
    Color::Rgb(191, 97, 106),
    Color::Rgb(143, 188, 187),
];

const LIGHT_SERIES: &[Color] = &[
    Color::Rgb(31, 119, 180),
    Color::Rgb(255, 127, 14),
    Color::Rgb(44, 160, 44),
    Color::Rgb(214, 39, 40),
    Color::Rgb(148, 103, 189),
    Color::Rgb(140, 86, 75),
    Color::Rgb(227, 119, 194),
    Color::Rgb(23, 190, 207),
];

/// Colours for the dashboard chrome and its plots.
#[derive(Debug, Clone)]
pub struct Theme {
    pub kind: ThemeKind,

    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub muted_fg: Color,
    pub border_color: Color,
    /// Background of the header, status bar and sidebar.
    pub panel_bg: Color,
    pub selection_bg: Color,

    pub alert_fg: Color,
    pub ok_fg: Color,
    pub failure_fg: Color,

    /// Series and cluster colours, cycled.
    pub series: &'static [Color],
    /// Attributions that raise / lower the prediction.
    pub raises: Color,
    pub lowers: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            kind: ThemeKind::Dark,
            bg: Color::Rgb(46, 52, 64),
            fg: Color::Rgb(216, 222, 233),
            accent: Color::Rgb(136, 192, 208),
            muted_fg: Color::Rgb(118, 128, 146),
            border_color: Color::Rgb(76, 86, 106),
            panel_bg: Color::Rgb(36, 41, 51),
            selection_bg: Color::Rgb(67, 76, 94),
            alert_fg: Color::Rgb(235, 203, 139),
            ok_fg: Color::Rgb(163, 190, 140),
            failure_fg: Color::Rgb(191, 97, 106),
            series: DARK_SERIES,
            raises: Color::Rgb(255, 0, 81),
            lowers: Color::Rgb(0, 139, 251),
        }
    }

    pub fn light() -> Self {
        Self {
            kind: ThemeKind::Light,
            bg: Color::Rgb(250, 250, 248),
            fg: Color::Rgb(40, 44, 52),
            accent: Color::Rgb(31, 119, 180),
            muted_fg: Color::Rgb(128, 128, 128),
            border_color: Color::Rgb(190, 190, 190),
            panel_bg: Color::Rgb(235, 235, 232),
            selection_bg: Color::Rgb(210, 222, 238),
            alert_fg: Color::Rgb(196, 110, 0),
            ok_fg: Color::Rgb(44, 140, 44),
            failure_fg: Color::Rgb(200, 30, 40),
            series: LIGHT_SERIES,
            raises: Color::Rgb(230, 0, 70),
            lowers: Color::Rgb(0, 110, 220),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match ThemeKind::parse(name) {
            ThemeKind::Dark => Self::dark(),
            ThemeKind::Light => Self::light(),
        }
    }

    pub fn series_color(&self, i: usize) -> Color {
        self.series[i % self.series.len()]
    }

    /// Colour of one attribution bar in the waterfall.
    pub fn attribution_color(&self, value: f64) -> Color {
        if value >= 0.0 { self.raises } else { self.lowers }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn header_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.panel_bg)
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default().fg(self.muted_fg).bg(self.panel_bg)
    }

    pub fn sidebar_style(&self) -> Style {
        self.header_style()
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted_fg)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border_color)
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(self.failure_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.alert_fg)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.ok_fg)
    }
}
