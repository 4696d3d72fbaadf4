//! TUI (Terminal User Interface) module for evalboard.
//!
//! Provides the interactive dashboard: a control sidebar, the focused
//! section's plots, and a status bar with keybinding hints.

pub mod app;
pub mod event;
pub mod theme;
pub mod widgets;

use app::App;
use evalboard_core::{BoardConfig, Metadata};
use std::path::PathBuf;

/// Run the TUI application.
pub async fn run(log_folder: PathBuf, config: BoardConfig, metadata: Metadata) -> anyhow::Result<()> {
    // Setup terminal
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;

    let backend = ratatui::backend::CrosstermBackend::new(std::io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;
    terminal.clear()?;

    // Run app
    let mut app = App::new(log_folder, config, metadata);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
