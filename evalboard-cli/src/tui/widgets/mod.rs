//! TUI widget modules.

pub mod charts;
pub mod header;
pub mod panels;
pub mod sidebar;
pub mod status_bar;
