//! Key bindings and the async terminal event source.

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers};
use futures::StreamExt;

/// High-level actions the TUI can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Move the sidebar cursor.
    Up,
    Down,
    /// Cycle the value of the control under the sidebar cursor.
    Prev,
    Next,
    /// Toggle the control under the sidebar cursor.
    Toggle,
    NextPanel,
    PrevPanel,
    /// Move the cursor over the focused panel's items.
    ItemUp,
    ItemDown,
    /// Activate the focused panel's item: enable a count or open an image.
    Activate,
    ToggleLogX,
    ToggleLogY,
    PrevViewPoint,
    NextViewPoint,
    /// Move the highlighted embedding point whose hover text is shown.
    PrevPoint,
    NextPoint,
    ToggleSidebar,
    Reload,
}

/// Reads terminal events asynchronously using crossterm's EventStream.
pub struct EventHandler {
    stream: EventStream,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            stream: EventStream::new(),
        }
    }

    /// Read the next terminal event. Returns None if the stream ends.
    pub async fn next(&mut self) -> Option<Event> {
        self.stream.next().await.and_then(|r| r.ok())
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a key event to an Action.
pub fn map_key(event: &KeyEvent) -> Option<Action> {
    match (event.modifiers, event.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Action::Quit),
        (_, KeyCode::Char('q')) | (_, KeyCode::Esc) => Some(Action::Quit),
        (_, KeyCode::Up) => Some(Action::Up),
        (_, KeyCode::Down) => Some(Action::Down),
        (_, KeyCode::Left) => Some(Action::Prev),
        (_, KeyCode::Right) => Some(Action::Next),
        (_, KeyCode::Char(' ')) => Some(Action::Toggle),
        (_, KeyCode::Tab) => Some(Action::NextPanel),
        (_, KeyCode::BackTab) => Some(Action::PrevPanel),
        (_, KeyCode::Char('k')) => Some(Action::ItemUp),
        (_, KeyCode::Char('j')) => Some(Action::ItemDown),
        (_, KeyCode::Enter) | (_, KeyCode::Char('o')) => Some(Action::Activate),
        (_, KeyCode::Char('x')) => Some(Action::ToggleLogX),
        (_, KeyCode::Char('y')) => Some(Action::ToggleLogY),
        (_, KeyCode::Char('[')) => Some(Action::PrevViewPoint),
        (_, KeyCode::Char(']')) => Some(Action::NextViewPoint),
        (_, KeyCode::Char(',')) => Some(Action::PrevPoint),
        (_, KeyCode::Char('.')) => Some(Action::NextPoint),
        (_, KeyCode::Char('s')) => Some(Action::ToggleSidebar),
        (_, KeyCode::Char('r')) => Some(Action::Reload),
        _ => None,
    }
}
