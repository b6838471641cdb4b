// src/terminal.rs

//! Terminal input surface for the interactive carousel.
//!
//! Attaching the first listener puts the terminal into raw mode with mouse
//! capture; detaching the last one restores it. Mouse drags stand in for
//! touch swipes.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEventKind,
};
use crossterm::{execute, terminal};

use crate::error::{AppError, Result};
use crate::services::carousel::{InputEvent, InputSurface, Key, ListenerId, ListenerKind};

/// Approximate width of one terminal cell in pixels.
pub const CELL_WIDTH_PX: f64 = 8.0;

/// Input read from the terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminalInput {
    /// Carousel navigation input
    Nav(InputEvent),
    /// Copy the displayed match
    Copy,
    /// Favorite the displayed match
    Favorite,
    /// Anything else
    Ignored,
}

/// Map a terminal event onto carousel input.
pub fn map_event(event: &Event) -> TerminalInput {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Left => TerminalInput::Nav(InputEvent::KeyDown(Key::ArrowLeft)),
            KeyCode::Right => TerminalInput::Nav(InputEvent::KeyDown(Key::ArrowRight)),
            KeyCode::Esc | KeyCode::Char('q') => TerminalInput::Nav(InputEvent::KeyDown(Key::Escape)),
            KeyCode::Char('c') => TerminalInput::Copy,
            KeyCode::Char('f') => TerminalInput::Favorite,
            _ => TerminalInput::Nav(InputEvent::KeyDown(Key::Other)),
        },
        Event::Mouse(mouse) => {
            let x = f64::from(mouse.column) * CELL_WIDTH_PX;
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    TerminalInput::Nav(InputEvent::TouchStart { x })
                }
                MouseEventKind::Up(MouseButton::Left) => TerminalInput::Nav(InputEvent::TouchEnd { x }),
                _ => TerminalInput::Ignored,
            }
        }
        _ => TerminalInput::Ignored,
    }
}

/// Block on the next terminal event without stalling the runtime.
pub async fn read_input() -> Result<TerminalInput> {
    let event = tokio::task::spawn_blocking(event::read)
        .await
        .map_err(|e| AppError::capability("terminal", e))??;
    Ok(map_event(&event))
}

/// Turn on raw mode, then mouse capture. Raw mode is turned back off when
/// mouse capture fails.
fn enter_with(
    raw_on: impl FnOnce() -> io::Result<()>,
    mouse_on: impl FnOnce() -> io::Result<()>,
    raw_off: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    raw_on()?;
    if let Err(e) = mouse_on() {
        if let Err(undo) = raw_off() {
            log::warn!("Failed to leave raw mode: {}", undo);
        }
        return Err(e);
    }
    Ok(())
}

/// The controlling terminal as an input surface.
#[derive(Default)]
pub struct TerminalSurface {
    next_id: AtomicU64,
    attached: Mutex<HashSet<ListenerId>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter() -> io::Result<()> {
        enter_with(
            terminal::enable_raw_mode,
            || execute!(io::stdout(), EnableMouseCapture),
            terminal::disable_raw_mode,
        )
    }

    fn leave() -> io::Result<()> {
        execute!(io::stdout(), DisableMouseCapture)?;
        terminal::disable_raw_mode()?;
        io::stdout().flush()
    }
}

impl InputSurface for TerminalSurface {
    fn attach(&self, kind: ListenerKind) -> Result<ListenerId> {
        let mut attached = self
            .attached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if attached.is_empty() {
            Self::enter()?;
            log::debug!("Terminal input captured");
        }
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        attached.insert(id);
        log::trace!("Attached {:?} listener {:?}", kind, id);
        Ok(id)
    }

    fn detach(&self, id: ListenerId) {
        let mut attached = self
            .attached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if attached.remove(&id) && attached.is_empty() {
            if let Err(e) = Self::leave() {
                log::warn!("Failed to restore terminal: {}", e);
            }
            log::debug!("Terminal input released");
        }
    }
}
