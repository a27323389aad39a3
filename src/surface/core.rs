use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::console::ConsoleBuffer;
use crate::error::Result;
use crate::geometry::Size;

/// Window display mode tracked by the hub's fullscreen toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Windowed,
    Fullscreen,
}

/// What a window resize does to the character grid.
///
/// `ResizeGrid` changes the cell count and triggers relayout;
/// `RescaleCells` keeps the cell count fixed (the backend stretches
/// glyphs instead), so no resize notification is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeBehavior {
    ResizeGrid,
    RescaleCells,
}

/// Settings consumed when a surface is created. Implementations use the
/// fields that apply to them; a terminal backend has no say over glyph
/// metrics, for example.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub title: String,
    pub width: u16,
    pub height: u16,
    pub cell_width: u16,
    pub cell_height: u16,
    pub scale: f32,
    pub resizable: bool,
    pub resize_behavior: ResizeBehavior,
    pub start_mode: WindowMode,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "gridwin".to_string(),
            width: 80,
            height: 24,
            cell_width: 8,
            cell_height: 8,
            scale: 1.0,
            resizable: true,
            resize_behavior: ResizeBehavior::ResizeGrid,
            start_mode: WindowMode::Windowed,
        }
    }
}

/// One pending input notification from the surface.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    Key(KeyEvent),
    Resized(Size),
    CloseRequested,
}

/// Window geometry change relayed to screens and their panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEvent {
    pub old: Size,
    pub new: Size,
}

/// The root console: a cell grid plus presentation and input polling.
///
/// A surface that reports a resize must have already resized its own
/// buffer by the time [`Surface::poll_input`] returns the event.
pub trait Surface {
    fn size(&self) -> Size;

    fn buffer(&self) -> &ConsoleBuffer;

    fn buffer_mut(&mut self) -> &mut ConsoleBuffer;

    /// Pop one pending event, or `None` when the queue is empty.
    fn poll_input(&mut self) -> Result<Option<SurfaceEvent>>;

    /// Flush the buffer to the physical display.
    fn present(&mut self) -> Result<()>;

    fn window_mode(&self) -> WindowMode;

    fn set_window_mode(&mut self, mode: WindowMode) -> Result<()>;

    /// Take over the backing display for the duration of a run.
    fn activate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the backing display.
    fn deactivate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Idle until `timeout` elapses or input is likely available.
    fn wait(&mut self, timeout: Duration) -> Result<()> {
        std::thread::sleep(timeout);
        Ok(())
    }
}
