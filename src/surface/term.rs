use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use crossterm::{execute, queue};

use crate::console::{Cell, ConsoleBuffer};
use crate::error::Result;
use crate::geometry::Size;
use crate::surface::core::{ResizeBehavior, Surface, SurfaceConfig, SurfaceEvent, WindowMode};

/// Crossterm-backed surface writing to stdout.
///
/// `activate` switches the terminal into raw mode on the alternate
/// screen; `deactivate` restores it best-effort. `present` rewrites only
/// the rows whose content hash changed since the previous frame.
pub struct TermSurface {
    out: io::Stdout,
    buffer: ConsoleBuffer,
    mode: WindowMode,
    resize_behavior: ResizeBehavior,
    row_hashes: Vec<Option<blake3::Hash>>,
}

impl TermSurface {
    pub fn new(config: &SurfaceConfig) -> Result<Self> {
        let size = terminal::size()
            .map(|(width, height)| Size::new(width, height))
            .unwrap_or(Size::new(config.width, config.height));

        let mut out = io::stdout();
        execute!(out, SetTitle(&config.title))?;

        Ok(Self {
            out,
            buffer: ConsoleBuffer::new(size.width, size.height),
            mode: config.start_mode,
            resize_behavior: config.resize_behavior,
            row_hashes: Vec::new(),
        })
    }

    fn row_digest(row: &[Cell]) -> blake3::Hash {
        let mut bytes = Vec::with_capacity(row.len() * 8);
        let mut utf8 = [0u8; 4];
        for cell in row {
            bytes.extend_from_slice(cell.glyph.encode_utf8(&mut utf8).as_bytes());
            encode_color(cell.fg, &mut bytes);
            encode_color(cell.bg, &mut bytes);
        }
        blake3::hash(&bytes)
    }
}

impl Surface for TermSurface {
    fn size(&self) -> Size {
        self.buffer.size()
    }

    fn buffer(&self) -> &ConsoleBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut ConsoleBuffer {
        &mut self.buffer
    }

    fn poll_input(&mut self) -> Result<Option<SurfaceEvent>> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    // Raw mode swallows SIGINT; treat Ctrl-C as a close request.
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(Some(SurfaceEvent::CloseRequested));
                    }
                    return Ok(Some(SurfaceEvent::Key(key)));
                }
                Event::Resize(width, height) => {
                    if self.resize_behavior == ResizeBehavior::RescaleCells {
                        continue;
                    }
                    self.buffer.resize(width, height);
                    self.row_hashes.clear();
                    return Ok(Some(SurfaceEvent::Resized(Size::new(width, height))));
                }
                _ => continue,
            }
        }
        Ok(None)
    }

    fn present(&mut self) -> Result<()> {
        let Self {
            out,
            buffer,
            row_hashes,
            ..
        } = self;

        row_hashes.resize(buffer.height() as usize, None);
        for y in 0..buffer.height() {
            let row = buffer.row(y);
            let digest = Self::row_digest(row);
            if row_hashes[y as usize] == Some(digest) {
                continue;
            }
            row_hashes[y as usize] = Some(digest);

            queue!(out, MoveTo(0, y))?;
            let mut fg = None;
            let mut bg = None;
            for cell in row {
                if fg != Some(cell.fg) {
                    queue!(out, SetForegroundColor(cell.fg))?;
                    fg = Some(cell.fg);
                }
                if bg != Some(cell.bg) {
                    queue!(out, SetBackgroundColor(cell.bg))?;
                    bg = Some(cell.bg);
                }
                queue!(out, Print(cell.glyph))?;
            }
        }
        queue!(out, ResetColor)?;
        out.flush()?;
        Ok(())
    }

    fn window_mode(&self) -> WindowMode {
        self.mode
    }

    fn set_window_mode(&mut self, mode: WindowMode) -> Result<()> {
        // Terminal emulators own their window state; the mode is tracked
        // so the hub's toggle stays observable.
        self.mode = mode;
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        self.row_hashes.clear();
        Ok(())
    }

    fn deactivate(&mut self) -> Result<()> {
        execute!(self.out, Show, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
        Ok(())
    }

    fn wait(&mut self, timeout: Duration) -> Result<()> {
        // Returns early when input arrives; the next tick consumes it.
        event::poll(timeout)?;
        Ok(())
    }
}

fn encode_color(color: Color, out: &mut Vec<u8>) {
    match color {
        Color::Reset => out.push(0),
        Color::Black => out.push(1),
        Color::DarkGrey => out.push(2),
        Color::Red => out.push(3),
        Color::DarkRed => out.push(4),
        Color::Green => out.push(5),
        Color::DarkGreen => out.push(6),
        Color::Yellow => out.push(7),
        Color::DarkYellow => out.push(8),
        Color::Blue => out.push(9),
        Color::DarkBlue => out.push(10),
        Color::Magenta => out.push(11),
        Color::DarkMagenta => out.push(12),
        Color::Cyan => out.push(13),
        Color::DarkCyan => out.push(14),
        Color::White => out.push(15),
        Color::Grey => out.push(16),
        Color::Rgb { r, g, b } => {
            out.push(17);
            out.extend_from_slice(&[r, g, b]);
        }
        Color::AnsiValue(value) => {
            out.extend_from_slice(&[18, value]);
        }
    }
}
