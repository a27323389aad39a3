use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::console::ConsoleBuffer;
use crate::error::Result;
use crate::geometry::Size;
use crate::surface::core::{Surface, SurfaceEvent, WindowMode};

#[derive(Debug, Default)]
struct Probe {
    presented: u64,
    last_frame: Option<ConsoleBuffer>,
    modes: Vec<WindowMode>,
}

/// In-memory surface for tests, benches, and scripted demos.
///
/// Input is whatever the paired [`HeadlessHandle`] queued; `present`
/// captures a copy of the buffer instead of touching a terminal. Resize
/// events take effect on the grid when they are polled, mirroring how the
/// terminal surface resizes before reporting.
pub struct HeadlessSurface {
    buffer: ConsoleBuffer,
    events: Rc<RefCell<VecDeque<SurfaceEvent>>>,
    probe: Rc<RefCell<Probe>>,
    mode: WindowMode,
}

/// Observation and injection side of a [`HeadlessSurface`], kept by the
/// caller after the surface moves into the hub.
#[derive(Clone)]
pub struct HeadlessHandle {
    events: Rc<RefCell<VecDeque<SurfaceEvent>>>,
    probe: Rc<RefCell<Probe>>,
}

impl HeadlessSurface {
    pub fn new(width: u16, height: u16) -> (Self, HeadlessHandle) {
        let events = Rc::new(RefCell::new(VecDeque::new()));
        let probe = Rc::new(RefCell::new(Probe::default()));
        let surface = Self {
            buffer: ConsoleBuffer::new(width, height),
            events: Rc::clone(&events),
            probe: Rc::clone(&probe),
            mode: WindowMode::Windowed,
        };
        (surface, HeadlessHandle { events, probe })
    }
}

impl HeadlessHandle {
    pub fn push_event(&self, event: SurfaceEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn push_key(&self, key: KeyEvent) {
        self.push_event(SurfaceEvent::Key(key));
    }

    pub fn push_char(&self, ch: char) {
        self.push_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
    }

    pub fn push_resize(&self, size: Size) {
        self.push_event(SurfaceEvent::Resized(size));
    }

    pub fn push_close(&self) {
        self.push_event(SurfaceEvent::CloseRequested);
    }

    /// How many frames the surface has presented.
    pub fn presented_frames(&self) -> u64 {
        self.probe.borrow().presented
    }

    /// Copy of the root buffer as of the most recent present.
    pub fn last_frame(&self) -> Option<ConsoleBuffer> {
        self.probe.borrow().last_frame.clone()
    }

    /// Window modes the surface was asked to switch into, in order.
    pub fn modes(&self) -> Vec<WindowMode> {
        self.probe.borrow().modes.clone()
    }
}

impl Surface for HeadlessSurface {
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
        let event = self.events.borrow_mut().pop_front();
        if let Some(SurfaceEvent::Resized(size)) = &event {
            self.buffer.resize(size.width, size.height);
        }
        Ok(event)
    }

    fn present(&mut self) -> Result<()> {
        let mut probe = self.probe.borrow_mut();
        probe.presented += 1;
        probe.last_frame = Some(self.buffer.clone());
        Ok(())
    }

    fn window_mode(&self) -> WindowMode {
        self.mode
    }

    fn set_window_mode(&mut self, mode: WindowMode) -> Result<()> {
        self.mode = mode;
        self.probe.borrow_mut().modes.push(mode);
        Ok(())
    }

    fn wait(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}
