use std::cell::Cell;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use serde_json::{Value, json};

use crate::error::Result;
use crate::geometry::Size;
use crate::keys::{HandlerRc, KeyPressEvent, stop_handler};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{HubMetrics, MetricSnapshot};
use crate::panel::{PanelRc, hide_panel};
use crate::surface::{ResizeEvent, Surface, SurfaceConfig, SurfaceEvent, TermSurface, WindowMode};

/// Identity of one registration in the hub's chains. Allocated per
/// panel/handler/screen at construction; removal is by identity, so the
/// same component can never shadow another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Configuration knobs for the hub.
#[derive(Clone)]
pub struct HubConfig {
    /// Target interval between frame ticks when running the loop.
    pub frame_interval: Duration,
    /// Structured logger receiving lifecycle events and misuse
    /// diagnostics. `None` silences the hub.
    pub logger: Option<Logger>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(33),
            logger: None,
        }
    }
}

/// Deferred actions a dispatch hook may request.
///
/// Hooks run while the hub is mid-dispatch, so they cannot re-enter it;
/// the hub applies requests after each hook returns. Hide targets the
/// component that was invoked (for a key handler it means stop
/// handling); refresh repaints the invoked panel's buffer.
#[derive(Debug, Default)]
pub struct EventCtx {
    hide_requested: bool,
    refresh_requested: bool,
    exit_requested: bool,
    fullscreen_toggle_requested: bool,
}

impl EventCtx {
    pub fn request_hide(&mut self) {
        self.hide_requested = true;
    }

    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn request_toggle_fullscreen(&mut self) {
        self.fullscreen_toggle_requested = true;
    }
}

#[derive(Clone)]
pub(crate) enum KeySink {
    Panel(PanelRc),
    Handler(HandlerRc),
}

#[derive(Clone)]
struct KeyEntry {
    id: HandlerId,
    sink: KeySink,
}

const TARGET: &str = "gridwin::hub";

/// Owns the root surface and the event chains, and drives the frame
/// tick: poll input, dispatch the key chain, refresh real-time layouts,
/// clear, render, present.
///
/// There is exactly one hub per surface and it is passed by reference
/// wherever it is needed; constructing it consumes the surface, so it
/// cannot be initialized twice.
pub struct EventHub {
    surface: Box<dyn Surface>,
    key_chain: Vec<KeyEntry>,
    refresh_chain: Vec<(HandlerId, PanelRc)>,
    render_chain: Vec<(HandlerId, PanelRc)>,
    resize_listeners: Vec<(HandlerId, crate::screen::ScreenRc)>,
    config: HubConfig,
    fullscreen: bool,
    should_exit: bool,
    last_size: Size,
    metrics: HubMetrics,
    created_at: Instant,
    ids: Cell<u64>,
}

impl EventHub {
    /// Construct a hub over a terminal surface built from `config`.
    pub fn init(config: SurfaceConfig) -> Result<Self> {
        Self::init_with(config, HubConfig::default())
    }

    pub fn init_with(config: SurfaceConfig, hub_config: HubConfig) -> Result<Self> {
        let surface = TermSurface::new(&config)?;
        Ok(Self::with_config(Box::new(surface), hub_config))
    }

    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self::with_config(surface, HubConfig::default())
    }

    pub fn with_config(surface: Box<dyn Surface>, config: HubConfig) -> Self {
        let last_size = surface.size();
        let fullscreen = surface.window_mode() == WindowMode::Fullscreen;
        Self {
            surface,
            key_chain: Vec::new(),
            refresh_chain: Vec::new(),
            render_chain: Vec::new(),
            resize_listeners: Vec::new(),
            config,
            fullscreen,
            should_exit: false,
            last_size,
            metrics: HubMetrics::new(),
            created_at: Instant::now(),
            ids: Cell::new(0),
        }
    }

    pub fn surface(&self) -> &dyn Surface {
        &*self.surface
    }

    pub fn surface_size(&self) -> Size {
        self.surface.size()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Flip the window display mode on the surface.
    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        let mode = if self.fullscreen {
            WindowMode::Windowed
        } else {
            WindowMode::Fullscreen
        };
        self.surface.set_window_mode(mode)?;
        self.fullscreen = !self.fullscreen;
        self.log(
            LogLevel::Info,
            "window_mode_changed",
            [json_kv("fullscreen", json!(self.fullscreen))],
        );
        Ok(())
    }

    pub fn request_exit(&mut self) {
        self.should_exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.should_exit
    }

    pub fn metrics(&self) -> MetricSnapshot {
        self.metrics.snapshot(self.created_at.elapsed())
    }

    /// Run the frame loop until exit is requested or the surface asks to
    /// close. Blocks the calling thread.
    pub fn run(&mut self) -> Result<()> {
        self.surface.activate()?;
        self.should_exit = false;
        self.log(
            LogLevel::Info,
            "hub_started",
            [
                json_kv("key_handlers", json!(self.key_chain.len())),
                json_kv("render_handlers", json!(self.render_chain.len())),
            ],
        );

        let result = self.run_loop();

        let _ = self.surface.deactivate();
        self.log(
            LogLevel::Info,
            "hub_stopped",
            [json_kv(
                "uptime_ms",
                json!(self.created_at.elapsed().as_millis() as u64),
            )],
        );
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        while !self.should_exit {
            let frame_started = Instant::now();
            self.tick()?;
            if self.should_exit {
                break;
            }
            if let Some(budget) = self.config.frame_interval.checked_sub(frame_started.elapsed())
            {
                if !budget.is_zero() {
                    self.surface.wait(budget)?;
                }
            }
        }
        Ok(())
    }

    /// One frame: poll input, dispatch, refresh real-time layouts, clear
    /// the root, render every shown panel in insertion order, present.
    pub fn tick(&mut self) -> Result<()> {
        self.poll_and_dispatch_input()?;
        self.run_refresh_chain();
        self.surface.buffer_mut().clear();
        self.run_render_chain();
        self.surface.present()?;
        self.metrics.record_frame();
        Ok(())
    }

    /// At most one key event is dispatched per tick; resize and close
    /// notifications found before it are handled inline.
    fn poll_and_dispatch_input(&mut self) -> Result<()> {
        while let Some(event) = self.surface.poll_input()? {
            match event {
                SurfaceEvent::Resized(new) => self.relay_resize(new),
                SurfaceEvent::Key(key) => {
                    self.dispatch_key(key)?;
                    break;
                }
                SurfaceEvent::CloseRequested => {
                    self.log(LogLevel::Info, "close_requested", std::iter::empty());
                    self.should_exit = true;
                    break;
                }
            }
        }
        Ok(())
    }

    fn dispatch_key(&mut self, key: KeyEvent) -> Result<()> {
        let mut event = KeyPressEvent::new(key);
        // Snapshot so chain edits requested mid-dispatch do not affect
        // who sees this event.
        let chain = self.key_chain.clone();
        let mut cancelled = false;
        for entry in chain {
            let mut ctx = EventCtx::default();
            match &entry.sink {
                KeySink::Panel(panel) => panel.borrow_mut().handle_key(&mut event, &mut ctx),
                KeySink::Handler(handler) => {
                    handler.borrow_mut().handle_key(&mut event, &mut ctx)
                }
            }
            self.apply_ctx(ctx, &entry.sink)?;
            if event.is_cancelled() {
                cancelled = true;
                break;
            }
        }
        self.metrics.record_key(cancelled);
        self.log(
            LogLevel::Debug,
            "key_dispatched",
            [json_kv("cancelled", json!(cancelled))],
        );
        Ok(())
    }

    fn apply_ctx(&mut self, ctx: EventCtx, sink: &KeySink) -> Result<()> {
        let EventCtx {
            hide_requested,
            refresh_requested,
            exit_requested,
            fullscreen_toggle_requested,
        } = ctx;

        if refresh_requested {
            if let KeySink::Panel(panel) = sink {
                panel.borrow_mut().refresh_layout();
            }
        }
        if hide_requested {
            match sink {
                KeySink::Panel(panel) => hide_panel(self, panel),
                KeySink::Handler(handler) => stop_handler(self, handler),
            }
        }
        if fullscreen_toggle_requested {
            self.toggle_fullscreen()?;
        }
        if exit_requested {
            self.should_exit = true;
            self.log(LogLevel::Info, "exit_requested", std::iter::empty());
        }
        Ok(())
    }

    fn run_refresh_chain(&mut self) {
        let chain = self.refresh_chain.clone();
        for (_, panel) in chain {
            panel.borrow_mut().refresh_layout();
            self.metrics.record_layout_refresh();
        }
    }

    fn run_render_chain(&mut self) {
        let chain = self.render_chain.clone();
        for (_, panel) in chain {
            panel.borrow_mut().render(self.surface.buffer_mut());
        }
    }

    fn relay_resize(&mut self, new: Size) {
        let old = self.last_size;
        self.last_size = new;
        let event = ResizeEvent { old, new };
        self.metrics.record_resize();
        self.log(
            LogLevel::Info,
            "surface_resized",
            [
                json_kv("width", json!(new.width)),
                json_kv("height", json!(new.height)),
            ],
        );
        let listeners = self.resize_listeners.clone();
        for (_, screen) in listeners {
            crate::screen::relay_resize(&screen, &event);
        }
    }

    pub(crate) fn next_id(&self) -> HandlerId {
        let next = self.ids.get() + 1;
        self.ids.set(next);
        HandlerId(next)
    }

    pub(crate) fn add_refresh(&mut self, id: HandlerId, panel: PanelRc) {
        if self.refresh_chain.iter().any(|(existing, _)| *existing == id) {
            self.warn_duplicate("refresh", id);
            return;
        }
        self.refresh_chain.push((id, panel));
    }

    pub(crate) fn remove_refresh(&mut self, id: HandlerId) {
        self.refresh_chain.retain(|(existing, _)| *existing != id);
    }

    pub(crate) fn add_render(&mut self, id: HandlerId, panel: PanelRc) {
        if self.render_chain.iter().any(|(existing, _)| *existing == id) {
            self.warn_duplicate("render", id);
            return;
        }
        self.render_chain.push((id, panel));
    }

    pub(crate) fn remove_render(&mut self, id: HandlerId) {
        self.render_chain.retain(|(existing, _)| *existing != id);
    }

    /// Head insertion: the newest subscriber gets first refusal on every
    /// key until something in front of it cancels.
    pub(crate) fn add_key_front(&mut self, id: HandlerId, sink: KeySink) {
        if self.key_chain.iter().any(|entry| entry.id == id) {
            self.warn_duplicate("key", id);
            return;
        }
        self.key_chain.insert(0, KeyEntry { id, sink });
    }

    pub(crate) fn remove_key(&mut self, id: HandlerId) {
        self.key_chain.retain(|entry| entry.id != id);
    }

    pub(crate) fn add_resize_listener(&mut self, id: HandlerId, screen: crate::screen::ScreenRc) {
        if self
            .resize_listeners
            .iter()
            .any(|(existing, _)| *existing == id)
        {
            self.warn_duplicate("resize", id);
            return;
        }
        self.resize_listeners.push((id, screen));
    }

    pub(crate) fn remove_resize_listener(&mut self, id: HandlerId) {
        self.resize_listeners.retain(|(existing, _)| *existing != id);
    }

    pub(crate) fn log_at(
        &self,
        level: LogLevel,
        target: &str,
        message: &str,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        if let Some(logger) = self.config.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, target, message, fields));
        }
    }

    pub(crate) fn warn_misuse(
        &self,
        target: &str,
        message: &str,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        self.log_at(LogLevel::Warn, target, message, fields);
    }

    fn warn_duplicate(&self, chain: &str, id: HandlerId) {
        self.warn_misuse(
            TARGET,
            "handler_already_registered",
            [
                json_kv("chain", json!(chain)),
                json_kv("handler", json!(id.as_u64())),
            ],
        );
    }

    fn log(
        &self,
        level: LogLevel,
        message: &str,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        self.log_at(level, TARGET, message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crossterm::event::{KeyCode, KeyModifiers};
    use crossterm::style::Color;

    use crate::console::{Cell as GridCell, ConsoleBuffer};
    use crate::keys::{KeyHandler, KeyListener};
    use crate::logging::{BufferSink, Logger};
    use crate::panel::{Panel, PanelGeometry, PanelOptions, PanelWidget};
    use crate::screen::{Screen, fixed, height_minus, width_minus};
    use crate::surface::{HeadlessHandle, HeadlessSurface};

    type Trace = Rc<RefCell<Vec<String>>>;

    struct FillWidget {
        glyph: char,
        layouts: Rc<RefCell<u32>>,
        keys: Trace,
        cancel_keys: bool,
        hide_on_key: bool,
    }

    impl FillWidget {
        fn boxed(glyph: char, layouts: &Rc<RefCell<u32>>, keys: &Trace) -> Box<Self> {
            Box::new(Self {
                glyph,
                layouts: Rc::clone(layouts),
                keys: Rc::clone(keys),
                cancel_keys: false,
                hide_on_key: false,
            })
        }
    }

    impl PanelWidget for FillWidget {
        fn update_layout(&mut self, buffer: &mut ConsoleBuffer) {
            *self.layouts.borrow_mut() += 1;
            buffer.fill(GridCell::new(self.glyph, Color::Reset, Color::Reset));
        }

        fn on_key_press(&mut self, event: &mut KeyPressEvent, ctx: &mut EventCtx) {
            self.keys.borrow_mut().push(format!("{}:{:?}", self.glyph, event.code()));
            if self.hide_on_key {
                ctx.request_hide();
            }
            if self.cancel_keys {
                event.cancel();
            }
        }
    }

    struct NamedListener {
        label: &'static str,
        trace: Trace,
        cancel: bool,
    }

    impl KeyListener for NamedListener {
        fn on_key_press(&mut self, event: &mut KeyPressEvent, _ctx: &mut EventCtx) {
            self.trace.borrow_mut().push(self.label.to_string());
            if self.cancel {
                event.cancel();
            }
        }
    }

    fn hub_with_sink(width: u16, height: u16) -> (EventHub, BufferSink, HeadlessHandle) {
        let (surface, handle) = HeadlessSurface::new(width, height);
        let sink = BufferSink::new();
        let config = HubConfig {
            logger: Some(Logger::new(sink.clone())),
            ..HubConfig::default()
        };
        (EventHub::with_config(Box::new(surface), config), sink, handle)
    }

    fn full_panel(
        hub: &EventHub,
        name: &str,
        glyph: char,
        options: PanelOptions,
        layouts: &Rc<RefCell<u32>>,
        keys: &Trace,
    ) -> Panel {
        Panel::new(
            hub,
            name,
            PanelGeometry::new(fixed(0), fixed(0), width_minus(0), height_minus(0)),
            options,
            FillWidget::boxed(glyph, layouts, keys),
        )
    }

    fn chain_ids(hub: &EventHub) -> (Vec<u64>, Vec<u64>, Vec<u64>) {
        (
            hub.key_chain.iter().map(|e| e.id.as_u64()).collect(),
            hub.refresh_chain.iter().map(|(id, _)| id.as_u64()).collect(),
            hub.render_chain.iter().map(|(id, _)| id.as_u64()).collect(),
        )
    }

    #[test]
    fn show_then_hide_restores_chain_registrations() {
        let (mut hub, _sink, _handle) = hub_with_sink(20, 10);
        let layouts = Rc::new(RefCell::new(0));
        let keys = Rc::new(RefCell::new(Vec::new()));
        let bystander = KeyHandler::new(
            &hub,
            "bystander",
            Box::new(NamedListener {
                label: "bystander",
                trace: Rc::clone(&keys),
                cancel: false,
            }),
        );
        bystander.start_handling(&mut hub);

        let before = chain_ids(&hub);
        let panel = full_panel(
            &hub,
            "p",
            '#',
            PanelOptions {
                accepts_keyboard: true,
                real_time_update: true,
            },
            &layouts,
            &keys,
        );
        panel.show(&mut hub);
        assert_eq!(hub.key_chain.len(), 2);
        assert_eq!(hub.refresh_chain.len(), 1);
        assert_eq!(hub.render_chain.len(), 1);

        panel.hide(&mut hub);
        assert_eq!(chain_ids(&hub), before);
    }

    #[test]
    fn double_show_leaves_chains_unchanged() {
        let (mut hub, sink, _handle) = hub_with_sink(20, 10);
        let layouts = Rc::new(RefCell::new(0));
        let keys = Rc::new(RefCell::new(Vec::new()));
        let panel = full_panel(
            &hub,
            "p",
            '#',
            PanelOptions {
                accepts_keyboard: true,
                ..PanelOptions::default()
            },
            &layouts,
            &keys,
        );

        panel.show(&mut hub);
        let after_first = chain_ids(&hub);
        panel.show(&mut hub);
        assert_eq!(chain_ids(&hub), after_first);
        assert!(sink.messages().contains(&"panel_already_shown".to_string()));
    }

    #[test]
    fn key_chain_dispatches_most_recent_first() {
        let (mut hub, _sink, handle) = hub_with_sink(20, 10);
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        for label in ["a", "b", "c"] {
            let handler = KeyHandler::new(
                &hub,
                label,
                Box::new(NamedListener {
                    label,
                    trace: Rc::clone(&trace),
                    cancel: false,
                }),
            );
            handler.start_handling(&mut hub);
        }

        handle.push_char('k');
        hub.tick().unwrap();
        assert_eq!(*trace.borrow(), vec!["c", "b", "a"]);
    }

    #[test]
    fn cancel_stops_exactly_at_the_cancelling_handler() {
        let (mut hub, _sink, handle) = hub_with_sink(20, 10);
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        // Temporal registration order a, b, c; dispatch order c, b, a.
        for (label, cancel) in [("a", false), ("b", true), ("c", false)] {
            let handler = KeyHandler::new(
                &hub,
                label,
                Box::new(NamedListener {
                    label,
                    trace: Rc::clone(&trace),
                    cancel,
                }),
            );
            handler.start_handling(&mut hub);
        }

        handle.push_char('k');
        hub.tick().unwrap();
        // c ran before the cancel, b cancelled, a never saw the event.
        assert_eq!(*trace.borrow(), vec!["c", "b"]);
        assert_eq!(hub.metrics().keys_cancelled, 1);
    }

    #[test]
    fn screen_panels_render_in_insertion_order() {
        let (mut hub, _sink, handle) = hub_with_sink(8, 3);
        let layouts = Rc::new(RefCell::new(0));
        let keys = Rc::new(RefCell::new(Vec::new()));
        let screen = Screen::new(&mut hub, "stack");
        for (name, glyph) in [("p1", 'A'), ("p2", 'B'), ("p3", 'C')] {
            let panel = full_panel(&hub, name, glyph, PanelOptions::default(), &layouts, &keys);
            screen.add_panel(&hub, &panel);
        }
        screen.show(&mut hub);
        hub.tick().unwrap();

        let frame = handle.last_frame().unwrap();
        // The last panel shown overwrites everything beneath it.
        assert_eq!(frame.cell(0, 0).unwrap().glyph, 'C');
        assert_eq!(frame.row_text(1), "CCCCCCCC");
    }

    #[test]
    fn full_size_panel_consumes_the_key_exclusively() {
        let (mut hub, _sink, handle) = hub_with_sink(60, 40);
        let layouts = Rc::new(RefCell::new(0));
        let keys: Trace = Rc::new(RefCell::new(Vec::new()));

        let other = KeyHandler::new(
            &hub,
            "other",
            Box::new(NamedListener {
                label: "other",
                trace: Rc::clone(&keys),
                cancel: false,
            }),
        );
        other.start_handling(&mut hub);

        let screen = Screen::new(&mut hub, "main");
        let panel = Panel::new(
            &hub,
            "full",
            PanelGeometry::new(fixed(0), fixed(0), width_minus(0), height_minus(0)),
            PanelOptions {
                accepts_keyboard: true,
                ..PanelOptions::default()
            },
            Box::new(FillWidget {
                glyph: '#',
                layouts: Rc::clone(&layouts),
                keys: Rc::clone(&keys),
                cancel_keys: true,
                hide_on_key: false,
            }),
        );
        screen.add_panel(&hub, &panel);
        screen.show(&mut hub);

        handle.push_char('z');
        hub.tick().unwrap();

        // Shown after the other handler started, so the panel is in
        // front; it cancels, so nothing else sees the key.
        assert_eq!(*keys.borrow(), vec!["#:Char('z')".to_string()]);
    }

    #[test]
    fn real_time_panels_refresh_each_tick_static_panels_do_not() {
        let (mut hub, _sink, handle) = hub_with_sink(20, 10);
        let live_layouts = Rc::new(RefCell::new(0));
        let static_layouts = Rc::new(RefCell::new(0));
        let keys = Rc::new(RefCell::new(Vec::new()));

        let screen = Screen::new(&mut hub, "mixed");
        let live = full_panel(
            &hub,
            "live",
            '~',
            PanelOptions {
                real_time_update: true,
                ..PanelOptions::default()
            },
            &live_layouts,
            &keys,
        );
        let fixed_panel = full_panel(
            &hub,
            "static",
            '#',
            PanelOptions::default(),
            &static_layouts,
            &keys,
        );
        screen.add_panel(&hub, &live);
        screen.add_panel(&hub, &fixed_panel);
        screen.show(&mut hub);

        assert_eq!(*live_layouts.borrow(), 0);
        assert_eq!(*static_layouts.borrow(), 1);

        for _ in 0..3 {
            hub.tick().unwrap();
        }
        assert_eq!(*live_layouts.borrow(), 3);
        assert_eq!(*static_layouts.borrow(), 1);

        handle.push_resize(Size::new(30, 12));
        hub.tick().unwrap();
        // Static panel gets exactly one forced repaint at resize time;
        // the live panel just keeps its per-frame cadence.
        assert_eq!(*static_layouts.borrow(), 2);
        assert_eq!(*live_layouts.borrow(), 4);
    }

    #[test]
    fn hide_requested_from_a_key_hook_is_applied() {
        let (mut hub, _sink, handle) = hub_with_sink(20, 10);
        let layouts = Rc::new(RefCell::new(0));
        let keys = Rc::new(RefCell::new(Vec::new()));
        let panel = Panel::new(
            &hub,
            "overlay",
            PanelGeometry::new(fixed(0), fixed(0), width_minus(0), height_minus(0)),
            PanelOptions {
                accepts_keyboard: true,
                ..PanelOptions::default()
            },
            Box::new(FillWidget {
                glyph: '!',
                layouts: Rc::clone(&layouts),
                keys: Rc::clone(&keys),
                cancel_keys: true,
                hide_on_key: true,
            }),
        );
        panel.show(&mut hub);
        hub.tick().unwrap();
        assert_eq!(handle.last_frame().unwrap().cell(0, 0).unwrap().glyph, '!');

        handle.push_char('x');
        hub.tick().unwrap();
        assert!(!panel.is_shown());
        assert_eq!(handle.last_frame().unwrap().cell(0, 0).unwrap().glyph, ' ');
        assert!(hub.key_chain.is_empty());
    }

    #[test]
    fn toggling_keyboard_acceptance_rewires_live() {
        let (mut hub, _sink, handle) = hub_with_sink(20, 10);
        let layouts = Rc::new(RefCell::new(0));
        let keys: Trace = Rc::new(RefCell::new(Vec::new()));
        let panel = full_panel(
            &hub,
            "p",
            '#',
            PanelOptions {
                accepts_keyboard: true,
                ..PanelOptions::default()
            },
            &layouts,
            &keys,
        );
        panel.show(&mut hub);

        panel.set_accepts_keyboard(&mut hub, false);
        handle.push_char('a');
        hub.tick().unwrap();
        assert!(keys.borrow().is_empty());

        panel.set_accepts_keyboard(&mut hub, true);
        handle.push_char('b');
        hub.tick().unwrap();
        assert_eq!(keys.borrow().len(), 1);
    }

    #[test]
    fn close_request_ends_the_run() {
        let (surface, handle) = HeadlessSurface::new(10, 4);
        let mut hub = EventHub::new(Box::new(surface));
        handle.push_char('a');
        handle.push_close();
        hub.run().unwrap();
        assert!(hub.exit_requested());
        assert!(handle.presented_frames() >= 1);
    }

    #[test]
    fn fullscreen_toggle_reaches_the_surface() {
        let (mut hub, _sink, handle) = hub_with_sink(10, 4);
        assert!(!hub.is_fullscreen());
        hub.toggle_fullscreen().unwrap();
        assert!(hub.is_fullscreen());
        hub.toggle_fullscreen().unwrap();
        assert!(!hub.is_fullscreen());
        assert_eq!(
            handle.modes(),
            vec![WindowMode::Fullscreen, WindowMode::Windowed]
        );
    }

    #[test]
    fn duplicate_chain_registration_is_refused() {
        let (mut hub, sink, _handle) = hub_with_sink(10, 4);
        let layouts = Rc::new(RefCell::new(0));
        let keys = Rc::new(RefCell::new(Vec::new()));
        let panel = full_panel(&hub, "p", '#', PanelOptions::default(), &layouts, &keys);

        hub.add_render(panel.id(), panel.rc());
        hub.add_render(panel.id(), panel.rc());
        assert_eq!(hub.render_chain.len(), 1);
        assert!(
            sink.messages()
                .contains(&"handler_already_registered".to_string())
        );
    }

    #[test]
    fn key_dispatch_records_metrics() {
        let (mut hub, _sink, handle) = hub_with_sink(10, 4);
        handle.push_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        hub.tick().unwrap();
        let snapshot = hub.metrics();
        assert_eq!(snapshot.keys, 1);
        assert_eq!(snapshot.frames, 1);
    }
}
