use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::console::ConsoleBuffer;
use crate::geometry::Size;
use crate::hub::{EventCtx, EventHub, HandlerId, KeySink};
use crate::keys::KeyPressEvent;
use crate::logging::{LogLevel, json_kv, json_str};
use crate::surface::ResizeEvent;

/// Recomputes one panel coordinate from the current root surface size.
pub type GeomCalc = Box<dyn Fn(Size) -> u16>;

/// The four recompute functions a panel is declared with: root-relative
/// x/y of its top-left corner, and its width/height.
pub struct PanelGeometry {
    pub x: GeomCalc,
    pub y: GeomCalc,
    pub width: GeomCalc,
    pub height: GeomCalc,
}

impl PanelGeometry {
    pub fn new(
        x: impl Fn(Size) -> u16 + 'static,
        y: impl Fn(Size) -> u16 + 'static,
        width: impl Fn(Size) -> u16 + 'static,
        height: impl Fn(Size) -> u16 + 'static,
    ) -> Self {
        Self {
            x: Box::new(x),
            y: Box::new(y),
            width: Box::new(width),
            height: Box::new(height),
        }
    }
}

/// Flags a panel is constructed with.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelOptions {
    /// Join the key-press chain while shown.
    pub accepts_keyboard: bool,
    /// Repaint the offscreen buffer every frame instead of only at show
    /// and resize time. A map camera wants this; a static menu does not.
    pub real_time_update: bool,
}

/// Behaviour hooks a concrete panel implements.
///
/// `update_layout` is a full repaint of the offscreen buffer; callers
/// never rely on partial-update semantics. Z-order within the buffer is
/// the widget's own business; between panels, whichever was shown last
/// draws on top.
pub trait PanelWidget {
    fn update_layout(&mut self, buffer: &mut ConsoleBuffer);

    /// Blit the panel onto the root. The default copies the whole buffer
    /// to (`root_x`, `root_y`).
    fn render(&mut self, buffer: &ConsoleBuffer, root: &mut ConsoleBuffer, root_x: u16, root_y: u16) {
        buffer.blit_into(root, root_x, root_y);
    }

    /// Claim a key by cancelling the event; request deferred actions
    /// (hide this panel, repaint, exit) through `ctx`.
    fn on_key_press(&mut self, _event: &mut KeyPressEvent, _ctx: &mut EventCtx) {}

    /// Fired just before this panel's geometry is recomputed for a
    /// window resize.
    fn on_resizing(&mut self, _event: &ResizeEvent) {}

    /// Fired after the offscreen buffer was reallocated to `new_size`
    /// and before the relayout repaint.
    fn on_resized(&mut self, _new_size: Size) {}
}

pub(crate) struct PanelState {
    pub(crate) id: HandlerId,
    pub(crate) name: String,
    calc: PanelGeometry,
    pub(crate) root_x: u16,
    pub(crate) root_y: u16,
    pub(crate) buffer: ConsoleBuffer,
    pub(crate) shown: bool,
    pub(crate) real_time: bool,
    pub(crate) accepts_keyboard: bool,
    widget: Box<dyn PanelWidget>,
}

impl PanelState {
    pub(crate) fn refresh_layout(&mut self) {
        let PanelState { widget, buffer, .. } = self;
        widget.update_layout(buffer);
    }

    pub(crate) fn render(&mut self, root: &mut ConsoleBuffer) {
        let PanelState {
            widget,
            buffer,
            root_x,
            root_y,
            ..
        } = self;
        widget.render(buffer, root, *root_x, *root_y);
    }

    pub(crate) fn handle_key(&mut self, event: &mut KeyPressEvent, ctx: &mut EventCtx) {
        self.widget.on_key_press(event, ctx);
    }

    fn apply_resize(&mut self, event: &ResizeEvent) {
        self.widget.on_resizing(event);

        self.root_x = (self.calc.x)(event.new);
        self.root_y = (self.calc.y)(event.new);
        let width = (self.calc.width)(event.new);
        let height = (self.calc.height)(event.new);
        self.buffer.resize(width, height);

        self.widget.on_resized(Size::new(width, height));

        // Real-time panels repaint on the next frame anyway.
        if !self.real_time {
            self.refresh_layout();
        }
    }
}

pub(crate) type PanelRc = Rc<RefCell<PanelState>>;

/// Handle to one panel. Cheap to clone; screens keep clones of the
/// handles they own, and the hub keeps clones while the panel is
/// registered in its chains. A panel dropped while shown therefore keeps
/// rendering until it is hidden: lifecycle is explicit.
#[derive(Clone)]
pub struct Panel {
    id: HandlerId,
    inner: PanelRc,
}

impl Panel {
    /// Evaluates root-x/root-y against the current surface size and
    /// allocates the offscreen buffer from the width/height functions.
    /// The panel starts hidden.
    pub fn new(
        hub: &EventHub,
        name: impl Into<String>,
        geometry: PanelGeometry,
        options: PanelOptions,
        widget: Box<dyn PanelWidget>,
    ) -> Self {
        let id = hub.next_id();
        let size = hub.surface_size();
        let root_x = (geometry.x)(size);
        let root_y = (geometry.y)(size);
        let width = (geometry.width)(size);
        let height = (geometry.height)(size);

        let state = PanelState {
            id,
            name: name.into(),
            calc: geometry,
            root_x,
            root_y,
            buffer: ConsoleBuffer::new(width, height),
            shown: false,
            real_time: options.real_time_update,
            accepts_keyboard: options.accepts_keyboard,
            widget,
        };

        Self {
            id,
            inner: Rc::new(RefCell::new(state)),
        }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn root_x(&self) -> u16 {
        self.inner.borrow().root_x
    }

    pub fn root_y(&self) -> u16 {
        self.inner.borrow().root_y
    }

    pub fn width(&self) -> u16 {
        self.inner.borrow().buffer.width()
    }

    pub fn height(&self) -> u16 {
        self.inner.borrow().buffer.height()
    }

    pub fn size(&self) -> Size {
        self.inner.borrow().buffer.size()
    }

    pub fn is_shown(&self) -> bool {
        self.inner.borrow().shown
    }

    pub fn is_real_time(&self) -> bool {
        self.inner.borrow().real_time
    }

    pub fn accepts_keyboard(&self) -> bool {
        self.inner.borrow().accepts_keyboard
    }

    /// Register into the hub's chains and start rendering each frame.
    /// No-op with a diagnostic when already shown.
    pub fn show(&self, hub: &mut EventHub) {
        show_panel(hub, &self.inner);
    }

    /// Withdraw from the hub's chains. No-op with a diagnostic when
    /// already hidden.
    pub fn hide(&self, hub: &mut EventHub) {
        hide_panel(hub, &self.inner);
    }

    /// Live rewiring: while shown, enabling front-inserts the key handler
    /// immediately and disabling removes it immediately.
    pub fn set_accepts_keyboard(&self, hub: &mut EventHub, enabled: bool) {
        let (shown, current) = {
            let state = self.inner.borrow();
            (state.shown, state.accepts_keyboard)
        };
        if current == enabled {
            return;
        }
        self.inner.borrow_mut().accepts_keyboard = enabled;
        if shown {
            if enabled {
                hub.add_key_front(self.id, KeySink::Panel(Rc::clone(&self.inner)));
            } else {
                hub.remove_key(self.id);
            }
        }
    }

    /// Manual synchronous repaint of the offscreen buffer.
    pub fn refresh(&self) {
        self.inner.borrow_mut().refresh_layout();
    }

    pub(crate) fn id(&self) -> HandlerId {
        self.id
    }

    pub(crate) fn rc(&self) -> PanelRc {
        Rc::clone(&self.inner)
    }

    /// Resize procedure, invoked only through the owning screen's relay:
    /// pre-resize hook, geometry recompute, buffer reallocation,
    /// post-resize hook, then one synchronous repaint for non-real-time
    /// panels.
    pub(crate) fn apply_surface_resize(&self, event: &ResizeEvent) {
        self.inner.borrow_mut().apply_resize(event);
    }
}

pub(crate) fn show_panel(hub: &mut EventHub, panel: &PanelRc) {
    let (id, name, real_time, accepts_keyboard, shown) = {
        let state = panel.borrow();
        (
            state.id,
            state.name.clone(),
            state.real_time,
            state.accepts_keyboard,
            state.shown,
        )
    };
    if shown {
        hub.warn_misuse(
            "gridwin::panel",
            "panel_already_shown",
            [json_str("panel", name)],
        );
        return;
    }

    if real_time {
        hub.add_refresh(id, Rc::clone(panel));
    } else {
        panel.borrow_mut().refresh_layout();
    }
    hub.add_render(id, Rc::clone(panel));
    if accepts_keyboard {
        hub.add_key_front(id, KeySink::Panel(Rc::clone(panel)));
    }
    panel.borrow_mut().shown = true;

    hub.log_at(
        LogLevel::Debug,
        "gridwin::panel",
        "panel_shown",
        [
            json_str("panel", name),
            json_kv("real_time", json!(real_time)),
            json_kv("keys", json!(accepts_keyboard)),
        ],
    );
}

pub(crate) fn hide_panel(hub: &mut EventHub, panel: &PanelRc) {
    let (id, name, real_time, accepts_keyboard, shown) = {
        let state = panel.borrow();
        (
            state.id,
            state.name.clone(),
            state.real_time,
            state.accepts_keyboard,
            state.shown,
        )
    };
    if !shown {
        hub.warn_misuse(
            "gridwin::panel",
            "panel_already_hidden",
            [json_str("panel", name)],
        );
        return;
    }

    hub.remove_render(id);
    if accepts_keyboard {
        hub.remove_key(id);
    }
    if real_time {
        hub.remove_refresh(id);
    }
    panel.borrow_mut().shown = false;

    hub.log_at(
        LogLevel::Debug,
        "gridwin::panel",
        "panel_hidden",
        [json_str("panel", name)],
    );
}
