use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::geometry::Size;
use crate::hub::{EventHub, HandlerId};
use crate::logging::{LogLevel, json_kv, json_str};
use crate::panel::{GeomCalc, Panel};
use crate::surface::ResizeEvent;

pub(crate) struct ScreenState {
    name: String,
    panels: Vec<Panel>,
    shown: bool,
}

pub(crate) type ScreenRc = Rc<RefCell<ScreenState>>;

/// Ordered collection of panels shown/hidden together.
///
/// Insertion order is show/hide order and therefore render order: the
/// last panel added draws on top of earlier ones wherever they overlap.
/// A screen subscribes to window-resize notifications at construction
/// and relays them to every panel, shown or not; call
/// [`Screen::dispose`] to unsubscribe.
#[derive(Clone)]
pub struct Screen {
    id: HandlerId,
    inner: ScreenRc,
}

impl Screen {
    pub fn new(hub: &mut EventHub, name: impl Into<String>) -> Self {
        let id = hub.next_id();
        let inner = Rc::new(RefCell::new(ScreenState {
            name: name.into(),
            panels: Vec::new(),
            shown: false,
        }));
        hub.add_resize_listener(id, Rc::clone(&inner));
        Self { id, inner }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn is_shown(&self) -> bool {
        self.inner.borrow().shown
    }

    pub fn panel_count(&self) -> usize {
        self.inner.borrow().panels.len()
    }

    /// Attach a panel. Adding the same panel twice is a no-op with a
    /// diagnostic.
    pub fn add_panel(&self, hub: &EventHub, panel: &Panel) {
        let mut state = self.inner.borrow_mut();
        if state.panels.iter().any(|p| p.id() == panel.id()) {
            hub.warn_misuse(
                "gridwin::screen",
                "panel_already_attached",
                [
                    json_str("screen", state.name.clone()),
                    json_str("panel", panel.name()),
                ],
            );
            return;
        }
        state.panels.push(panel.clone());
    }

    /// Detach a panel without touching its shown state; hide it first if
    /// that is what you want.
    pub fn remove_panel(&self, panel: &Panel) {
        self.inner
            .borrow_mut()
            .panels
            .retain(|p| p.id() != panel.id());
    }

    /// Show every owned panel in insertion order. No-op with a
    /// diagnostic when the screen is already shown.
    pub fn show(&self, hub: &mut EventHub) {
        let (name, shown, panels) = self.snapshot();
        if shown {
            hub.warn_misuse(
                "gridwin::screen",
                "screen_already_shown",
                [json_str("screen", name)],
            );
            return;
        }
        self.inner.borrow_mut().shown = true;
        for panel in &panels {
            panel.show(hub);
        }
        hub.log_at(
            LogLevel::Debug,
            "gridwin::screen",
            "screen_shown",
            [
                json_str("screen", name),
                json_kv("panels", json!(panels.len())),
            ],
        );
    }

    /// Hide every owned panel in insertion order. No-op with a
    /// diagnostic when the screen is already hidden.
    pub fn hide(&self, hub: &mut EventHub) {
        let (name, shown, panels) = self.snapshot();
        if !shown {
            hub.warn_misuse(
                "gridwin::screen",
                "screen_already_hidden",
                [json_str("screen", name)],
            );
            return;
        }
        self.inner.borrow_mut().shown = false;
        for panel in &panels {
            panel.hide(hub);
        }
        hub.log_at(
            LogLevel::Debug,
            "gridwin::screen",
            "screen_hidden",
            [json_str("screen", name)],
        );
    }

    /// Tear the screen down: hide it if shown, then unsubscribe from
    /// resize notifications. Nothing is reclaimed implicitly; this is
    /// the only way to drop the resize registration.
    pub fn dispose(self, hub: &mut EventHub) {
        let name = self.name();
        if self.is_shown() {
            self.hide(hub);
        }
        hub.remove_resize_listener(self.id);
        hub.log_at(
            LogLevel::Debug,
            "gridwin::screen",
            "screen_disposed",
            [json_str("screen", name)],
        );
    }

    fn snapshot(&self) -> (String, bool, Vec<Panel>) {
        let state = self.inner.borrow();
        (state.name.clone(), state.shown, state.panels.clone())
    }
}

/// Relay one window resize to every panel in list order. Panels are
/// relaid out even while the screen is hidden.
pub(crate) fn relay_resize(screen: &ScreenRc, event: &ResizeEvent) {
    let panels = screen.borrow().panels.clone();
    for panel in &panels {
        panel.apply_surface_resize(event);
    }
}

/// Geometry that always evaluates to `value`.
pub fn fixed(value: u16) -> GeomCalc {
    Box::new(move |_| value)
}

/// Geometry evaluating to the root width minus `subtract`.
pub fn width_minus(subtract: u16) -> GeomCalc {
    Box::new(move |size: Size| size.width.saturating_sub(subtract))
}

/// Geometry evaluating to the root height minus `subtract`.
pub fn height_minus(subtract: u16) -> GeomCalc {
    Box::new(move |size: Size| size.height.saturating_sub(subtract))
}

/// Geometry evaluating to half the root width, rounded down.
pub fn half_width() -> GeomCalc {
    Box::new(|size: Size| size.width / 2)
}

/// Geometry evaluating to half the root height, rounded down.
pub fn half_height() -> GeomCalc {
    Box::new(|size: Size| size.height / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleBuffer;
    use crate::hub::HubConfig;
    use crate::logging::{BufferSink, Logger};
    use crate::panel::{PanelGeometry, PanelOptions, PanelWidget};
    use crate::surface::{HeadlessHandle, HeadlessSurface};

    struct CountingWidget {
        layouts: Rc<RefCell<Vec<String>>>,
        label: &'static str,
    }

    impl PanelWidget for CountingWidget {
        fn update_layout(&mut self, _buffer: &mut ConsoleBuffer) {
            self.layouts.borrow_mut().push(format!("layout:{}", self.label));
        }

        fn on_resizing(&mut self, _event: &ResizeEvent) {
            self.layouts
                .borrow_mut()
                .push(format!("resizing:{}", self.label));
        }
    }

    fn hub_with_sink() -> (EventHub, BufferSink, HeadlessHandle) {
        let (surface, handle) = HeadlessSurface::new(30, 10);
        let sink = BufferSink::new();
        let config = HubConfig {
            logger: Some(Logger::new(sink.clone())),
            ..HubConfig::default()
        };
        (EventHub::with_config(Box::new(surface), config), sink, handle)
    }

    fn counting_panel(
        hub: &EventHub,
        label: &'static str,
        trace: &Rc<RefCell<Vec<String>>>,
    ) -> Panel {
        Panel::new(
            hub,
            label,
            PanelGeometry::new(fixed(0), fixed(0), width_minus(0), height_minus(0)),
            PanelOptions::default(),
            Box::new(CountingWidget {
                layouts: Rc::clone(trace),
                label,
            }),
        )
    }

    #[test]
    fn geometry_helpers_evaluate_against_root_size() {
        let size = Size::new(61, 41);
        assert_eq!(fixed(7)(size), 7);
        assert_eq!(width_minus(10)(size), 51);
        assert_eq!(height_minus(50)(size), 0);
        assert_eq!(half_width()(size), 30);
        assert_eq!(half_height()(size), 20);
    }

    #[test]
    fn duplicate_add_is_a_diagnosed_noop() {
        let (mut hub, sink, _handle) = hub_with_sink();
        let trace = Rc::new(RefCell::new(Vec::new()));
        let screen = Screen::new(&mut hub, "main");
        let panel = counting_panel(&hub, "p", &trace);

        screen.add_panel(&hub, &panel);
        screen.add_panel(&hub, &panel);
        assert_eq!(screen.panel_count(), 1);
        assert!(
            sink.messages()
                .contains(&"panel_already_attached".to_string())
        );
    }

    #[test]
    fn show_and_hide_walk_panels_in_order() {
        let (mut hub, sink, _handle) = hub_with_sink();
        let trace = Rc::new(RefCell::new(Vec::new()));
        let screen = Screen::new(&mut hub, "main");
        let first = counting_panel(&hub, "first", &trace);
        let second = counting_panel(&hub, "second", &trace);
        screen.add_panel(&hub, &first);
        screen.add_panel(&hub, &second);

        screen.show(&mut hub);
        assert!(first.is_shown());
        assert!(second.is_shown());
        assert_eq!(
            *trace.borrow(),
            vec!["layout:first".to_string(), "layout:second".to_string()]
        );

        screen.hide(&mut hub);
        assert!(!first.is_shown());
        assert!(!second.is_shown());

        screen.hide(&mut hub);
        assert!(
            sink.messages()
                .contains(&"screen_already_hidden".to_string())
        );
    }

    #[test]
    fn resize_relays_even_while_hidden() {
        let (mut hub, _sink, handle) = hub_with_sink();
        let trace = Rc::new(RefCell::new(Vec::new()));
        let screen = Screen::new(&mut hub, "main");
        let panel = counting_panel(&hub, "p", &trace);
        screen.add_panel(&hub, &panel);

        handle.push_resize(Size::new(44, 12));
        hub.tick().unwrap();

        let recorded = trace.borrow().clone();
        assert!(recorded.contains(&"resizing:p".to_string()));
        assert_eq!(panel.size(), Size::new(44, 12));
    }

    #[test]
    fn remove_panel_keeps_shown_state() {
        let (mut hub, _sink, _handle) = hub_with_sink();
        let trace = Rc::new(RefCell::new(Vec::new()));
        let screen = Screen::new(&mut hub, "main");
        let panel = counting_panel(&hub, "p", &trace);
        screen.add_panel(&hub, &panel);
        screen.show(&mut hub);

        screen.remove_panel(&panel);
        assert_eq!(screen.panel_count(), 0);
        assert!(panel.is_shown());
    }

    #[test]
    fn dispose_unsubscribes_from_resize() {
        let (mut hub, _sink, handle) = hub_with_sink();
        let trace = Rc::new(RefCell::new(Vec::new()));
        let screen = Screen::new(&mut hub, "main");
        let panel = counting_panel(&hub, "p", &trace);
        screen.add_panel(&hub, &panel);
        screen.show(&mut hub);

        screen.dispose(&mut hub);
        assert!(!panel.is_shown());
        trace.borrow_mut().clear();

        handle.push_resize(Size::new(50, 20));
        hub.tick().unwrap();
        assert!(trace.borrow().is_empty());
    }
}
