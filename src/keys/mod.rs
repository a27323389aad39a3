//! Key-press dispatch types and standalone key handlers.
//!
//! Panels handle keys through their widget hook; [`KeyHandler`] lets
//! anything that is not a panel join the same front-to-back chain.

use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent};

use crate::hub::{EventCtx, EventHub, HandlerId, KeySink};
use crate::logging::json_str;

/// One key press travelling down the dispatch chain. Cancelable: once a
/// handler cancels it, no later handler sees it.
#[derive(Debug)]
pub struct KeyPressEvent {
    key: KeyEvent,
    cancelled: bool,
}

impl KeyPressEvent {
    pub fn new(key: KeyEvent) -> Self {
        Self {
            key,
            cancelled: false,
        }
    }

    pub fn key(&self) -> &KeyEvent {
        &self.key
    }

    pub fn code(&self) -> KeyCode {
        self.key.code
    }

    /// Claim the key: the remaining handlers in the chain are skipped for
    /// this event only.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Behaviour hook for a [`KeyHandler`].
pub trait KeyListener {
    fn on_key_press(&mut self, event: &mut KeyPressEvent, ctx: &mut EventCtx);
}

pub(crate) struct KeyHandlerState {
    pub(crate) id: HandlerId,
    pub(crate) name: String,
    pub(crate) handling: bool,
    listener: Box<dyn KeyListener>,
}

impl KeyHandlerState {
    pub(crate) fn handle_key(&mut self, event: &mut KeyPressEvent, ctx: &mut EventCtx) {
        self.listener.on_key_press(event, ctx);
    }
}

pub(crate) type HandlerRc = Rc<RefCell<KeyHandlerState>>;

/// Non-panel key subscriber. Created inactive; `start_handling` pushes it
/// to the front of the key chain so the most recently started handler
/// gets first refusal.
#[derive(Clone)]
pub struct KeyHandler {
    id: HandlerId,
    inner: HandlerRc,
}

impl KeyHandler {
    pub fn new(hub: &EventHub, name: impl Into<String>, listener: Box<dyn KeyListener>) -> Self {
        let id = hub.next_id();
        let state = KeyHandlerState {
            id,
            name: name.into(),
            handling: false,
            listener,
        };
        Self {
            id,
            inner: Rc::new(RefCell::new(state)),
        }
    }

    pub fn is_handling(&self) -> bool {
        self.inner.borrow().handling
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// No-op with a diagnostic when already handling.
    pub fn start_handling(&self, hub: &mut EventHub) {
        let (name, handling) = {
            let state = self.inner.borrow();
            (state.name.clone(), state.handling)
        };
        if handling {
            hub.warn_misuse(
                "gridwin::keys",
                "key_handler_already_active",
                [json_str("handler", name)],
            );
            return;
        }
        hub.add_key_front(self.id, KeySink::Handler(Rc::clone(&self.inner)));
        self.inner.borrow_mut().handling = true;
    }

    /// No-op with a diagnostic when not currently handling.
    pub fn stop_handling(&self, hub: &mut EventHub) {
        let (name, handling) = {
            let state = self.inner.borrow();
            (state.name.clone(), state.handling)
        };
        if !handling {
            hub.warn_misuse(
                "gridwin::keys",
                "key_handler_already_inactive",
                [json_str("handler", name)],
            );
            return;
        }
        hub.remove_key(self.id);
        self.inner.borrow_mut().handling = false;
    }
}

/// Deferred stop requested from inside a dispatch hook.
pub(crate) fn stop_handler(hub: &mut EventHub, handler: &HandlerRc) {
    let (id, handling) = {
        let state = handler.borrow();
        (state.id, state.handling)
    };
    if !handling {
        return;
    }
    hub.remove_key(id);
    handler.borrow_mut().handling = false;
}
