//! Offscreen character-grid buffers panels draw into and blit from.

mod core;

pub use core::{Cell, ConsoleBuffer};
