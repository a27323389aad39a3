//! Screens: ordered groups of panels shown and hidden as one unit, plus
//! the geometry helper factories screens declare their panels with.

mod core;

pub use core::{Screen, fixed, half_height, half_width, height_minus, width_minus};

pub(crate) use core::{ScreenRc, relay_resize};
