//! Panels: rectangular regions of the root surface with their own
//! offscreen buffers, shown and hidden through the hub's event chains.

mod core;

pub use core::{GeomCalc, Panel, PanelGeometry, PanelOptions, PanelWidget};

pub(crate) use core::{PanelRc, hide_panel};
