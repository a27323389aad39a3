//! Panel/screen windowing layer for character-grid console renderers.
//!
//! Applications declare rectangular [`Panel`]s that paint into offscreen
//! buffers and blit onto a shared root surface, group them into
//! [`Screen`]s that show and hide as a unit, and hand both to an
//! [`EventHub`] that drives key dispatch, per-frame layout refresh,
//! rendering, and resize relayout. Single-threaded, one frame at a time.

pub mod console;
pub mod error;
pub mod geometry;
pub mod hub;
pub mod keys;
pub mod logging;
pub mod metrics;
pub mod panel;
pub mod screen;
pub mod surface;

pub use console::{Cell, ConsoleBuffer};
pub use error::{HubError, Result};
pub use geometry::{Rect, Size};
pub use hub::{EventCtx, EventHub, HandlerId, HubConfig};
pub use keys::{KeyHandler, KeyListener, KeyPressEvent};
pub use logging::{
    BufferSink, FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError,
    LoggingResult, StderrSink,
};
pub use metrics::{HubMetrics, MetricSnapshot};
pub use panel::{GeomCalc, Panel, PanelGeometry, PanelOptions, PanelWidget};
pub use screen::{Screen, fixed, half_height, half_width, height_minus, width_minus};
pub use surface::{
    HeadlessHandle, HeadlessSurface, ResizeBehavior, ResizeEvent, Surface, SurfaceConfig,
    SurfaceEvent, TermSurface, WindowMode,
};
