//! Root render surfaces.
//!
//! The hub is written against the [`Surface`] trait so the same dispatch
//! and layout machinery runs on a real terminal ([`TermSurface`]) or a
//! scripted in-memory grid ([`HeadlessSurface`]).

mod core;
mod headless;
mod term;

pub use core::{ResizeBehavior, ResizeEvent, Surface, SurfaceConfig, SurfaceEvent, WindowMode};
pub use headless::{HeadlessHandle, HeadlessSurface};
pub use term::TermSurface;
