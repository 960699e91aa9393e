//! Terminal-facing UI.

pub mod render;

pub use render::{RenderSink, Renderer, SilentRenderer};
