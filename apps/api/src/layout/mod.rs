// Receipt raster layout: font resolution with fallback, word wrapping, drawing
// primitives and the fixed-geometry receipt engine.
// Rendering is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod builtin_font;
pub mod canvas;
pub mod engine;
pub mod fonts;
pub mod wrap;

// Re-export the public API consumed by the receipt handlers and config.
pub use engine::{encode_png, render_receipt};
pub use fonts::{FontCatalog, FontSource};
