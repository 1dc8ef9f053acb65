//! Font resolution: an ordered list of font locators with a built-in fallback.
//!
//! `FontCatalog::load` walks the bold locators first (when bold is requested),
//! then the regular ones, and returns the first that parses as a TrueType/OpenType
//! font. When nothing resolves the built-in bitmap font is returned, so a render
//! never fails because font files are missing. Nothing is cached: every call
//! resolves the chain again.

use std::path::PathBuf;

use image::Rgb;
use rusttype::{point, Font, Scale};
use tracing::debug;

use crate::layout::builtin_font::BuiltinFont;
use crate::layout::canvas::Canvas;

/// Pixel width of rendered text.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f32;
}

// ────────────────────────────────────────────────────────────────────────────
// Locators
// ────────────────────────────────────────────────────────────────────────────

/// Location of a TrueType/OpenType font file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    path: PathBuf,
}

impl FontSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads and parses the font, or `None` if it is missing or not a font.
    fn resolve(&self) -> Option<Font<'static>> {
        std::fs::read(&self.path).ok().and_then(Font::try_from_vec)
    }
}

/// Ordered font locators for the regular and bold faces.
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    pub regular: Vec<FontSource>,
    pub bold: Vec<FontSource>,
}

pub const DEJAVU_DIR: &str = "/usr/share/fonts/truetype/dejavu";

impl FontCatalog {
    /// DejaVu Sans, looked up next to the binary first and then in the system font dir.
    pub fn dejavu() -> Self {
        Self {
            regular: vec![
                FontSource::path("DejaVuSans.ttf"),
                FontSource::path(format!("{DEJAVU_DIR}/DejaVuSans.ttf")),
            ],
            bold: vec![
                FontSource::path("DejaVuSans-Bold.ttf"),
                FontSource::path(format!("{DEJAVU_DIR}/DejaVuSans-Bold.ttf")),
            ],
        }
    }

    /// A catalog with no locators; every load yields the built-in font.
    #[cfg(test)]
    pub fn builtin_only() -> Self {
        Self::default()
    }

    /// Locators in the order they are tried for the requested weight.
    pub fn candidates(&self, bold: bool) -> impl Iterator<Item = &FontSource> {
        let bold_sources: &[FontSource] = if bold { self.bold.as_slice() } else { &[] };
        bold_sources.iter().chain(self.regular.iter())
    }

    /// Returns a usable font at `size` pixels. Never fails.
    pub fn load(&self, size: f32, bold: bool) -> ReceiptFont {
        for source in self.candidates(bold) {
            if let Some(font) = source.resolve() {
                return ReceiptFont::Outline { font, size };
            }
        }
        debug!(size, bold, "No font locator resolved, using built-in font");
        ReceiptFont::Builtin(BuiltinFont::new(size, bold))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font handle
// ────────────────────────────────────────────────────────────────────────────

/// A resolved font at a fixed pixel size.
#[derive(Clone)]
pub enum ReceiptFont {
    Outline { font: Font<'static>, size: f32 },
    Builtin(BuiltinFont),
}

impl ReceiptFont {
    pub fn is_builtin(&self) -> bool {
        matches!(self, ReceiptFont::Builtin(_))
    }

    pub fn size(&self) -> f32 {
        match self {
            ReceiptFont::Outline { size, .. } => *size,
            ReceiptFont::Builtin(font) => font.size(),
        }
    }

    /// Draws `text` with its top-left corner (ascender line) at `(x, y)`.
    pub fn draw(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        if text.is_empty() {
            return;
        }
        match self {
            ReceiptFont::Builtin(font) => font.draw(canvas, x, y, text, color),
            ReceiptFont::Outline { font, size } => {
                let scale = Scale::uniform(*size);
                let ascent = font.v_metrics(scale).ascent;
                let origin = point(x as f32, y as f32 + ascent);
                for glyph in font.layout(text, scale, origin) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        canvas.blend(bb.min.x + gx as i32, bb.min.y + gy as i32, color, coverage);
                    });
                }
            }
        }
    }
}

impl TextMeasure for ReceiptFont {
    fn text_width(&self, text: &str) -> f32 {
        match self {
            ReceiptFont::Builtin(font) => font.text_width(text),
            ReceiptFont::Outline { font, size } => {
                let scale = Scale::uniform(*size);
                font.layout(text, scale, point(0.0, 0.0))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0)
            }
        }
    }
}

impl std::fmt::Debug for ReceiptFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiptFont::Outline { size, .. } => write!(f, "Outline({size}px)"),
            ReceiptFont::Builtin(font) => write!(f, "Builtin(x{})", font.scale()),
        }
    }
}
