//! Built-in 5×7 bitmap font, the last link of the font fallback chain.
//!
//! Glyphs are stored column-major: each glyph is 5 column bytes, bit 0 is the top
//! row and bit 6 the bottom row. The table covers ASCII 0x20..=0x7E (95 glyphs),
//! index = (char as usize) - 32. Each glyph advances 6 units (5 columns + 1 gap),
//! and the whole font is drawn at an integer pixel scale.

use image::Rgb;

use crate::layout::canvas::Canvas;
use crate::layout::fonts::TextMeasure;

const GLYPH_COLUMNS: i32 = 5;
const GLYPH_ROWS: i32 = 7;
const ADVANCE_UNITS: u32 = 6;
/// Nominal pixel size of the unscaled font (7 rows + 1 row of leading).
const NATIVE_SIZE: f32 = 8.0;

/// The built-in font at a concrete size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFont {
    scale: u32,
    bold: bool,
}

impl BuiltinFont {
    /// Picks the integer scale closest to the requested pixel size (never below 1).
    pub fn new(size: f32, bold: bool) -> Self {
        let scale = if size.is_finite() {
            (size / NATIVE_SIZE).round().max(1.0) as u32
        } else {
            1
        };
        Self { scale, bold }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Pixel size actually drawn, a multiple of the native 8 px.
    pub fn size(&self) -> f32 {
        self.scale as f32 * NATIVE_SIZE
    }

    pub fn advance(&self) -> u32 {
        ADVANCE_UNITS * self.scale
    }

    /// Draws `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        let s = self.scale as i32;
        // One unit of top padding so the cap height sits like an outline font's ascent.
        let top = y + s;
        let mut pen_x = x;

        for c in text.chars() {
            let columns = glyph_for(c);
            for (col, bits) in columns.iter().enumerate() {
                for row in 0..GLYPH_ROWS {
                    if bits & (1 << row) == 0 {
                        continue;
                    }
                    let px = pen_x + col as i32 * s;
                    let py = top + row * s;
                    canvas.fill_rect(px, py, px + s - 1, py + s - 1, color);
                    if self.bold {
                        canvas.fill_rect(px + 1, py, px + s, py + s - 1, color);
                    }
                }
            }
            pen_x += self.advance() as i32;
        }
    }
}

impl TextMeasure for BuiltinFont {
    fn text_width(&self, text: &str) -> f32 {
        (text.chars().count() as u32 * self.advance()) as f32
    }
}

/// Returns the column bytes used to draw `c`.
///
/// Spanish accented letters fold to their base letter; `•` and the dashes have
/// their own glyphs; any other code point outside the table draws as `?`.
pub fn glyph_for(c: char) -> &'static [u8; GLYPH_COLUMNS as usize] {
    let folded = match c {
        'á' | 'à' | 'â' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        '¿' => '?',
        '¡' => '!',
        '•' | '·' => return &BULLET,
        '—' | '–' => return &DASH,
        other => other,
    };

    let code = folded as usize;
    if (32..=126).contains(&code) {
        &GLYPHS[code - 32]
    } else {
        &GLYPHS[(b'?' - 32) as usize]
    }
}

static BULLET: [u8; 5] = [0x00, 0x1C, 0x1C, 0x1C, 0x00];
static DASH: [u8; 5] = [0x08, 0x08, 0x08, 0x08, 0x08];

#[rustfmt::skip]
static GLYPHS: [[u8; 5]; 95] = [
    // sp                            !                               "                               #
    [0x00, 0x00, 0x00, 0x00, 0x00], [0x00, 0x00, 0x5F, 0x00, 0x00], [0x00, 0x07, 0x00, 0x07, 0x00], [0x14, 0x7F, 0x14, 0x7F, 0x14],
    // $                             %                               &                               '
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], [0x23, 0x13, 0x08, 0x64, 0x62], [0x36, 0x49, 0x55, 0x22, 0x50], [0x00, 0x05, 0x03, 0x00, 0x00],
    // (                             )                               *                               +
    [0x00, 0x1C, 0x22, 0x41, 0x00], [0x00, 0x41, 0x22, 0x1C, 0x00], [0x08, 0x2A, 0x1C, 0x2A, 0x08], [0x08, 0x08, 0x3E, 0x08, 0x08],
    // ,                             -                               .                               /
    [0x00, 0x50, 0x30, 0x00, 0x00], [0x08, 0x08, 0x08, 0x08, 0x08], [0x00, 0x60, 0x60, 0x00, 0x00], [0x20, 0x10, 0x08, 0x04, 0x02],
    // 0                             1                               2                               3
    [0x3E, 0x51, 0x49, 0x45, 0x3E], [0x00, 0x42, 0x7F, 0x40, 0x00], [0x42, 0x61, 0x51, 0x49, 0x46], [0x21, 0x41, 0x45, 0x4B, 0x31],
    // 4                             5                               6                               7
    [0x18, 0x14, 0x12, 0x7F, 0x10], [0x27, 0x45, 0x45, 0x45, 0x39], [0x3C, 0x4A, 0x49, 0x49, 0x30], [0x01, 0x71, 0x09, 0x05, 0x03],
    // 8                             9                               :                               ;
    [0x36, 0x49, 0x49, 0x49, 0x36], [0x06, 0x49, 0x49, 0x29, 0x1E], [0x00, 0x36, 0x36, 0x00, 0x00], [0x00, 0x56, 0x36, 0x00, 0x00],
    // <                             =                               >                               ?
    [0x08, 0x14, 0x22, 0x41, 0x00], [0x14, 0x14, 0x14, 0x14, 0x14], [0x00, 0x41, 0x22, 0x14, 0x08], [0x02, 0x01, 0x51, 0x09, 0x06],
    // @                             A                               B                               C
    [0x32, 0x49, 0x79, 0x41, 0x3E], [0x7E, 0x11, 0x11, 0x11, 0x7E], [0x7F, 0x49, 0x49, 0x49, 0x36], [0x3E, 0x41, 0x41, 0x41, 0x22],
    // D                             E                               F                               G
    [0x7F, 0x41, 0x41, 0x22, 0x1C], [0x7F, 0x49, 0x49, 0x49, 0x41], [0x7F, 0x09, 0x09, 0x01, 0x01], [0x3E, 0x41, 0x41, 0x51, 0x32],
    // H                             I                               J                               K
    [0x7F, 0x08, 0x08, 0x08, 0x7F], [0x00, 0x41, 0x7F, 0x41, 0x00], [0x20, 0x40, 0x41, 0x3F, 0x01], [0x7F, 0x08, 0x14, 0x22, 0x41],
    // L                             M                               N                               O
    [0x7F, 0x40, 0x40, 0x40, 0x40], [0x7F, 0x02, 0x04, 0x02, 0x7F], [0x7F, 0x04, 0x08, 0x10, 0x7F], [0x3E, 0x41, 0x41, 0x41, 0x3E],
    // P                             Q                               R                               S
    [0x7F, 0x09, 0x09, 0x09, 0x06], [0x3E, 0x41, 0x51, 0x21, 0x5E], [0x7F, 0x09, 0x19, 0x29, 0x46], [0x46, 0x49, 0x49, 0x49, 0x31],
    // T                             U                               V                               W
    [0x01, 0x01, 0x7F, 0x01, 0x01], [0x3F, 0x40, 0x40, 0x40, 0x3F], [0x1F, 0x20, 0x40, 0x20, 0x1F], [0x7F, 0x20, 0x18, 0x20, 0x7F],
    // X                             Y                               Z                               [
    [0x63, 0x14, 0x08, 0x14, 0x63], [0x03, 0x04, 0x78, 0x04, 0x03], [0x61, 0x51, 0x49, 0x45, 0x43], [0x00, 0x7F, 0x41, 0x41, 0x00],
    // \                             ]                               ^                               _
    [0x02, 0x04, 0x08, 0x10, 0x20], [0x00, 0x41, 0x41, 0x7F, 0x00], [0x04, 0x02, 0x01, 0x02, 0x04], [0x40, 0x40, 0x40, 0x40, 0x40],
    // `                             a                               b                               c
    [0x00, 0x01, 0x02, 0x04, 0x00], [0x20, 0x54, 0x54, 0x54, 0x78], [0x7F, 0x48, 0x44, 0x44, 0x38], [0x38, 0x44, 0x44, 0x44, 0x20],
    // d                             e                               f                               g
    [0x38, 0x44, 0x44, 0x48, 0x7F], [0x38, 0x54, 0x54, 0x54, 0x18], [0x08, 0x7E, 0x09, 0x01, 0x02], [0x0C, 0x52, 0x52, 0x52, 0x3E],
    // h                             i                               j                               k
    [0x7F, 0x08, 0x04, 0x04, 0x78], [0x00, 0x44, 0x7D, 0x40, 0x00], [0x20, 0x40, 0x44, 0x3D, 0x00], [0x7F, 0x10, 0x28, 0x44, 0x00],
    // l                             m                               n                               o
    [0x00, 0x41, 0x7F, 0x40, 0x00], [0x7C, 0x04, 0x18, 0x04, 0x78], [0x7C, 0x08, 0x04, 0x04, 0x78], [0x38, 0x44, 0x44, 0x44, 0x38],
    // p                             q                               r                               s
    [0x7C, 0x14, 0x14, 0x14, 0x08], [0x08, 0x14, 0x14, 0x18, 0x7C], [0x7C, 0x08, 0x04, 0x04, 0x08], [0x48, 0x54, 0x54, 0x54, 0x20],
    // t                             u                               v                               w
    [0x04, 0x3F, 0x44, 0x40, 0x20], [0x3C, 0x40, 0x40, 0x20, 0x7C], [0x1C, 0x20, 0x40, 0x20, 0x1C], [0x3C, 0x40, 0x30, 0x40, 0x3C],
    // x                             y                               z                               {
    [0x44, 0x28, 0x10, 0x28, 0x44], [0x0C, 0x50, 0x50, 0x50, 0x3C], [0x44, 0x64, 0x54, 0x4C, 0x44], [0x00, 0x08, 0x36, 0x41, 0x00],
    // |                             }                               ~
    [0x00, 0x00, 0x7F, 0x00, 0x00], [0x00, 0x41, 0x36, 0x08, 0x00], [0x08, 0x04, 0x08, 0x10, 0x08],
];
