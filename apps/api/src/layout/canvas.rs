//! Raster drawing surface for receipts.
//!
//! A thin wrapper over `image::RgbImage` with the handful of primitives the
//! receipt layout needs. All coordinates are signed and every write is clipped
//! to the image bounds, so callers never have to pre-check geometry.

use image::{Rgb, RgbImage, RgbaImage};

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Mixes `color` into the pixel at `(x, y)` with the given coverage in `0.0..=1.0`.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
        if x < 0 || y < 0 || coverage <= 0.0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.image.width() || y >= self.image.height() {
            return;
        }
        let a = coverage.min(1.0);
        let inv = 1.0 - a;
        let dst = self.image.get_pixel_mut(x, y);
        for i in 0..3 {
            dst.0[i] = (color.0[i] as f32 * a + dst.0[i] as f32 * inv).round() as u8;
        }
    }

    /// Fills the inclusive rectangle `[x0, x1] × [y0, y1]`.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
        let (w, h) = (self.image.width() as i32, self.image.height() as i32);
        let (x0, x1) = (x0.min(x1).max(0), x0.max(x1).min(w - 1));
        let (y0, y1) = (y0.min(y1).max(0), y0.max(y1).min(h - 1));
        if x0 > x1 || y0 > y1 {
            return;
        }
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.image.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Draws a straight line `width` pixels thick.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>, width: u32) {
        let width = width.max(1) as i32;
        let before = (width - 1) / 2;
        let after = width - 1 - before;

        if y0 == y1 {
            self.fill_rect(x0, y0 - before, x1, y0 + after, color);
            return;
        }
        if x0 == x1 {
            self.fill_rect(x0 - before, y0, x0 + after, y1, color);
            return;
        }

        // Bresenham, stamping a square brush at every step.
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.fill_rect(x - before, y - before, x + after, y + after, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draws a rectangle with rounded corners covering `[x0, x1] × [y0, y1]`.
    ///
    /// The outline is drawn inside the bounds; `fill` paints the interior.
    #[allow(clippy::too_many_arguments)]
    pub fn rounded_rect(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        radius: u32,
        fill: Option<Rgb<u8>>,
        outline: Rgb<u8>,
        width: u32,
    ) {
        let outer = RoundedBox::new(x0 as f32, y0 as f32, (x1 + 1) as f32, (y1 + 1) as f32, radius as f32);
        let w = width as f32;
        let inner = RoundedBox::new(
            x0 as f32 + w,
            y0 as f32 + w,
            (x1 + 1) as f32 - w,
            (y1 + 1) as f32 - w,
            (radius as f32 - w).max(0.0),
        );

        for y in y0..=y1 {
            for x in x0..=x1 {
                let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
                if !outer.contains(cx, cy) {
                    continue;
                }
                if width > 0 && !inner.contains(cx, cy) {
                    self.blend(x, y, outline, 1.0);
                } else if let Some(fill) = fill {
                    self.blend(x, y, fill, 1.0);
                }
            }
        }
    }

    /// Alpha-composites `src` with its top-left corner at `(x, y)`.
    pub fn paste_rgba(&mut self, src: &RgbaImage, x: i32, y: i32) {
        for (sx, sy, pixel) in src.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            self.blend(x + sx as i32, y + sy as i32, Rgb([r, g, b]), a as f32 / 255.0);
        }
    }
}

struct RoundedBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    radius: f32,
}

impl RoundedBox {
    fn new(left: f32, top: f32, right: f32, bottom: f32, radius: f32) -> Self {
        let radius = radius.min((right - left) / 2.0).min((bottom - top) / 2.0).max(0.0);
        Self {
            left,
            top,
            right,
            bottom,
            radius,
        }
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        if x < self.left || x > self.right || y < self.top || y > self.bottom {
            return false;
        }
        let nx = x.clamp(self.left + self.radius, self.right - self.radius);
        let ny = y.clamp(self.top + self.radius, self.bottom - self.radius);
        let (dx, dy) = (x - nx, y - ny);
        dx * dx + dy * dy <= self.radius * self.radius
    }
}
