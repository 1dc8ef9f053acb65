//! Receipt layout engine: `ReceiptRecord` → raster image + totals.
//!
//! # Page structure (top to bottom)
//! 1. Header: optional logo, business name, tagline, contact line
//! 2. Metadata panel: receipt no / date / customer | type / paid via / notes
//! 3. Line-item table: description (wrapped), qty, unit, row total
//! 4. Summary panel anchored right: subtotal, tax, divider, total
//! 5. Footer: divider + up to 3 wrapped lines pinned to the page bottom
//!
//! The canvas is 900px wide. Height starts at 1050px and grows with every item past
//! the third and with every wrapped description line past what a default row holds,
//! so the footer never collides with the summary panel.
//!
//! The engine is synchronous and CPU-bound. Callers on an async runtime run it
//! inside `tokio::task::spawn_blocking`.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::layout::canvas::Canvas;
use crate::layout::fonts::{FontCatalog, ReceiptFont, TextMeasure};
use crate::layout::wrap::{line_count, wrap_text};
use crate::receipt::models::{LineItem, ReceiptRecord, RenderResult};
use crate::receipt::money::{compute_totals, format_money, row_total};

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

pub const CANVAS_WIDTH: u32 = 900;
pub const BASE_HEIGHT: u32 = 1050;
/// Items that fit in `BASE_HEIGHT` without growing the canvas.
pub const BASELINE_ITEMS: usize = 3;
pub const PAD: u32 = 48;

const LOGO_BOX: u32 = 140;
const LOGO_GAP: u32 = 18;

const META_BOX_HEIGHT: i32 = 118;
const META_ROW_PITCH: i32 = 32;
const META_LEFT_VALUE_OFFSET: i32 = 210;
const META_RIGHT_VALUE_OFFSET: i32 = 235;
const PANEL_RADIUS: u32 = 18;
const PANEL_INSET: i32 = 18;

const DESC_LINE_PITCH: u32 = 24;
const MIN_ROW_HEIGHT: u32 = 50;
const ROW_GAP: u32 = 14;
/// Vertical space one single-line row consumes, divider gap included.
// Each item past the third adds exactly this much height (not a flat 60 px) so the
// canvas always matches the rows actually drawn and the footer clears the summary.
const DEFAULT_ROW_PITCH: u32 = MIN_ROW_HEIGHT + ROW_GAP;

const QTY_COLUMN_FROM_RIGHT: u32 = 240;
const UNIT_COLUMN_FROM_RIGHT: u32 = 160;
const TOTAL_COLUMN_FROM_RIGHT: u32 = 90;
const DESC_COLUMN_GUTTER: u32 = 20;

const SUMMARY_WIDTH: i32 = 340;
const SUMMARY_HEIGHT: i32 = 180;

const FOOTER_FROM_BOTTOM: u32 = 120;
const FOOTER_MAX_LINES: usize = 3;
const FOOTER_LINE_PITCH: i32 = 22;

const PLACEHOLDER: &str = "—";
const CONTACT_SEPARATOR: &str = " • ";

// ────────────────────────────────────────────────────────────────────────────
// Palette
// ────────────────────────────────────────────────────────────────────────────

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([25, 25, 25]);
const MUTED: Rgb<u8> = Rgb([90, 90, 90]);
const RULE: Rgb<u8> = Rgb([220, 220, 220]);
const ROW_RULE: Rgb<u8> = Rgb([245, 245, 245]);
const PANEL_FILL: Rgb<u8> = Rgb([250, 250, 250]);

// ────────────────────────────────────────────────────────────────────────────
// Type scale
// ────────────────────────────────────────────────────────────────────────────

/// The five faces a receipt uses, resolved once per render.
struct Typefaces {
    title: ReceiptFont,
    heading: ReceiptFont,
    body: ReceiptFont,
    body_bold: ReceiptFont,
    small: ReceiptFont,
}

impl Typefaces {
    fn load(catalog: &FontCatalog) -> Self {
        Self {
            title: catalog.load(40.0, true),
            heading: catalog.load(26.0, true),
            body: catalog.load(22.0, false),
            body_bold: catalog.load(22.0, true),
            small: catalog.load(18.0, false),
        }
    }
}

/// Usable width of the description column.
pub fn description_width() -> f32 {
    let x_qty = CANVAS_WIDTH - PAD - QTY_COLUMN_FROM_RIGHT;
    (x_qty - PAD - DESC_COLUMN_GUTTER) as f32
}

/// Height one item row consumes for a description of `lines` lines, divider gap included.
pub fn row_pitch(lines: usize) -> u32 {
    (DESC_LINE_PITCH * lines as u32 + 12).max(MIN_ROW_HEIGHT) + ROW_GAP
}

/// Canvas height for the given items: the base height, plus a default row for every
/// item past the baseline, plus whatever wrapped descriptions need beyond a default row.
pub fn canvas_height<M: TextMeasure + ?Sized>(items: &[LineItem], body: &M) -> u32 {
    let desc_width = description_width();
    let extra_items = items.len().saturating_sub(BASELINE_ITEMS) as u32;
    let wrap_growth: u32 = items
        .iter()
        .map(|item| row_pitch(line_count(&item.desc, body, desc_width)) - DEFAULT_ROW_PITCH)
        .sum();

    BASE_HEIGHT + extra_items * DEFAULT_ROW_PITCH + wrap_growth
}

// ────────────────────────────────────────────────────────────────────────────
// Logo
// ────────────────────────────────────────────────────────────────────────────

/// Decodes logo bytes and shrinks them to fit a 140×140 box, keeping the aspect ratio.
/// Returns `None` for anything that is not a decodable image.
pub fn decode_logo(bytes: &[u8]) -> Option<RgbaImage> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!("Logo could not be decoded, rendering without it: {e}");
            return None;
        }
    };
    if decoded.width() == 0 || decoded.height() == 0 {
        return None;
    }
    // Only shrink, never enlarge.
    let fitted = if decoded.width() > LOGO_BOX || decoded.height() > LOGO_BOX {
        decoded.resize(LOGO_BOX, LOGO_BOX, FilterType::Lanczos3)
    } else {
        decoded
    };
    Some(fitted.to_rgba8())
}

/// X offset of the header text for an (optional) placed logo.
pub fn header_x(logo: Option<&RgbaImage>) -> u32 {
    match logo {
        Some(logo) => PAD + logo.width() + LOGO_GAP,
        None => PAD,
    }
}

/// Joins the non-empty contact fields with ` • `.
pub fn contact_line(phone: &str, email: &str, city_state: &str) -> String {
    [phone, email, city_state]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(CONTACT_SEPARATOR)
}

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Render
// ────────────────────────────────────────────────────────────────────────────

/// Lays out and rasterizes one receipt.
pub fn render_receipt(record: &ReceiptRecord, catalog: &FontCatalog) -> RenderResult {
    let fonts = Typefaces::load(catalog);

    let width = CANVAS_WIDTH;
    let height = canvas_height(&record.items, &fonts.body);
    let mut canvas = Canvas::new(width, height, BACKGROUND);

    let pad = PAD as i32;
    let right = (canvas.width() - PAD) as i32;
    let mut y = pad;

    // ── Header ──────────────────────────────────────────────────────────────
    let logo = record.logo.as_deref().and_then(decode_logo);
    if let Some(logo) = &logo {
        canvas.paste_rgba(logo, pad, y);
    }
    let lx = header_x(logo.as_ref()) as i32;

    fonts.title.draw(&mut canvas, lx, y, &record.business_name, INK);
    y += 52;
    fonts.small.draw(&mut canvas, lx, y, &record.tagline, MUTED);
    y += 28;
    let contact = contact_line(&record.phone, &record.email, &record.city_state);
    if !contact.is_empty() {
        fonts.small.draw(&mut canvas, lx, y, &contact, MUTED);
    }
    y += 34;

    // ── Metadata panel ──────────────────────────────────────────────────────
    let box_top = y + 10;
    canvas.rounded_rect(
        pad,
        box_top,
        right,
        box_top + META_BOX_HEIGHT,
        PANEL_RADIUS,
        Some(PANEL_FILL),
        RULE,
        2,
    );
    let mx = pad + PANEL_INSET;
    let my = box_top + 16;
    let col_w = (width as i32 - 2 * pad - 2 * PANEL_INSET) / 2;
    let rx = mx + col_w + PANEL_INSET;

    let date = record.service_date.format("%Y-%m-%d").to_string();
    let left_meta = [
        ("Receipt / Recibo", record.receipt_no.as_str()),
        ("Date / Fecha", date.as_str()),
        ("Customer / Cliente", or_placeholder(&record.customer)),
    ];
    let right_meta = [
        ("Type / Tipo", record.service_type.as_str()),
        ("Paid via / Pagado por", record.paid_via.as_str()),
        ("Notes / Notas", or_placeholder(&record.notes)),
    ];
    for (i, (label, value)) in left_meta.iter().enumerate() {
        let row_y = my + i as i32 * META_ROW_PITCH;
        fonts.small.draw(&mut canvas, mx, row_y, &format!("{label}: "), MUTED);
        fonts.small.draw(&mut canvas, mx + META_LEFT_VALUE_OFFSET, row_y, value, INK);
    }
    for (i, (label, value)) in right_meta.iter().enumerate() {
        let row_y = my + i as i32 * META_ROW_PITCH;
        fonts.small.draw(&mut canvas, rx, row_y, &format!("{label}: "), MUTED);
        fonts.small.draw(&mut canvas, rx + META_RIGHT_VALUE_OFFSET, row_y, value, INK);
    }
    y = box_top + META_BOX_HEIGHT + 28;

    // ── Item table ──────────────────────────────────────────────────────────
    fonts.heading.draw(&mut canvas, pad, y, "Service Details / Detalles del Servicio", INK);
    y += 18;
    canvas.line(pad, y + 18, right, y + 18, RULE, 2);
    y += 36;

    let x_desc = pad;
    let x_qty = (width - PAD - QTY_COLUMN_FROM_RIGHT) as i32;
    let x_unit = (width - PAD - UNIT_COLUMN_FROM_RIGHT) as i32;
    let x_total = right - TOTAL_COLUMN_FROM_RIGHT as i32;

    fonts.body_bold.draw(&mut canvas, x_desc, y, "Description / Descripción", MUTED);
    fonts.body_bold.draw(&mut canvas, x_qty, y, "Qty", MUTED);
    fonts.body_bold.draw(&mut canvas, x_unit, y, "Unit", MUTED);
    fonts.body_bold.draw(&mut canvas, x_total, y, "Total", MUTED);
    y += 26;
    canvas.line(pad, y + 10, right, y + 10, RULE, 2);
    y += 26;

    let desc_width = description_width();
    for item in &record.items {
        let lines = wrap_text(&item.desc, &fonts.body, desc_width);
        for (j, line) in lines.iter().enumerate() {
            let line_y = y + (j as u32 * DESC_LINE_PITCH) as i32;
            fonts.body.draw(&mut canvas, x_desc, line_y, line, INK);
        }
        fonts.body.draw(&mut canvas, x_qty, y, &item.qty.to_string(), INK);
        fonts.body.draw(&mut canvas, x_unit, y, &format_money(&item.unit), INK);
        fonts.body.draw(&mut canvas, x_total, y, &format_money(&row_total(item.qty, item.unit)), INK);

        y += (row_pitch(lines.len()) - ROW_GAP) as i32;
        canvas.line(pad, y, right, y, ROW_RULE, 2);
        y += ROW_GAP as i32;
    }

    // ── Summary panel ───────────────────────────────────────────────────────
    let totals = compute_totals(&record.items, record.tax);

    y += 16;
    let sx1 = right - SUMMARY_WIDTH;
    let sx2 = right;
    canvas.rounded_rect(sx1, y, sx2, y + SUMMARY_HEIGHT, PANEL_RADIUS, Some(PANEL_FILL), RULE, 2);

    let label_x = sx1 + PANEL_INSET;
    let value_right = sx2 - PANEL_INSET;
    let mut yy = y + 18;
    fonts.body_bold.draw(&mut canvas, label_x, yy, "Summary / Resumen", INK);
    yy += 34;
    fonts.body.draw(&mut canvas, label_x, yy, "Subtotal:", MUTED);
    draw_right_aligned(&mut canvas, &fonts.body, value_right, yy, &format_money(&totals.subtotal), INK);
    yy += 30;
    fonts.body.draw(&mut canvas, label_x, yy, "Tax / Impuesto:", MUTED);
    draw_right_aligned(&mut canvas, &fonts.body, value_right, yy, &format_money(&totals.tax), INK);
    yy += 30;
    canvas.line(label_x, yy + 6, value_right, yy + 6, RULE, 2);
    yy += 18;
    fonts.body_bold.draw(&mut canvas, label_x, yy, "Total:", INK);
    draw_right_aligned(&mut canvas, &fonts.body_bold, value_right, yy, &format_money(&totals.total), INK);

    // ── Footer ──────────────────────────────────────────────────────────────
    let mut fy = (canvas.height() - FOOTER_FROM_BOTTOM) as i32;
    canvas.line(pad, fy, right, fy, RULE, 2);
    fy += 18;
    let footer_lines = wrap_text(&record.footer, &fonts.small, (width - 2 * PAD) as f32);
    for (i, line) in footer_lines.iter().take(FOOTER_MAX_LINES).enumerate() {
        fonts.small.draw(&mut canvas, pad, fy + i as i32 * FOOTER_LINE_PITCH, line, MUTED);
    }

    debug!(
        receipt_no = %record.receipt_no,
        width,
        height,
        items = record.items.len(),
        builtin_font = fonts.body.is_builtin(),
        body_size = fonts.body.size(),
        "Receipt laid out"
    );

    RenderResult {
        image: canvas.into_image(),
        totals,
        header_x: lx as u32,
    }
}

fn draw_right_aligned(
    canvas: &mut Canvas,
    font: &ReceiptFont,
    right: i32,
    y: i32,
    text: &str,
    color: Rgb<u8>,
) {
    let x = right - font.text_width(text).ceil() as i32;
    font.draw(canvas, x, y, text, color);
}

/// Encodes the receipt as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AppError::Render(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::builtin_font::BuiltinFont;
    use crate::layout::fonts::{FontSource, DEJAVU_DIR};
    use crate::receipt::validation::{MAX_DESC_CHARS, MAX_ITEMS};
    use chrono::NaiveDate;
    use image::{DynamicImage, Rgba};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn item(desc: &str, qty: u32, unit: &str) -> LineItem {
        LineItem {
            desc: desc.to_string(),
            qty,
            unit: Decimal::from_str(unit).unwrap(),
        }
    }

    fn make_record(items: Vec<LineItem>, tax: &str) -> ReceiptRecord {
        ReceiptRecord {
            business_name: "jhgbinwash".to_string(),
            tagline: "Biweekly membership & one-time service".to_string(),
            phone: String::new(),
            email: "contact@jhgbinwash.com".to_string(),
            city_state: "Utah".to_string(),
            receipt_no: "JHGBIN-240105-1234".to_string(),
            service_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            customer: String::new(),
            service_type: "One-time service / Servicio único".to_string(),
            paid_via: "Cash / Efectivo".to_string(),
            notes: String::new(),
            items,
            tax: Decimal::from_str(tax).unwrap(),
            footer: "Thank you for supporting a local business.".to_string(),
            logo: None,
        }
    }

    fn png_logo(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_single_item_scenario_total() {
        let record = make_record(vec![item("Bin cleaning", 1, "17.00")], "0.0");
        let result = render_receipt(&record, &FontCatalog::builtin_only());
        assert_eq!(format_money(&result.total()), "$17.00");
        assert_eq!(result.image.width(), CANVAS_WIDTH);
        assert_eq!(result.image.height(), BASE_HEIGHT);
    }

    #[test]
    fn test_two_item_scenario_with_tax() {
        let record = make_record(
            vec![item("Bin cleaning", 2, "15.00"), item("Deodorize", 1, "5.00")],
            "2.00",
        );
        let result = render_receipt(&record, &FontCatalog::builtin_only());
        assert_eq!(format_money(&result.totals.subtotal), "$35.00");
        assert_eq!(format_money(&result.total()), "$37.00");
    }

    #[test]
    fn test_height_grows_past_three_items() {
        let font = BuiltinFont::new(22.0, false);
        let three: Vec<_> = (0..3).map(|_| item("Bin cleaning", 1, "17")).collect();
        let five: Vec<_> = (0..5).map(|_| item("Bin cleaning", 1, "17")).collect();
        assert_eq!(canvas_height(&three, &font), BASE_HEIGHT);
        assert!(canvas_height(&five, &font) > canvas_height(&three, &font));
        assert_eq!(canvas_height(&five, &font), BASE_HEIGHT + 2 * DEFAULT_ROW_PITCH);
    }

    #[test]
    fn test_height_never_below_base() {
        let font = BuiltinFont::new(22.0, false);
        assert_eq!(canvas_height(&[], &font), BASE_HEIGHT);
        assert_eq!(canvas_height(&[item("x", 1, "1")], &font), BASE_HEIGHT);
    }

    #[test]
    fn test_height_grows_with_wrapped_description() {
        let font = BuiltinFont::new(22.0, false);
        let short = vec![item("Bin cleaning", 1, "17")];
        let long = vec![item(&"Biweekly membership every two weeks ".repeat(6), 1, "17")];
        let lines = wrap_text(&long[0].desc, &font, description_width()).len();
        assert!(lines >= 3, "long description should wrap, got {lines} lines");
        assert_eq!(
            canvas_height(&long, &font),
            canvas_height(&short, &font) + row_pitch(lines) - DEFAULT_ROW_PITCH
        );
    }

    #[test]
    fn test_outline_wrapping_matches_canvas_height() {
        let regular = format!("{DEJAVU_DIR}/DejaVuSans.ttf");
        if !std::path::Path::new(&regular).exists() {
            return;
        }
        let catalog = FontCatalog {
            regular: vec![FontSource::path(regular)],
            bold: vec![],
        };
        let body = catalog.load(22.0, false);
        assert!(!body.is_builtin());

        let items = vec![
            item(&"Biweekly membership every two weeks ".repeat(6), 1, "17"),
            item("Deodorize", 1, "5"),
        ];
        let lines = wrap_text(&items[0].desc, &body, description_width()).len();
        assert!(lines >= 2, "long description should wrap, got {lines} lines");
        assert_eq!(
            canvas_height(&items, &body),
            BASE_HEIGHT + row_pitch(lines) - DEFAULT_ROW_PITCH
        );

        let result = render_receipt(&make_record(items.clone(), "0"), &catalog);
        assert_eq!(result.image.height(), canvas_height(&items, &body));
    }

    #[test]
    fn test_height_bounded_at_item_limits() {
        let font = BuiltinFont::new(22.0, false);
        // Single-letter words wrap into the most lines a description can take.
        let desc: String = "a ".repeat(MAX_DESC_CHARS / 2);
        let items: Vec<_> = (0..MAX_ITEMS).map(|_| item(&desc, 1, "1")).collect();
        let height = canvas_height(&items, &font);
        assert!(height > BASE_HEIGHT);
        assert!(height < 20_000, "worst-case canvas too tall: {height}");
    }

    #[test]
    fn test_row_pitch_minimum() {
        assert_eq!(row_pitch(0), DEFAULT_ROW_PITCH);
        assert_eq!(row_pitch(1), DEFAULT_ROW_PITCH);
        assert_eq!(row_pitch(2), 24 * 2 + 12 + ROW_GAP);
        assert_eq!(row_pitch(3), 24 * 3 + 12 + ROW_GAP);
    }

    #[test]
    fn test_corrupt_logo_uses_default_margin() {
        let mut record = make_record(vec![item("Bin cleaning", 1, "17")], "0");
        record.logo = Some(b"not an image at all".to_vec());
        let result = render_receipt(&record, &FontCatalog::builtin_only());
        assert_eq!(result.header_x, PAD);
        assert_eq!(format_money(&result.total()), "$17.00");
    }

    #[test]
    fn test_no_logo_uses_default_margin() {
        let record = make_record(vec![item("Bin cleaning", 1, "17")], "0");
        let result = render_receipt(&record, &FontCatalog::builtin_only());
        assert_eq!(result.header_x, PAD);
    }

    #[test]
    fn test_logo_shifts_header_and_is_scaled_to_fit() {
        let mut record = make_record(vec![item("Bin cleaning", 1, "17")], "0");
        record.logo = Some(png_logo(280, 140));
        let result = render_receipt(&record, &FontCatalog::builtin_only());
        // 280×140 fits the 140 box as 140×70.
        assert_eq!(result.header_x, PAD + 140 + LOGO_GAP);
        let [r, g, _] = result.image.get_pixel(PAD + 10, PAD + 10).0;
        assert!(r > 150 && g < 80, "logo pixels should be composited at the top-left");
    }

    #[test]
    fn test_decode_logo_keeps_small_images_unscaled() {
        let logo = decode_logo(&png_logo(40, 20)).unwrap();
        assert_eq!((logo.width(), logo.height()), (40, 20));
    }

    #[test]
    fn test_decode_logo_preserves_aspect_ratio() {
        let logo = decode_logo(&png_logo(100, 400)).unwrap();
        assert_eq!((logo.width(), logo.height()), (35, 140));
    }

    #[test]
    fn test_contact_line_skips_empty_fields() {
        assert_eq!(contact_line("", "a@b.com", "Utah"), "a@b.com • Utah");
        assert_eq!(contact_line("555", "", ""), "555");
        assert_eq!(contact_line("", "", ""), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let record = make_record(vec![item("Bin cleaning / Lavado de bote", 1, "17")], "1.5");
        let catalog = FontCatalog::builtin_only();
        let a = render_receipt(&record, &catalog);
        let b = render_receipt(&record, &catalog);
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }

    #[test]
    fn test_render_draws_ink() {
        let record = make_record(vec![item("Bin cleaning", 1, "17")], "0");
        let result = render_receipt(&record, &FontCatalog::builtin_only());
        assert!(result.image.pixels().any(|p| p.0 == INK.0));
    }

    #[test]
    fn test_encode_png_signature() {
        let record = make_record(vec![item("Bin cleaning", 1, "17")], "0");
        let result = render_receipt(&record, &FontCatalog::builtin_only());
        let bytes = encode_png(&result.image).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
