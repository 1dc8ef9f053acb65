use chrono::NaiveDate;
use image::RgbImage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::receipt::money::{format_money, Totals};

/// One billable service entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub desc: String,
    pub qty: u32,
    pub unit: Decimal,
}

/// Everything the layout engine needs to draw one receipt.
///
/// Built fresh for every render and never mutated by the engine.
#[derive(Debug, Clone)]
pub struct ReceiptRecord {
    pub business_name: String,
    pub tagline: String,
    pub phone: String,
    pub email: String,
    pub city_state: String,
    pub receipt_no: String,
    pub service_date: NaiveDate,
    pub customer: String,
    pub service_type: String,
    pub paid_via: String,
    pub notes: String,
    pub items: Vec<LineItem>,
    pub tax: Decimal,
    pub footer: String,
    pub logo: Option<Vec<u8>>,
}

/// Output of one render: the raster plus the amounts printed on it.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub image: RgbImage,
    pub totals: Totals,
    /// X offset of the header text block; larger than the page margin only when a logo was placed.
    pub header_x: u32,
}

impl RenderResult {
    pub fn total(&self) -> Decimal {
        self.totals.total
    }
}

/// File name offered for download. Blank receipt numbers fall back to `receipt.png`.
///
/// Characters that would break a `Content-Disposition` header are replaced with `_`.
pub fn download_filename(receipt_no: &str) -> String {
    let stem: String = receipt_no
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "receipt.png".to_string()
    } else {
        format!("{stem}.png")
    }
}

/// Bilingual confirmation text the operator can paste into a message to the customer.
pub fn share_message(business_name: &str, total: Decimal) -> String {
    let total = format_money(&total);
    format!(
        "Hello! Here is your receipt from {business_name}.\nTotal: {total}\nThank you!\n\n\
         Hola! Aquí está tu recibo de {business_name}.\nTotal: {total}\n¡Gracias!"
    )
}
