//! Receipt profiles: the default strings, receipt-number prefix and item entry mode
//! a deployment renders with.
//!
//! Two profiles ship built in:
//! - `one-time`: free-form line items entered by the operator
//! - `membership`: a fixed set of biweekly membership plans, one chosen per receipt

use std::str::FromStr;

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::receipt::models::LineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    OneTime,
    Membership,
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one-time" | "onetime" | "manual" => Ok(ProfileKind::OneTime),
            "membership" | "preset" | "presets" => Ok(ProfileKind::Membership),
            other => Err(format!("unknown receipt profile '{other}'")),
        }
    }
}

/// Business fields printed in the header and footer when a request leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDefaults {
    pub name: String,
    pub tagline: String,
    pub phone: String,
    pub email: String,
    pub city_state: String,
    pub footer: String,
}

/// Optional per-deployment replacements for `BusinessDefaults`.
#[derive(Debug, Clone, Default)]
pub struct BusinessOverrides {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city_state: Option<String>,
}

/// A fixed-price plan offered in preset mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetPlan {
    pub id: String,
    pub label: String,
    pub desc: String,
    pub unit: Decimal,
}

impl PresetPlan {
    pub fn to_item(&self) -> LineItem {
        LineItem {
            desc: self.desc.clone(),
            qty: 1,
            unit: self.unit,
        }
    }
}

/// How the items of a receipt are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ItemMode {
    Manual {
        service_type: String,
        /// Pre-filled first row offered to the operator.
        starter_item: LineItem,
    },
    Presets {
        service_type: String,
        plans: Vec<PresetPlan>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptProfile {
    pub kind: ProfileKind,
    pub business: BusinessDefaults,
    /// Prefix of generated receipt numbers: `{prefix}-{YYMMDD}-{NNNN}`.
    pub id_prefix: String,
    pub item_mode: ItemMode,
    pub payment_options: Vec<String>,
}

fn jhg_business() -> BusinessDefaults {
    BusinessDefaults {
        name: "jhgbinwash".to_string(),
        tagline: "Biweekly membership & one-time service • Membresía quincenal y servicio único"
            .to_string(),
        phone: String::new(),
        email: "contact@jhgbinwash.com".to_string(),
        city_state: "Utah".to_string(),
        footer: "Thank you for supporting a local business. • Gracias por apoyar un negocio local."
            .to_string(),
    }
}

fn payment_options() -> Vec<String> {
    ["Cash / Efectivo", "Venmo", "Zelle", "Card / Tarjeta", "Other / Otro"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn membership_plan(bins: u32, price: i64) -> PresetPlan {
    let noun = if bins == 1 { "Bin" } else { "Bins" };
    PresetPlan {
        id: format!("{bins}-{}", noun.to_ascii_lowercase()),
        label: format!("{bins} {noun} – ${price}"),
        desc: format!(
            "Biweekly Membership (Every 2 weeks) / Membresía quincenal (cada dos semanas) – {bins} {noun}"
        ),
        unit: Decimal::from(price),
    }
}

impl ReceiptProfile {
    /// Manual entry of one-off services.
    pub fn one_time() -> Self {
        Self {
            kind: ProfileKind::OneTime,
            business: jhg_business(),
            id_prefix: "JHGBIN".to_string(),
            item_mode: ItemMode::Manual {
                service_type: "One-time service / Servicio único".to_string(),
                starter_item: LineItem {
                    desc: "Bin cleaning / Lavado de bote".to_string(),
                    qty: 1,
                    unit: Decimal::from(17),
                },
            },
            payment_options: payment_options(),
        }
    }

    /// Biweekly membership plans: 1 bin $15, 2 bins $30, 3 bins $40.
    pub fn membership() -> Self {
        Self {
            kind: ProfileKind::Membership,
            business: jhg_business(),
            id_prefix: "JHGMEM".to_string(),
            item_mode: ItemMode::Presets {
                service_type: "Biweekly Membership / Membresía quincenal".to_string(),
                plans: vec![
                    membership_plan(1, 15),
                    membership_plan(2, 30),
                    membership_plan(3, 40),
                ],
            },
            payment_options: payment_options(),
        }
    }

    pub fn for_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::OneTime => Self::one_time(),
            ProfileKind::Membership => Self::membership(),
        }
    }

    /// Replaces business defaults with the non-empty overrides.
    pub fn with_overrides(mut self, overrides: &BusinessOverrides) -> Self {
        let pairs = [
            (&mut self.business.name, &overrides.name),
            (&mut self.business.phone, &overrides.phone),
            (&mut self.business.email, &overrides.email),
            (&mut self.business.city_state, &overrides.city_state),
        ];
        for (field, value) in pairs {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *field = value.to_string();
            }
        }
        self
    }

    pub fn service_type(&self) -> &str {
        match &self.item_mode {
            ItemMode::Manual { service_type, .. } | ItemMode::Presets { service_type, .. } => {
                service_type
            }
        }
    }

    pub fn offers_presets(&self) -> bool {
        matches!(self.item_mode, ItemMode::Presets { .. })
    }

    pub fn find_plan(&self, id: &str) -> Option<&PresetPlan> {
        match &self.item_mode {
            ItemMode::Presets { plans, .. } => plans.iter().find(|p| p.id == id.trim()),
            ItemMode::Manual { .. } => None,
        }
    }

    /// Suggests a fresh receipt number for `date`.
    pub fn generate_receipt_no(&self, date: NaiveDate) -> String {
        let serial = rand::thread_rng().gen_range(1000..=9999);
        format_receipt_no(&self.id_prefix, date, serial)
    }
}

/// `{prefix}-{YYMMDD}-{serial}`
pub fn format_receipt_no(prefix: &str, date: NaiveDate, serial: u16) -> String {
    format!("{prefix}-{}-{serial:04}", date.format("%y%m%d"))
}
