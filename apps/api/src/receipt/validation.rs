//! Builds a `ReceiptRecord` from an operator request and the active profile.
//!
//! This is the only place a render can be refused. Rows with a blank description
//! are dropped; if nothing is left the request is rejected before the layout
//! engine is ever invoked.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::AppError;
use crate::receipt::models::{LineItem, ReceiptRecord};
use crate::receipt::profile::ReceiptProfile;

pub const NO_ITEMS_MESSAGE: &str = "Add at least one service / Agrega al menos un servicio.";

/// Most item rows one receipt accepts, blank rows included.
pub const MAX_ITEMS: usize = 50;
/// Longest description, in characters, a single item may carry.
pub const MAX_DESC_CHARS: usize = 300;

/// One row of the item editor as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub desc: String,
    #[serde(default = "default_qty")]
    pub qty: i64,
    #[serde(default)]
    pub unit: Decimal,
}

fn default_qty() -> i64 {
    1
}

/// Operator input for one receipt. Missing business fields fall back to the profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptRequest {
    pub business_name: Option<String>,
    pub tagline: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city_state: Option<String>,
    /// Absent: a number is generated. Present but blank: kept blank.
    pub receipt_no: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub customer: Option<String>,
    pub paid_via: Option<String>,
    pub notes: Option<String>,
    pub tax: Option<Decimal>,
    pub footer: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemInput>,
    /// Preset plan id (preset profiles only).
    pub plan: Option<String>,
}

fn field_or(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).trim().to_string()
}

fn trimmed(value: &Option<String>) -> String {
    field_or(value, "")
}

/// Validates manual rows: blank descriptions are skipped, the rest must have
/// `qty ≥ 1` and a non-negative unit price.
pub fn collect_items(inputs: &[ItemInput]) -> Result<Vec<LineItem>, AppError> {
    // Canvas height grows with rows and wrapped lines, so both are capped here.
    if inputs.len() > MAX_ITEMS {
        return Err(AppError::Validation(format!(
            "At most {MAX_ITEMS} items per receipt / Máximo {MAX_ITEMS} servicios por recibo"
        )));
    }
    let mut items = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let desc = input.desc.trim();
        if desc.is_empty() {
            continue;
        }
        if desc.chars().count() > MAX_DESC_CHARS {
            return Err(AppError::Validation(format!(
                "Item {}: description is longer than {MAX_DESC_CHARS} characters",
                i + 1
            )));
        }
        let qty = u32::try_from(input.qty)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                AppError::Validation(format!("Item {}: quantity must be at least 1", i + 1))
            })?;
        if input.unit < Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "Item {}: unit price cannot be negative",
                i + 1
            )));
        }
        items.push(LineItem {
            desc: desc.to_string(),
            qty,
            unit: input.unit,
        });
    }
    Ok(items)
}

/// Resolves items, defaults and identifiers into a record ready to render.
pub fn build_record(
    request: &ReceiptRequest,
    profile: &ReceiptProfile,
    logo: Option<Vec<u8>>,
    today: NaiveDate,
) -> Result<ReceiptRecord, AppError> {
    let items = if profile.offers_presets() {
        if !request.items.is_empty() {
            return Err(AppError::Validation(
                "This profile uses preset plans; choose a plan instead of items".to_string(),
            ));
        }
        let plan_id = request
            .plan
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Choose a plan / Elige un plan".to_string()))?;
        let plan = profile
            .find_plan(plan_id)
            .ok_or_else(|| AppError::Validation(format!("Unknown plan '{plan_id}'")))?;
        vec![plan.to_item()]
    } else {
        if request.plan.is_some() {
            return Err(AppError::Validation(
                "This profile takes manual items, not preset plans".to_string(),
            ));
        }
        collect_items(&request.items)?
    };

    if items.is_empty() {
        return Err(AppError::Validation(NO_ITEMS_MESSAGE.to_string()));
    }

    let tax = request.tax.unwrap_or(Decimal::ZERO);
    if tax < Decimal::ZERO {
        return Err(AppError::Validation("Tax cannot be negative".to_string()));
    }

    let paid_via = match request.paid_via.as_deref().map(str::trim) {
        None | Some("") => profile.payment_options.first().cloned().unwrap_or_default(),
        Some(choice) => profile
            .payment_options
            .iter()
            .find(|option| option.as_str() == choice)
            .cloned()
            .ok_or_else(|| AppError::Validation(format!("Unknown payment option '{choice}'")))?,
    };

    let service_date = request.service_date.unwrap_or(today);
    let receipt_no = match &request.receipt_no {
        Some(no) => no.trim().to_string(),
        None => profile.generate_receipt_no(service_date),
    };

    let business = &profile.business;
    Ok(ReceiptRecord {
        business_name: field_or(&request.business_name, &business.name),
        tagline: field_or(&request.tagline, &business.tagline),
        phone: field_or(&request.phone, &business.phone),
        email: field_or(&request.email, &business.email),
        city_state: field_or(&request.city_state, &business.city_state),
        receipt_no,
        service_date,
        customer: trimmed(&request.customer),
        service_type: profile.service_type().to_string(),
        paid_via,
        notes: trimmed(&request.notes),
        items,
        tax,
        footer: field_or(&request.footer, &business.footer),
        logo: logo.filter(|bytes| !bytes.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn input(desc: &str, qty: i64, unit: &str) -> ItemInput {
        ItemInput {
            desc: desc.to_string(),
            qty,
            unit: Decimal::from_str(unit).unwrap(),
        }
    }

    fn manual_request(items: Vec<ItemInput>) -> ReceiptRequest {
        ReceiptRequest {
            items,
            ..Default::default()
        }
    }

    fn assert_validation(result: Result<ReceiptRecord, AppError>, needle: &str) {
        match result {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {msg}")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_items_rejected() {
        let result = build_record(&manual_request(vec![]), &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "Add at least one service");
    }

    #[test]
    fn test_blank_descriptions_rejected() {
        let request = manual_request(vec![input("   ", 1, "17"), input("", 2, "5")]);
        let result = build_record(&request, &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "Add at least one service");
    }

    #[test]
    fn test_blank_rows_dropped_and_descriptions_trimmed() {
        let request = manual_request(vec![input(" Bin cleaning ", 1, "17"), input(" ", 1, "0")]);
        let record = build_record(&request, &ReceiptProfile::one_time(), None, today()).unwrap();
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].desc, "Bin cleaning");
    }

    #[test]
    fn test_item_count_limit() {
        let at_limit: Vec<_> = (0..MAX_ITEMS).map(|_| input("Bin cleaning", 1, "17")).collect();
        let record = build_record(&manual_request(at_limit), &ReceiptProfile::one_time(), None, today())
            .unwrap();
        assert_eq!(record.items.len(), MAX_ITEMS);

        let over: Vec<_> = (0..=MAX_ITEMS).map(|_| input("a", 1, "1")).collect();
        let result = build_record(&manual_request(over), &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "At most 50 items");
    }

    #[test]
    fn test_blank_rows_count_toward_item_limit() {
        let mut rows: Vec<_> = (0..MAX_ITEMS).map(|_| input("   ", 1, "1")).collect();
        rows.push(input("Bin cleaning", 1, "17"));
        let result = build_record(&manual_request(rows), &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "At most 50 items");
    }

    #[test]
    fn test_description_length_limit() {
        let at_limit = "x".repeat(MAX_DESC_CHARS);
        let record = build_record(
            &manual_request(vec![input(&at_limit, 1, "1")]),
            &ReceiptProfile::one_time(),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(record.items[0].desc.chars().count(), MAX_DESC_CHARS);

        // Counted in characters, not bytes.
        let accented = "ñ".repeat(MAX_DESC_CHARS);
        assert!(collect_items(&[input(&accented, 1, "1")]).is_ok());

        let over = "x".repeat(MAX_DESC_CHARS + 1);
        let result = build_record(
            &manual_request(vec![input("Bin cleaning", 1, "17"), input(&over, 1, "1")]),
            &ReceiptProfile::one_time(),
            None,
            today(),
        );
        assert_validation(result, "Item 2: description is longer than 300");
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let request = manual_request(vec![input("Bin cleaning", 0, "17")]);
        let result = build_record(&request, &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "quantity must be at least 1");
    }

    #[test]
    fn test_negative_unit_rejected() {
        let request = manual_request(vec![input("Bin cleaning", 1, "-1")]);
        let result = build_record(&request, &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "unit price cannot be negative");
    }

    #[test]
    fn test_negative_tax_rejected() {
        let mut request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        request.tax = Some(Decimal::from(-2));
        let result = build_record(&request, &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "Tax cannot be negative");
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        let record = build_record(&request, &ReceiptProfile::one_time(), None, today()).unwrap();
        assert_eq!(record.business_name, "jhgbinwash");
        assert_eq!(record.email, "contact@jhgbinwash.com");
        assert_eq!(record.paid_via, "Cash / Efectivo");
        assert_eq!(record.service_type, "One-time service / Servicio único");
        assert_eq!(record.service_date, today());
        assert_eq!(record.tax, Decimal::ZERO);
        assert!(record.receipt_no.starts_with("JHGBIN-240105-"));
        assert!(record.logo.is_none());
    }

    #[test]
    fn test_blank_receipt_no_is_kept_blank() {
        let mut request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        request.receipt_no = Some("  ".to_string());
        let record = build_record(&request, &ReceiptProfile::one_time(), None, today()).unwrap();
        assert_eq!(record.receipt_no, "");
    }

    #[test]
    fn test_unknown_payment_option_rejected() {
        let mut request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        request.paid_via = Some("Bitcoin".to_string());
        let result = build_record(&request, &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "Unknown payment option");
    }

    #[test]
    fn test_known_payment_option_accepted() {
        let mut request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        request.paid_via = Some("Zelle".to_string());
        let record = build_record(&request, &ReceiptProfile::one_time(), None, today()).unwrap();
        assert_eq!(record.paid_via, "Zelle");
    }

    #[test]
    fn test_preset_profile_resolves_plan() {
        let request = ReceiptRequest {
            plan: Some("3-bins".to_string()),
            ..Default::default()
        };
        let profile = ReceiptProfile::membership();
        let record = build_record(&request, &profile, None, today()).unwrap();
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].unit, Decimal::from(40));
        assert_eq!(record.service_type, "Biweekly Membership / Membresía quincenal");
    }

    #[test]
    fn test_preset_profile_requires_plan() {
        let result = build_record(&ReceiptRequest::default(), &ReceiptProfile::membership(), None, today());
        assert_validation(result, "Choose a plan");
    }

    #[test]
    fn test_preset_profile_rejects_manual_items() {
        let request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        let result = build_record(&request, &ReceiptProfile::membership(), None, today());
        assert_validation(result, "preset plans");
    }

    #[test]
    fn test_manual_profile_rejects_plan() {
        let mut request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        request.plan = Some("1-bin".to_string());
        let result = build_record(&request, &ReceiptProfile::one_time(), None, today());
        assert_validation(result, "manual items");
    }

    #[test]
    fn test_empty_logo_bytes_treated_as_absent() {
        let request = manual_request(vec![input("Bin cleaning", 1, "17")]);
        let record = build_record(&request, &ReceiptProfile::one_time(), Some(vec![]), today()).unwrap();
        assert!(record.logo.is_none());
    }

    #[test]
    fn test_request_deserializes_numeric_json() {
        let request: ReceiptRequest = serde_json::from_str(
            r#"{"items":[{"desc":"Bin cleaning","qty":2,"unit":15.0}],"tax":2.0,"service_date":"2024-01-05"}"#,
        )
        .unwrap();
        assert_eq!(request.items[0].qty, 2);
        assert_eq!(request.items[0].unit, Decimal::from(15));
        assert_eq!(request.tax, Some(Decimal::from(2)));
        assert_eq!(request.service_date, Some(today()));
    }
}
