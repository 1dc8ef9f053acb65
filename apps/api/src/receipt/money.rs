//! Currency arithmetic and display.
//!
//! Every displayed amount is a `Decimal` rounded to cents with banker's rounding
//! (half-even). Row totals are rounded before they are summed, so the subtotal is
//! independent of item order.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::receipt::models::LineItem;

pub const CURRENCY_SYMBOL: &str = "$";
pub const ZERO_AMOUNT: &str = "$0.00";

const CENTS_DP: u32 = 2;

// ────────────────────────────────────────────────────────────────────────────
// Amount conversion
// ────────────────────────────────────────────────────────────────────────────

/// Anything that can be shown as money. Returns `None` for values that have no
/// sensible decimal reading (non-numeric text, NaN, infinities, out-of-range).
pub trait ToAmount {
    fn to_amount(&self) -> Option<Decimal>;
}

impl ToAmount for Decimal {
    fn to_amount(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl ToAmount for str {
    fn to_amount(&self) -> Option<Decimal> {
        Decimal::from_str(self.trim()).ok()
    }
}

impl ToAmount for String {
    fn to_amount(&self) -> Option<Decimal> {
        self.as_str().to_amount()
    }
}

impl<T: ToAmount> ToAmount for Option<T> {
    fn to_amount(&self) -> Option<Decimal> {
        self.as_ref().and_then(ToAmount::to_amount)
    }
}

impl<T: ToAmount + ?Sized> ToAmount for &T {
    fn to_amount(&self) -> Option<Decimal> {
        (**self).to_amount()
    }
}

// Floats go through their shortest round-trip text so that 12.345_f64 reads as
// 12.345 rather than 12.3449999...
macro_rules! float_amount {
    ($($t:ty),*) => {$(
        impl ToAmount for $t {
            fn to_amount(&self) -> Option<Decimal> {
                if !self.is_finite() {
                    return None;
                }
                Decimal::from_str(&self.to_string()).ok()
            }
        }
    )*};
}

macro_rules! int_amount {
    ($($t:ty),*) => {$(
        impl ToAmount for $t {
            fn to_amount(&self) -> Option<Decimal> {
                Some(Decimal::from(*self))
            }
        }
    )*};
}

float_amount!(f32, f64);
int_amount!(i32, i64, u32, u64, usize);

// ────────────────────────────────────────────────────────────────────────────
// Rounding and formatting
// ────────────────────────────────────────────────────────────────────────────

/// Rounds to cents (half-even) and pins the scale to exactly two places.
pub fn round_cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(CENTS_DP, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(CENTS_DP);
    rounded
}

/// Formats a value as `$D.CC`. Never fails: unreadable input becomes `$0.00`.
pub fn format_money<T: ToAmount + ?Sized>(value: &T) -> String {
    match value.to_amount() {
        Some(amount) => format!("{CURRENCY_SYMBOL}{}", round_cents(amount)),
        None => ZERO_AMOUNT.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Totals
// ────────────────────────────────────────────────────────────────────────────

/// Computed amounts for one receipt, each already at two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// `qty × unit`, rounded to cents.
pub fn row_total(qty: u32, unit: Decimal) -> Decimal {
    round_cents(Decimal::from(qty).saturating_mul(unit))
}

/// Sums the rounded row totals and adds the flat tax.
pub fn compute_totals(items: &[LineItem], tax: Decimal) -> Totals {
    let subtotal = items
        .iter()
        .map(|item| row_total(item.qty, item.unit))
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let subtotal = round_cents(subtotal);
    let tax = round_cents(tax);

    Totals {
        subtotal,
        tax,
        total: round_cents(subtotal.saturating_add(tax)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: u32, unit: &str) -> LineItem {
        LineItem {
            desc: "Bin cleaning".to_string(),
            qty,
            unit: Decimal::from_str(unit).unwrap(),
        }
    }

    #[test]
    fn test_format_money_zero() {
        assert_eq!(format_money(&0), "$0.00");
        assert_eq!(format_money(&Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_format_money_malformed_inputs_degrade_to_zero() {
        assert_eq!(format_money(&None::<f64>), ZERO_AMOUNT);
        assert_eq!(format_money("abc"), ZERO_AMOUNT);
        assert_eq!(format_money(&f64::NEG_INFINITY), ZERO_AMOUNT);
        assert_eq!(format_money(&f64::NAN), ZERO_AMOUNT);
        assert_eq!(format_money(&f64::MAX), ZERO_AMOUNT);
    }

    #[test]
    fn test_format_money_half_even_boundary() {
        assert_eq!(format_money(&12.345_f64), "$12.34");
        assert_eq!(format_money(&12.355_f64), "$12.36");
        assert_eq!(format_money("0.125"), "$0.12");
        assert_eq!(format_money("0.135"), "$0.14");
    }

    #[test]
    fn test_format_money_pads_to_two_places() {
        assert_eq!(format_money(&17), "$17.00");
        assert_eq!(format_money(&15.5_f64), "$15.50");
        assert_eq!(format_money(" 40 "), "$40.00");
        assert_eq!(format_money(&Some("2.5".to_string())), "$2.50");
    }

    #[test]
    fn test_format_money_keeps_sign() {
        assert_eq!(format_money(&-5), "$-5.00");
    }

    #[test]
    fn test_row_total_rounds_each_row() {
        assert_eq!(row_total(3, Decimal::from_str("0.333").unwrap()).to_string(), "1.00");
        assert_eq!(row_total(2, Decimal::from(15)).to_string(), "30.00");
    }

    #[test]
    fn test_subtotal_independent_of_order() {
        let mut items = vec![item(3, "0.335"), item(7, "1.115"), item(1, "9.999")];
        let forward = compute_totals(&items, Decimal::ZERO);
        items.reverse();
        let reversed = compute_totals(&items, Decimal::ZERO);
        assert_eq!(forward.subtotal, reversed.subtotal);

        let expected: Decimal = items.iter().map(|i| row_total(i.qty, i.unit)).sum();
        assert_eq!(forward.subtotal, round_cents(expected));
    }

    #[test]
    fn test_single_item_no_tax() {
        let totals = compute_totals(&[item(1, "17.00")], Decimal::ZERO);
        assert_eq!(format_money(&totals.total), "$17.00");
        assert_eq!(format_money(&totals.tax), "$0.00");
    }

    #[test]
    fn test_two_items_with_tax() {
        let totals = compute_totals(&[item(2, "15.00"), item(1, "5.00")], Decimal::from(2));
        assert_eq!(format_money(&totals.subtotal), "$35.00");
        assert_eq!(format_money(&totals.total), "$37.00");
    }

    #[test]
    fn test_total_is_rounded_sum_of_subtotal_and_tax() {
        let totals = compute_totals(&[item(1, "10.10")], Decimal::from_str("0.005").unwrap());
        assert_eq!(totals.tax.to_string(), "0.00");
        assert_eq!(totals.total, round_cents(totals.subtotal + totals.tax));
    }
}
