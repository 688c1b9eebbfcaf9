//! Final validation and correction pass.
//!
//! Clamps quantities and prices to sane ranges, recomputes line totals, and
//! re-enforces the output invariants: the subtotal tracks the item sum and
//! the grand total closes the identity, with a correction recorded for every
//! value that had to move.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::RecrConfig;
use crate::models::receipt::{Correction, CorrectionKind, Receipt};

use super::rules::amounts::round2;

fn eps() -> Decimal {
    Decimal::new(2, 2)
}

/// Validate and correct an assembled receipt in place.
///
/// `tax_explicit` and `grand_labeled` tell the identity enforcement whether
/// the tax amount and grand total were printed on the receipt or derived
/// during reconciliation.
pub fn validate_and_correct(
    receipt: &mut Receipt,
    config: &RecrConfig,
    tax_explicit: bool,
    grand_labeled: bool,
) {
    let extraction = &config.extraction;

    for (index, item) in receipt.items.iter_mut().enumerate() {
        let context = format!("item {}", index + 1);
        let mut touched = false;

        if item.quantity == 0 {
            receipt.corrections.push(Correction::new(
                CorrectionKind::QuantityNonNumeric,
                item.quantity,
                1,
                context.clone(),
            ));
            item.quantity = 1;
            touched = true;
        }
        if item.quantity > extraction.max_quantity {
            receipt.corrections.push(Correction::new(
                CorrectionKind::QuantityCapped,
                item.quantity,
                extraction.max_quantity,
                context.clone(),
            ));
            item.quantity = extraction.max_quantity;
            touched = true;
        }

        if item.unit_price.is_sign_negative() && !item.unit_price.is_zero() {
            receipt.corrections.push(Correction::new(
                CorrectionKind::NegativePriceZeroed,
                item.unit_price,
                Decimal::ZERO,
                context.clone(),
            ));
            item.unit_price = Decimal::ZERO;
            touched = true;
        } else if item.unit_price > Decimal::ZERO && item.unit_price < Decimal::new(1, 2) {
            // Sub-cent noise; zero it without ceremony.
            item.unit_price = Decimal::ZERO;
            touched = true;
        }
        if item.unit_price > Decimal::new(500000, 2) {
            receipt.corrections.push(Correction::new(
                CorrectionKind::PriceSuspicious,
                item.unit_price,
                item.unit_price,
                context.clone(),
            ));
        }

        // The printed line total survives only when nothing above moved.
        if touched || !item.explicit_total || item.line_total.is_sign_negative() {
            item.line_total = round2(Decimal::from(item.quantity) * item.unit_price);
        }
    }

    enforce_totals(receipt, tax_explicit, grand_labeled);

    // Implausible tax ratios are flagged, never silently corrected.
    let base = (receipt.subtotal - receipt.discount_total).max(Decimal::new(1, 2));
    if !receipt.tax_total.is_zero()
        && receipt.tax_total / base > config.reconcile.suspicious_tax_ratio
    {
        receipt.corrections.push(Correction::new(
            CorrectionKind::TaxSuspicious,
            receipt.tax_total,
            receipt.tax_total,
            "tax_ratio",
        ));
    }

    debug!(
        "validated receipt: {} items, {} corrections",
        receipt.items.len(),
        receipt.corrections.len()
    );
}

fn enforce_totals(receipt: &mut Receipt, tax_explicit: bool, grand_labeled: bool) {
    if receipt.items.is_empty() {
        // Nothing purchasable survived extraction; the receipt is zero.
        if !receipt.subtotal.is_zero() {
            receipt.corrections.push(Correction::new(
                CorrectionKind::SubtotalRecomputed,
                receipt.subtotal,
                Decimal::ZERO,
                "no_items",
            ));
        }
        if !receipt.grand_total.is_zero() {
            receipt.corrections.push(Correction::new(
                CorrectionKind::TotalRecomputed,
                receipt.grand_total,
                Decimal::ZERO,
                "no_items",
            ));
        }
        receipt.subtotal = Decimal::ZERO;
        receipt.discount_total = Decimal::ZERO;
        receipt.tax_total = Decimal::ZERO;
        receipt.shipping_total = Decimal::ZERO;
        receipt.grand_total = Decimal::ZERO;
        return;
    }

    // The subtotal always tracks what the items actually sum to.
    let items_sum: Decimal = receipt.items.iter().map(|i| i.line_total).sum();
    let tolerance = eps() * Decimal::from(receipt.items.len() as u64);
    if (items_sum - receipt.subtotal).abs() > tolerance {
        receipt.corrections.push(Correction::new(
            CorrectionKind::SubtotalRecomputed,
            receipt.subtotal,
            items_sum,
            "items_sum",
        ));
        receipt.subtotal = items_sum;
    }

    // A discount larger than everything owed would drive the total negative.
    let charges = receipt.subtotal + receipt.tax_total + receipt.shipping_total;
    let discount_capped = receipt.discount_total > charges;
    if discount_capped {
        receipt.corrections.push(Correction::new(
            CorrectionKind::TotalRecomputed,
            receipt.discount_total,
            charges,
            "discount_exceeds_charges",
        ));
        receipt.discount_total = charges;
    }

    let implied =
        receipt.subtotal - receipt.discount_total + receipt.tax_total + receipt.shipping_total;
    if (receipt.grand_total - implied).abs() > eps() {
        if !tax_explicit && grand_labeled && !discount_capped {
            // Keep the printed total when a non-negative tax can close it.
            let adjusted = receipt.grand_total - receipt.subtotal + receipt.discount_total
                - receipt.shipping_total;
            if adjusted >= Decimal::ZERO {
                receipt.corrections.push(Correction::new(
                    CorrectionKind::TaxEstimated,
                    receipt.tax_total,
                    adjusted,
                    "closed_from_total",
                ));
                receipt.tax_total = adjusted;
                return;
            }
        }
        receipt.corrections.push(Correction::new(
            CorrectionKind::TotalRecomputed,
            receipt.grand_total,
            implied,
            "identity",
        ));
        receipt.grand_total = implied;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::{Category, LineItem};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(quantity: u32, unit_price: &str) -> LineItem {
        let unit_price = dec(unit_price);
        LineItem {
            name: "Item".to_string(),
            quantity,
            unit_price,
            line_total: Decimal::from(quantity) * unit_price,
            category: Category::Other,
            explicit_total: false,
        }
    }

    fn receipt_with(items: Vec<LineItem>) -> Receipt {
        let mut receipt = Receipt::empty(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        receipt.subtotal = items.iter().map(|i| i.line_total).sum();
        receipt.grand_total = receipt.subtotal;
        receipt.items = items;
        receipt
    }

    #[test]
    fn test_suspicious_quantity_and_negative_price() {
        let mut receipt = receipt_with(vec![item(9999, "-2.50")]);
        validate_and_correct(&mut receipt, &RecrConfig::default(), false, false);

        let fixed = &receipt.items[0];
        assert_eq!(fixed.quantity, 100);
        assert_eq!(fixed.unit_price, Decimal::ZERO);
        assert_eq!(fixed.line_total, Decimal::ZERO);
        assert!(receipt.has_correction(CorrectionKind::QuantityCapped));
        assert!(receipt.has_correction(CorrectionKind::NegativePriceZeroed));
        assert_eq!(receipt.subtotal, Decimal::ZERO);
        assert_eq!(receipt.grand_total, Decimal::ZERO);
    }

    #[test]
    fn test_zero_quantity_becomes_one() {
        let mut receipt = receipt_with(vec![item(0, "3.99")]);
        validate_and_correct(&mut receipt, &RecrConfig::default(), false, false);
        assert_eq!(receipt.items[0].quantity, 1);
        assert_eq!(receipt.items[0].line_total, dec("3.99"));
        assert!(receipt.has_correction(CorrectionKind::QuantityNonNumeric));
    }

    #[test]
    fn test_explicit_line_total_preserved_when_untouched() {
        let mut receipt = receipt_with(vec![LineItem {
            name: "Burger".to_string(),
            quantity: 4,
            unit_price: dec("6.00"),
            line_total: dec("23.99"),
            category: Category::Restaurant,
            explicit_total: true,
        }]);
        receipt.subtotal = dec("23.99");
        receipt.grand_total = dec("23.99");
        validate_and_correct(&mut receipt, &RecrConfig::default(), false, false);
        assert_eq!(receipt.items[0].line_total, dec("23.99"));
        assert!(receipt.corrections.is_empty());
    }

    #[test]
    fn test_subtotal_reanchored_to_items() {
        let mut receipt = receipt_with(vec![item(1, "3.99"), item(1, "2.49")]);
        receipt.subtotal = dec("99.00");
        receipt.grand_total = dec("99.00");
        validate_and_correct(&mut receipt, &RecrConfig::default(), false, false);
        assert_eq!(receipt.subtotal, dec("6.48"));
        assert_eq!(receipt.grand_total, dec("6.48"));
        assert!(receipt.has_correction(CorrectionKind::SubtotalRecomputed));
    }

    #[test]
    fn test_oversized_discount_capped() {
        let mut receipt = receipt_with(vec![item(1, "5.00")]);
        receipt.discount_total = dec("20.00");
        validate_and_correct(&mut receipt, &RecrConfig::default(), false, false);
        assert_eq!(receipt.discount_total, dec("5.00"));
        assert_eq!(receipt.grand_total, Decimal::ZERO);
    }

    #[test]
    fn test_high_tax_ratio_flagged_not_corrected() {
        let mut receipt = receipt_with(vec![item(1, "10.00")]);
        receipt.tax_total = dec("3.00");
        receipt.grand_total = dec("13.00");
        validate_and_correct(&mut receipt, &RecrConfig::default(), true, false);
        assert_eq!(receipt.tax_total, dec("3.00"));
        assert!(receipt.has_correction(CorrectionKind::TaxSuspicious));
    }

    #[test]
    fn test_empty_receipt_zeroed() {
        let mut receipt = Receipt::empty(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        receipt.subtotal = dec("10.00");
        receipt.grand_total = dec("10.00");
        validate_and_correct(&mut receipt, &RecrConfig::default(), false, false);
        assert_eq!(receipt.subtotal, Decimal::ZERO);
        assert_eq!(receipt.grand_total, Decimal::ZERO);
        assert!(receipt.has_correction(CorrectionKind::SubtotalRecomputed));
        assert!(receipt.has_correction(CorrectionKind::TotalRecomputed));
    }
}
