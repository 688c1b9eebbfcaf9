//! Financial reconciliation.
//!
//! Closes the identity `grand = subtotal - discount + tax + shipping` from
//! whatever labeled amounts the transcript yielded, filling gaps from the
//! item sum and recording every adjustment.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::ReconcileConfig;
use crate::models::receipt::{Correction, CorrectionKind};

use super::rules::amounts::{round2, LabeledAmounts};

/// Reconciled financial totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub shipping_total: Decimal,
    pub grand_total: Decimal,
}

fn eps() -> Decimal {
    Decimal::new(2, 2)
}

/// Close the arithmetic over the labeled amounts and the item sum.
pub fn reconcile(
    labeled: &LabeledAmounts,
    items_total: Decimal,
    config: &ReconcileConfig,
) -> (Totals, Vec<Correction>) {
    let mut corrections = Vec::new();

    let mut subtotal = labeled.subtotal;
    let discount = labeled.discount.unwrap_or(Decimal::ZERO);
    let mut tax = labeled.tax;
    let shipping = labeled.shipping.unwrap_or(Decimal::ZERO);
    let mut grand = labeled.grand_total;

    // Fully labeled and already balanced: nothing to do.
    let fully_labeled = subtotal.is_some()
        && tax.is_some()
        && labeled.shipping.is_some()
        && grand.is_some();
    let balanced = match (subtotal, grand) {
        (Some(s), Some(g)) => {
            (g - (s - discount + tax.unwrap_or(Decimal::ZERO) + shipping)).abs() <= eps()
        }
        _ => false,
    };

    if !(fully_labeled && balanced) {
        // Missing subtotal comes from the items.
        if subtotal.is_none() && items_total > Decimal::ZERO {
            subtotal = Some(items_total);
            corrections.push(Correction::new(
                CorrectionKind::SubtotalRecomputed,
                Decimal::ZERO,
                items_total,
                "items",
            ));
        }

        // Printed total disagrees with the implied one.
        if let (Some(g), Some(s)) = (grand, subtotal) {
            let implied = s - discount + tax.unwrap_or(Decimal::ZERO) + shipping;
            if (g - implied).abs() > eps() {
                if !labeled.tax_explicit {
                    // The printed total is the customer-facing number; close
                    // the gap through the tax amount.
                    let adjusted = g - s + discount - shipping;
                    if adjusted >= Decimal::ZERO {
                        corrections.push(Correction::new(
                            CorrectionKind::TaxEstimated,
                            tax.unwrap_or(Decimal::ZERO),
                            adjusted,
                            "closed_from_total",
                        ));
                        tax = Some(adjusted);
                    } else {
                        // No non-negative tax can close this; the total is
                        // irreconcilable with the items.
                        corrections.push(Correction::new(
                            CorrectionKind::TaxEstimated,
                            tax.unwrap_or(Decimal::ZERO),
                            Decimal::ZERO,
                            "closed_from_total",
                        ));
                        tax = Some(Decimal::ZERO);
                        let recomputed = s - discount + shipping;
                        corrections.push(Correction::new(
                            CorrectionKind::TotalRecomputed,
                            g,
                            recomputed,
                            "identity",
                        ));
                        grand = Some(recomputed);
                    }
                } else if items_total > Decimal::ZERO {
                    // The tax was printed and the subtotal is anchored to the
                    // items; the printed total loses, and the conflict is
                    // surfaced for review.
                    let t = tax.unwrap_or(Decimal::ZERO);
                    let recomputed = s - discount + t + shipping;
                    corrections.push(Correction::new(
                        CorrectionKind::TotalRecomputed,
                        g,
                        recomputed,
                        "identity",
                    ));
                    corrections.push(Correction::new(
                        CorrectionKind::TaxSuspicious,
                        t,
                        t,
                        "printed_total_conflict",
                    ));
                    grand = Some(recomputed);
                } else {
                    // No items to anchor on: trust the printed total and tax,
                    // adjust the subtotal.
                    let t = tax.unwrap_or(Decimal::ZERO);
                    let adjusted = (g - t - shipping + discount).max(Decimal::ZERO);
                    corrections.push(Correction::new(
                        CorrectionKind::SubtotalRecomputed,
                        s,
                        adjusted,
                        "identity",
                    ));
                    subtotal = Some(adjusted);
                }
            }
        }

        // Missing grand total comes from the identity.
        if grand.is_none() {
            let g = (subtotal.unwrap_or(Decimal::ZERO) - discount
                + tax.unwrap_or(Decimal::ZERO)
                + shipping)
                .max(Decimal::ZERO);
            let anything_labeled = subtotal.is_some()
                || labeled.tax.is_some()
                || labeled.shipping.is_some()
                || labeled.discount.is_some();
            if anything_labeled {
                corrections.push(Correction::new(
                    CorrectionKind::TotalRecomputed,
                    Decimal::ZERO,
                    g,
                    "identity",
                ));
            }
            grand = Some(g);
        }

        // Missing tax comes from the identity or the default rate.
        if tax.is_none() {
            tax = Some(match (grand, subtotal) {
                (Some(g), Some(s)) => (g - s + discount - shipping).max(Decimal::ZERO),
                (_, Some(s)) => {
                    let estimated = round2(config.default_tax_rate * (s - discount));
                    corrections.push(Correction::new(
                        CorrectionKind::TaxEstimated,
                        Decimal::ZERO,
                        estimated,
                        "default_rate",
                    ));
                    estimated
                }
                _ => Decimal::ZERO,
            });
        }
    }

    let totals = Totals {
        subtotal: subtotal.unwrap_or(Decimal::ZERO),
        discount_total: discount,
        tax_total: tax.unwrap_or(Decimal::ZERO),
        shipping_total: shipping,
        grand_total: grand.unwrap_or(Decimal::ZERO),
    };

    debug!(
        "reconciled subtotal={} discount={} tax={} shipping={} total={}",
        totals.subtotal,
        totals.discount_total,
        totals.tax_total,
        totals.shipping_total,
        totals.grand_total
    );

    (totals, corrections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn labeled(
        subtotal: Option<&str>,
        discount: Option<&str>,
        tax: Option<&str>,
        shipping: Option<&str>,
        grand: Option<&str>,
    ) -> LabeledAmounts {
        LabeledAmounts {
            subtotal: subtotal.map(dec),
            discount: discount.map(dec),
            tax: tax.map(dec),
            shipping: shipping.map(dec),
            grand_total: grand.map(dec),
            tax_explicit: tax.is_some(),
        }
    }

    fn run(amounts: LabeledAmounts, items: &str) -> (Totals, Vec<Correction>) {
        reconcile(&amounts, dec(items), &ReconcileConfig::default())
    }

    #[test]
    fn test_balanced_receipt_untouched() {
        let (totals, corrections) = run(
            labeled(Some("30.93"), None, Some("3.09"), Some("0.00"), Some("34.02")),
            "30.93",
        );
        assert_eq!(totals.grand_total, dec("34.02"));
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_missing_subtotal_from_items() {
        let (totals, corrections) = run(labeled(None, None, None, None, None), "6.48");
        assert_eq!(totals.subtotal, dec("6.48"));
        assert_eq!(totals.grand_total, dec("6.48"));
        assert_eq!(totals.tax_total, dec("0.00"));
        assert!(corrections
            .iter()
            .any(|c| c.kind == CorrectionKind::SubtotalRecomputed));
        assert!(corrections
            .iter()
            .any(|c| c.kind == CorrectionKind::TotalRecomputed));
    }

    #[test]
    fn test_missing_total_with_discount() {
        let (totals, corrections) = run(
            labeled(Some("39.20"), Some("15.00"), None, None, None),
            "39.20",
        );
        assert_eq!(totals.grand_total, dec("24.20"));
        assert_eq!(totals.tax_total, dec("0.00"));
        assert!(corrections
            .iter()
            .any(|c| c.kind == CorrectionKind::TotalRecomputed));
        assert!(!corrections.iter().any(|c| c.kind == CorrectionKind::TaxEstimated));
    }

    #[test]
    fn test_unlabeled_tax_closed_from_total() {
        let (totals, corrections) = run(
            labeled(Some("31.43"), None, None, None, Some("34.02")),
            "31.43",
        );
        assert_eq!(totals.tax_total, dec("2.59"));
        assert_eq!(totals.grand_total, dec("34.02"));
        assert!(corrections.iter().any(|c| c.kind == CorrectionKind::TaxEstimated));
    }

    #[test]
    fn test_labeled_tax_conflict_surfaced() {
        // Items say 6.48, the printed tax says 0.52, the printed total says
        // 6.00. The identity wins and the conflict is flagged.
        let (totals, corrections) =
            run(labeled(None, None, Some("0.52"), None, Some("6.00")), "6.48");
        assert_eq!(totals.subtotal, dec("6.48"));
        assert_eq!(totals.tax_total, dec("0.52"));
        assert_eq!(totals.grand_total, dec("7.00"));
        assert!(corrections
            .iter()
            .any(|c| c.kind == CorrectionKind::SubtotalRecomputed));
        assert!(corrections
            .iter()
            .any(|c| c.kind == CorrectionKind::TotalRecomputed));
        assert!(corrections
            .iter()
            .any(|c| c.kind == CorrectionKind::TaxSuspicious));
    }

    #[test]
    fn test_no_items_trusts_printed_total() {
        let (totals, corrections) = run(
            labeled(Some("10.00"), None, Some("0.50"), None, Some("9.00")),
            "0.00",
        );
        assert_eq!(totals.subtotal, dec("8.50"));
        assert_eq!(totals.grand_total, dec("9.00"));
        assert!(corrections
            .iter()
            .any(|c| c.kind == CorrectionKind::SubtotalRecomputed));
    }

    #[test]
    fn test_missing_tax_from_identity() {
        let (totals, _) = run(
            labeled(Some("20.00"), None, None, Some("5.00"), Some("27.00")),
            "20.00",
        );
        assert_eq!(totals.tax_total, dec("2.00"));
    }

    #[test]
    fn test_shipping_in_identity() {
        let (totals, corrections) = run(
            labeled(Some("899.93"), None, Some("95.00"), Some("50.00"), Some("1044.93")),
            "899.93",
        );
        assert_eq!(totals.grand_total, dec("1044.93"));
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_empty_everything() {
        let (totals, corrections) = run(labeled(None, None, None, None, None), "0.00");
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.grand_total, Decimal::ZERO);
        assert!(corrections.is_empty());
    }
}
