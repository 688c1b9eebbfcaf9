//! Receipt data models produced by the interpretation pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fully reconciled receipt.
///
/// Built in a single pipeline call and immutable afterwards. The field names
/// are the wire contract for any serialization the caller chooses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Merchant name, `"Unknown Store"` when no pattern matched.
    pub merchant: String,

    /// How strongly the merchant pattern matched (0.0 - 1.0).
    pub merchant_confidence: f32,

    /// Purchase date. Falls back to the caller-supplied "today" when the
    /// transcript carries no recognizable date.
    pub date: NaiveDate,

    /// Line items in the order they appear in the transcript.
    pub items: Vec<LineItem>,

    /// Sum of item line totals.
    pub subtotal: Decimal,

    /// Accumulated discount magnitude (always non-negative).
    pub discount_total: Decimal,

    /// Accumulated tax amount.
    pub tax_total: Decimal,

    /// Shipping / delivery / handling charges.
    pub shipping_total: Decimal,

    /// The customer-facing total.
    pub grand_total: Decimal,

    /// Detected payment method.
    pub payment_method: PaymentMethod,

    /// Every automated fix applied while interpreting, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Correction>,

    /// Always true for receipts produced by this interpreter.
    pub ocr_parsed: bool,
}

/// A single purchased item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description, cleaned of weight prefixes and OCR garbage.
    pub name: String,

    /// Purchase quantity (1 - 100 after validation).
    pub quantity: u32,

    /// Price per unit (0.00 - 500.00 after validation).
    pub unit_price: Decimal,

    /// Printed or recomputed total for this row.
    pub line_total: Decimal,

    /// Spending category assigned by the categorizer.
    pub category: Category,

    /// Whether `line_total` was taken from the printed row rather than
    /// recomputed from quantity and unit price.
    #[serde(skip)]
    pub explicit_total: bool,
}

/// Spending category for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Groceries,
    Restaurant,
    Pharmacy,
    Retail,
    Other,
}

impl Default for Category {
    fn default() -> Self {
        Self::Other
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
    Unknown,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Locale bias for ambiguous numeric dates such as `03/04/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocaleHint {
    /// Month-first (`MM/DD/YYYY`).
    Us,
    /// Day-first (`DD/MM/YYYY`).
    Intl,
    /// No preference; month-first is tried before day-first.
    None,
}

impl Default for LocaleHint {
    fn default() -> Self {
        Self::None
    }
}

/// An automated fix applied by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// What kind of fix was applied.
    pub kind: CorrectionKind,

    /// Value before the fix.
    pub before: String,

    /// Value after the fix.
    pub after: String,

    /// Where the fix applies: a transcript line, an item index, or a field.
    pub context: String,
}

impl Correction {
    pub fn new(
        kind: CorrectionKind,
        before: impl ToString,
        after: impl ToString,
        context: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            before: before.to_string(),
            after: after.to_string(),
            context: context.into(),
        }
    }
}

/// The complete set of fixes the pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// Merchant matched weakly or not at all.
    MerchantLowConfidence,
    /// No date found; the caller-supplied date was used.
    DateFallback,
    /// Printed line total disagreed with quantity times unit price.
    ItemMathMismatch,
    /// A weight/metadata prefix was removed from an item name.
    WeightPrefixStripped,
    /// A negative unit price was set to zero.
    NegativePriceZeroed,
    /// A price outside the plausible range was flagged.
    PriceSuspicious,
    /// A non-numeric or non-positive quantity was set to one.
    QuantityNonNumeric,
    /// An implausibly large quantity was clamped.
    QuantityCapped,
    /// The subtotal was recomputed from the items.
    SubtotalRecomputed,
    /// The grand total was recomputed from the identity.
    TotalRecomputed,
    /// The tax amount was estimated rather than read from the transcript.
    TaxEstimated,
    /// The tax amount looks implausible but was left as printed.
    TaxSuspicious,
    /// A discount printed with a negative sign was folded into the magnitude.
    DiscountSignFixed,
    /// A line that looked item-shaped was discarded after cleaning.
    LineDiscardedNonItem,
}

impl Receipt {
    /// Create an empty receipt dated `today`.
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            merchant: "Unknown Store".to_string(),
            merchant_confidence: 0.0,
            date: today,
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            discount_total: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            shipping_total: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            payment_method: PaymentMethod::Unknown,
            corrections: Vec::new(),
            ocr_parsed: true,
        }
    }

    /// Check whether a correction of the given kind was recorded.
    pub fn has_correction(&self, kind: CorrectionKind) -> bool {
        self.corrections.iter().any(|c| c.kind == kind)
    }

    /// Validate the receipt arithmetic and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let eps = Decimal::new(2, 2);

        if self.merchant.is_empty() {
            issues.push("Missing merchant name".to_string());
        }

        let items_sum: Decimal = self.items.iter().map(|i| i.line_total).sum();
        let tolerance = eps * Decimal::from(self.items.len().max(1) as u64);
        if (items_sum - self.subtotal).abs() > tolerance {
            issues.push(format!(
                "Item total ({}) differs from subtotal ({})",
                items_sum, self.subtotal
            ));
        }

        let implied =
            self.subtotal - self.discount_total + self.tax_total + self.shipping_total;
        if (self.grand_total - implied).abs() > eps {
            issues.push(format!(
                "Grand total ({}) differs from implied total ({})",
                self.grand_total, implied
            ));
        }

        for (i, item) in self.items.iter().enumerate() {
            if item.quantity == 0 || item.quantity > 100 {
                issues.push(format!("Item {} has implausible quantity {}", i + 1, item.quantity));
            }
            if item.unit_price.is_sign_negative() || item.unit_price > Decimal::new(50000, 2) {
                issues.push(format!(
                    "Item {} has implausible unit price {}",
                    i + 1,
                    item.unit_price
                ));
            }
            if item.line_total.is_sign_negative() {
                issues.push(format!("Item {} has negative line total", i + 1));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_receipt_is_consistent() {
        let receipt = Receipt::empty(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert!(receipt.validate().is_empty());
        assert_eq!(receipt.merchant, "Unknown Store");
        assert!(receipt.ocr_parsed);
    }

    #[test]
    fn test_wire_field_names() {
        let mut receipt = Receipt::empty(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        receipt.items.push(LineItem {
            name: "Milk".to_string(),
            quantity: 1,
            unit_price: Decimal::new(399, 2),
            line_total: Decimal::new(399, 2),
            category: Category::Groceries,
            explicit_total: false,
        });
        receipt.subtotal = Decimal::new(399, 2);
        receipt.grand_total = Decimal::new(399, 2);

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["merchant"], "Unknown Store");
        assert_eq!(json["items"][0]["name"], "Milk");
        assert_eq!(json["items"][0]["unit_price"], "3.99");
        assert_eq!(json["items"][0]["category"], "groceries");
        assert_eq!(json["payment_method"], "unknown");
        assert_eq!(json["ocr_parsed"], true);
        assert_eq!(json["date"], "2024-01-10");
    }

    #[test]
    fn test_validate_flags_imbalance() {
        let mut receipt = Receipt::empty(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        receipt.subtotal = Decimal::new(1000, 2);
        let issues = receipt.validate();
        assert_eq!(issues.len(), 2); // item sum and identity both off
    }

    #[test]
    fn test_correction_kind_wire_names() {
        let correction = Correction::new(
            CorrectionKind::SubtotalRecomputed,
            "0.00",
            "6.48",
            "items",
        );
        let json = serde_json::to_value(&correction).unwrap();
        assert_eq!(json["kind"], "subtotal_recomputed");
    }
}
