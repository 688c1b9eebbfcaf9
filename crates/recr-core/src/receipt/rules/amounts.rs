//! Price lexing and labeled financial amounts.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::debug;

use crate::models::receipt::{Correction, CorrectionKind, PaymentMethod};

use super::patterns::{
    DISCOUNT_LABEL, GRAND_TOTAL_LABEL, PAYMENT_CASH, PAYMENT_CREDIT, PAYMENT_DEBIT, PRICE_TOKEN,
    SHIPPING_LABEL, SUBTOTAL_LABEL, TAX_LABEL,
};

/// Round to cents, away from zero on midpoints.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a lexed price token such as `$1,234.56` or `-$15.00`.
///
/// Currency symbols and thousands separators are dropped; a minus on either
/// side of the symbol makes the amount negative.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let negative = token.contains('-');
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// Financial amounts read off labeled transcript lines.
///
/// Discounts, taxes, and shipping accumulate across lines; the first labeled
/// subtotal and the last labeled grand total win.
#[derive(Debug, Clone, Default)]
pub struct LabeledAmounts {
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub grand_total: Option<Decimal>,
    /// Whether the tax amount was printed rather than derived.
    pub tax_explicit: bool,
}

/// Scan the full transcript for labeled financial amounts.
///
/// Item lines are scanned too; some receipts put totals inline.
pub fn extract_labeled_amounts(transcript: &str) -> (LabeledAmounts, Vec<Correction>) {
    let mut amounts = LabeledAmounts::default();
    let mut corrections = Vec::new();

    for (idx, line) in transcript.lines().enumerate() {
        let lineno = idx + 1;

        if let Some(m) = SUBTOTAL_LABEL.find(line) {
            if amounts.subtotal.is_none() {
                if let Some(value) = amount_after(line, m.end()) {
                    amounts.subtotal = Some(value.abs());
                }
            }
        } else if let Some(m) = DISCOUNT_LABEL.find(line) {
            if let Some(value) = amount_after(line, m.end()) {
                let negative = value.is_sign_negative() || parenthesized(line);
                if negative {
                    corrections.push(Correction::new(
                        CorrectionKind::DiscountSignFixed,
                        -value.abs(),
                        value.abs(),
                        format!("line {}", lineno),
                    ));
                }
                amounts.discount = Some(amounts.discount.unwrap_or(Decimal::ZERO) + value.abs());
            }
        } else if let Some(m) = TAX_LABEL.find(line) {
            if let Some(value) = amount_after(line, m.end()) {
                amounts.tax = Some(amounts.tax.unwrap_or(Decimal::ZERO) + value.abs());
                amounts.tax_explicit = true;
            }
        } else if let Some(m) = SHIPPING_LABEL.find(line) {
            if let Some(value) = amount_after(line, m.end()) {
                amounts.shipping =
                    Some(amounts.shipping.unwrap_or(Decimal::ZERO) + value.abs());
            }
        } else if let Some(m) = GRAND_TOTAL_LABEL.find(line) {
            if let Some(value) = amount_after(line, m.end()) {
                // Last labeled total wins.
                amounts.grand_total = Some(value.abs());
            }
        }
    }

    debug!(
        "labeled amounts: subtotal={:?} discount={:?} tax={:?} shipping={:?} total={:?}",
        amounts.subtotal, amounts.discount, amounts.tax, amounts.shipping, amounts.grand_total
    );

    (amounts, corrections)
}

/// The last price token after a label match.
fn amount_after(line: &str, label_end: usize) -> Option<Decimal> {
    PRICE_TOKEN
        .find_iter(&line[label_end..])
        .last()
        .and_then(|m| parse_amount(m.as_str()))
}

fn parenthesized(line: &str) -> bool {
    match (line.find('('), line.rfind(')')) {
        (Some(open), Some(close)) => {
            open < close && PRICE_TOKEN.is_match(&line[open..=close.min(line.len() - 1)])
        }
        _ => false,
    }
}

/// Detect how the receipt was paid. Debit markers win over credit, credit
/// over cash.
pub fn extract_payment_method(transcript: &str) -> PaymentMethod {
    if PAYMENT_DEBIT.is_match(transcript) {
        PaymentMethod::Debit
    } else if PAYMENT_CREDIT.is_match(transcript) {
        PaymentMethod::Credit
    } else if PAYMENT_CASH.is_match(transcript) {
        PaymentMethod::Cash
    } else {
        PaymentMethod::Unknown
    }
}
