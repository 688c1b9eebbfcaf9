//! Compiled regex patterns for receipt transcript interpretation.

use lazy_static::lazy_static;
use regex::Regex;

// A printed price: up to five integer digits, optional comma-grouped
// thousands, exactly two fractional digits, optional currency symbol, with a
// minus tolerated on either side of the symbol.
macro_rules! price {
    () => {
        r"-?[$€£]?-?\b\d{1,5}(?:,\d{3})*\.\d{2}\b"
    };
}

// Weight/metadata annotation such as `0.778kg NET @ $5.99/kg`.
macro_rules! weight {
    () => {
        r"(?i)^\d+(?:\.\d+)?\s*(?:kg|g|lbs|lb|oz)\s*(?:net\s*)?@\s*-?[$€£]?-?\b\d{1,5}(?:,\d{3})*\.\d{2}\b\s*/\s*(?:kg|g|lbs|lb|oz)"
    };
}

lazy_static! {
    /// Any price token, used for scanning.
    pub static ref PRICE_TOKEN: Regex = Regex::new(price!()).unwrap();

    // --- Item line shapes, matched in cascade order ---

    /// `QTY NAME UNIT_PRICE LINE_TOTAL` (an `x` after the quantity is tolerated).
    pub static ref ITEM_QTY_UNIT_TOTAL: Regex = Regex::new(concat!(
        r"^(\d{1,4})(?:\s*[x×])?\s+(.+?)\s+(", price!(), r")\s+(", price!(), r")$"
    ))
    .unwrap();

    /// `QTY x NAME PRICE` where the price is the line total.
    pub static ref ITEM_QTY_X_PRICE: Regex = Regex::new(concat!(
        r"^(\d{1,4})\s*[x×]\s+(.+?)\s+(", price!(), r")$"
    ))
    .unwrap();

    /// `NAME .... PRICE` with a dot or dash leader.
    pub static ref ITEM_LEADER_PRICE: Regex = Regex::new(concat!(
        r"^(.+?)\s*[.·\-]{2,}\s*(", price!(), r")$"
    ))
    .unwrap();

    /// `NAME PRICE` with no quantity column.
    pub static ref ITEM_NAME_PRICE: Regex = Regex::new(concat!(
        r"^(.+?)\s+(", price!(), r")$"
    ))
    .unwrap();

    /// `NAME UNIT_PRICE LINE_TOTAL` with no leading quantity.
    pub static ref ITEM_TWO_PRICES: Regex = Regex::new(concat!(
        r"^(.+?)\s+(", price!(), r")\s+(", price!(), r")$"
    ))
    .unwrap();

    /// A line that starts with a bare integer token.
    pub static ref LEADING_INTEGER: Regex = Regex::new(r"^\d{1,5}\s").unwrap();

    // --- Weight annotations ---

    /// A line that is nothing but a weight annotation.
    pub static ref WEIGHT_ONLY: Regex =
        Regex::new(concat!(weight!(), r"\s*$")).unwrap();

    /// A weight annotation prefixing an item line.
    pub static ref WEIGHT_PREFIX: Regex = Regex::new(weight!()).unwrap();

    // --- Line classification ---

    /// Receipt-meta keywords that mark a non-item line.
    pub static ref SKIP_LINE: Regex = Regex::new(
        r"(?i)\b(?:sub\s*-?\s*total|total|tax|gst|pst|hst|qst|vat|amount|balance|change|tender|payment|cash|credit|debit|card|visa|mastercard|amex|receipt|transaction|invoice|order|discount|coupon|savings|loyalty|refund|signature|approved|declined|ref\s*num|cashier|thank|visit|tip|fee|received|remaining|due|paid)\b"
    )
    .unwrap();

    /// Promotional copy that sneaks onto receipts between items.
    pub static ref PROMO_LINE: Regex = Regex::new(
        r"(?i)\b(?:take\s+home|made\s+from|authentic|taste\s+of|limited\s+time|offer|sale)\b"
    )
    .unwrap();

    /// Financial anchor: item scanning stops after this keyword plus a price.
    pub static ref STOP_ANCHOR: Regex =
        Regex::new(r"(?i)\b(?:grand\s+total|amount\s+due|balance|total)\b").unwrap();

    // --- Financial labels ---

    pub static ref SUBTOTAL_LABEL: Regex =
        Regex::new(r"(?i)\bsub\s*-?\s*total\b").unwrap();

    pub static ref TAX_LABEL: Regex =
        Regex::new(r"(?i)\b(?:tax|gst|pst|hst|qst|vat)\b").unwrap();

    pub static ref SHIPPING_LABEL: Regex =
        Regex::new(r"(?i)\b(?:shipping|delivery|handling|service\s+fee)\b").unwrap();

    pub static ref DISCOUNT_LABEL: Regex =
        Regex::new(r"(?i)\b(?:discount|coupon|savings|loyalty|member)\b").unwrap();

    pub static ref GRAND_TOTAL_LABEL: Regex = Regex::new(
        r"(?i)\b(?:grand\s+total|total\s+to\s+pay|amount\s+due|balance\s+due|total)\b"
    )
    .unwrap();

    // --- Dates ---

    pub static ref DATE_ISO: Regex =
        Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap();

    pub static ref DATE_SLASH: Regex =
        Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").unwrap();

    pub static ref DATE_DASH: Regex =
        Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b").unwrap();

    pub static ref DATE_DOT: Regex =
        Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{2,4})\b").unwrap();

    pub static ref DATE_MONTH_FIRST: Regex = Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    )
    .unwrap();

    pub static ref DATE_DAY_FIRST: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b"
    )
    .unwrap();

    // --- Payment methods ---

    pub static ref PAYMENT_DEBIT: Regex =
        Regex::new(r"(?i)\b(?:debit|interac)\b").unwrap();

    pub static ref PAYMENT_CREDIT: Regex =
        Regex::new(r"(?i)\b(?:credit|visa|master\s*card|amex|american\s+express)\b").unwrap();

    pub static ref PAYMENT_CASH: Regex = Regex::new(r"(?i)\bcash\b").unwrap();

    // --- Name cleaning ---

    /// Leading quantity-like digit run in an item name.
    pub static ref NAME_LEADING_DIGITS: Regex = Regex::new(r"^\d+\s+").unwrap();

    /// A name needs at least two consecutive letters to survive cleaning.
    pub static ref NAME_HAS_WORD: Regex = Regex::new(r"[A-Za-z]{2,}").unwrap();

    // --- Multi-line price fusion ---

    /// Orphan integer token at the end of a line (a wrapped price's head).
    pub static ref ORPHAN_TAIL: Regex = Regex::new(r"(?:^|\s)(\d{1,5})$").unwrap();

    /// The continuation of a wrapped price at the start of the next line.
    pub static ref FRAGMENT_HEAD: Regex =
        Regex::new(r"^(\.\d{2}|,\d{3}\.\d{2})\b").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_token_shapes() {
        assert!(PRICE_TOKEN.is_match("5.99"));
        assert!(PRICE_TOKEN.is_match("$1,234.56"));
        assert!(PRICE_TOKEN.is_match("-$15.00"));
        assert!(PRICE_TOKEN.is_match("£3.20"));
        assert!(!PRICE_TOKEN.is_match("5.9"));
        assert!(!PRICE_TOKEN.is_match("1.234"));
        assert!(!PRICE_TOKEN.is_match("no numbers"));
    }

    #[test]
    fn test_price_token_rejects_long_integer_part() {
        assert!(!PRICE_TOKEN.is_match("1234567.89"));
    }

    #[test]
    fn test_weight_only_line() {
        assert!(WEIGHT_ONLY.is_match("0.778kg NET @ $5.99/kg"));
        assert!(WEIGHT_ONLY.is_match("1.5 lb @ 2.99/lb"));
        assert!(!WEIGHT_ONLY.is_match("0.778kg NET @ $5.99/kg BANANA $1.32"));
    }

    #[test]
    fn test_skip_line_keywords() {
        assert!(SKIP_LINE.is_match("Subtotal: 31.43"));
        assert!(SKIP_LINE.is_match("GST 5%"));
        assert!(SKIP_LINE.is_match("Thank you for shopping"));
        assert!(!SKIP_LINE.is_match("Cheese Burger"));
        // `cashier` is a skip word but `cash` must not fire inside it alone
        assert!(SKIP_LINE.is_match("Cashier: #14"));
    }

    #[test]
    fn test_grand_total_label_does_not_match_subtotal_word() {
        assert!(!GRAND_TOTAL_LABEL.is_match("Subtotal"));
        assert!(GRAND_TOTAL_LABEL.is_match("Total to Pay"));
        assert!(GRAND_TOTAL_LABEL.is_match("TOTAL"));
    }

    #[test]
    fn test_orphan_tail_excludes_full_prices() {
        assert!(ORPHAN_TAIL.is_match("Bulk Coffee 10"));
        assert!(!ORPHAN_TAIL.is_match("Bulk Coffee 10.99"));
    }
}
