//! Line-item extraction.
//!
//! Each transcript line is classified as an item line, a skip line, or a
//! financial line, and item candidates run through an ordered cascade of
//! shape matchers. The first matcher that recognizes the line wins.

use lazy_static::lazy_static;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::models::config::ExtractionConfig;
use crate::models::receipt::{Correction, CorrectionKind};

use super::amounts::{parse_amount, round2};
use super::patterns::{
    DISCOUNT_LABEL, FRAGMENT_HEAD, ITEM_LEADER_PRICE, ITEM_NAME_PRICE, ITEM_QTY_UNIT_TOTAL,
    ITEM_QTY_X_PRICE, ITEM_TWO_PRICES, LEADING_INTEGER, NAME_HAS_WORD, NAME_LEADING_DIGITS,
    ORPHAN_TAIL, PRICE_TOKEN, PROMO_LINE, SHIPPING_LABEL, SKIP_LINE, STOP_ANCHOR, WEIGHT_ONLY,
    WEIGHT_PREFIX,
};

/// Characters that signal OCR garbage when they pile up on a line.
const NOISE_CHARS: &str = "—=*~@#$%^&()[]{}|\\<>";

/// One recognized item row, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMatch {
    pub quantity: u32,
    pub name: String,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// The printed line total is authoritative for this row.
    pub explicit_total: bool,
    /// Unit price as printed, when the row's math disagreed and the unit
    /// price was recomputed from the printed total.
    pub printed_unit_price: Option<Decimal>,
}

/// A shape matcher in the cascade. Matchers are pure: classification and
/// cleanup happen around them.
pub trait LineMatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_match(&self, line: &str) -> Option<ItemMatch>;
}

/// `QTY NAME UNIT_PRICE LINE_TOTAL`
struct QtyUnitTotal;

impl LineMatcher for QtyUnitTotal {
    fn name(&self) -> &'static str {
        "qty_unit_total"
    }

    fn try_match(&self, line: &str) -> Option<ItemMatch> {
        let caps = ITEM_QTY_UNIT_TOTAL.captures(line)?;
        let quantity: u32 = caps[1].parse().unwrap_or(0);
        let unit_price = parse_amount(&caps[3])?;
        let line_total = parse_amount(&caps[4])?;

        let expected = Decimal::from(quantity) * unit_price;
        let mismatch = (expected - line_total).abs() > Decimal::new(2, 2);
        let (unit_price, printed) = if mismatch {
            let divisor = Decimal::from(quantity.max(1));
            (round2(line_total / divisor), Some(unit_price))
        } else {
            (unit_price, None)
        };

        Some(ItemMatch {
            quantity,
            name: caps[2].to_string(),
            unit_price,
            line_total,
            explicit_total: true,
            printed_unit_price: printed,
        })
    }
}

/// `QTY x NAME PRICE` where the price is the line total.
struct QtyTimesPrice;

impl LineMatcher for QtyTimesPrice {
    fn name(&self) -> &'static str {
        "qty_x_price"
    }

    fn try_match(&self, line: &str) -> Option<ItemMatch> {
        let caps = ITEM_QTY_X_PRICE.captures(line)?;
        let name = &caps[2];
        if PRICE_TOKEN.is_match(name) {
            return None;
        }
        let quantity: u32 = caps[1].parse().unwrap_or(0);
        let line_total = parse_amount(&caps[3])?;

        Some(ItemMatch {
            quantity,
            name: name.to_string(),
            unit_price: round2(line_total / Decimal::from(quantity.max(1))),
            line_total,
            explicit_total: true,
            printed_unit_price: None,
        })
    }
}

/// `NAME .... PRICE` with a dot or dash leader.
struct LeaderPrice;

impl LineMatcher for LeaderPrice {
    fn name(&self) -> &'static str {
        "leader_price"
    }

    fn try_match(&self, line: &str) -> Option<ItemMatch> {
        let caps = ITEM_LEADER_PRICE.captures(line)?;
        let name = &caps[1];
        if PRICE_TOKEN.is_match(name) {
            return None;
        }
        let price = parse_amount(&caps[2])?;

        Some(ItemMatch {
            quantity: 1,
            name: name.to_string(),
            unit_price: price,
            line_total: price,
            explicit_total: false,
            printed_unit_price: None,
        })
    }
}

/// `NAME PRICE` with no quantity column.
struct NamePrice;

impl LineMatcher for NamePrice {
    fn name(&self) -> &'static str {
        "name_price"
    }

    fn try_match(&self, line: &str) -> Option<ItemMatch> {
        let caps = ITEM_NAME_PRICE.captures(line)?;
        let name = &caps[1];
        // A price inside the name means this is really a two-price row.
        if PRICE_TOKEN.is_match(name) {
            return None;
        }
        let price = parse_amount(&caps[2])?;

        Some(ItemMatch {
            quantity: 1,
            name: name.to_string(),
            unit_price: price,
            line_total: price,
            explicit_total: false,
            printed_unit_price: None,
        })
    }
}

/// `NAME UNIT_PRICE LINE_TOTAL` with no leading quantity.
struct TwoPrices;

impl LineMatcher for TwoPrices {
    fn name(&self) -> &'static str {
        "two_prices"
    }

    fn try_match(&self, line: &str) -> Option<ItemMatch> {
        if LEADING_INTEGER.is_match(line) {
            return None;
        }
        let caps = ITEM_TWO_PRICES.captures(line)?;
        let name = &caps[1];
        if PRICE_TOKEN.is_match(name) {
            return None;
        }
        let unit_price = parse_amount(&caps[2])?;
        let line_total = parse_amount(&caps[3])?;

        Some(ItemMatch {
            quantity: 1,
            name: name.to_string(),
            unit_price,
            line_total,
            explicit_total: true,
            printed_unit_price: None,
        })
    }
}

lazy_static! {
    static ref MATCHERS: Vec<Box<dyn LineMatcher>> = vec![
        Box::new(QtyUnitTotal),
        Box::new(QtyTimesPrice),
        Box::new(LeaderPrice),
        Box::new(NamePrice),
        Box::new(TwoPrices),
    ];
}

/// An extracted item with its transcript position.
#[derive(Debug, Clone)]
pub struct ExtractedItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub explicit_total: bool,
    pub source_line: usize,
}

/// Result of scanning a transcript for item lines.
#[derive(Debug, Default)]
pub struct ItemExtraction {
    pub items: Vec<ExtractedItem>,
    pub corrections: Vec<Correction>,
}

/// Scan the transcript line by line and extract item rows in order.
pub fn extract_items(transcript: &str, config: &ExtractionConfig) -> ItemExtraction {
    let mut extraction = ItemExtraction::default();
    let lines: Vec<&str> = transcript.lines().collect();
    let mut stopped = false;
    let mut skip_next = false;

    for (idx, raw) in lines.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }

        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let lineno = idx + 1;

        if stopped {
            continue;
        }
        if is_financial_anchor(line) {
            stopped = true;
            continue;
        }
        if WEIGHT_ONLY.is_match(line) {
            trace!("line {}: weight annotation", lineno);
            continue;
        }
        if SKIP_LINE.is_match(line)
            || PROMO_LINE.is_match(line)
            || SHIPPING_LABEL.is_match(line)
            || DISCOUNT_LABEL.is_match(line)
        {
            trace!("line {}: skip line", lineno);
            continue;
        }

        let mut candidate = line.to_string();

        // A weight prefix annotates the item on the same line; peel it off.
        let stripped = WEIGHT_PREFIX
            .find(&candidate)
            .map(|m| candidate[m.end()..].trim().to_string());
        if let Some(rest) = stripped {
            if !rest.is_empty() {
                extraction.corrections.push(Correction::new(
                    CorrectionKind::WeightPrefixStripped,
                    &candidate,
                    &rest,
                    format!("line {}", lineno),
                ));
                candidate = rest;
            }
        }

        if noise_count(&candidate) > 3 {
            trace!("line {}: OCR noise", lineno);
            continue;
        }
        if candidate.len() > config.max_line_length {
            extraction.corrections.push(Correction::new(
                CorrectionKind::LineDiscardedNonItem,
                format!("{} chars", candidate.len()),
                "",
                format!("line {}", lineno),
            ));
            continue;
        }

        // A price wrapped across lines leaves an orphan integer here and the
        // fraction on the next line; fuse them before matching.
        if ORPHAN_TAIL.is_match(&candidate) {
            let fragment = lines
                .get(idx + 1)
                .and_then(|next| FRAGMENT_HEAD.find(next.trim()))
                .map(|m| m.as_str().to_string());
            if let Some(fragment) = fragment {
                candidate.push_str(&fragment);
                skip_next = true;
            }
        }

        if let Some(item) = match_candidate(&candidate, lineno, config, &mut extraction.corrections)
        {
            extraction.items.push(item);
        }
    }

    debug!("extracted {} items", extraction.items.len());
    extraction
}

fn match_candidate(
    line: &str,
    lineno: usize,
    config: &ExtractionConfig,
    corrections: &mut Vec<Correction>,
) -> Option<ExtractedItem> {
    let context = format!("line {}", lineno);

    for matcher in MATCHERS.iter() {
        let Some(mut item) = matcher.try_match(line) else {
            continue;
        };
        trace!("line {}: matched {}", lineno, matcher.name());

        let name = match clean_name(&item.name) {
            Some(name) => name,
            None => {
                corrections.push(Correction::new(
                    CorrectionKind::LineDiscardedNonItem,
                    &item.name,
                    "",
                    context,
                ));
                return None;
            }
        };

        if let Some(printed) = item.printed_unit_price {
            corrections.push(Correction::new(
                CorrectionKind::ItemMathMismatch,
                printed,
                item.unit_price,
                context.clone(),
            ));
        }

        if item.unit_price > config.max_unit_price {
            corrections.push(Correction::new(
                CorrectionKind::PriceSuspicious,
                item.unit_price,
                config.max_unit_price,
                context.clone(),
            ));
            item.unit_price = config.max_unit_price;
            if !item.explicit_total {
                item.line_total = round2(Decimal::from(item.quantity.max(1)) * item.unit_price);
            }
        }

        return Some(ExtractedItem {
            name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total,
            explicit_total: item.explicit_total,
            source_line: lineno,
        });
    }

    None
}

/// Trim OCR garbage off an extracted name. Returns `None` when nothing
/// item-like survives.
fn clean_name(raw: &str) -> Option<String> {
    let mut name = raw.trim().to_string();

    name = NAME_LEADING_DIGITS.replace(&name, "").to_string();

    // Leading single-character garbage such as `* MILK` or `» MILK`.
    loop {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(first), Some(' ')) if !first.is_alphanumeric() => {
                name = chars.as_str().trim_start().to_string();
            }
            _ => break,
        }
    }

    name = name
        .trim_end_matches(|c: char| c.is_whitespace() || ".,;:*-".contains(c))
        .to_string();

    if !NAME_HAS_WORD.is_match(&name) {
        return None;
    }

    Some(name.chars().take(200).collect())
}

/// A financial anchor is a total-like keyword followed by a parseable price.
fn is_financial_anchor(line: &str) -> bool {
    STOP_ANCHOR
        .find(line)
        .is_some_and(|m| PRICE_TOKEN.is_match(&line[m.end()..]))
}

fn noise_count(line: &str) -> usize {
    line.chars().filter(|c| NOISE_CHARS.contains(*c)).count()
}
