//! Merchant resolution against a pattern table.

use lazy_static::lazy_static;
use regex::RegexBuilder;
use tracing::debug;

use crate::error::{RecrError, Result};

/// A resolved merchant name with its match confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantMatch {
    pub name: String,
    pub confidence: f32,
}

struct MerchantEntry {
    pattern: regex::Regex,
    name: String,
    weight: f32,
}

/// A read-only table mapping transcript patterns to canonical merchant names.
///
/// Shared after construction; extending the merchant set is a data change.
pub struct MerchantTable {
    entries: Vec<MerchantEntry>,
}

impl MerchantTable {
    /// Compile a table from `(pattern, canonical_name, weight)` entries.
    /// Patterns are matched case-insensitively.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, f32)>,
    {
        let mut compiled = Vec::new();
        for (pattern, name, weight) in entries {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| RecrError::MerchantPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
            compiled.push(MerchantEntry {
                pattern: regex,
                name: name.to_string(),
                weight: weight.clamp(0.0, 1.0),
            });
        }
        Ok(Self { entries: compiled })
    }

    /// Match the transcript's leading lines against the table.
    ///
    /// Returns the highest-weight match; ties go to the earliest occurrence
    /// in the transcript.
    pub fn resolve(&self, transcript: &str, scan_lines: usize) -> Option<MerchantMatch> {
        let window = transcript
            .lines()
            .take(scan_lines)
            .collect::<Vec<_>>()
            .join("\n");

        let mut best: Option<(f32, usize, &str)> = None;
        for entry in &self.entries {
            if let Some(m) = entry.pattern.find(&window) {
                let better = match best {
                    None => true,
                    Some((weight, position, _)) => {
                        entry.weight > weight || (entry.weight == weight && m.start() < position)
                    }
                };
                if better {
                    best = Some((entry.weight, m.start(), &entry.name));
                }
            }
        }

        best.map(|(weight, _, name)| {
            debug!("resolved merchant {} with confidence {:.2}", name, weight);
            MerchantMatch {
                name: name.to_string(),
                confidence: weight,
            }
        })
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Built-in retailer table. Patterns tolerate the spellings and spacing OCR
// tends to produce; weights reflect how distinctive the mark is.
const DEFAULT_MERCHANTS: &[(&str, &str, f32)] = &[
    (r"mcdonald", "McDonald's", 0.95),
    (r"wal\s*-?\s*mart", "Walmart", 0.95),
    (r"target", "Target", 0.8),
    (r"ikea", "IKEA", 0.9),
    (r"starbucks", "Starbucks", 0.95),
    (r"tim\s*hortons?", "Tim Hortons", 0.95),
    (r"subway", "Subway", 0.85),
    (r"\bcvs\b", "CVS", 0.9),
    (r"walgreens", "Walgreens", 0.95),
    (r"costco", "Costco", 0.95),
    (r"whole\s*foods", "Whole Foods", 0.95),
    (r"safeway", "Safeway", 0.95),
    (r"kroger", "Kroger", 0.95),
    (r"burger\s*king", "Burger King", 0.95),
    (r"wendy'?s", "Wendy's", 0.9),
    (r"\bkfc\b", "KFC", 0.9),
    (r"taco\s*bell", "Taco Bell", 0.95),
    (r"chipotle", "Chipotle", 0.95),
    (r"dunkin'?", "Dunkin'", 0.9),
    (r"pizza\s*hut", "Pizza Hut", 0.95),
    (r"domino'?s", "Domino's", 0.9),
    (r"chick\s*-?\s*fil\s*-?\s*a", "Chick-fil-A", 0.95),
    (r"panera", "Panera Bread", 0.9),
    (r"7\s*-?\s*eleven", "7-Eleven", 0.9),
    (r"\baldi\b", "Aldi", 0.85),
    (r"\blidl\b", "Lidl", 0.85),
    (r"trader\s*joe'?s", "Trader Joe's", 0.95),
    (r"publix", "Publix", 0.95),
    (r"albertsons?", "Albertsons", 0.9),
    (r"sprouts\s*farmers", "Sprouts Farmers Market", 0.95),
    (r"\bh\s*-?\s*e\s*-?\s*b\b", "H-E-B", 0.85),
    (r"meijer", "Meijer", 0.9),
    (r"wegmans", "Wegmans", 0.95),
    (r"rite\s*aid", "Rite Aid", 0.9),
    (r"home\s*depot", "Home Depot", 0.95),
    (r"lowe'?s", "Lowe's", 0.85),
    (r"best\s*buy", "Best Buy", 0.9),
    (r"office\s*depot", "Office Depot", 0.9),
    (r"staples", "Staples", 0.85),
    (r"dollar\s*general", "Dollar General", 0.9),
    (r"dollar\s*tree", "Dollar Tree", 0.9),
    (r"family\s*dollar", "Family Dollar", 0.9),
    (r"sam'?s\s*club", "Sam's Club", 0.9),
    (r"petsmart", "PetSmart", 0.9),
    (r"\bpetco\b", "Petco", 0.85),
    (r"nordstrom", "Nordstrom", 0.9),
    (r"macy'?s", "Macy's", 0.85),
    (r"t\.?j\.?\s*maxx", "TJ Maxx", 0.9),
    (r"marshalls", "Marshalls", 0.9),
    (r"sephora", "Sephora", 0.9),
    (r"old\s*navy", "Old Navy", 0.9),
];

lazy_static! {
    static ref DEFAULT_TABLE: MerchantTable =
        MerchantTable::from_entries(DEFAULT_MERCHANTS.iter().copied())
            .expect("built-in merchant patterns compile");
}

/// The built-in retailer table.
pub fn default_table() -> &'static MerchantTable {
    &DEFAULT_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_size() {
        assert!(default_table().len() >= 40);
    }

    #[test]
    fn test_resolves_ocr_spellings() {
        let table = default_table();
        let m = table.resolve("McDONALDS #12345\n123 Main St", 20).unwrap();
        assert_eq!(m.name, "McDonald's");
        assert!(m.confidence >= 0.9);

        let m = table.resolve("WAL MART SUPERCENTER", 20).unwrap();
        assert_eq!(m.name, "Walmart");

        let m = table.resolve("TIM  HORTON", 20).unwrap();
        assert_eq!(m.name, "Tim Hortons");
    }

    #[test]
    fn test_no_match_returns_none() {
        assert!(default_table().resolve("CORNER STORE\nMilk 3.99", 20).is_none());
    }

    #[test]
    fn test_scan_window_limits_matching() {
        let mut text = String::new();
        for _ in 0..25 {
            text.push_str("filler line\n");
        }
        text.push_str("WALMART");
        assert!(default_table().resolve(&text, 20).is_none());
        assert!(default_table().resolve(&text, 30).is_some());
    }

    #[test]
    fn test_highest_weight_wins() {
        let table = MerchantTable::from_entries([
            (r"store", "Generic Store", 0.4),
            (r"mega\s*store", "Mega Store", 0.9),
        ])
        .unwrap();
        let m = table.resolve("MEGA STORE #4", 20).unwrap();
        assert_eq!(m.name, "Mega Store");
    }

    #[test]
    fn test_tie_broken_by_first_occurrence() {
        let table = MerchantTable::from_entries([
            (r"beta", "Beta", 0.8),
            (r"alpha", "Alpha", 0.8),
        ])
        .unwrap();
        let m = table.resolve("alpha then beta", 20).unwrap();
        assert_eq!(m.name, "Alpha");
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(MerchantTable::from_entries([(r"(unclosed", "Broken", 0.5)]).is_err());
    }
}
