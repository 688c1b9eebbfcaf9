//! Configuration structures for the interpretation pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RecrError, Result};

/// Main configuration for the recr pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecrConfig {
    /// Line classification and extraction tunables.
    pub extraction: ExtractionConfig,

    /// Financial reconciliation tunables.
    pub reconcile: ReconcileConfig,
}

/// Extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many leading lines to scan for a merchant name.
    pub merchant_scan_lines: usize,

    /// How many leading lines to scan for a purchase date.
    pub date_scan_lines: usize,

    /// Merchant matches below this confidence are flagged for review.
    pub min_merchant_confidence: f32,

    /// Quantities above this are clamped.
    pub max_quantity: u32,

    /// Unit prices above this are clamped at extraction time.
    pub max_unit_price: Decimal,

    /// Lines longer than this are discarded rather than matched.
    pub max_line_length: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            merchant_scan_lines: 20,
            date_scan_lines: 30,
            min_merchant_confidence: 0.5,
            max_quantity: 100,
            max_unit_price: Decimal::new(50000, 2),
            max_line_length: 1000,
        }
    }
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Tax rate used when a tax estimate is needed with no total to close
    /// against.
    pub default_tax_rate: Decimal,

    /// Implied tax ratios above this are flagged but not corrected.
    pub suspicious_tax_ratio: Decimal,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            default_tax_rate: Decimal::new(10, 2),
            suspicious_tax_ratio: Decimal::new(20, 2),
        }
    }
}

impl RecrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| RecrError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| RecrError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
