//! The receipt interpretation pipeline.
//!
//! A single-threaded, deterministic pass over an OCR transcript:
//! denoise, resolve the merchant, extract the date, extract line items,
//! reconcile the financials, validate. The pipeline never fails; malformed
//! input degrades into corrections on the returned receipt.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::categorize::{Categorizer, KeywordCategorizer};
use crate::models::config::RecrConfig;
use crate::models::receipt::{
    Correction, CorrectionKind, LineItem, LocaleHint, Receipt,
};

use super::reconcile::reconcile;
use super::rules::amounts::{extract_labeled_amounts, extract_payment_method};
use super::rules::dates::extract_date;
use super::rules::denoise::denoise;
use super::rules::items::extract_items;
use super::rules::merchant::{default_table, MerchantTable};
use super::validate::validate_and_correct;

/// Trait for receipt parsing.
pub trait ReceiptParser {
    /// Interpret a transcript into a receipt. Never fails.
    fn parse(&self, transcript: &str) -> Receipt;
}

/// The standard interpretation pipeline.
///
/// Construction is the only configurable moment; a built pipeline is
/// read-only and can be shared across threads.
pub struct ReceiptPipeline {
    config: RecrConfig,
    table: Option<MerchantTable>,
    categorizer: Box<dyn Categorizer + Send + Sync>,
    locale: LocaleHint,
    today: NaiveDate,
}

impl ReceiptPipeline {
    /// Create a pipeline with the built-in merchant table and categorizer.
    /// The date fallback defaults to the current day.
    pub fn new() -> Self {
        Self {
            config: RecrConfig::default(),
            table: None,
            categorizer: Box::new(KeywordCategorizer::new()),
            locale: LocaleHint::None,
            today: chrono::Utc::now().date_naive(),
        }
    }

    /// Set the date used when the transcript has none.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Bias ambiguous numeric dates.
    pub fn with_locale(mut self, locale: LocaleHint) -> Self {
        self.locale = locale;
        self
    }

    /// Replace the built-in merchant table.
    pub fn with_merchant_table(mut self, table: MerchantTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Replace the built-in keyword categorizer.
    pub fn with_categorizer(
        mut self,
        categorizer: impl Categorizer + Send + Sync + 'static,
    ) -> Self {
        self.categorizer = Box::new(categorizer);
        self
    }

    /// Override the pipeline tunables.
    pub fn with_config(mut self, config: RecrConfig) -> Self {
        self.config = config;
        self
    }

    fn merchant_table(&self) -> &MerchantTable {
        self.table.as_ref().unwrap_or_else(|| default_table())
    }
}

impl Default for ReceiptPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser for ReceiptPipeline {
    fn parse(&self, transcript: &str) -> Receipt {
        info!("interpreting {} characters of transcript", transcript.len());
        let mut receipt = Receipt::empty(self.today);
        let mut corrections: Vec<Correction> = Vec::new();

        debug!("stage: denoising");
        let text = denoise(transcript);

        debug!("stage: merchant resolution");
        let resolved = self
            .merchant_table()
            .resolve(&text, self.config.extraction.merchant_scan_lines);
        let confidence = resolved.as_ref().map(|m| m.confidence).unwrap_or(0.0);
        if let Some(m) = resolved {
            receipt.merchant = m.name;
        }
        receipt.merchant_confidence = confidence;
        if confidence < self.config.extraction.min_merchant_confidence {
            corrections.push(Correction::new(
                CorrectionKind::MerchantLowConfidence,
                receipt.merchant.clone(),
                format!("{:.2}", confidence),
                "merchant",
            ));
        }

        debug!("stage: date extraction");
        if let Some(date) = extract_date(&text, self.locale, self.config.extraction.date_scan_lines)
        {
            receipt.date = date;
        }

        debug!("stage: item extraction");
        let extraction = extract_items(&text, &self.config.extraction);
        corrections.extend(extraction.corrections);
        receipt.items = extraction
            .items
            .into_iter()
            .map(|item| LineItem {
                category: self.categorizer.categorize(&item.name),
                name: item.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total,
                explicit_total: item.explicit_total,
            })
            .collect();

        debug!("stage: financial reconciliation");
        let (labeled, label_corrections) = extract_labeled_amounts(&text);
        corrections.extend(label_corrections);
        let items_total: Decimal = receipt.items.iter().map(|i| i.line_total).sum();
        let (totals, reconcile_corrections) =
            reconcile(&labeled, items_total, &self.config.reconcile);
        corrections.extend(reconcile_corrections);
        receipt.subtotal = totals.subtotal;
        receipt.discount_total = totals.discount_total;
        receipt.tax_total = totals.tax_total;
        receipt.shipping_total = totals.shipping_total;
        receipt.grand_total = totals.grand_total;
        receipt.payment_method = extract_payment_method(&text);

        debug!("stage: validation");
        receipt.corrections = corrections;
        validate_and_correct(
            &mut receipt,
            &self.config,
            labeled.tax_explicit,
            labeled.grand_total.is_some(),
        );

        info!(
            "done: merchant={} items={} total={} corrections={}",
            receipt.merchant,
            receipt.items.len(),
            receipt.grand_total,
            receipt.corrections.len()
        );
        receipt
    }
}
