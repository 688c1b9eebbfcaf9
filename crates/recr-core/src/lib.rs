//! Core library for receipt OCR transcript interpretation.
//!
//! This crate turns the noisy text an OCR pass produces from a receipt photo
//! into a structured, arithmetically reconciled record:
//! - transcript denoising (whitespace, digit/letter confusions)
//! - merchant resolution against a pattern table
//! - purchase-date extraction with locale-aware disambiguation
//! - line-item extraction through a ranked matcher cascade
//! - financial reconciliation and a full correction audit trail
//!
//! The pipeline never fails; every deviation from the happy path is reported
//! as a [`models::receipt::Correction`] on the returned receipt.

pub mod categorize;
pub mod error;
pub mod models;
pub mod receipt;

pub use categorize::{Categorizer, KeywordCategorizer};
pub use error::{RecrError, Result};
pub use models::config::RecrConfig;
pub use models::receipt::{
    Category, Correction, CorrectionKind, LineItem, LocaleHint, PaymentMethod, Receipt,
};
pub use receipt::rules::merchant::MerchantTable;
pub use receipt::{ReceiptParser, ReceiptPipeline};
