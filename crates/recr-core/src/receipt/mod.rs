//! Receipt interpretation module.

mod pipeline;
mod reconcile;
mod validate;
pub mod rules;

pub use pipeline::{ReceiptParser, ReceiptPipeline};
pub use reconcile::Totals;
