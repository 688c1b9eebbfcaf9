//! Rule-based extractors for receipt transcripts.

pub mod amounts;
pub mod dates;
pub mod denoise;
pub mod items;
pub mod merchant;
pub mod patterns;

pub use amounts::{extract_labeled_amounts, extract_payment_method, parse_amount, LabeledAmounts};
pub use dates::extract_date;
pub use denoise::denoise;
pub use items::{extract_items, ExtractedItem, ItemExtraction, ItemMatch, LineMatcher};
pub use merchant::{default_table, MerchantMatch, MerchantTable};
