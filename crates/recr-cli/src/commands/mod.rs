//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use clap::ValueEnum;
use recr_core::LocaleHint;

/// Locale bias for ambiguous dates, as a CLI flag.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LocaleArg {
    /// Month-first dates (MM/DD/YYYY)
    Us,
    /// Day-first dates (DD/MM/YYYY)
    Intl,
    /// No preference
    None,
}

impl From<LocaleArg> for LocaleHint {
    fn from(value: LocaleArg) -> Self {
        match value {
            LocaleArg::Us => LocaleHint::Us,
            LocaleArg::Intl => LocaleHint::Intl,
            LocaleArg::None => LocaleHint::None,
        }
    }
}
