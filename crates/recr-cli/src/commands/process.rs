//! Process command - interpret a single transcript file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use tracing::{debug, info};

use recr_core::{Receipt, ReceiptParser, ReceiptPipeline, RecrConfig};

use super::LocaleArg;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input transcript file (plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fallback date when the transcript has none (default: today)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Locale bias for ambiguous dates
    #[arg(long, value_enum, default_value = "none")]
    locale: LocaleArg,

    /// Print the correction audit trail
    #[arg(long)]
    show_corrections: bool,

    /// Validate the reconciled arithmetic
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV summary row
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Interpreting transcript: {}", args.input.display());
    let transcript = fs::read_to_string(&args.input)?;

    let mut pipeline = ReceiptPipeline::new()
        .with_config(config)
        .with_locale(args.locale.into());
    if let Some(today) = args.today {
        pipeline = pipeline.with_today(today);
    }

    let receipt = pipeline.parse(&transcript);

    if args.validate {
        let issues = receipt.validate();
        if issues.is_empty() {
            eprintln!("{} Arithmetic is consistent", style("✓").green());
        } else {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    if args.show_corrections {
        if receipt.corrections.is_empty() {
            eprintln!("{} No corrections were needed", style("✓").green());
        } else {
            eprintln!("{}", style("Corrections:").yellow());
            for correction in &receipt.corrections {
                eprintln!(
                    "  - {:?} [{}]: {} -> {}",
                    correction.kind, correction.context, correction.before, correction.after
                );
            }
        }
    }

    let output = format_receipt(&receipt, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RecrConfig> {
    match config_path {
        Some(path) => Ok(RecrConfig::from_file(Path::new(path))?),
        None => Ok(RecrConfig::default()),
    }
}

pub fn format_receipt(receipt: &Receipt, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
        OutputFormat::Csv => format_csv(receipt),
        OutputFormat::Text => format_text(receipt),
    }
}

fn format_csv(receipt: &Receipt) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "merchant",
        "date",
        "items",
        "subtotal",
        "discount_total",
        "tax_total",
        "shipping_total",
        "grand_total",
        "payment_method",
        "corrections",
    ])?;

    wtr.write_record([
        &receipt.merchant,
        &receipt.date.to_string(),
        &receipt.items.len().to_string(),
        &receipt.subtotal.to_string(),
        &receipt.discount_total.to_string(),
        &receipt.tax_total.to_string(),
        &receipt.shipping_total.to_string(),
        &receipt.grand_total.to_string(),
        &format!("{:?}", receipt.payment_method).to_lowercase(),
        &receipt.corrections.len().to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(receipt: &Receipt) -> anyhow::Result<String> {
    let mut output = String::new();

    output.push_str(&format!(
        "Merchant: {} ({:.0}%)\n",
        receipt.merchant,
        receipt.merchant_confidence * 100.0
    ));
    output.push_str(&format!("Date: {}\n", receipt.date));
    output.push('\n');

    for item in &receipt.items {
        output.push_str(&format!(
            "  {:>3} x {:<40} {:>8}\n",
            item.quantity, item.name, item.line_total
        ));
    }
    output.push('\n');

    output.push_str(&format!("  Subtotal: {:>10}\n", receipt.subtotal));
    if !receipt.discount_total.is_zero() {
        output.push_str(&format!("  Discount: {:>10}\n", receipt.discount_total));
    }
    output.push_str(&format!("  Tax:      {:>10}\n", receipt.tax_total));
    if !receipt.shipping_total.is_zero() {
        output.push_str(&format!("  Shipping: {:>10}\n", receipt.shipping_total));
    }
    output.push_str(&format!("  Total:    {:>10}\n", receipt.grand_total));

    if !receipt.corrections.is_empty() {
        output.push_str(&format!(
            "\n  {} correction(s) applied\n",
            receipt.corrections.len()
        ));
    }

    Ok(output)
}
