//! Batch command - interpret multiple transcript files.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error};

use recr_core::{Receipt, ReceiptParser, ReceiptPipeline};

use super::process::{format_receipt, load_config, OutputFormat};
use super::LocaleArg;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Locale bias for ambiguous dates
    #[arg(long, value_enum, default_value = "none")]
    locale: LocaleArg,
}

struct ProcessResult {
    path: PathBuf,
    receipt: Option<Receipt>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} transcripts to interpret",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let pipeline = Arc::new(
        ReceiptPipeline::new()
            .with_config(config)
            .with_locale(args.locale.into()),
    );
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));

    let mut handles = Vec::new();
    for path in files {
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore open");
            tokio::task::spawn_blocking(move || {
                let result = fs::read_to_string(&path);
                match result {
                    Ok(transcript) => ProcessResult {
                        receipt: Some(pipeline.parse(&transcript)),
                        error: None,
                        path,
                    },
                    Err(e) => ProcessResult {
                        receipt: None,
                        error: Some(e.to_string()),
                        path,
                    },
                }
            })
            .await
            .expect("worker task panicked")
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        let result = handle.await?;
        progress.inc(1);
        results.push(result);
    }
    progress.finish_with_message("Done");

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for result in &results {
        match (&result.receipt, &result.error) {
            (Some(receipt), _) => {
                succeeded += 1;
                write_output(receipt, &result.path, &args)?;
            }
            (None, Some(e)) => {
                failed += 1;
                error!("failed to read {}: {}", result.path.display(), e);
            }
            _ => {}
        }
    }

    if args.summary {
        write_summary(&results, &args)?;
    }

    println!(
        "{} Interpreted {} transcripts ({} failed) in {:.1}s",
        style("✓").green(),
        succeeded,
        failed,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn write_output(receipt: &Receipt, input_path: &PathBuf, args: &BatchArgs) -> anyhow::Result<()> {
    let output = format_receipt(receipt, args.format)?;

    match &args.output_dir {
        Some(dir) => {
            let extension = match args.format {
                OutputFormat::Json => "json",
                OutputFormat::Csv => "csv",
                OutputFormat::Text => "txt",
            };
            let stem = input_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("receipt");
            let path = dir.join(format!("{}.{}", stem, extension));
            fs::write(&path, output)?;
            debug!("wrote {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

fn write_summary(results: &[ProcessResult], args: &BatchArgs) -> anyhow::Result<()> {
    let dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join("summary.csv");

    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record([
        "file",
        "merchant",
        "date",
        "items",
        "subtotal",
        "tax_total",
        "grand_total",
        "corrections",
    ])?;

    for result in results {
        if let Some(receipt) = &result.receipt {
            wtr.write_record([
                &result.path.display().to_string(),
                &receipt.merchant,
                &receipt.date.to_string(),
                &receipt.items.len().to_string(),
                &receipt.subtotal.to_string(),
                &receipt.tax_total.to_string(),
                &receipt.grand_total.to_string(),
                &receipt.corrections.len().to_string(),
            ])?;
        }
    }
    wtr.flush()?;

    println!("{} Summary written to {}", style("✓").green(), path.display());
    Ok(())
}
