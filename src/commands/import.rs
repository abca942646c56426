//! Import command implementation

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::cli::ImportArgs;
use crate::config::Config;
use crate::csvio::{self, ImportStats};
use crate::error::Result;

use super::helpers;

/// Run import command
pub fn run(ledger_path: Option<PathBuf>, args: ImportArgs) -> Result<()> {
    let config = Config::load()?;
    let mut ledger = helpers::open_ledger(ledger_path, &config)?;

    let bar = ProgressBar::new(args.files.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut totals = ImportStats::default();
    for file in &args.files {
        bar.set_message(file.display().to_string());
        let stats = csvio::import_file(&mut ledger, file)?;
        totals.transactions += stats.transactions;
        totals.skipped += stats.skipped;
        totals.rates += stats.rates;
        bar.inc(1);
    }
    bar.finish_and_clear();

    ledger.save()?;

    println!(
        "{} {} transaction(s) imported, {} duplicate(s) skipped, {} rate(s) merged",
        style("Done:").green().bold(),
        totals.transactions,
        totals.skipped,
        totals.rates,
    );
    println!("Ledger: {}", ledger.path().display());
    Ok(())
}
