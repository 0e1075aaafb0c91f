//! Dataset commands - fold external rows in and summarize.

use std::path::PathBuf;

use clap::Args;
use console::style;
use rust_decimal::Decimal;

use super::Context;

/// Arguments for the merge command.
#[derive(Args)]
pub struct MergeArgs {
    /// CSV file with the dataset columns
    #[arg(required = true)]
    rows: PathBuf,
}

pub fn merge(args: MergeArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let outcome = session.merge_file(&args.rows)?;

    println!(
        "{} Merged {}: {} rows in {} ({} duplicate(s) dropped)",
        style("✓").green(),
        args.rows.display(),
        outcome.rows.len(),
        session.dataset_path().display(),
        outcome.duplicates_dropped
    );
    Ok(())
}

pub fn summary(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let summaries = session.summary()?;

    if summaries.is_empty() {
        println!(
            "{} The dataset at {} is empty",
            style("ℹ").blue(),
            session.dataset_path().display()
        );
        return Ok(());
    }

    for summary in &summaries {
        println!("{}", summary);
    }

    let total: Decimal = summaries.iter().map(|s| s.total).sum();
    let rows: usize = summaries.iter().map(|s| s.rows).sum();
    println!("{}", style(format!("ALL: {} rows, {:.2}", rows, total)).bold());
    Ok(())
}
