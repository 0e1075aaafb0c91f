//! Approve command - merge a reviewed draft into the dataset.

use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use console::style;

use tally_core::{InvoiceRecord, TallyError};

use super::extract::report_flags;
use super::Context;

/// Arguments for the approve command.
#[derive(Args)]
pub struct ApproveArgs {
    /// Reviewed draft (JSON written by `tally extract`)
    #[arg(required = true)]
    draft: PathBuf,

    /// Approve even though review flags remain open
    #[arg(long)]
    accept_flags: bool,
}

pub fn run(args: ApproveArgs, ctx: &Context) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.draft)
        .with_context(|| format!("Failed to read draft {}", args.draft.display()))?;
    let record: InvoiceRecord = serde_json::from_str(&content)
        .with_context(|| format!("Invalid draft {}", args.draft.display()))?;

    let mut session = ctx.session()?;
    let outcome = match session.approve(record.clone(), args.accept_flags) {
        Ok(outcome) => outcome,
        Err(TallyError::NeedsReview(count)) => {
            report_flags(&record.revalidate());
            anyhow::bail!(
                "{} review flag(s) are still open. Fix the draft, or pass --accept-flags.",
                count
            );
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} Approved invoice {}: {} rows in {}",
        style("✓").green(),
        record.invoice_number,
        outcome.rows.len(),
        session.dataset_path().display()
    );
    if outcome.duplicates_dropped > 0 {
        println!(
            "{} {} duplicate row(s) dropped",
            style("ℹ").blue(),
            outcome.duplicates_dropped
        );
    }

    Ok(())
}
