//! Extract-all command - draft every pending scan of one supplier.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use tally_core::ledger::document_id;
use tally_core::{PureOcrEngine, SupplierLayout};

use super::{file_name, inbox_scans, Context};

/// Arguments for the extract-all command.
#[derive(Args)]
pub struct ExtractAllArgs {
    /// Supplier id, the name of the inbox folder to read
    #[arg(short, long)]
    supplier: String,

    /// Directory receiving one draft per scan
    #[arg(short, long)]
    drafts: PathBuf,
}

pub fn run(args: ExtractAllArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let layout = SupplierLayout::from_id(&args.supplier)?;
    let mut session = ctx.session()?;

    let files: Vec<PathBuf> = inbox_scans(session.config(), layout.id())?
        .into_iter()
        .filter(|p| {
            file_name(p).is_ok_and(|name| !session.ledger().is_processed(&document_id(layout.id(), &name)))
        })
        .collect();

    if files.is_empty() {
        println!(
            "{} Nothing pending for {}",
            style("ℹ").blue(),
            layout.display_name()
        );
        return Ok(());
    }

    println!(
        "{} Found {} scans to extract",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.drafts)?;
    let engine = PureOcrEngine::from_config(&session.config().ocr)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scans {msg}")?
            .progress_chars("=>-"),
    );

    let mut drafted = 0;
    let mut flagged = 0;
    let mut failed = Vec::new();

    for path in &files {
        let name = file_name(path)?;
        pb.set_message(name.clone());

        match session.extract_document(path, layout.id(), &engine, false) {
            Ok(record) => {
                let draft = args.drafts.join(format!("{}.json", name));
                fs::write(&draft, serde_json::to_string_pretty(&record)?)?;
                drafted += 1;
                if record.needs_review() {
                    flagged += 1;
                }
            }
            Err(e) => {
                warn!("Failed to extract {}: {}", path.display(), e);
                failed.push((name, e.to_string()));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    session.checkpoint()?;

    println!(
        "{} Drafted {} of {} scans in {:.1}s ({} need review)",
        style("✓").green(),
        drafted,
        files.len(),
        start.elapsed().as_secs_f64(),
        flagged
    );
    if !failed.is_empty() {
        eprintln!("{}", style("Failed scans:").red());
        for (name, error) in &failed {
            eprintln!("  - {}: {}", name, error);
        }
    }
    println!("Drafts are in {}", args.drafts.display());

    Ok(())
}
