//! Extract command - turn one scanned invoice into a draft record.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use tally_core::error::ExtractionError;
use tally_core::{InvoiceRecord, PureOcrEngine, Session, TallyError, Token};

use super::{file_name, Context};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Scanned invoice (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier id, the name of the inbox folder the scan came from
    #[arg(short, long)]
    supplier: String,

    /// Use OCR tokens saved as JSON instead of running OCR
    #[arg(long)]
    tokens: Option<PathBuf>,

    /// Draft output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extract again although the scan was already approved
    #[arg(long)]
    reprocess: bool,
}

pub fn run(args: ExtractArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut session = ctx.session()?;

    let result = match &args.tokens {
        Some(tokens_path) => extract_from_tokens(&mut session, &args, tokens_path),
        None => extract_with_ocr(&mut session, &args),
    };

    let record = match result {
        Ok(record) => record,
        Err(TallyError::Extraction(ExtractionError::AlreadyProcessed(id))) => {
            anyhow::bail!("{} was already approved. Use --reprocess to extract it again.", id);
        }
        Err(e) => return Err(e.into()),
    };

    // Extraction attempts are remembered even if the draft is never approved
    session.checkpoint()?;

    write_draft(&record, args.output.as_deref())?;
    report_flags(&record);

    debug!("Total extraction time: {:?}", start.elapsed());
    Ok(())
}

fn extract_from_tokens(
    session: &mut Session,
    args: &ExtractArgs,
    tokens_path: &Path,
) -> tally_core::Result<InvoiceRecord> {
    let content = fs::read_to_string(tokens_path)?;
    let tokens: Vec<Token> = serde_json::from_str(&content).map_err(|e| {
        TallyError::Config(format!("invalid tokens file {}: {}", tokens_path.display(), e))
    })?;
    info!("Loaded {} tokens from {}", tokens.len(), tokens_path.display());

    let name = file_name(&args.input).map_err(|e| TallyError::Config(e.to_string()))?;
    session.extract_tokens(&name, &args.supplier, &tokens, args.reprocess)
}

fn extract_with_ocr(session: &mut Session, args: &ExtractArgs) -> tally_core::Result<InvoiceRecord> {
    if !args.input.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", args.input.display()),
        )
        .into());
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(spinner);
    }

    pb.set_message("Loading OCR models...");
    let engine = PureOcrEngine::from_config(&session.config().ocr)?;

    pb.set_message(format!("Reading {}...", args.input.display()));
    let result = session.extract_document(&args.input, &args.supplier, &engine, args.reprocess);

    pb.finish_and_clear();
    result
}

/// Write the draft as pretty JSON, to a file or stdout.
pub fn write_draft(record: &InvoiceRecord, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            eprintln!(
                "{} Draft written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn report_flags(record: &InvoiceRecord) {
    if record.flags.is_empty() {
        return;
    }
    eprintln!(
        "{} {} item(s) need review before approval:",
        style("!").yellow(),
        record.flags.len()
    );
    for flag in &record.flags {
        eprintln!("  - {}", flag);
    }
}
