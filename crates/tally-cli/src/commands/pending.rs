//! Pending command - list inbox scans that are not yet approved.

use clap::Args;
use console::style;

use tally_core::ledger::document_id;
use tally_core::SupplierLayout;

use super::{file_name, inbox_scans, Context};

/// Arguments for the pending command.
#[derive(Args)]
pub struct PendingArgs {
    /// Only this supplier (default: every known supplier)
    #[arg(short, long)]
    supplier: Option<String>,
}

pub fn run(args: PendingArgs, ctx: &Context) -> anyhow::Result<()> {
    let layouts = match &args.supplier {
        Some(id) => vec![SupplierLayout::from_id(id)?],
        None => SupplierLayout::ALL.to_vec(),
    };
    let session = ctx.session()?;

    let mut total = 0;
    for layout in layouts {
        for path in inbox_scans(session.config(), layout.id())? {
            let id = document_id(layout.id(), &file_name(&path)?);
            if !session.ledger().is_processed(&id) {
                println!("{}", id);
                total += 1;
            }
        }
    }

    eprintln!("{} {} scan(s) pending", style("ℹ").blue(), total);
    Ok(())
}
