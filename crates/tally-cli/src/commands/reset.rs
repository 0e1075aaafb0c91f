//! Reset command - clear processed flags so scans can be extracted again.

use clap::{ArgGroup, Args};
use console::style;

use tally_core::error::LedgerError;
use tally_core::{ResetScope, SupplierLayout, TallyError};

use super::Context;

/// Arguments for the reset command.
#[derive(Args)]
#[command(group(ArgGroup::new("scope").required(true).args(["all", "document", "supplier"])))]
pub struct ResetArgs {
    /// Clear every entry
    #[arg(long)]
    all: bool,

    /// Clear one document, as `<supplier>/<file name>`
    #[arg(long)]
    document: Option<String>,

    /// Clear every document of one supplier
    #[arg(long)]
    supplier: Option<String>,

    /// Administrator passphrase (prompted for when omitted)
    #[arg(long)]
    passphrase: Option<String>,
}

pub fn run(args: ResetArgs, ctx: &Context) -> anyhow::Result<()> {
    let scope = if let Some(document) = args.document {
        ResetScope::Document(document)
    } else if let Some(supplier) = args.supplier {
        ResetScope::Supplier(SupplierLayout::from_id(&supplier)?.id().to_string())
    } else {
        ResetScope::All
    };

    let passphrase = match args.passphrase {
        Some(p) => p,
        None => rpassword::prompt_password("Administrator passphrase: ")?,
    };

    let mut session = ctx.session()?;
    match session.reset(&scope, &passphrase) {
        Ok(cleared) => {
            println!(
                "{} Cleared {} processed entr{}",
                style("✓").green(),
                cleared,
                if cleared == 1 { "y" } else { "ies" }
            );
            Ok(())
        }
        Err(TallyError::Ledger(LedgerError::AuthDenied)) => {
            anyhow::bail!("Reset denied: wrong passphrase. The ledger was not changed.")
        }
        Err(e) => Err(e.into()),
    }
}
