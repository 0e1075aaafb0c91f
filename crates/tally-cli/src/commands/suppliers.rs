//! Suppliers command - list the known invoice layouts.

use console::style;

use tally_core::SupplierLayout;

use super::{inbox_scans, Context};

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    for layout in SupplierLayout::ALL {
        let inbox = ctx.config.supplier_inbox(layout.id());
        let scans = inbox_scans(&ctx.config, layout.id())?.len();
        println!(
            "{:<12} {:<12} {} ({} scans)",
            style(layout.id()).bold(),
            layout.display_name(),
            inbox.display(),
            scans
        );
    }
    Ok(())
}
