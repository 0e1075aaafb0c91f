//! Known supplier layouts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Where a header field sits on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Printed label text; alternatives are tried in order, longest first.
    Label(&'static [&'static str]),
    /// Token `col` of row `row`, counted from the top of the page.
    Fixed { row: usize, col: usize },
}

/// Horizontal band of a table column, as fractions of the page extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRange {
    pub start: f32,
    pub end: f32,
}

impl ColumnRange {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, fraction: f32) -> bool {
        fraction >= self.start && fraction <= self.end
    }
}

/// Everything layout-specific about reading one supplier's invoices.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRules {
    pub invoice_number: Anchor,
    pub date: Anchor,
    /// `None` when the layout prints no vehicle label.
    pub vehicle: Option<Anchor>,

    pub description: ColumnRange,
    /// `None` when the layout has no quantity column.
    pub quantity: Option<ColumnRange>,
    pub total: ColumnRange,

    /// Table header markers; empty when the table has no header row.
    pub items_header: &'static [&'static str],
    /// Markers of the first row after the line items.
    pub footer: &'static [&'static str],
    /// Rows with only a description continue the previous item.
    pub merge_wrapped: bool,
}

impl LayoutRules {
    /// Every label of every label anchor.
    pub fn labels(&self) -> Vec<&'static str> {
        [Some(self.invoice_number), Some(self.date), self.vehicle]
            .into_iter()
            .flatten()
            .filter_map(|a| match a {
                Anchor::Label(labels) => Some(labels.iter().copied()),
                Anchor::Fixed { .. } => None,
            })
            .flatten()
            .collect()
    }
}

static TYREMART: LayoutRules = LayoutRules {
    invoice_number: Anchor::Label(&["INVOICE NO", "INV NO", "INVOICE", "INV"]),
    date: Anchor::Label(&["INVOICE DATE", "DATE"]),
    vehicle: Some(Anchor::Label(&["VEHICLE REG", "REG NO", "VEHICLE", "REG"])),
    description: ColumnRange::new(0.0, 0.55),
    quantity: Some(ColumnRange::new(0.55, 0.75)),
    total: ColumnRange::new(0.75, 1.0),
    items_header: &[],
    footer: &["SUBTOTAL", "SUB TOTAL", "TOTAL", "VAT"],
    merge_wrapped: false,
};

static AUTOXPRESS: LayoutRules = LayoutRules {
    invoice_number: Anchor::Label(&["INVOICE NUMBER", "INVOICE NO", "INVOICE"]),
    date: Anchor::Label(&["DATE"]),
    vehicle: Some(Anchor::Label(&["VEHICLE NO", "VEHICLE", "REG NO"])),
    quantity: Some(ColumnRange::new(0.0, 0.12)),
    description: ColumnRange::new(0.12, 0.7),
    total: ColumnRange::new(0.78, 1.0),
    items_header: &["DESCRIPTION"],
    footer: &["AMOUNT DUE", "TOTAL", "VAT"],
    merge_wrapped: false,
};

static CMC: LayoutRules = LayoutRules {
    invoice_number: Anchor::Fixed { row: 0, col: 1 },
    date: Anchor::Label(&["DATE"]),
    vehicle: Some(Anchor::Label(&["REG NO", "REGISTRATION"])),
    description: ColumnRange::new(0.0, 0.7),
    quantity: None,
    total: ColumnRange::new(0.7, 1.0),
    items_header: &["PARTICULARS"],
    footer: &["TOTAL", "VAT"],
    merge_wrapped: true,
};

/// A supplier whose invoice layout is known.
///
/// The id is the name of the supplier's inbox folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierLayout {
    Tyremart,
    Autoxpress,
    Cmc,
}

impl SupplierLayout {
    pub const ALL: [SupplierLayout; 3] = [
        SupplierLayout::Tyremart,
        SupplierLayout::Autoxpress,
        SupplierLayout::Cmc,
    ];

    /// Look up a layout by supplier id, ignoring case.
    pub fn from_id(id: &str) -> Result<Self, ExtractionError> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| ExtractionError::UnknownSupplier(id.to_string()))
    }

    pub fn id(&self) -> &'static str {
        match self {
            SupplierLayout::Tyremart => "tyremart",
            SupplierLayout::Autoxpress => "autoxpress",
            SupplierLayout::Cmc => "cmc",
        }
    }

    /// Name written to the SUPPLIER column.
    pub fn display_name(&self) -> &'static str {
        match self {
            SupplierLayout::Tyremart => "TYREMART",
            SupplierLayout::Autoxpress => "AUTOXPRESS",
            SupplierLayout::Cmc => "CMC MOTORS",
        }
    }

    pub fn rules(&self) -> &'static LayoutRules {
        match self {
            SupplierLayout::Tyremart => &TYREMART,
            SupplierLayout::Autoxpress => &AUTOXPRESS,
            SupplierLayout::Cmc => &CMC,
        }
    }
}

impl FromStr for SupplierLayout {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

impl fmt::Display for SupplierLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id() {
        assert_eq!(SupplierLayout::from_id("tyremart").unwrap(), SupplierLayout::Tyremart);
        assert_eq!(SupplierLayout::from_id(" CMC ").unwrap(), SupplierLayout::Cmc);
        assert!(matches!(
            SupplierLayout::from_id("acme"),
            Err(ExtractionError::UnknownSupplier(id)) if id == "acme"
        ));
    }

    #[test]
    fn test_ids_round_trip_through_display() {
        for layout in SupplierLayout::ALL {
            assert_eq!(layout.to_string().parse::<SupplierLayout>().unwrap(), layout);
        }
    }

    #[test]
    fn test_column_ranges_are_ordered() {
        for layout in SupplierLayout::ALL {
            let rules = layout.rules();
            for range in [Some(rules.description), rules.quantity, Some(rules.total)].into_iter().flatten() {
                assert!(range.start < range.end, "{}", layout);
            }
        }
    }

    #[test]
    fn test_labels_skip_fixed_anchors() {
        let labels = SupplierLayout::Cmc.rules().labels();
        assert_eq!(labels, vec!["DATE", "REG NO", "REGISTRATION"]);
    }
}
