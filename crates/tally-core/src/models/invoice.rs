//! Invoice record model: header fields, line items and review flags.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::rules::dates::serde_dmy;

/// Owner written on records that do not name one.
pub const DEFAULT_OWNER: &str = "FIRESIDE";

/// A validated invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity, at least one.
    pub quantity: Decimal,

    /// `total / quantity`, unrounded.
    pub unit_cost: Decimal,

    /// Line total.
    pub total: Decimal,
}

/// A field a reviewer may be asked to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    Date,
    Vehicle,
    Quantity { line: usize },
    Total { line: usize },
}

/// Something a human must confirm before the record is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewFlag {
    /// The field was found but its text did not parse cleanly.
    FieldLowConfidence { field: Field, raw: String },
    /// The field could not be located.
    MissingField { field: Field },
    /// No line items survived extraction.
    NoLineItems,
}

impl ReviewFlag {
    pub fn low_confidence(field: Field, raw: impl Into<String>) -> Self {
        ReviewFlag::FieldLowConfidence {
            field,
            raw: raw.into(),
        }
    }

    fn is_low_confidence(&self) -> bool {
        matches!(self, ReviewFlag::FieldLowConfidence { .. })
    }

    fn concerns(&self, target: Field) -> bool {
        match self {
            ReviewFlag::FieldLowConfidence { field, .. } | ReviewFlag::MissingField { field } => {
                *field == target
            }
            ReviewFlag::NoLineItems => false,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::InvoiceNumber => write!(f, "invoice number"),
            Field::Date => write!(f, "date"),
            Field::Vehicle => write!(f, "vehicle"),
            Field::Quantity { line } => write!(f, "quantity of line {}", line + 1),
            Field::Total { line } => write!(f, "total of line {}", line + 1),
        }
    }
}

impl fmt::Display for ReviewFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewFlag::FieldLowConfidence { field, raw } => write!(f, "unclear {}: '{}'", field, raw),
            ReviewFlag::MissingField { field } => write!(f, "missing {}", field),
            ReviewFlag::NoLineItems => write!(f, "no line items"),
        }
    }
}

/// Header values as located by an extractor, before validation.
#[derive(Debug, Clone, Default)]
pub struct HeaderFields {
    pub invoice_number: String,
    pub date: Option<NaiveDate>,
    pub vehicle: String,
    pub supplier: String,
    pub owner: Option<String>,
    pub source_document: Option<String>,
    /// Low-confidence findings for header fields.
    pub flags: Vec<ReviewFlag>,
}

/// Numeric cell of a raw line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemColumn {
    Quantity,
    Total,
}

/// A line item as segmented from the page, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLineItem {
    pub description: String,
    /// `None` when the quantity cell was blank.
    pub quantity: Option<Decimal>,
    /// `None` when the total cell was blank.
    pub total: Option<Decimal>,
    /// Cells that did not parse cleanly, with their source text.
    pub low_confidence: Vec<(ItemColumn, String)>,
}

impl RawLineItem {
    pub fn new(description: impl Into<String>, quantity: Option<Decimal>, total: Option<Decimal>) -> Self {
        Self {
            description: description.into(),
            quantity,
            total,
            low_confidence: Vec::new(),
        }
    }
}

/// A typed invoice: header plus line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Ledger id of the scan this record came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,

    pub invoice_number: String,

    /// Invoice date, written as DD/MM/YYYY; blank when unknown.
    #[serde(with = "serde_dmy")]
    pub date: Option<NaiveDate>,

    /// Vehicle registration.
    pub vehicle: String,

    pub supplier: String,

    pub owner: String,

    pub line_items: Vec<LineItem>,

    /// Open review items; empty for a clean record.
    #[serde(default)]
    pub flags: Vec<ReviewFlag>,
}

/// Validate extracted fields into an [`InvoiceRecord`].
///
/// Derives unit costs, applies defaults, normalizes whitespace and drops
/// noise lines. Problems are recorded as flags; no data is discarded.
pub fn finalize(header: HeaderFields, raw_items: Vec<RawLineItem>) -> InvoiceRecord {
    let mut flags: Vec<ReviewFlag> = header.flags;
    let mut line_items = Vec::with_capacity(raw_items.len());

    for raw in raw_items {
        let description = normalize_text(&raw.description);
        if description.is_empty() && raw.total.is_none() {
            continue;
        }

        let line = line_items.len();
        for (column, text) in raw.low_confidence {
            let field = match column {
                ItemColumn::Quantity => Field::Quantity { line },
                ItemColumn::Total => Field::Total { line },
            };
            flags.push(ReviewFlag::low_confidence(field, text));
        }

        line_items.push(line_item(description, raw.quantity, raw.total));
    }

    let owner = header
        .owner
        .map(|o| normalize_text(&o))
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| DEFAULT_OWNER.to_string());

    let mut record = InvoiceRecord {
        source_document: header.source_document,
        invoice_number: normalize_text(&header.invoice_number),
        date: header.date,
        vehicle: normalize_text(&header.vehicle).to_uppercase(),
        supplier: normalize_text(&header.supplier),
        owner,
        line_items,
        flags: Vec::new(),
    };

    for (field, empty) in [
        (Field::InvoiceNumber, record.invoice_number.is_empty()),
        (Field::Date, record.date.is_none()),
        (Field::Vehicle, record.vehicle.is_empty()),
    ] {
        if empty && !flags.iter().any(|f| f.concerns(field)) {
            flags.push(ReviewFlag::MissingField { field });
        }
    }
    if record.line_items.is_empty() {
        flags.push(ReviewFlag::NoLineItems);
    }

    record.flags = flags;
    record
}

/// Build a line item, applying the quantity default and deriving unit cost.
pub fn line_item(description: String, quantity: Option<Decimal>, total: Option<Decimal>) -> LineItem {
    let quantity = quantity
        .map(|q| q.abs())
        .filter(|q| !q.is_zero())
        .unwrap_or(Decimal::ONE);
    let total = total.map(|t| t.abs()).unwrap_or(Decimal::ZERO);
    let unit_cost = total.checked_div(quantity).unwrap_or(total);

    LineItem {
        description,
        quantity,
        unit_cost,
        total,
    }
}

/// Trim and collapse internal whitespace.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl InvoiceRecord {
    /// Whether a reviewer still has open items on this record.
    pub fn needs_review(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Sum of line totals.
    pub fn grand_total(&self) -> Decimal {
        self.line_items.iter().map(|i| i.total).sum()
    }

    /// Re-run validation after a reviewer edited the record.
    ///
    /// Low-confidence flags the reviewer left in place are kept; structural
    /// flags are recomputed from the edited values.
    pub fn revalidate(self) -> InvoiceRecord {
        let header = HeaderFields {
            invoice_number: self.invoice_number,
            date: self.date,
            vehicle: self.vehicle,
            supplier: self.supplier,
            owner: Some(self.owner),
            source_document: self.source_document,
            flags: self.flags.into_iter().filter(ReviewFlag::is_low_confidence).collect(),
        };
        let raw = self
            .line_items
            .into_iter()
            .map(|item| RawLineItem::new(item.description, Some(item.quantity), Some(item.total)))
            .collect();
        finalize(header, raw)
    }
}
