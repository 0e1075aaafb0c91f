//! Reconciliation of approved invoices into the canonical dataset.
//!
//! The dataset is one row per line item with header fields repeated. Merging
//! keeps the first row seen for each `INVOICE|DESCRIPTION` key, with existing
//! rows ahead of new ones, then sorts by date.

mod store;

pub use store::{read_dataset, read_rows, write_dataset, write_rows, HEADER};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::invoice::rules::dates::DATE_FORMAT;
use crate::invoice::rules::{format_date, parse_date, to_money};
use crate::models::invoice::{line_item, InvoiceRecord};

/// One flattened line item of the canonical dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    #[serde(rename = "INVOICE")]
    pub invoice: String,
    /// `DD/MM/YYYY`, or blank when unknown.
    #[serde(rename = "DATE")]
    pub date: String,
    #[serde(rename = "VEHICLE")]
    pub vehicle: String,
    #[serde(rename = "DESCRIPTION")]
    pub description: String,
    #[serde(rename = "QUANTITY", with = "number")]
    pub quantity: Decimal,
    #[serde(rename = "UNIT_COST", with = "number")]
    pub unit_cost: Decimal,
    #[serde(rename = "TOTAL", with = "number")]
    pub total: Decimal,
    #[serde(rename = "SUPPLIER")]
    pub supplier: String,
    #[serde(rename = "OWNER")]
    pub owner: String,
}

impl DatasetRow {
    /// Flatten a record into dataset rows, money rounded to two places.
    pub fn from_record(record: &InvoiceRecord) -> Vec<DatasetRow> {
        let date = format_date(record.date);
        record
            .line_items
            .iter()
            .map(|item| DatasetRow {
                invoice: record.invoice_number.clone(),
                date: date.clone(),
                vehicle: record.vehicle.clone(),
                description: item.description.clone(),
                quantity: item.quantity,
                unit_cost: to_money(item.unit_cost),
                total: to_money(item.total),
                supplier: record.supplier.clone(),
                owner: record.owner.clone(),
            })
            .collect()
    }

    /// Deduplication key: `INVOICE|DESCRIPTION`.
    pub fn identity_key(&self) -> String {
        format!("{}|{}", self.invoice, self.description)
    }

    /// The row's date, when it parses.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let text = self.date.trim();
        if text.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .or_else(|| parse_date(text))
    }

    /// Bring a row from outside the pipeline into canonical form.
    ///
    /// Parsable dates are rewritten as `DD/MM/YYYY`; unparsable ones are kept
    /// verbatim. Quantity and unit cost are rebuilt from the total with the
    /// same rule the extractor applies, and money is rounded to two places.
    pub fn normalized(self) -> DatasetRow {
        let date = match self.parsed_date() {
            Some(date) => format_date(Some(date)),
            None => self.date,
        };
        let item = line_item(self.description, Some(self.quantity), Some(self.total));
        DatasetRow {
            date,
            description: item.description,
            quantity: item.quantity,
            unit_cost: to_money(item.unit_cost),
            total: to_money(item.total),
            ..self
        }
    }
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The new canonical dataset.
    pub rows: Vec<DatasetRow>,
    /// Rows dropped because their identity key was already present.
    pub duplicates_dropped: usize,
}

/// Merge approved records into an existing dataset.
pub fn merge(existing: Vec<DatasetRow>, new_records: &[InvoiceRecord]) -> MergeOutcome {
    let incoming = new_records.iter().flat_map(DatasetRow::from_record).collect();
    merge_rows(existing, incoming)
}

/// Merge already-flattened rows into an existing dataset.
///
/// Incoming rows are normalized first. Existing rows win over incoming rows
/// with the same identity key. The result is sorted stably by date with
/// blank or unparsable dates last.
pub fn merge_rows(existing: Vec<DatasetRow>, incoming: Vec<DatasetRow>) -> MergeOutcome {
    let incoming: Vec<_> = incoming.into_iter().map(DatasetRow::normalized).collect();
    let total = existing.len() + incoming.len();
    let mut seen = HashSet::with_capacity(total);
    let mut rows = Vec::with_capacity(total);

    for row in existing.into_iter().chain(incoming) {
        if seen.insert(row.identity_key()) {
            rows.push(row);
        } else {
            debug!("Duplicate row {}", row.identity_key());
        }
    }
    let duplicates_dropped = total - rows.len();

    rows.sort_by_cached_key(|r| match r.parsed_date() {
        Some(date) => (false, date),
        None => (true, NaiveDate::MIN),
    });

    if duplicates_dropped > 0 {
        info!("Dropped {} duplicate rows during merge", duplicates_dropped);
    }

    MergeOutcome {
        rows,
        duplicates_dropped,
    }
}

/// Per-supplier totals of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierSummary {
    pub supplier: String,
    /// Distinct invoice numbers.
    pub invoices: usize,
    pub rows: usize,
    pub total: Decimal,
}

impl fmt::Display for SupplierSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} invoices, {} rows, {:.2}",
            self.supplier, self.invoices, self.rows, self.total
        )
    }
}

/// Group a dataset by supplier, sorted by supplier name.
pub fn summarize(rows: &[DatasetRow]) -> Vec<SupplierSummary> {
    let mut groups: BTreeMap<&str, (BTreeSet<&str>, usize, Decimal)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(row.supplier.as_str()).or_default();
        entry.0.insert(row.invoice.as_str());
        entry.1 += 1;
        entry.2 += row.total;
    }

    groups
        .into_iter()
        .map(|(supplier, (invoices, rows, total))| SupplierSummary {
            supplier: supplier.to_string(),
            invoices: invoices.len(),
            rows,
            total,
        })
        .collect()
}

/// Numeric cells: blank reads as zero, anything else must be a plain number.
mod number {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.normalize())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let text = String::deserialize(deserializer)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(Decimal::ZERO);
        }
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| serde::de::Error::custom(format!("not a number: '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::{finalize, HeaderFields, RawLineItem};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn row(invoice: &str, date: &str, description: &str, total: &str) -> DatasetRow {
        let total = Decimal::from_str(total).unwrap();
        DatasetRow {
            invoice: invoice.to_string(),
            date: date.to_string(),
            vehicle: "KCA 123A".to_string(),
            description: description.to_string(),
            quantity: Decimal::ONE,
            unit_cost: total,
            total,
            supplier: "TYREMART".to_string(),
            owner: "FIRESIDE".to_string(),
        }
    }

    fn canonical() -> Vec<DatasetRow> {
        vec![
            row("1", "01/01/2024", "Oil filter", "400"),
            row("2", "02/01/2024", "Brake pads", "1500"),
            row("3", "03/01/2024", "Wiper", "300"),
        ]
    }

    fn record(invoice: &str, date: (i32, u32, u32), items: &[(&str, &str)]) -> InvoiceRecord {
        let header = HeaderFields {
            invoice_number: invoice.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            vehicle: "KCA 123A".to_string(),
            supplier: "TYREMART".to_string(),
            ..Default::default()
        };
        let raw = items
            .iter()
            .map(|(d, t)| RawLineItem::new(*d, None, Some(Decimal::from_str(t).unwrap())))
            .collect();
        finalize(header, raw)
    }

    #[test]
    fn test_merge_with_nothing_is_identity() {
        let outcome = merge(canonical(), &[]);
        assert_eq!(outcome.rows, canonical());
        assert_eq!(outcome.duplicates_dropped, 0);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let new = [record("4", (2024, 1, 4), &[("Battery", "9000")])];
        let once = merge(canonical(), &new).rows;
        let twice = merge(once.clone(), &new);
        assert_eq!(twice.rows, once);
        assert_eq!(twice.duplicates_dropped, 1);
    }

    #[test]
    fn test_three_plus_two_with_one_duplicate_is_four() {
        let new = [
            record("2", (2024, 1, 2), &[("Brake pads", "1600")]),
            record("5", (2024, 1, 5), &[("Tyre", "8000")]),
        ];
        let outcome = merge(canonical(), &new);
        assert_eq!(outcome.rows.len(), 4);
        assert_eq!(outcome.duplicates_dropped, 1);

        // The existing row survives
        let brake = outcome.rows.iter().find(|r| r.invoice == "2").unwrap();
        assert_eq!(brake.total, Decimal::from(1500));
    }

    #[test]
    fn test_first_new_row_wins_without_existing() {
        let outcome = merge_rows(
            Vec::new(),
            vec![row("7", "01/02/2024", "Tyre", "100"), row("7", "01/02/2024", "Tyre", "200")],
        );
        assert_eq!(outcome.rows, vec![row("7", "01/02/2024", "Tyre", "100")]);
    }

    #[test]
    fn test_sort_by_date_with_blanks_last_in_input_order() {
        let outcome = merge_rows(
            vec![
                row("a", "", "x", "1"),
                row("b", "15/03/2024", "x", "1"),
                row("c", "garbage", "x", "1"),
                row("d", "01/03/2024", "x", "1"),
            ],
            vec![row("e", "2024-02-01", "x", "1"), row("f", "", "x", "1")],
        );
        let order: Vec<_> = outcome.rows.iter().map(|r| r.invoice.as_str()).collect();
        assert_eq!(order, vec!["e", "d", "b", "a", "c", "f"]);
    }

    #[test]
    fn test_incoming_rows_are_normalized() {
        let external = DatasetRow {
            quantity: Decimal::from(3),
            unit_cost: Decimal::from(999),
            ..row("8", "2024-02-01", "Bolts", "100.006")
        };
        let outcome = merge_rows(Vec::new(), vec![external, row("9", "garbage", "Nuts", "50")]);

        let bolts = &outcome.rows[0];
        assert_eq!(bolts.date, "01/02/2024");
        assert_eq!(bolts.quantity, Decimal::from(3));
        assert_eq!(bolts.unit_cost, Decimal::from_str("33.34").unwrap());
        assert_eq!(bolts.total, Decimal::from_str("100.01").unwrap());

        // Unparsable dates are kept as written
        assert_eq!(outcome.rows[1].date, "garbage");
    }

    #[test]
    fn test_incoming_quantity_defaults_to_one() {
        let external = DatasetRow {
            quantity: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            ..row("8", "01/02/2024", "Labour", "750")
        };
        let outcome = merge_rows(Vec::new(), vec![external]);
        assert_eq!(outcome.rows[0].quantity, Decimal::ONE);
        assert_eq!(outcome.rows[0].unit_cost, Decimal::from(750));
    }

    #[test]
    fn test_normalized_incoming_duplicate_of_existing_is_dropped() {
        let outcome = merge_rows(
            vec![row("7", "01/02/2024", "Tyre", "100")],
            vec![row("7", "2024-02-01", "Tyre", "100")],
        );
        assert_eq!(outcome.rows, vec![row("7", "01/02/2024", "Tyre", "100")]);
        assert_eq!(outcome.duplicates_dropped, 1);
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let outcome = merge_rows(
            vec![row("z", "01/01/2024", "x", "1")],
            vec![row("a", "01/01/2024", "x", "1")],
        );
        let order: Vec<_> = outcome.rows.iter().map(|r| r.invoice.as_str()).collect();
        assert_eq!(order, vec!["z", "a"]);
    }

    #[test]
    fn test_flatten_rounds_money() {
        let mut rec = record("9", (2024, 5, 1), &[("Bolts", "100")]);
        rec.line_items[0].quantity = Decimal::from(3);
        let rec = rec.revalidate();

        let rows = DatasetRow::from_record(&rec);
        assert_eq!(rows[0].unit_cost, Decimal::from_str("33.33").unwrap());
        assert_eq!(rows[0].date, "01/05/2024");
        assert_eq!(rows[0].owner, "FIRESIDE");
    }

    #[test]
    fn test_summarize() {
        let mut rows = canonical();
        rows.push(row("1", "01/01/2024", "Labour", "100"));
        rows.push(DatasetRow {
            supplier: "CMC MOTORS".to_string(),
            ..row("C-1", "", "Service", "5000")
        });

        let summary = summarize(&rows);
        assert_eq!(
            summary,
            vec![
                SupplierSummary {
                    supplier: "CMC MOTORS".to_string(),
                    invoices: 1,
                    rows: 1,
                    total: Decimal::from(5000),
                },
                SupplierSummary {
                    supplier: "TYREMART".to_string(),
                    invoices: 3,
                    rows: 4,
                    total: Decimal::from(2300),
                },
            ]
        );
    }
}
