//! Layout-driven extraction of header fields and line items from rows.

use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info, trace, warn};

use crate::error::ExtractionError;
use crate::models::invoice::{
    finalize, Field, HeaderFields, InvoiceRecord, ItemColumn, RawLineItem, ReviewFlag,
};
use crate::ocr::{BBox, PageExtent, Row};

use super::layout::{Anchor, LayoutRules, SupplierLayout};
use super::rules::{normalize_vehicle, parse_amount, parse_date, FieldExtractor, VehicleExtractor};
use super::{InvoiceLayout, Result};

/// Header fields located on a page, plus where the line items begin.
#[derive(Debug, Clone, Default)]
pub struct HeaderScan {
    pub header: HeaderFields,
    /// First row that may hold a line item.
    pub items_start: usize,
    /// Rows consumed by header anchors; never read as line items.
    pub anchor_rows: Vec<usize>,
}

/// Extract an invoice from grouped rows using the layout named by
/// `supplier_id`.
pub fn extract(rows: &[Row], supplier_id: &str) -> Result<InvoiceRecord> {
    LayoutExtractor::new(SupplierLayout::from_id(supplier_id)?).extract(rows)
}

/// Extractor bound to one supplier layout.
#[derive(Debug, Clone)]
pub struct LayoutExtractor {
    layout: SupplierLayout,
    owner: Option<String>,
}

impl LayoutExtractor {
    pub fn new(layout: SupplierLayout) -> Self {
        Self { layout, owner: None }
    }

    /// Owner written on extracted records.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Extract and validate one invoice.
    ///
    /// Fails with `DocumentUnreadable` when there are no rows or when no
    /// anchor and no table header can be found.
    pub fn extract(&self, rows: &[Row]) -> Result<InvoiceRecord> {
        let start = Instant::now();
        if rows.is_empty() {
            return Err(ExtractionError::DocumentUnreadable("no text rows on page".into()));
        }

        let rules = self.layout.rules();
        let mut scan = rules.locate_header(rows)?;
        scan.header.supplier = self.layout.display_name().to_string();
        scan.header.owner = self.owner.clone();

        let items = rules.segment_items(rows, &scan);
        let record = finalize(scan.header, items);

        info!(
            "Extracted {} invoice '{}' with {} line items ({} flags) in {}ms",
            self.layout,
            record.invoice_number,
            record.line_items.len(),
            record.flags.len(),
            start.elapsed().as_millis()
        );

        Ok(record)
    }
}

impl InvoiceLayout for LayoutRules {
    fn locate_header(&self, rows: &[Row]) -> Result<HeaderScan> {
        let labels = self.labels();
        let items_header = find_marker_row(rows, 0, self.items_header);

        // Labels are only read above the table, so item descriptions such as
        // "Reg plate holder" never act as anchors.
        let band_end = items_header.unwrap_or_else(|| {
            let extent = PageExtent::of(rows);
            rows.iter()
                .position(|row| self.is_item_row(&self.cells(row, &extent), &labels))
                .unwrap_or(rows.len())
        });
        let band = &rows[..band_end];
        trace!("Header band is rows 0..{}", band_end);

        let invoice = locate(band, self.invoice_number, &labels);
        let date = locate(band, self.date, &labels);
        let vehicle = self.vehicle.and_then(|a| locate(band, a, &labels));

        if invoice.is_none() && date.is_none() && vehicle.is_none() && items_header.is_none() {
            return Err(ExtractionError::DocumentUnreadable(
                "no header anchor or table header found".into(),
            ));
        }

        let mut anchor_rows: Vec<usize> = [&invoice, &date, &vehicle]
            .into_iter()
            .flatten()
            .flat_map(|hit| hit.row..=hit.last_row)
            .collect();
        anchor_rows.sort_unstable();
        anchor_rows.dedup();

        let items_start = match items_header {
            Some(r) => r + 1,
            None => anchor_rows.last().map_or(0, |r| r + 1),
        };
        debug!("Header anchors on rows {:?}, line items from row {}", anchor_rows, items_start);

        let mut header = HeaderFields {
            invoice_number: invoice.map(|h| h.value).unwrap_or_default(),
            ..Default::default()
        };

        if let Some(hit) = date {
            header.date = parse_date(&hit.value);
            if header.date.is_none() {
                warn!("Unreadable date '{}'", hit.value);
                header.flags.push(ReviewFlag::low_confidence(Field::Date, hit.value));
            }
        }

        match vehicle {
            Some(hit) => {
                let plate = normalize_vehicle(&hit.value);
                if !plate.is_confident() {
                    warn!("Vehicle '{}' is not a registration plate", hit.value);
                    header.flags.push(ReviewFlag::low_confidence(Field::Vehicle, hit.value));
                }
                header.vehicle = plate.value;
            }
            None => {
                let page = rows.iter().map(Row::text).collect::<Vec<_>>().join("\n");
                if let Some(plate) = VehicleExtractor::new().extract(&page) {
                    debug!("Vehicle {} found by page search", plate.value);
                    header.vehicle = plate.value;
                }
            }
        }

        Ok(HeaderScan {
            header,
            items_start,
            anchor_rows,
        })
    }

    fn segment_items(&self, rows: &[Row], scan: &HeaderScan) -> Vec<RawLineItem> {
        let extent = PageExtent::of(rows);
        let mut end = rows.len();
        let mut items: Vec<RawLineItem> = Vec::new();

        for (r, row) in rows.iter().enumerate().skip(scan.items_start) {
            if scan.anchor_rows.contains(&r) {
                continue;
            }

            let Cells {
                description,
                quantity,
                total,
            } = self.cells(row, &extent);

            if self.is_footer_row(&description, &quantity) {
                end = r;
                break;
            }
            if description.is_empty() && quantity.is_empty() && total.is_empty() {
                continue;
            }
            let description = description.join(" ");

            if self.merge_wrapped && quantity.is_empty() && total.is_empty() {
                if let Some(previous) = items.last_mut() {
                    trace!("Row {}: continuing description '{}'", r, description);
                    previous.description.push(' ');
                    previous.description.push_str(&description);
                    continue;
                }
            }

            let mut item = RawLineItem::new(description, None, None);
            item.quantity = read_cell(&quantity.join(" "), ItemColumn::Quantity, &mut item.low_confidence);
            item.total = read_cell(&total.join(" "), ItemColumn::Total, &mut item.low_confidence);
            items.push(item);
        }

        debug!("Segmented {} raw line items from rows {}..{}", items.len(), scan.items_start, end);
        items
    }
}

/// Row text split into table columns.
#[derive(Debug, Default)]
struct Cells<'a> {
    description: Vec<&'a str>,
    quantity: Vec<&'a str>,
    total: Vec<&'a str>,
}

impl LayoutRules {
    fn cells<'a>(&self, row: &'a Row, extent: &PageExtent) -> Cells<'a> {
        let mut cells = Cells::default();
        for token in &row.tokens {
            let text = token.text.trim();
            if text.is_empty() {
                continue;
            }
            let f = extent.fraction(token.bbox.center_x());
            if self.description.contains(f) {
                cells.description.push(text);
            } else if self.quantity.is_some_and(|q| q.contains(f)) {
                cells.quantity.push(text);
            } else if self.total.contains(f) {
                cells.total.push(text);
            } else {
                trace!("'{}' at {:.2} is outside every column", text, f);
            }
        }
        cells
    }

    /// A row shaped like a line item: a description that is more than a
    /// label, an amount in the total column, and one in the quantity column
    /// when the layout has it.
    fn is_item_row(&self, cells: &Cells<'_>, labels: &[&str]) -> bool {
        let words = text_words(&cells.description);
        if words.is_empty() || match_label(&words, 0, labels) == Some(words.len()) {
            return false;
        }
        let quantity_ok = self.quantity.is_none() || is_amount_cell(&cells.quantity);
        quantity_ok && is_amount_cell(&cells.total)
    }

    /// A footer starts its description with a marker, carries no quantity,
    /// and has nothing but figures or currency after the marker.
    fn is_footer_row(&self, description: &[&str], quantity: &[&str]) -> bool {
        if !quantity.is_empty() {
            return false;
        }
        let words = text_words(description);
        match match_label(&words, 0, self.footer) {
            Some(n) => words[n..].iter().all(|w| {
                matches!(w.key.as_str(), "KSH" | "KSHS" | "KES") || !w.key.chars().any(char::is_alphabetic)
            }),
            None => false,
        }
    }
}

fn text_words(cells: &[&str]) -> Vec<Word> {
    cells
        .iter()
        .flat_map(|c| c.split_whitespace())
        .map(|w| Word::new(w.to_string(), 0))
        .collect()
}

/// A cell holding an amount and not a date.
fn is_amount_cell(cells: &[&str]) -> bool {
    let text = cells.join(" ");
    !text.is_empty() && parse_date(&text).is_none() && parse_amount(&text).is_some()
}

/// Parse a numeric cell. Blank is `None`; noise reads as zero and is flagged.
fn read_cell(text: &str, column: ItemColumn, flags: &mut Vec<(ItemColumn, String)>) -> Option<Decimal> {
    if text.trim().is_empty() {
        return None;
    }
    match parse_amount(text) {
        Some(m) => {
            if !m.is_confident() {
                flags.push((column, m.source.clone()));
            }
            Some(m.value)
        }
        None => {
            warn!("Unreadable {:?} cell '{}'", column, text);
            flags.push((column, text.to_string()));
            Some(Decimal::ZERO)
        }
    }
}

/// A located header value.
#[derive(Debug, Clone)]
struct AnchorHit {
    row: usize,
    /// Last row the value was read from.
    last_row: usize,
    value: String,
}

/// One word of row text and the token it came from.
#[derive(Debug, Clone)]
struct Word {
    text: String,
    key: String,
    token: usize,
}

impl Word {
    fn new(text: String, token: usize) -> Self {
        let key = text
            .to_uppercase()
            .trim_matches(|c: char| matches!(c, ':' | '.' | '#' | ','))
            .to_string();
        Self { text, key, token }
    }
}

fn row_words(row: &Row) -> Vec<Word> {
    let mut words = Vec::new();
    for (token, t) in row.tokens.iter().enumerate() {
        for piece in t.text.split_whitespace() {
            // "INV:1023" carries the label and its value in one word
            match piece.split_once(':') {
                Some((label, value))
                    if !value.is_empty() && !label.is_empty() && label.chars().all(|c| c.is_alphabetic() || c == '.') =>
                {
                    words.push(Word::new(format!("{}:", label), token));
                    words.push(Word::new(value.to_string(), token));
                }
                _ => words.push(Word::new(piece.to_string(), token)),
            }
        }
    }
    words
}

/// Number of words of the first label matching at `start`.
fn match_label(words: &[Word], start: usize, labels: &[&str]) -> Option<usize> {
    labels.iter().find_map(|label| {
        let parts: Vec<&str> = label.split_whitespace().collect();
        let window = words.get(start..start + parts.len())?;
        window
            .iter()
            .zip(&parts)
            .all(|(w, p)| w.key == *p)
            .then_some(parts.len())
    })
}

fn find_marker_row(rows: &[Row], from: usize, markers: &[&str]) -> Option<usize> {
    if markers.is_empty() {
        return None;
    }
    (from..rows.len()).find(|&r| {
        let words = row_words(&rows[r]);
        (0..words.len()).any(|i| match_label(&words, i, markers).is_some())
    })
}

fn locate(rows: &[Row], anchor: Anchor, all_labels: &[&str]) -> Option<AnchorHit> {
    match anchor {
        Anchor::Fixed { row, col } => {
            let value = rows.get(row)?.tokens.get(col)?.text.trim().to_string();
            trace!("Fixed anchor ({}, {}) = '{}'", row, col, value);
            (!value.is_empty()).then_some(AnchorHit {
                row,
                last_row: row,
                value,
            })
        }
        Anchor::Label(labels) => find_label(rows, labels, all_labels),
    }
}

/// Find a labelled value.
///
/// A value on the label's own row wins over one read from the row below.
fn find_label(rows: &[Row], labels: &[&str], all_labels: &[&str]) -> Option<AnchorHit> {
    let mut below: Option<AnchorHit> = None;

    for (r, row) in rows.iter().enumerate() {
        let words = row_words(row);
        for start in 0..words.len() {
            let Some(n) = match_label(&words, start, labels) else {
                continue;
            };
            let value_start = start + n;
            let value_end = (value_start..words.len())
                .find(|&i| match_label(&words, i, all_labels).is_some())
                .unwrap_or(words.len());

            let value = join_value(&words[value_start..value_end]);
            if !value.is_empty() {
                trace!("Label '{}' on row {} = '{}'", words[start].text, r, value);
                return Some(AnchorHit {
                    row: r,
                    last_row: r,
                    value,
                });
            }

            if below.is_none() {
                let span = label_span(row, &words[start..value_start]);
                let value = rows.get(r + 1).map(|next| text_below(next, &span)).unwrap_or_default();
                if !value.is_empty() {
                    trace!("Label '{}' on row {} reads '{}' below", words[start].text, r, value);
                    below = Some(AnchorHit {
                        row: r,
                        last_row: r + 1,
                        value,
                    });
                }
            }
        }
    }

    below
}

fn join_value(words: &[Word]) -> String {
    let joined = words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
    joined
        .trim_start_matches(|c: char| c == ':' || c == '#' || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Horizontal span of the tokens a label was read from.
fn label_span(row: &Row, words: &[Word]) -> BBox {
    words.iter().fold(
        BBox::new(f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY, f32::INFINITY),
        |span, w| {
            let b = row.tokens[w.token].bbox;
            BBox::new(span.x0.min(b.x0), b.y0, span.x1.max(b.x1), b.y1)
        },
    )
}

fn text_below(row: &Row, span: &BBox) -> String {
    row.tokens
        .iter()
        .filter(|t| t.bbox.overlaps_horizontally(span))
        .map(|t| t.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{group_rows, Token, DEFAULT_Y_TOLERANCE};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Lay out `(text, x0, x1)` cells with one page row per inner slice.
    fn page(lines: &[&[(&str, f32, f32)]]) -> Vec<Row> {
        let mut tokens = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let y0 = i as f32 * 40.0;
            for (text, x0, x1) in line.iter() {
                tokens.push(Token::new(*text, [*x0, y0, *x1, y0 + 20.0]));
            }
        }
        // OCR emission order is not reading order
        tokens.reverse();
        group_rows(&tokens, DEFAULT_Y_TOLERANCE)
    }

    #[test]
    fn test_tyremart_scenario() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("1023", 60.0, 120.0)],
            &[("DATE", 0.0, 50.0), ("05/04/2024", 60.0, 200.0)],
            &[("Oil filter", 0.0, 150.0), ("2", 300.0, 320.0), ("400", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();

        assert_eq!(record.invoice_number, "1023");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 4, 5));
        assert_eq!(record.supplier, "TYREMART");
        assert_eq!(record.owner, "FIRESIDE");
        assert_eq!(record.line_items.len(), 1);

        let item = &record.line_items[0];
        assert_eq!(item.description, "Oil filter");
        assert_eq!(item.quantity, dec("2"));
        assert_eq!(item.total, dec("400"));
        assert_eq!(item.unit_cost, dec("200"));
    }

    #[test]
    fn test_blank_quantity_and_thousands_total() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("1024", 60.0, 120.0)],
            &[("DATE", 0.0, 50.0), ("06/04/2024", 60.0, 200.0)],
            &[("Brake pads", 0.0, 150.0), ("1,500", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        let item = &record.line_items[0];
        assert_eq!(item.quantity, Decimal::ONE);
        assert_eq!(item.total, dec("1500"));
        assert_eq!(item.unit_cost, dec("1500"));
    }

    #[test]
    fn test_footer_stops_line_items() {
        let rows = page(&[
            &[("INVOICE NO:", 0.0, 100.0), ("88", 110.0, 150.0), ("REG: kca 123a", 250.0, 400.0)],
            &[("DATE:", 0.0, 50.0), ("2024-01-09", 60.0, 200.0)],
            &[("Tyre 205/55R16", 0.0, 200.0), ("4", 300.0, 320.0), ("KSh 32,000", 420.0, 500.0)],
            &[("SUBTOTAL", 0.0, 100.0), ("32,000", 420.0, 500.0)],
            &[("Thank you", 0.0, 100.0), ("1", 300.0, 320.0), ("5", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        assert_eq!(record.invoice_number, "88");
        assert_eq!(record.vehicle, "KCA 123A");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 9));
        assert_eq!(record.line_items.len(), 1);
        assert_eq!(record.line_items[0].unit_cost, dec("8000"));
        assert!(!record.needs_review());
    }

    #[test]
    fn test_autoxpress_header_table() {
        let rows = page(&[
            &[("INVOICE NO: AX-77", 0.0, 300.0)],
            &[("DATE: 12-Mar-24", 0.0, 300.0)],
            &[("VEHICLE: kcb 123x", 0.0, 300.0)],
            &[("QTY", 20.0, 60.0), ("DESCRIPTION", 150.0, 500.0), ("UNIT PRICE", 700.0, 760.0), ("TOTAL", 850.0, 950.0)],
            &[("2", 20.0, 60.0), ("Brake pads", 150.0, 500.0), ("1,250.00", 700.0, 760.0), ("2,500.00", 850.0, 950.0)],
            &[("1", 20.0, 60.0), ("Labour", 150.0, 500.0), ("500", 700.0, 760.0), ("500", 850.0, 950.0)],
            &[("AMOUNT DUE", 150.0, 400.0), ("3,000.00", 850.0, 950.0)],
            &[("Thank you", 150.0, 400.0)],
        ]);

        let record = extract(&rows, "autoxpress").unwrap();
        assert_eq!(record.invoice_number, "AX-77");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(record.vehicle, "KCB 123X");
        assert_eq!(record.line_items.len(), 2);
        assert_eq!(record.line_items[0].description, "Brake pads");
        assert_eq!(record.line_items[0].quantity, dec("2"));
        assert_eq!(record.line_items[0].unit_cost, dec("1250"));
        assert_eq!(record.line_items[1].total, dec("500"));
        assert_eq!(record.grand_total(), dec("3000"));
    }

    #[test]
    fn test_cmc_fixed_anchor_and_wrapped_descriptions() {
        let rows = page(&[
            &[("CMC MOTORS", 0.0, 300.0), ("C-4411", 600.0, 800.0)],
            &[("DATE", 0.0, 100.0), ("05/04/2024", 150.0, 350.0), ("REG NO", 600.0, 700.0), ("KDA 456B", 750.0, 950.0)],
            &[("PARTICULARS", 0.0, 300.0), ("AMOUNT", 800.0, 950.0)],
            &[("Front shock absorbers", 0.0, 400.0), ("9,000", 800.0, 950.0)],
            &[("(pair) fitted", 0.0, 300.0)],
            &[("Wheel balancing", 0.0, 300.0), ("1,200", 800.0, 950.0)],
            &[("TOTAL", 0.0, 100.0), ("10,200", 800.0, 950.0)],
        ]);

        let record = extract(&rows, "cmc").unwrap();
        assert_eq!(record.invoice_number, "C-4411");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 4, 5));
        assert_eq!(record.vehicle, "KDA 456B");
        assert_eq!(record.supplier, "CMC MOTORS");

        let descriptions: Vec<_> = record.line_items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Front shock absorbers (pair) fitted", "Wheel balancing"]);
        assert!(record.line_items.iter().all(|i| i.quantity == Decimal::ONE));
        assert_eq!(record.grand_total(), dec("10200"));
    }

    #[test]
    fn test_values_read_from_row_below_labels() {
        let rows = page(&[
            &[("INVOICE NO", 0.0, 200.0), ("DATE", 400.0, 500.0)],
            &[("1023", 0.0, 100.0), ("05/04/2024", 400.0, 600.0)],
            &[("Oil filter", 0.0, 150.0), ("2", 400.0, 430.0), ("400", 520.0, 600.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        assert_eq!(record.invoice_number, "1023");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 4, 5));
        assert_eq!(record.line_items.len(), 1);
    }

    #[test]
    fn test_noisy_cells_are_flagged_not_fatal() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("9", 60.0, 120.0)],
            &[("DATE", 0.0, 50.0), ("31/31/2024", 60.0, 200.0)],
            &[("Battery", 0.0, 150.0), ("1", 300.0, 320.0), ("l2,5OO", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        assert_eq!(record.date, None);
        assert_eq!(record.line_items[0].total, Decimal::ZERO);
        assert!(record.flags.contains(&ReviewFlag::low_confidence(Field::Date, "31/31/2024")));
        assert!(record.flags.contains(&ReviewFlag::low_confidence(Field::Total { line: 0 }, "l2,5OO")));
    }

    #[test]
    fn test_vehicle_found_by_page_search() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("1023", 60.0, 120.0)],
            &[("DATE", 0.0, 50.0), ("05/04/2024", 60.0, 200.0), ("KBZ001X", 300.0, 400.0)],
            &[("Oil filter", 0.0, 150.0), ("2", 300.0, 320.0), ("400", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        assert_eq!(record.vehicle, "KBZ 001X");
    }

    #[test]
    fn test_no_anchor_is_unreadable() {
        let rows = page(&[&[("smudge", 0.0, 100.0)], &[("42", 300.0, 320.0)]]);
        assert!(matches!(
            extract(&rows, "tyremart"),
            Err(ExtractionError::DocumentUnreadable(_))
        ));
        assert!(matches!(
            extract(&[], "tyremart"),
            Err(ExtractionError::DocumentUnreadable(_))
        ));
    }

    #[test]
    fn test_unknown_supplier() {
        let rows = page(&[&[("INV", 0.0, 40.0), ("1", 60.0, 120.0)]]);
        assert!(matches!(
            extract(&rows, "nobody"),
            Err(ExtractionError::UnknownSupplier(_))
        ));
    }

    #[test]
    fn test_owner_override() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("1023", 60.0, 120.0)],
            &[("Oil filter", 0.0, 150.0), ("2", 300.0, 320.0), ("400", 420.0, 500.0)],
        ]);
        let record = LayoutExtractor::new(SupplierLayout::Tyremart)
            .with_owner("ACME FLEET")
            .extract(&rows)
            .unwrap();
        assert_eq!(record.owner, "ACME FLEET");
    }

    fn descriptions(record: &InvoiceRecord) -> Vec<&str> {
        record.line_items.iter().map(|i| i.description.as_str()).collect()
    }

    #[test]
    fn test_label_words_in_descriptions_stay_line_items() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("1023", 60.0, 120.0)],
            &[("DATE", 0.0, 50.0), ("05/04/2024", 60.0, 200.0)],
            &[("Oil filter", 0.0, 150.0), ("2", 300.0, 320.0), ("400", 420.0, 500.0)],
            &[("Reg plate holder", 0.0, 150.0), ("1", 300.0, 320.0), ("300", 420.0, 500.0)],
            &[("Invoice handling", 0.0, 150.0), ("1", 300.0, 320.0), ("50", 420.0, 500.0)],
            &[("Battery", 0.0, 150.0), ("1", 300.0, 320.0), ("9000", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        assert_eq!(record.invoice_number, "1023");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 4, 5));
        assert_eq!(
            descriptions(&record),
            vec!["Oil filter", "Reg plate holder", "Invoice handling", "Battery"]
        );
        assert_eq!(record.vehicle, "");
        assert!(record.flags.contains(&ReviewFlag::MissingField { field: Field::Vehicle }));
        assert_eq!(record.grand_total(), dec("9750"));
    }

    #[test]
    fn test_label_below_does_not_swallow_first_item() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("1023", 60.0, 120.0)],
            &[("DATE", 0.0, 50.0), ("05/04/2024", 60.0, 200.0), ("REG", 300.0, 340.0)],
            &[("Oil filter", 0.0, 150.0), ("2", 300.0, 320.0), ("400", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        assert_eq!(descriptions(&record), vec!["Oil filter"]);
        assert_eq!(record.line_items[0].quantity, dec("2"));
    }

    #[test]
    fn test_footer_words_inside_descriptions_stay_line_items() {
        let rows = page(&[
            &[("INV", 0.0, 40.0), ("1023", 60.0, 120.0)],
            &[("DATE", 0.0, 50.0), ("05/04/2024", 60.0, 200.0)],
            &[("TOTAL Quartz 5W40 oil", 0.0, 200.0), ("2", 300.0, 320.0), ("4,800", 420.0, 500.0)],
            &[("VAT exempt labour", 0.0, 200.0), ("1", 300.0, 320.0), ("500", 420.0, 500.0)],
            &[("Oil filter", 0.0, 150.0), ("1", 300.0, 320.0), ("400", 420.0, 500.0)],
            &[("SUBTOTAL KSh", 0.0, 150.0), ("5,700", 420.0, 500.0)],
            &[("Thank you", 0.0, 100.0), ("1", 300.0, 320.0), ("5", 420.0, 500.0)],
        ]);

        let record = extract(&rows, "tyremart").unwrap();
        assert_eq!(
            descriptions(&record),
            vec!["TOTAL Quartz 5W40 oil", "VAT exempt labour", "Oil filter"]
        );
        assert_eq!(record.line_items[0].unit_cost, dec("2400"));
        assert_eq!(record.grand_total(), dec("5700"));
    }

    #[test]
    fn test_footer_needs_marker_first_without_quantity_column() {
        let rows = page(&[
            &[("CMC MOTORS", 0.0, 300.0), ("C-4412", 600.0, 800.0)],
            &[("DATE", 0.0, 100.0), ("06/04/2024", 150.0, 350.0)],
            &[("PARTICULARS", 0.0, 300.0), ("AMOUNT", 800.0, 950.0)],
            &[("TOTAL Quartz engine oil", 0.0, 400.0), ("4,800", 800.0, 950.0)],
            &[("Labour", 0.0, 300.0), ("1,000", 800.0, 950.0)],
            &[("TOTAL", 0.0, 100.0), ("5,800", 800.0, 950.0)],
            &[("Signature", 0.0, 300.0), ("1", 800.0, 950.0)],
        ]);

        let record = extract(&rows, "cmc").unwrap();
        assert_eq!(descriptions(&record), vec!["TOTAL Quartz engine oil", "Labour"]);
        assert_eq!(record.grand_total(), dec("5800"));
    }
}
