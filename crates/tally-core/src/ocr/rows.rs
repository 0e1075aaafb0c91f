//! Grouping of OCR tokens into horizontal rows.

use tracing::trace;

use super::{BBox, Token};

/// Default same-row overlap, as a fraction of the shorter box height.
pub const DEFAULT_Y_TOLERANCE: f32 = 0.5;

/// Tokens lying on the same horizontal band, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub tokens: Vec<Token>,
}

impl Row {
    /// Row text with tokens joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Horizontal extent of all tokens on a page, used to express column
/// boundaries as fractions of the printed width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageExtent {
    pub x_min: f32,
    pub x_max: f32,
}

impl PageExtent {
    pub fn of(rows: &[Row]) -> Self {
        let (x_min, x_max) = rows
            .iter()
            .flat_map(|r| r.tokens.iter())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), t| {
                (lo.min(t.bbox.x0), hi.max(t.bbox.x1))
            });
        Self { x_min, x_max }
    }

    /// Position of `x` as a fraction of the extent, in `[0, 1]` for points
    /// on the page. A zero-width extent maps everything to `0`.
    pub fn fraction(&self, x: f32) -> f32 {
        let width = self.x_max - self.x_min;
        if !(width > 0.0) {
            return 0.0;
        }
        (x - self.x_min) / width
    }
}

/// Group tokens into rows.
///
/// A token joins the row being built when its vertical span overlaps the
/// row's band by more than `y_tolerance` of the shorter of the two heights.
/// Zero-height geometry never overlaps, so degenerate input yields one row
/// per token. Rows come out top to bottom; within a row tokens are ordered
/// by `x0`, keeping emission order on ties.
pub fn group_rows(tokens: &[Token], y_tolerance: f32) -> Vec<Row> {
    let mut order: Vec<(usize, BBox)> = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| (i, t.bbox.normalized()))
        .collect();
    order.sort_by(|a, b| a.1.y0.total_cmp(&b.1.y0).then(a.0.cmp(&b.0)));

    let mut groups: Vec<(BBox, Vec<(usize, BBox)>)> = Vec::new();

    for (idx, bbox) in order {
        let joins = groups.last().is_some_and(|(band, _)| {
            let shorter = band.height().min(bbox.height());
            shorter > 0.0 && band.vertical_overlap(&bbox) > y_tolerance * shorter
        });

        match groups.last_mut() {
            Some((band, members)) if joins => {
                band.y0 = band.y0.min(bbox.y0);
                band.y1 = band.y1.max(bbox.y1);
                members.push((idx, bbox));
            }
            _ => groups.push((bbox, vec![(idx, bbox)])),
        }
    }

    trace!("Grouped {} tokens into {} rows", tokens.len(), groups.len());

    groups
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| a.1.x0.total_cmp(&b.1.x0).then(a.0.cmp(&b.0)));
            Row {
                tokens: members
                    .into_iter()
                    .map(|(i, bbox)| Token {
                        text: tokens[i].text.clone(),
                        bbox,
                    })
                    .collect(),
            }
        })
        .collect()
}
