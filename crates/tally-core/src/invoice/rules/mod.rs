//! Rule-based field parsers for scanned invoices.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod vehicle;

pub use amounts::{parse_amount, to_money};
pub use dates::{format_date, parse_date, DateExtractor};
pub use vehicle::{normalize_vehicle, VehicleExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A parsed value with its confidence and source text.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0). Anything below 1.0 goes to review.
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Whether the value parsed cleanly.
    pub fn is_confident(&self) -> bool {
        self.confidence >= 1.0
    }
}
