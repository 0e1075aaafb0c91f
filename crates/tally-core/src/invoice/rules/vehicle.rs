//! Vehicle registration extraction.

use super::{ExtractionMatch, FieldExtractor};
use super::patterns::PLATE;

/// Prefixes the plate pattern would otherwise read in money cells.
const CURRENCY_PREFIXES: [&str; 2] = ["KES", "KSH"];

/// Kenyan registration plate extractor.
pub struct VehicleExtractor;

impl VehicleExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VehicleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VehicleExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let upper = text.to_uppercase();
        PLATE
            .captures_iter(&upper)
            .filter(|caps| !CURRENCY_PREFIXES.contains(&&caps[1]))
            .filter_map(|caps| {
                let m = caps.get(0)?;
                let plate = format!("{} {}{}", &caps[1], &caps[2], &caps[3]);
                Some(ExtractionMatch::new(plate, 1.0, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }
}

/// Normalize an anchored vehicle value.
///
/// Returns the canonical plate when one is present, otherwise the upper-cased
/// text at reduced confidence.
pub fn normalize_vehicle(raw: &str) -> ExtractionMatch<String> {
    match VehicleExtractor::new().extract(raw) {
        Some(plate) => plate,
        None => {
            let upper = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
            ExtractionMatch::new(upper, 0.5, raw)
        }
    }
}
