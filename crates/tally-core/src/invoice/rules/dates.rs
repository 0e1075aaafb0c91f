//! Date extraction for scanned invoices.
//!
//! Dates are read day-first. Canonical text form is `DD/MM/YYYY`.

use chrono::NaiveDate;

use super::{ExtractionMatch, FieldExtractor};
use super::patterns::{DATE_DMY, DATE_TEXT_DMY, DATE_TEXT_MDY, DATE_YMD};

/// Canonical `strftime` format for dates in drafts and the dataset.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<ExtractionMatch<NaiveDate>> = Vec::new();

        let mut push = |date: Option<NaiveDate>, m: Option<regex::Match<'_>>, confidence: f32| {
            if let (Some(date), Some(m)) = (date, m) {
                if results.iter().any(|r| r.position.is_some_and(|(s, e)| s < m.end() && m.start() < e)) {
                    return;
                }
                results.push(
                    ExtractionMatch::new(date, confidence, m.as_str())
                        .with_position(m.start(), m.end()),
                );
            }
        };

        // YYYY-MM-DD first so its tail is not read as a day-first date
        for caps in DATE_YMD.captures_iter(text) {
            let date = ymd(caps[1].parse().ok(), caps[2].parse().ok(), caps[3].parse().ok());
            push(date, caps.get(0), 0.95);
        }

        for caps in DATE_DMY.captures_iter(text) {
            let date = ymd(Some(parse_year(&caps[3])), caps[2].parse().ok(), caps[1].parse().ok());
            push(date, caps.get(0), 0.9);
        }

        for caps in DATE_TEXT_DMY.captures_iter(text) {
            let date = ymd(Some(parse_year(&caps[3])), month_number(&caps[2]), caps[1].parse().ok());
            push(date, caps.get(0), 0.9);
        }

        for caps in DATE_TEXT_MDY.captures_iter(text) {
            let date = ymd(caps[3].parse().ok(), month_number(&caps[1]), caps[2].parse().ok());
            push(date, caps.get(0), 0.9);
        }

        results.sort_by_key(|r| r.position.map(|(s, _)| s));
        results
    }
}

/// Parse the first date in `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    DateExtractor::new().extract(text).map(|m| m.value)
}

/// Canonical `DD/MM/YYYY` text of an optional date; blank when absent.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

fn ymd(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year?, month?, day?)
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 { 2000 + year } else { year }
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Serde adapter for `Option<NaiveDate>` as `DD/MM/YYYY`, blank for `None`.
///
/// Any format [`parse_date`] understands is accepted on input.
pub mod serde_dmy {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        super::parse_date(text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_day_first_slashed() {
        assert_eq!(parse_date("05/04/2024"), date(2024, 4, 5));
        assert_eq!(parse_date("5-4-24"), date(2024, 4, 5));
        assert_eq!(parse_date("05.04.2024"), date(2024, 4, 5));
    }

    #[test]
    fn test_iso() {
        assert_eq!(parse_date("2024-04-05"), date(2024, 4, 5));
    }

    #[test]
    fn test_textual_months() {
        assert_eq!(parse_date("5 Apr 2024"), date(2024, 4, 5));
        assert_eq!(parse_date("05-Apr-24"), date(2024, 4, 5));
        assert_eq!(parse_date("April 5, 2024"), date(2024, 4, 5));
        assert_eq!(parse_date("5th September 2023"), date(2023, 9, 5));
    }

    #[test]
    fn test_date_inside_label_text() {
        assert_eq!(parse_date("Date: 12/01/2024 Time 10:32"), date(2024, 1, 12));
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        assert_eq!(parse_date("32/13/2024"), None);
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("no date here"), None);
    }

    #[test]
    fn test_earliest_match_wins() {
        let all = DateExtractor::new().extract_all("from 01/02/2024 to 2024-03-04");
        let values: Vec<_> = all.iter().map(|m| Some(m.value)).collect();
        assert_eq!(values, vec![date(2024, 2, 1), date(2024, 3, 4)]);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2024, 4, 5)), "05/04/2024");
        assert_eq!(format_date(None), "");
    }
}
