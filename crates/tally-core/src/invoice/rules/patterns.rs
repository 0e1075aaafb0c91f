//! Common regex patterns for scanned invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency markers and trailing "/=" or "/-" shilling suffixes
    pub static ref CURRENCY: Regex = Regex::new(
        r"(?i)(?:KSHS?|KES)\.?|/=|/-|\$"
    ).unwrap();

    // Digits with optional separators, after currency stripping
    pub static ref NUMERIC: Regex = Regex::new(
        r"^\d[\d,.]*$|^[,.]\d+$"
    ).unwrap();

    // Day-first dates: 05/04/2024, 5-4-24, 05.04.2024
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    // ISO dates: 2024-04-05
    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // Textual day-month-year: 5 Apr 2024, 05-Apr-24, 5th April, 2024
    pub static ref DATE_TEXT_DMY: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[\s\-./]*([a-z]{3,9})\.?[\s\-./,]*(\d{4}|\d{2})\b"
    ).unwrap();

    // Textual month-day-year: April 5, 2024
    pub static ref DATE_TEXT_MDY: Regex = Regex::new(
        r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();

    // Kenyan registration plate: KCA 123A, KBZ001X
    pub static ref PLATE: Regex = Regex::new(
        r"\b(K[A-Z]{2})\s?(\d{3})\s?([A-Z]?)\b"
    ).unwrap();
}
