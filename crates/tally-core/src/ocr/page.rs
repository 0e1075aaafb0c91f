//! Page-level checks run before OCR.

use image::DynamicImage;

/// Mean grey level of a page, 0 (black) to 255 (white).
pub fn mean_luma(page: &DynamicImage) -> f32 {
    let gray = page.to_luma8();
    let count = gray.pixels().len();
    if count == 0 {
        return 255.0;
    }
    let sum: u64 = gray.pixels().map(|p| p[0] as u64).sum();
    sum as f32 / count as f32
}

/// A page is blank when its mean grey level is above `threshold`.
pub fn is_blank_page(page: &DynamicImage, threshold: f32) -> bool {
    mean_luma(page) > threshold
}
