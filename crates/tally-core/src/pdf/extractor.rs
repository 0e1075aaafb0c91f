//! Page image extraction from scanned PDFs using lopdf.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::Result;
use crate::error::PdfError;

/// Deepest page tree walked when inheriting resources.
const MAX_TREE_DEPTH: usize = 32;

/// A scanned PDF: one embedded raster image per page.
pub struct ScannedPdf {
    document: Document,
}

impl ScannedPdf {
    /// Parse a PDF, decrypting it when it uses an empty user password.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// The scan of `page` (1-indexed): its largest decodable image.
    pub fn page_image(&self, page: u32) -> Result<Option<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let largest = self
            .page_xobjects(*page_id)
            .into_iter()
            .filter_map(|obj| self.decode_image(obj))
            .max_by_key(|img| img.width() as u64 * img.height() as u64);

        if largest.is_none() {
            debug!("No decodable image on page {}", page);
        }
        Ok(largest)
    }

    /// Scans of every page that has one, in page order.
    pub fn page_images(&self) -> Result<Vec<DynamicImage>> {
        let mut images = Vec::new();
        for page in 1..=self.page_count() {
            if let Some(img) = self.page_image(page)? {
                images.push(img);
            }
        }
        debug!("Extracted {} page images", images.len());
        Ok(images)
    }

    fn page_xobjects(&self, page_id: ObjectId) -> Vec<&Object> {
        let doc = &self.document;
        let Some(resources) = self.page_resources(page_id, 0) else {
            return Vec::new();
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Vec::new();
        };
        let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
            return Vec::new();
        };
        xobj_dict
            .iter()
            .filter_map(|(_, obj_ref)| doc.dereference(obj_ref).ok().map(|(_, obj)| obj))
            .collect()
    }

    /// Resources of a page, inherited from the page tree when absent.
    fn page_resources(&self, node_id: ObjectId, depth: usize) -> Option<&Dictionary> {
        if depth > MAX_TREE_DEPTH {
            debug!("Page tree deeper than {} levels at {:?}", MAX_TREE_DEPTH, node_id);
            return None;
        }
        let doc = &self.document;
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return Some(res_dict);
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id, depth + 1),
            _ => None,
        }
    }

    fn decode_image(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                // JPEG bytes are stored as-is
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }

        let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        raw_image(data, width, height, color_space, bits)
    }
}

/// Decode uncompressed 8-bit grey or RGB samples.
fn raw_image(data: Vec<u8>, width: u32, height: u32, color_space: &[u8], bits: i64) -> Option<DynamicImage> {
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let Some(pixels) = (width as usize).checked_mul(height as usize) else {
        trace!("Image dimensions overflow: {}x{}", width, height);
        return None;
    };
    let samples = match color_space {
        b"DeviceRGB" | b"RGB" => pixels.checked_mul(3),
        _ => Some(pixels),
    };
    let Some(samples) = samples else {
        trace!("Image dimensions overflow: {}x{}", width, height);
        return None;
    };

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= samples => {
            let mut data = data;
            data.truncate(samples);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= samples => {
            let mut data = data;
            data.truncate(samples);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode {} image: {} bytes for {}x{}",
                String::from_utf8_lossy(color_space),
                data.len(),
                width,
                height
            );
            None
        }
    }
}
