//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{BBox, Token, TokenSource};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        Self::from_dir(&config.model_dir, config)
    }

    /// Create an engine from model files in a directory.
    pub fn from_dir(model_dir: &Path, config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = model_dir.join(&config.detection_model);
        let rec_path = model_dir.join(&config.recognition_model);
        let dict_path = model_dir.join(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("missing {}", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }
}

impl TokenSource for PureOcrEngine {
    fn recognize(&self, page: &DynamicImage) -> Result<Vec<Token>, OcrError> {
        let start = Instant::now();
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{}", width, height)));
        }

        let results = self
            .engine
            .run_from_image(page)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let tokens: Vec<Token> = results
            .iter()
            .map(|r| {
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                Token {
                    text,
                    bbox: polygon_to_bbox(&r.bounding_box),
                }
            })
            .filter(|t| !t.text.trim().is_empty())
            .collect();

        debug!(
            "OCR produced {} tokens on a {}x{} page in {}ms",
            tokens.len(),
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(tokens)
    }
}

/// Axis-aligned bounds of the detector's quadrilateral.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> BBox {
    let mut bbox = BBox::new(f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for coord in polygon.exterior().coords().take(4) {
        bbox.x0 = bbox.x0.min(coord.x as f32);
        bbox.y0 = bbox.y0.min(coord.y as f32);
        bbox.x1 = bbox.x1.max(coord.x as f32);
        bbox.y1 = bbox.y1.max(coord.y as f32);
    }
    bbox
}
