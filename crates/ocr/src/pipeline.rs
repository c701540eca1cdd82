use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parse;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use payfill_core::PayslipRecord;

/// Image formats accepted by batch intake, matching the scanner output
/// the tool is fed.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The product of one image run: raw OCR text kept alongside the record
/// so callers can show what the extraction was scraped from.
#[derive(Debug)]
pub struct ExtractionResult {
    pub source: PathBuf,
    pub ocr_text: String,
    pub record: PayslipRecord,
}

/// One batch entry: a failure here never aborts the rest of the batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub source: PathBuf,
    pub result: Result<ExtractionResult, PipelineError>,
}

/// Orchestrates: read → preprocess → OCR → parse.
pub struct PayslipPipeline<R: OcrBackend> {
    recognizer: R,
}

impl<R: OcrBackend> PayslipPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }

    /// Process a single payslip image on disk.
    pub fn process_file(&self, path: &Path) -> Result<ExtractionResult, PipelineError> {
        let bytes = std::fs::read(path)?;
        let image_bytes = preprocess::prepare_for_ocr_from_bytes(&bytes)?;
        let ocr_text = self.recognizer.recognize(&image_bytes)?;
        let record = parse::parse_payslip(&ocr_text);
        Ok(ExtractionResult {
            source: path.to_path_buf(),
            ocr_text,
            record,
        })
    }

    /// Process every image in a directory, skipping files that fail. An
    /// image-free directory is not an error, just an empty batch.
    pub fn process_dir(&self, dir: &Path) -> Result<Vec<BatchOutcome>, PipelineError> {
        let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image(p))
            .collect();
        images.sort();
        tracing::info!("Found {} images in {}", images.len(), dir.display());

        let outcomes = images
            .into_iter()
            .map(|path| {
                let result = self.process_file(&path);
                if let Err(e) = &result {
                    tracing::warn!("Skipping {}: {e}", path.display());
                }
                BatchOutcome { source: path, result }
            })
            .collect();
        Ok(outcomes)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
