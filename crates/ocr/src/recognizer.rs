use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Failed to read mock text: {0}")]
    MockText(#[from] std::io::Error),
    #[error("Tesseract not available — build with `tesseract` feature")]
    NotAvailable,
    #[error("Unknown OCR engine: '{0}'")]
    UnknownEngine(String),
}

/// Abstraction over an OCR engine. Implementations take image bytes
/// (already preprocessed PNG) and return the recognized text, one
/// detected line per output line.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image_bytes)
    }
}

/// Which engine to run. Selected on the command line; `Tesseract` only
/// works when the crate was built with the `tesseract` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Mock,
    Tesseract,
}

impl FromStr for EngineKind {
    type Err = OcrError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(EngineKind::Mock),
            "tesseract" => Ok(EngineKind::Tesseract),
            other => Err(OcrError::UnknownEngine(other.to_string())),
        }
    }
}

/// Construct the selected backend. `mock_text` feeds the mock engine,
/// letting extraction be exercised against saved OCR dumps without an
/// installed Tesseract.
pub fn build_backend(
    kind: EngineKind,
    mock_text: Option<&Path>,
) -> Result<Box<dyn OcrBackend>, OcrError> {
    match kind {
        EngineKind::Mock => {
            let text = match mock_text {
                Some(path) => std::fs::read_to_string(path)?,
                None => String::new(),
            };
            Ok(Box::new(MockRecognizer::new(text)))
        }
        #[cfg(feature = "tesseract")]
        EngineKind::Tesseract => Ok(Box::new(tesseract_backend::TesseractRecognizer::new(
            None, "eng",
        ))),
        #[cfg(not(feature = "tesseract"))]
        EngineKind::Tesseract => Err(OcrError::NotAvailable),
    }
}

// ── Mock backend (always available, used for tests and dry runs) ──────────────

/// Returns a pre-set string regardless of the image handed to it.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
