pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;

pub use parse::parse_payslip;
pub use pipeline::{BatchOutcome, ExtractionResult, PayslipPipeline, PipelineError};
pub use preprocess::{prepare_for_ocr, prepare_for_ocr_from_bytes, PreprocessError};
pub use recognizer::{build_backend, EngineKind, MockRecognizer, OcrBackend, OcrError};
