use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Phone photos of payslips easily exceed this; Tesseract gains nothing
/// past ~300 DPI on an A5 slip.
const MAX_DIMENSION: u32 = 2600;

/// Fraction of pixels clipped at each end of the histogram before
/// stretching, so scanner dust and shadows don't pin the range.
const CLIP_FRACTION: f64 = 0.01;

/// Load a payslip scan from disk and return normalized PNG bytes ready
/// for the OCR engine.
pub fn prepare_for_ocr(path: &Path) -> Result<Vec<u8>, PreprocessError> {
    let img = image::open(path)?;
    encode_as_png(normalize(img))
}

/// Same, starting from raw JPEG/PNG/BMP/TIFF bytes.
pub fn prepare_for_ocr_from_bytes(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img))
}

/// Grayscale + percentile contrast stretch.
fn normalize(img: DynamicImage) -> DynamicImage {
    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let gray: GrayImage = img.to_luma8();
    let (lo, hi) = percentile_bounds(&gray, CLIP_FRACTION);

    if hi <= lo {
        // Uniform scan, nothing to stretch.
        return DynamicImage::ImageLuma8(gray);
    }

    let range = (hi - lo) as u32;
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        let v = (p.saturating_sub(lo) as u32 * 255 / range).min(255) as u8;
        Luma([v])
    });

    DynamicImage::ImageLuma8(stretched)
}

/// Lowest and highest gray values after clipping `fraction` of the pixel
/// mass at each tail.
fn percentile_bounds(gray: &GrayImage, fraction: f64) -> (u8, u8) {
    let mut histogram = [0u64; 256];
    for p in gray.pixels() {
        histogram[p[0] as usize] += 1;
    }
    let total: u64 = histogram.iter().sum();
    let clip = (total as f64 * fraction) as u64;

    let mut lo = 0u8;
    let mut acc = 0u64;
    for (v, &count) in histogram.iter().enumerate() {
        acc += count;
        if acc > clip {
            lo = v as u8;
            break;
        }
    }

    let mut hi = 255u8;
    let mut acc = 0u64;
    for (v, &count) in histogram.iter().enumerate().rev() {
        acc += count;
        if acc > clip {
            hi = v as u8;
            break;
        }
    }

    (lo, hi)
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
