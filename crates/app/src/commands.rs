use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use payfill_core::PayslipRecord;
use payfill_ocr::{build_backend, EngineKind, OcrBackend, PayslipPipeline};
use payfill_xlsx::{template, writer, Template};

pub fn inspect(path: &Path) -> Result<()> {
    let reports = template::inspect(path)
        .with_context(|| format!("Failed to inspect {}", path.display()))?;

    println!("Sheet names:");
    for report in &reports {
        println!("  - {}", report.name);
    }
    for report in &reports {
        println!("\n=== Sheet: {} ===", report.name);
        println!("Max row: {}, Max column: {}", report.rows, report.columns);
        println!("Populated cells (first 30 rows):");
        for (cell, value) in &report.populated {
            println!("  {cell}: {value}");
        }
    }
    Ok(())
}

pub fn extract(
    image: &Path,
    engine: EngineKind,
    mock_text: Option<&Path>,
    print_ocr_text: bool,
) -> Result<()> {
    let pipeline = pipeline(engine, mock_text)?;
    let result = pipeline
        .process_file(image)
        .with_context(|| format!("Failed to process {}", image.display()))?;

    debug!("OCR text:\n{}", result.ocr_text);
    if print_ocr_text {
        println!("=== OCR text ===\n{}\n=== Record ===", result.ocr_text);
    }
    println!("{}", serde_json::to_string_pretty(&result.record)?);
    Ok(())
}

pub fn process(
    image: Option<&Path>,
    batch: Option<&Path>,
    template_path: &Path,
    output: &Path,
    engine: EngineKind,
    mock_text: Option<&Path>,
) -> Result<()> {
    let template = open_template(template_path)?;
    let pipeline = pipeline(engine, mock_text)?;

    match (image, batch) {
        (Some(image), None) => {
            let result = pipeline
                .process_file(image)
                .with_context(|| format!("Failed to process {}", image.display()))?;
            writer::fill_summary_row(&template.sheet, &result.record, output)?;
            info!("Wrote {}", output.display());
            Ok(())
        }
        (None, Some(dir)) => {
            std::fs::create_dir_all(output)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            let outcomes = pipeline.process_dir(dir)?;
            let total = outcomes.len();
            let mut written = 0usize;
            for outcome in outcomes {
                let result = match outcome.result {
                    Ok(result) => result,
                    // Already logged by the pipeline; keep going.
                    Err(_) => continue,
                };
                let stem = outcome
                    .source
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("payslip");
                let out_path = output.join(format!("{stem}_output.xlsx"));
                match writer::fill_summary_row(&template.sheet, &result.record, &out_path) {
                    Ok(()) => {
                        info!("Wrote {}", out_path.display());
                        written += 1;
                    }
                    Err(e) => warn!("Skipping {}: {e}", outcome.source.display()),
                }
            }
            info!("Processed {written}/{total} images");
            Ok(())
        }
        _ => bail!("Provide exactly one of --image or --batch"),
    }
}

pub fn append(template_path: &Path, output: &Path, record_path: &Path) -> Result<()> {
    let template = open_template(template_path)?;
    let record = read_record(record_path)?;
    let row = writer::append_employee(&template.sheet, &record, output)?;
    println!("Appended at row {} of {}", row + 1, output.display());
    Ok(())
}

pub fn update(template_path: &Path, output: &Path, record_path: &Path) -> Result<()> {
    let template = open_template(template_path)?;
    let record = read_record(record_path)?;
    let row = writer::update_by_staff_code(&template.sheet, &record, output)?;
    println!("Updated row {} of {}", row + 1, output.display());
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn pipeline(
    engine: EngineKind,
    mock_text: Option<&Path>,
) -> Result<PayslipPipeline<Box<dyn OcrBackend>>> {
    let backend = build_backend(engine, mock_text)?;
    Ok(PayslipPipeline::new(backend))
}

fn open_template(path: &Path) -> Result<Template> {
    Template::open(path).with_context(|| format!("Failed to open template {}", path.display()))
}

fn read_record(path: &Path) -> Result<PayslipRecord> {
    let file =
        File::open(path).with_context(|| format!("Failed to open record {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Invalid payslip record in {}", path.display()))
}
