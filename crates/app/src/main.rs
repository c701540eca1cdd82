use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use payfill_ocr::EngineKind;

mod commands;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineArg {
    /// Preset text backend, fed by --mock-text. Lets extraction run
    /// against saved OCR dumps without a system Tesseract install.
    Mock,
    /// Tesseract via leptess (requires the `tesseract` build feature).
    Tesseract,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Mock => EngineKind::Mock,
            EngineArg::Tesseract => EngineKind::Tesseract,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "payfill",
    about = "Extract payroll fields from scanned payslips and fill the SA spreadsheet template."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the sheet names, dimensions and populated cells of a template.
    Inspect {
        template: PathBuf,
    },
    /// OCR one payslip image and print the extracted record as JSON.
    Extract {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, value_enum, default_value = "tesseract")]
        engine: EngineArg,
        /// Text file standing in for OCR output (mock engine only).
        #[arg(long)]
        mock_text: Option<PathBuf>,
        /// Also print the raw OCR text.
        #[arg(long)]
        ocr_text: bool,
    },
    /// Extract payslips and write each into a fresh copy of the template.
    Process {
        /// Single payslip image.
        #[arg(long, conflicts_with = "batch")]
        image: Option<PathBuf>,
        /// Directory of payslip images; failed files are skipped.
        #[arg(long)]
        batch: Option<PathBuf>,
        #[arg(long)]
        template: PathBuf,
        /// Output file (--image) or directory (--batch).
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value = "tesseract")]
        engine: EngineArg,
        #[arg(long)]
        mock_text: Option<PathBuf>,
    },
    /// Append a full employee row from a record JSON file.
    Append {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// PayslipRecord as JSON (see demos/sample_record.json).
        #[arg(long)]
        record: PathBuf,
    },
    /// Update the row matching the record's staff code.
    Update {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        record: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { template } => commands::inspect(&template),
        Command::Extract { image, engine, mock_text, ocr_text } => {
            commands::extract(&image, engine.into(), mock_text.as_deref(), ocr_text)
        }
        Command::Process { image, batch, template, output, engine, mock_text } => {
            commands::process(
                image.as_deref(),
                batch.as_deref(),
                &template,
                &output,
                engine.into(),
                mock_text.as_deref(),
            )
        }
        Command::Append { template, output, record } => {
            commands::append(&template, &output, &record)
        }
        Command::Update { template, output, record } => {
            commands::update(&template, &output, &record)
        }
    }
}
