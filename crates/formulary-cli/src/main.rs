mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use formulary_core::ExtractOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "formulary",
    version,
    about = "Extract formulary catalogs from PDF documents into JSON and Excel"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Boundary tuning shared by extract and batch.
#[derive(Args, Clone)]
struct ExtractionFlags {
    /// Pages scanned for the table of contents before the body starts
    #[arg(long = "front-matter-pages", value_name = "N", default_value_t = 10)]
    front_matter_pages: usize,

    /// Column alignment tolerance in points
    #[arg(long = "column-tolerance", value_name = "PT", default_value_t = 12.0)]
    column_tolerance: f32,

    /// Clamp near-miss rows to the column grid instead of reporting them
    #[arg(long)]
    lenient: bool,
}

impl ExtractionFlags {
    fn to_options(&self) -> ExtractOptions {
        ExtractOptions {
            front_matter_page_limit: self.front_matter_pages,
            column_tolerance: self.column_tolerance,
            lenient_rows: self.lenient,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one PDF into JSON files and an Excel workbook
    Extract {
        /// Path to the PDF file
        pdf_path: PathBuf,

        /// Output directory; files land in <DIR>/<pdf stem>/
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Only write JSON, skip the workbook
        #[arg(long)]
        json_only: bool,

        #[command(flatten)]
        flags: ExtractionFlags,
    },
    /// Process every PDF in a directory, one worker per document
    Batch {
        /// Directory containing PDF files
        pdf_dir: PathBuf,

        /// Output directory; each document gets its own subdirectory
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Only write JSON, skip the workbooks
        #[arg(long)]
        json_only: bool,

        /// Worker threads (default: one per CPU)
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,

        #[command(flatten)]
        flags: ExtractionFlags,
    },
    /// Render an Excel workbook from previously extracted JSON
    Render {
        /// Path to an extracted_data.json file
        json_path: PathBuf,

        /// Workbook path (default: next to the JSON)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            pdf_path,
            output_dir,
            json_only,
            flags,
        } => commands::extract::run(&pdf_path, &output_dir, json_only, &flags.to_options()),
        Commands::Batch {
            pdf_dir,
            output_dir,
            json_only,
            jobs,
            flags,
        } => commands::batch::run(&pdf_dir, &output_dir, json_only, jobs, &flags.to_options()),
        Commands::Render { json_path, out } => commands::render::run(&json_path, out),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
