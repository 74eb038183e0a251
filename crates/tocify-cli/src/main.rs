use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod output;

use output::ColorMode;
use tocify_core::{
    Collaborators, ExtractionMode, OcrMyPdf, ProcessOptions, backend::SourceOpener,
    extract_section_headers, extract_toc_from_pages, process_document,
};
use tocify_outline::LopdfOutlines;
use tocify_pdf_mupdf::{MupdfOpener, MupdfSource};

/// Add table-of-contents bookmarks to PDFs, running OCR first when needed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum Mode {
    /// Try ToC pages first, then section headers
    #[default]
    Auto,
    /// Only look for ToC pages
    TocPage,
    /// Extract from section headers in body content
    SectionHeaders,
}

impl From<Mode> for ExtractionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Auto => ExtractionMode::Auto,
            Mode::TocPage => ExtractionMode::TocPage,
            Mode::SectionHeaders => ExtractionMode::SectionHeaders,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Infer a table of contents and write it as bookmarks
    Process {
        /// Source PDF file
        #[arg(short = 'f', long = "from")]
        source: PathBuf,

        /// Output PDF file
        #[arg(short = 't', long = "to")]
        output: PathBuf,

        /// Skip OCR even if the PDF appears to need it
        #[arg(long)]
        skip_ocr: bool,

        /// Force OCR even if the PDF already has text
        #[arg(long)]
        force_ocr: bool,

        /// OCR language (e.g. 'eng', 'deu', 'eng+deu')
        #[arg(short = 'l', long = "lang", default_value = "eng")]
        language: String,

        /// OCR optimization level. Higher = smaller file, slower; 2+ needs
        /// jbig2enc.
        #[arg(short = 'O', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
        optimize: u8,

        /// ToC extraction mode
        #[arg(short = 'm', long, value_enum, default_value_t = Mode::Auto)]
        mode: Mode,

        /// Keep incorrect existing bookmarks instead of regenerating them
        #[arg(long)]
        no_fix: bool,

        /// Extract and print entries as JSON without writing any output
        #[arg(long)]
        dry_run: bool,
    },

    /// Download the arXiv LaTeX source for a paper
    FetchSource {
        /// Source PDF file
        #[arg(short = 'f', long = "from")]
        source: PathBuf,

        /// Directory for the downloaded source (defaults to the PDF's
        /// directory)
        #[arg(short = 'o', long = "output-dir")]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Process {
            source,
            output,
            skip_ocr,
            force_ocr,
            language,
            optimize,
            mode,
            no_fix,
            dry_run,
        } => {
            if !source.exists() {
                anyhow::bail!("File not found: {}", source.display());
            }

            if dry_run {
                return dry_run_extract(&source, mode.into());
            }

            println!("Processing: {}", source.display());

            let opener = MupdfOpener;
            let outlines = LopdfOutlines;
            let ocr = OcrMyPdf { language, optimize };
            let collab = Collaborators {
                opener: &opener,
                outlines: &outlines,
                ocr: &ocr,
            };
            let options = ProcessOptions {
                skip_ocr,
                force_ocr,
                mode: mode.into(),
                repair_outline: !no_fix,
            };

            let report = process_document(&source, &output, &options, &collab)?;
            output::print_report(&mut std::io::stdout(), &report, &output, color)?;
            Ok(())
        }

        Command::FetchSource { source, output_dir } => {
            if !source.exists() {
                anyhow::bail!("File not found: {}", source.display());
            }
            println!("Searching for arXiv ID in: {}", source.display());

            let out_dir = match output_dir {
                Some(dir) => dir,
                None => source
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(".")),
            };

            let doc = MupdfSource::open(&source)?;
            let report = tocify_arxiv::fetch_source(&doc, &out_dir)?;
            output::print_fetch_report(&mut std::io::stdout(), &report, color)?;
            Ok(())
        }
    }
}

/// Extract entries with the given mode and print them as JSON, touching
/// nothing on disk.
fn dry_run_extract(source: &std::path::Path, mode: ExtractionMode) -> anyhow::Result<()> {
    let opener = MupdfOpener;
    let doc = opener.open(source)?;

    let entries = match mode {
        ExtractionMode::Auto => {
            let entries = extract_toc_from_pages(doc.as_ref())?;
            if entries.is_empty() {
                extract_section_headers(doc.as_ref())?
            } else {
                entries
            }
        }
        ExtractionMode::TocPage => extract_toc_from_pages(doc.as_ref())?,
        ExtractionMode::SectionHeaders => extract_section_headers(doc.as_ref())?,
    };

    serde_json::to_writer_pretty(std::io::stdout(), &entries)?;
    println!();
    Ok(())
}
