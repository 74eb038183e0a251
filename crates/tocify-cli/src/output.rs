//! Human-facing summary output for the CLI.

use std::io::Write;

use owo_colors::OwoColorize;

use tocify_arxiv::FetchReport;
use tocify_core::PipelineReport;

/// Whether to colorize output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

pub fn print_report(
    writer: &mut dyn Write,
    report: &PipelineReport,
    output: &std::path::Path,
    color: ColorMode,
) -> std::io::Result<()> {
    if report.kept_existing {
        let msg = format!(
            "Existing bookmarks are valid; copied unchanged to {}",
            output.display()
        );
        if color.enabled() {
            writeln!(writer, "{} {}", "✓".green(), msg)?;
        } else {
            writeln!(writer, "{}", msg)?;
        }
        return Ok(());
    }

    if report.ocr_applied {
        writeln!(writer, "OCR applied before extraction")?;
    }
    if report.page_offset != 0 {
        writeln!(writer, "Detected page offset: {:+}", report.page_offset)?;
    }

    if report.entries_written == 0 {
        let msg = "No table of contents entries found; wrote an empty outline";
        if color.enabled() {
            writeln!(writer, "{} {}", "!".yellow(), msg)?;
        } else {
            writeln!(writer, "{}", msg)?;
        }
    } else {
        let msg = format!("Added {} bookmark(s)", report.entries_written);
        if color.enabled() {
            writeln!(writer, "{} {}", "✓".green(), msg)?;
        } else {
            writeln!(writer, "{}", msg)?;
        }
    }
    writeln!(writer, "Done! Output saved to: {}", output.display())?;
    Ok(())
}

pub fn print_fetch_report(
    writer: &mut dyn Write,
    report: &FetchReport,
    color: ColorMode,
) -> std::io::Result<()> {
    let msg = format!("Source downloaded to: {}", report.dir.display());
    if color.enabled() {
        writeln!(writer, "{} {}", "✓".green(), msg)?;
    } else {
        writeln!(writer, "{}", msg)?;
    }

    if !report.tex_files.is_empty() {
        writeln!(writer, "  Found {} .tex file(s):", report.tex_files.len())?;
        for tex in report.tex_files.iter().take(5) {
            let shown = tex.strip_prefix(&report.dir).unwrap_or(tex);
            writeln!(writer, "    - {}", shown.display())?;
        }
        if report.tex_files.len() > 5 {
            writeln!(writer, "    ... and {} more", report.tex_files.len() - 5)?;
        }
    }
    Ok(())
}
