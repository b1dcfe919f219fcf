use std::io::Write;

use owo_colors::OwoColorize;
use plagcheck_core::{CheckReport, RephraseReport, ServiceResult};

const DETAIL_CHARS: usize = 80;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the summary followed by the per-service tables.
pub fn print_check_report(
    w: &mut dyn Write,
    report: &CheckReport,
    color: ColorMode,
) -> std::io::Result<()> {
    print_summary(w, &report.summary, color)?;
    print_results(w, "Plagiarism checkers", &report.plagiarism_results, color)?;
    print_results(w, "AI detectors", &report.ai_detection_results, color)?;
    Ok(())
}

/// Print the rephrased text, then the same report as [`print_check_report`].
pub fn print_rephrase_report(
    w: &mut dyn Write,
    report: &RephraseReport,
    color: ColorMode,
) -> std::io::Result<()> {
    if let Some(used) = report.rephrase_attempts.last() {
        let skipped = report.rephrase_attempts.len() - 1;
        if skipped > 0 {
            writeln!(
                w,
                "Rephrased by {} after {} failed provider(s)",
                used.service_name(),
                skipped
            )?;
        } else {
            writeln!(w, "Rephrased by {}", used.service_name())?;
        }
    }
    heading(w, "Rephrased text", color)?;
    writeln!(w, "{}", report.rephrased_text)?;
    writeln!(w)?;

    print_summary(w, &report.summary, color)?;
    print_results(w, "Plagiarism checkers", &report.plagiarism_results, color)?;
    print_results(w, "AI detectors", &report.ai_detection_results, color)?;
    Ok(())
}

fn print_summary(w: &mut dyn Write, summary: &str, color: ColorMode) -> std::io::Result<()> {
    heading(w, "Summary", color)?;
    writeln!(w, "{}", summary.trim_end())?;
    writeln!(w)?;
    Ok(())
}

fn heading(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", title.bold())?;
    } else {
        writeln!(w, "{}", title)?;
    }
    writeln!(w, "{}", "=".repeat(title.len()))
}

/// One line per service: name, outcome, and the payload or error.
pub fn print_results(
    w: &mut dyn Write,
    title: &str,
    results: &[ServiceResult],
    color: ColorMode,
) -> std::io::Result<()> {
    heading(w, title, color)?;
    if results.is_empty() {
        writeln!(w, "  (none enabled)")?;
        writeln!(w)?;
        return Ok(());
    }

    let width = results
        .iter()
        .map(|r| r.service_name().chars().count())
        .max()
        .unwrap_or(0);

    for r in results {
        let name = format!("{:<width$}", r.service_name());
        match r.error() {
            None => {
                let detail = truncate(
                    &serde_json::to_string(r.payload()).unwrap_or_default(),
                    DETAIL_CHARS,
                );
                if color.enabled() {
                    writeln!(w, "  {}  {}  {}", name, "OK    ".green(), detail.dimmed())?;
                } else {
                    writeln!(w, "  {}  OK      {}", name, detail)?;
                }
            }
            Some(err) => {
                if color.enabled() {
                    writeln!(w, "  {}  {}  {}", name, "FAILED".red(), err)?;
                } else {
                    writeln!(w, "  {}  FAILED  {}", name, err)?;
                }
            }
        }
    }
    writeln!(w)?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}
