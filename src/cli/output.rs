//! Terminal output for framevote
//!
//! Styled status lines and the final frame summary. Status lines go to stderr
//! so stdout only ever carries the report itself.

use console::style;

use crate::analyzer::AnalysisReport;
use crate::tally::FrameSummary;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✔").green(), message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print the three frame counts in majority, any, all order.
    pub fn frame_summary(&self, summary: &FrameSummary) {
        self.count_line(
            "Frames with majority of the present votes true:",
            summary.majority_true,
        );
        self.count_line(
            "Frames with any of the present votes true:",
            summary.any_true,
        );
        self.count_line(
            "Frames with all of the present votes true:",
            summary.all_true,
        );
    }

    /// Print the full text report: skipped files, run line, then the summary.
    pub fn analysis_report(&self, report: &AnalysisReport) {
        for failure in &report.failures {
            self.warning(&format!(
                "Skipped {}: {}",
                failure.path.display(),
                failure.error
            ));
        }

        self.success(&format!(
            "Analyzed {} of {} camera files with {} workers in {}ms",
            report.files_ingested, report.files_discovered, report.workers, report.elapsed_ms
        ));
        self.frame_summary(&report.summary);
    }

    fn count_line(&self, label: &str, value: usize) {
        // The report is the command's result, so it prints even in quiet mode.
        println!("{} {}", style(label).bold(), style(value).yellow().bold());
    }
}
