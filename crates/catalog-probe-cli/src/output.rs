//! Console output for check results

use catalog_probe::catalog::{CheckReport, SuiteReport};
use console::{style, Term};

/// Writes check results to the terminal
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter writing to stdout
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    fn write(&self, line: &str) {
        let _ = self.term.write_line(line);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        self.write(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.write(&format!("{prefix} {message}"));
    }

    /// Print an informational line
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.write(message);
        }
    }

    /// Print one check result
    pub fn check(&self, report: &CheckReport) {
        if report.passed {
            self.success(&format!(
                "{} ({} ms)",
                report.check.name(),
                report.duration_ms
            ));
        } else {
            self.failure(&format!("{}: {}", report.check.name(), report.message));
        }
    }

    /// Print every check and a summary line
    pub fn suite(&self, report: &SuiteReport) {
        for check in &report.checks {
            self.check(check);
        }
        let summary = format!(
            "{} passed, {} failed, {} total",
            report.passed(),
            report.failed(),
            report.checks.len()
        );
        if report.all_passed() {
            let summary = if self.use_color {
                style(summary).green().to_string()
            } else {
                summary
            };
            self.info(&summary);
        } else {
            let summary = if self.use_color {
                style(summary).red().bold().to_string()
            } else {
                summary
            };
            self.write(&summary);
        }
    }
}
