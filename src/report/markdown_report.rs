//! @ai:module:intent Markdown report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::metrics::{MetricEntry, MetricOutcome, ResultRow};
use crate::report::EvalResults;
use crate::value::Scalar;
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from results
    fn generate(&self, results: &EvalResults, output_path: &Path) -> Result<()>;
}

/// @ai:intent Renders results as one Markdown table per row
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Format one metric output for a table cell
    /// @ai:effects pure
    fn format_entry(entry: &MetricEntry) -> String {
        match &entry.outcome {
            MetricOutcome::Value(Scalar::Float(f)) => format!("{:.3}", f),
            MetricOutcome::Value(other) => other.to_string(),
            MetricOutcome::Error(failure) => format!("error ({})", failure.kind),
        }
    }

    /// @ai:intent Escape text for use inside a table cell
    /// @ai:effects pure
    fn cell(text: &str) -> String {
        text.replace('|', "\\|")
    }

    fn generate_summary(results: &EvalResults) -> String {
        let mut output = String::new();

        writeln!(output, "# Evaluation Results").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Date:** {}", results.timestamp).unwrap();
        writeln!(output, "**Rows:** {}", results.rows.len()).unwrap();
        writeln!(output).unwrap();

        output
    }

    /// @ai:intent Generate the table of one result row
    /// @ai:effects pure
    fn generate_row_section(row: &ResultRow) -> String {
        let mut output = String::new();

        if row.name == row.scorer {
            writeln!(output, "## {}", row.name).unwrap();
        } else {
            writeln!(output, "## {} ({})", row.name, row.scorer).unwrap();
        }
        writeln!(output).unwrap();
        writeln!(output, "Scored samples: {}", row.scored_samples).unwrap();
        writeln!(output).unwrap();

        if row.metrics.is_empty() {
            writeln!(output, "_No metrics._").unwrap();
            writeln!(output).unwrap();
            return output;
        }

        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        for (name, entry) in &row.metrics {
            writeln!(
                output,
                "| {} | {} |",
                Self::cell(name),
                Self::cell(&Self::format_entry(entry))
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    fn generate_failure_section(results: &EvalResults) -> String {
        let mut output = String::new();
        if results.failures.is_empty() {
            return output;
        }

        writeln!(output, "## Failed Scorers").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Scorer | Kind | Message |").unwrap();
        writeln!(output, "|--------|------|---------|").unwrap();
        for failure in &results.failures {
            writeln!(
                output,
                "| {} | {} | {} |",
                Self::cell(&failure.scorer),
                Self::cell(&failure.kind),
                Self::cell(&failure.message)
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate(&self, results: &EvalResults, output_path: &Path) -> Result<()> {
        let mut content = Self::generate_summary(results);

        for row in &results.rows {
            content.push_str(&Self::generate_row_section(row));
        }
        content.push_str(&Self::generate_failure_section(results));

        std::fs::write(output_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;
    use crate::report::ScorerFailure;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    #[test]
    fn test_format_entry() {
        let ok = MetricEntry::value("mean", Scalar::Float(2.0 / 3.0));
        assert_eq!(MarkdownReporter::format_entry(&ok), "0.667");

        let failed = MetricEntry::failed("stderr", &ScoringError::too_few_clusters("stderr", 2, 1));
        assert_eq!(MarkdownReporter::format_entry(&failed), "error (insufficient_data)");
    }

    #[test]
    fn test_pipes_are_escaped_in_cells() {
        let mut metrics = IndexMap::new();
        metrics.insert("a|b".to_string(), MetricEntry::value("a|b", Scalar::from("x|y")));
        let row = ResultRow::new("s", "s", 1, metrics);

        let section = MarkdownReporter::generate_row_section(&row);
        assert!(section.contains(r#"| a\|b | "x\|y" |"#));
    }

    #[test]
    fn test_generate_markdown_report() {
        let reporter = MarkdownReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.md");

        let mut metrics = IndexMap::new();
        metrics.insert("mean".to_string(), MetricEntry::value("mean", Scalar::Int(1)));

        let results = EvalResults {
            timestamp: "2026-01-19T00:00:00+00:00".to_string(),
            rows: vec![
                ResultRow::new("wildcard_scorer", "wildcard_scorer", 1, IndexMap::new()),
                ResultRow::new("one", "wildcard_scorer", 1, metrics),
            ],
            failures: vec![ScorerFailure {
                scorer: "mixed".to_string(),
                kind: "shape_mismatch".to_string(),
                message: "sample #1 has a scalar value".to_string(),
            }],
        };

        reporter.generate(&results, &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("# Evaluation Results"));
        assert!(content.contains("## one (wildcard_scorer)"));
        assert!(content.contains("| mean | 1 |"));
        assert!(content.contains("## Failed Scorers"));
    }
}
