//! @ai:module:intent Results assembly and report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api EvalResults, ResultsBuilder, ReportGenerator, JsonReporter, MarkdownReporter

pub mod json_report;
pub mod markdown_report;
pub mod results;

pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};
pub use results::{EvalResults, ResultsBuilder, ScoreLog, ScorerFailure};

use anyhow::Result;
use std::path::Path;

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
        }
    }

    /// @ai:intent Write results.json and results.md into the output directory
    /// @ai:effects fs:write
    pub fn generate_all(&self, results: &EvalResults, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;

        self.json.generate(results, &output_dir.join("results.json"))?;
        self.markdown
            .generate(results, &output_dir.join("results.md"))?;

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(())
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
