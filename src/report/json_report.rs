//! @ai:module:intent JSON report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter
//! @ai:module:stateless true

use crate::report::EvalResults;
use anyhow::Result;
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Generate JSON report from results
    fn generate(&self, results: &EvalResults, output_path: &Path) -> Result<()>;

    /// @ai:intent Read a previously generated JSON report
    fn load(&self, path: &Path) -> Result<EvalResults>;
}

/// @ai:intent Writes and reads results documents as JSON
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Render results as pretty-printed JSON
    /// @ai:effects pure
    pub fn render(&self, results: &EvalResults) -> Result<String> {
        Ok(serde_json::to_string_pretty(results)?)
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:effects fs:write
    fn generate(&self, results: &EvalResults, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render(results)?)?;
        Ok(())
    }

    /// @ai:effects fs:read
    fn load(&self, path: &Path) -> Result<EvalResults> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
