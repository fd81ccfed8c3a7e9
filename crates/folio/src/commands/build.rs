//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use folio_static::SiteBuilder;

use crate::config::load_config;

/// Run the build command.
pub fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    tracing::info!("Building static site...");

    let config = load_config(config_path)?.build_config(output);
    let report = SiteBuilder::new(config)?.build()?;

    tracing::info!(
        "Built {} pages in {}ms",
        report.pages,
        report.duration_ms
    );

    tracing::info!("Output: {}", report.output_dir.display());

    if !report.is_success() {
        anyhow::bail!(
            "{} post(s) failed to build",
            report.failures.len()
        );
    }

    Ok(())
}
