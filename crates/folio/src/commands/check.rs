//! Validate every post without building.

use std::path::Path;

use anyhow::Result;
use folio_static::SiteBuilder;

use crate::config::load_config;

/// Run the check command.
pub fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?.build_config(None);
    let report = SiteBuilder::new(config)?.check()?;

    if !report.is_success() {
        anyhow::bail!(
            "{} post(s) are malformed, {} loaded cleanly",
            report.failures.len(),
            report.documents
        );
    }

    tracing::info!("All {} posts are well-formed", report.documents);

    Ok(())
}
