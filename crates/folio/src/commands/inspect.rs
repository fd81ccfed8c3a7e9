//! Print a parsed post.

use std::path::Path;

use anyhow::{Context, Result};
use folio_doc::load_document;

/// Run the inspect command.
pub fn run(file: &Path) -> Result<()> {
    let doc = load_document(file)?;
    let json = serde_json::to_string_pretty(&doc).context("Failed to serialize document")?;

    println!("{json}");

    Ok(())
}
