//! Loading posts from disk and writing them back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Value;

use crate::frontmatter::{parse_entries, split_front_matter, MalformedDocument, DELIMITER};
use crate::metadata::Metadata;

/// A parsed content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    metadata: Metadata,
    body: String,
}

/// Errors that can occur when loading a file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: MalformedDocument,
    },
}

impl LoadError {
    /// File the error belongs to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}

impl Document {
    pub fn new(metadata: Metadata, body: impl Into<String>) -> Self {
        Self {
            metadata,
            body: body.into(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Markdown body, verbatim from the source file.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Write the document back to its delimited text form.
    pub fn to_source(&self) -> Result<String, serde_yaml::Error> {
        let mapping = self.metadata.to_mapping();

        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(DELIMITER);
        out.push('\n');
        if !mapping.is_empty() {
            out.push_str(&serde_yaml::to_string(&Value::Mapping(mapping))?);
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(&self.body);

        Ok(out)
    }
}

/// Parse a content file held in memory.
pub fn parse_document(source: &str) -> Result<Document, MalformedDocument> {
    let (region, body) = split_front_matter(source)?;
    let metadata = Metadata::from_entries(parse_entries(region)?)?;

    Ok(Document::new(metadata, body))
}

/// Read and parse a content file.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let path = path.as_ref();

    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let doc = parse_document(&source).map_err(|source| LoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded {} ({} tags)", path.display(), doc.metadata.tags.len());

    Ok(doc)
}
