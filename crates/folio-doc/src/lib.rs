//! Front-matter document loader for markdown posts.
//!
//! A post is a `---` delimited YAML metadata block followed by a markdown
//! body. This crate parses the block into typed [`Metadata`], keeps the body
//! verbatim, and renders it to HTML for the site builder.

pub mod document;
pub mod frontmatter;
pub mod metadata;
pub mod render;

pub use document::{load_document, parse_document, Document, LoadError};
pub use frontmatter::{MalformedDocument, DELIMITER};
pub use metadata::{format_date, parse_date, MetaValue, Metadata};
pub use render::{render_markdown, slugify, Rendered, TocEntry};
