//! Static page builder for folio posts.
//!
//! Loads every markdown post of a content directory, renders it through the
//! template named by its `templateKey` and writes one HTML page per post.

pub mod builder;
pub mod templates;

pub use builder::{
    BuildConfig, BuildError, BuildReport, CheckReport, PageError, PageFailure, SiteBuilder,
};
pub use templates::{PageContext, TemplateEngine};
