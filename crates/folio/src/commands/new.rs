//! Create a new post skeleton.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SubsecRound, Utc};
use folio_doc::{slugify, Document, Metadata};

use crate::config::load_config;

/// Run the new command.
pub fn run(config_path: &Path, slug: &str, title: Option<String>, tags: Vec<String>) -> Result<()> {
    let config = load_config(config_path)?.build_config(None);

    let path = create_post(
        &config.content_dir,
        &config.default_template,
        slug,
        title,
        tags,
    )?;

    tracing::info!("Created {}", path.display());

    Ok(())
}

fn create_post(
    content_dir: &Path,
    template: &str,
    slug: &str,
    title: Option<String>,
    tags: Vec<String>,
) -> Result<PathBuf> {
    let file_stem = slugify(slug);
    if file_stem.is_empty() {
        anyhow::bail!("`{}` does not contain any usable characters for a file name", slug);
    }

    let path = content_dir.join(format!("{file_stem}.md"));
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    let metadata = Metadata {
        template_key: Some(template.to_string()),
        title: Some(title.unwrap_or_else(|| slug.to_string())),
        date: Some(Utc::now().trunc_subsecs(3).fixed_offset()),
        description: Some(String::new()),
        featured_post: Some(false),
        tags,
        ..Default::default()
    };

    let source = Document::new(metadata, "")
        .to_source()
        .context("Failed to serialize front matter")?;

    fs::create_dir_all(content_dir).context("Failed to create content directory")?;
    fs::write(&path, source).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_doc::load_document;
    use tempfile::tempdir;

    #[test]
    fn creates_loadable_post() {
        let temp = tempdir().unwrap();
        let content = temp.path().join("content");

        let path = create_post(
            &content,
            "blog-post",
            "Angular Signals",
            Some("Angular Signals in practice".to_string()),
            vec!["angular".to_string(), "signals".to_string()],
        )
        .unwrap();

        assert_eq!(path, content.join("angular-signals.md"));

        let doc = load_document(&path).unwrap();
        let meta = doc.metadata();
        assert_eq!(meta.template_key(), Some("blog-post"));
        assert_eq!(meta.title.as_deref(), Some("Angular Signals in practice"));
        assert!(meta.date.is_some());
        assert_eq!(meta.featured_post, Some(false));
        assert_eq!(meta.tags, vec!["angular", "signals"]);
        assert_eq!(doc.body(), "");
    }

    #[test]
    fn refuses_to_overwrite() {
        let temp = tempdir().unwrap();

        create_post(temp.path(), "blog-post", "hello", None, vec![]).unwrap();
        let result = create_post(temp.path(), "blog-post", "hello", None, vec![]);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_slug() {
        let temp = tempdir().unwrap();

        assert!(create_post(temp.path(), "blog-post", "???", None, vec![]).is_err());
    }
}
