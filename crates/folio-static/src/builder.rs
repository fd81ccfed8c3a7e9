//! Static site builder.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use folio_doc::{load_document, render_markdown, LoadError, MalformedDocument};

use crate::templates::{PageContext, TemplateEngine};

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source posts directory
    pub content_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Directory with user templates overriding the built-in ones
    pub templates_dir: Option<PathBuf>,

    /// Template used when a post has no `templateKey`
    pub default_template: String,

    /// Site title
    pub site_title: String,

    /// Base URL for the site
    pub base_url: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("public"),
            templates_dir: None,
            default_template: "blog-post".to_string(),
            site_title: "Blog".to_string(),
            base_url: "/".to_string(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildReport {
    /// Number of pages written
    pub pages: usize,

    /// Posts that could not be built
    pub failures: Vec<PageFailure>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of loading every post without rendering.
#[derive(Debug)]
pub struct CheckReport {
    /// Number of posts that loaded cleanly
    pub documents: usize,

    /// Posts that failed to load
    pub failures: Vec<PageFailure>,
}

impl CheckReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A post that failed, with the file it came from.
#[derive(Debug)]
pub struct PageFailure {
    pub path: PathBuf,
    pub error: PageError,
}

impl fmt::Display for PageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Errors affecting a single post.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Failed to read file: {0}")]
    Read(#[source] std::io::Error),

    #[error(transparent)]
    Malformed(MalformedDocument),

    #[error("Failed to render template `{template}`: {message}")]
    Template { template: String, message: String },

    #[error("Output page is already written by {}", other.display())]
    OutputCollision { other: PathBuf },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<LoadError> for PageError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Io { source, .. } => Self::Read(source),
            LoadError::Malformed { source, .. } => Self::Malformed(source),
        }
    }
}

/// Errors that stop the whole build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Content directory not found: {}", .0.display())]
    MissingContentDir(PathBuf),

    #[error("Failed to read content directory: {0}")]
    ReadError(String),

    #[error("Failed to load templates: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        if let Some(dir) = &config.templates_dir {
            if !dir.is_dir() {
                return Err(BuildError::TemplateError(format!(
                    "Templates directory not found: {}",
                    dir.display()
                )));
            }
            tracing::info!("Loading templates from {}", dir.display());
        }

        let templates = TemplateEngine::with_templates_dir(config.templates_dir.as_deref())
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        if !templates.has_template(&config.default_template) {
            tracing::warn!(
                "Default template `{}` does not exist; posts without templateKey will fail",
                config.default_template
            );
        }

        Ok(Self { config, templates })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the static site.
    ///
    /// Every post is built independently. A post that fails is recorded in
    /// the report and does not stop the others.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let sources = self.discover_sources()?;
        tracing::info!("Found {} posts in {}", sources.len(), self.config.content_dir.display());

        // Each output page belongs to the first source that maps to it.
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        let mut pending = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();

        for source in sources {
            let output_path = self.output_path(&source);
            if let Some(other) = claimed.get(&output_path) {
                failures.push(PageFailure {
                    path: source,
                    error: PageError::OutputCollision {
                        other: other.clone(),
                    },
                });
                continue;
            }
            claimed.insert(output_path.clone(), source.clone());
            pending.push((source, output_path));
        }

        let results: Vec<Result<(), PageFailure>> = pending
            .par_iter()
            .map(|(source, output_path)| {
                self.build_page(source, output_path)
                    .map_err(|error| PageFailure {
                        path: source.clone(),
                        error,
                    })
            })
            .collect();

        let mut pages = 0;

        for result in results {
            match result {
                Ok(()) => pages += 1,
                Err(failure) => failures.push(failure),
            }
        }

        for failure in &failures {
            tracing::error!("{}", failure);
        }

        Ok(BuildReport {
            pages,
            failures,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Load every post without writing anything.
    pub fn check(&self) -> Result<CheckReport, BuildError> {
        let sources = self.discover_sources()?;

        let failures: Vec<PageFailure> = sources
            .par_iter()
            .filter_map(|source| {
                load_document(source).err().map(|err| PageFailure {
                    path: source.clone(),
                    error: err.into(),
                })
            })
            .collect();

        for failure in &failures {
            tracing::error!("{}", failure);
        }

        Ok(CheckReport {
            documents: sources.len() - failures.len(),
            failures,
        })
    }

    /// Find all markdown posts in the content directory, sorted by path.
    fn discover_sources(&self) -> Result<Vec<PathBuf>, BuildError> {
        if !self.config.content_dir.is_dir() {
            return Err(BuildError::MissingContentDir(self.config.content_dir.clone()));
        }

        let mut sources = Vec::new();

        for entry in WalkDir::new(&self.config.content_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| BuildError::ReadError(e.to_string()))?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext == "md" || ext == "markdown" {
                sources.push(path.to_path_buf());
            }
        }

        Ok(sources)
    }

    /// Build a single page.
    fn build_page(&self, source: &Path, output_path: &Path) -> Result<(), PageError> {
        let doc = load_document(source)?;
        let rendered = render_markdown(doc.body());

        let template = doc
            .metadata()
            .template_key()
            .unwrap_or(self.config.default_template.as_str());

        let url = self.path_to_url(output_path);

        let context = PageContext {
            metadata: doc.metadata(),
            content: &rendered.html,
            toc: &rendered.toc,
            url: &url,
            site_title: &self.config.site_title,
            base_url: &self.config.base_url,
        };

        let html = self
            .templates
            .render_page(template, &context)
            .map_err(|e| PageError::Template {
                template: template.to_string(),
                message: e.to_string(),
            })?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|source| PageError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(output_path, html).map_err(|source| PageError::Write {
            path: output_path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Wrote {} using `{}`", output_path.display(), template);

        Ok(())
    }

    /// Calculate output path for a post.
    fn output_path(&self, source: &Path) -> PathBuf {
        let relative = source.strip_prefix(&self.config.content_dir).unwrap_or(source);
        let stem = relative
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");
        let parent = relative.parent().unwrap_or(Path::new(""));

        if stem == "index" {
            // content/index.md -> public/index.html
            self.config.output_dir.join(parent).join("index.html")
        } else {
            // content/blog/signals.md -> public/blog/signals/index.html
            self.config
                .output_dir
                .join(parent)
                .join(stem)
                .join("index.html")
        }
    }

    /// Convert output path to URL.
    fn path_to_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.config.output_dir).unwrap_or(path);

        let url = relative
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();

        if url.is_empty() {
            self.config.base_url.clone()
        } else {
            format!("{}{}/", self.config.base_url, url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn site(root: &Path) -> BuildConfig {
        BuildConfig {
            content_dir: root.join("content"),
            output_dir: root.join("public"),
            site_title: "Test Blog".to_string(),
            ..Default::default()
        }
    }

    fn write(path: PathBuf, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn builds_simple_site() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write(
            config.content_dir.join("blog/signals.md"),
            "---\ntemplateKey: blog-post\ntitle: Signals\ndate: 2023-12-04T16:47:27.733Z\ntags: [angular]\n---\n## Intro\n\nHello.\n",
        );
        write(
            config.content_dir.join("index.md"),
            "---\ntemplateKey: index-page\ntitle: Home\n---\nWelcome.\n",
        );

        let report = SiteBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(report.pages, 2);
        assert!(report.is_success());

        let post = fs::read_to_string(config.output_dir.join("blog/signals/index.html")).unwrap();
        assert!(post.contains(r#"<h1 class="post-title">Signals</h1>"#));
        assert!(post.contains(r#"<h2 id="intro">Intro</h2>"#));
        assert!(post.contains(r##"<a href="#intro">Intro</a>"##));
        assert!(post.contains("<title>Signals | Test Blog</title>"));

        let index = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(index.contains("<h1>Home</h1>"));
        assert!(index.contains("<p>Welcome.</p>"));
    }

    #[test]
    fn falls_back_to_default_template() {
        let temp = tempdir().unwrap();
        let config = BuildConfig {
            default_template: "index-page".to_string(),
            ..site(temp.path())
        };
        write(config.content_dir.join("about.md"), "---\ntitle: About\n---\nMe.\n");

        let report = SiteBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(report.pages, 1);
        let page = fs::read_to_string(config.output_dir.join("about/index.html")).unwrap();
        assert!(page.contains("<h1>About</h1>"));
    }

    #[test]
    fn uses_custom_templates() {
        let temp = tempdir().unwrap();
        let templates = temp.path().join("templates");
        write(
            templates.join("note.html"),
            "{{ title }} by {{ author }} at {{ url | safe }}",
        );
        let config = BuildConfig {
            templates_dir: Some(templates),
            ..site(temp.path())
        };
        write(
            config.content_dir.join("notes/first.md"),
            "---\ntemplateKey: note\ntitle: First\nauthor: Ada\n---\n",
        );

        SiteBuilder::new(config.clone()).unwrap().build().unwrap();

        let page = fs::read_to_string(config.output_dir.join("notes/first/index.html")).unwrap();
        assert_eq!(page, "First by Ada at /notes/first/");
    }

    #[test]
    fn malformed_post_does_not_stop_others() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write(config.content_dir.join("good.md"), "---\ntitle: Good\n---\nFine.\n");
        write(
            config.content_dir.join("bad.md"),
            "---\ntitle: Bad\ndate: not-a-date\n---\nBroken.\n",
        );

        let report = SiteBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_success());

        let failure = &report.failures[0];
        assert_eq!(failure.path, config.content_dir.join("bad.md"));
        assert!(matches!(
            failure.error,
            PageError::Malformed(MalformedDocument::InvalidDate { .. })
        ));
        assert!(failure.to_string().contains("bad.md"));

        assert!(config.output_dir.join("good/index.html").exists());
        assert!(!config.output_dir.join("bad/index.html").exists());
    }

    #[test]
    fn posts_sharing_an_output_page_are_reported() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        let flat = config.content_dir.join("signals.md");
        let nested = config.content_dir.join("signals/index.md");
        write(flat.clone(), "---\ntitle: A\n---\n");
        write(nested.clone(), "---\ntitle: B\n---\n");

        let report = SiteBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.failures.len(), 1);

        let failure = &report.failures[0];
        let PageError::OutputCollision { ref other } = failure.error else {
            panic!("unexpected error: {}", failure);
        };
        let mut pair = vec![failure.path.clone(), other.clone()];
        pair.sort();
        assert_eq!(pair, vec![flat, nested]);

        let written = fs::read_dir(config.output_dir.join("signals")).unwrap().count();
        assert_eq!(written, 1);
    }

    #[test]
    fn same_stem_with_different_extensions_collide() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write(config.content_dir.join("a.markdown"), "---\ntitle: A\n---\n");
        write(config.content_dir.join("a.md"), "---\ntitle: A\n---\n");

        let report = SiteBuilder::new(config).unwrap().build().unwrap();

        assert_eq!(report.pages, 1);
        assert!(matches!(
            report.failures[0].error,
            PageError::OutputCollision { .. }
        ));
    }

    #[test]
    fn unknown_template_key_fails_that_post() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write(
            config.content_dir.join("gallery.md"),
            "---\ntemplateKey: gallery\n---\n",
        );

        let report = SiteBuilder::new(config).unwrap().build().unwrap();

        assert_eq!(report.pages, 0);
        assert!(matches!(
            report.failures[0].error,
            PageError::Template { ref template, .. } if template == "gallery"
        ));
    }

    #[test]
    fn ignores_non_markdown_files() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write(config.content_dir.join("img/cover.png"), "not markdown");
        write(config.content_dir.join("post.markdown"), "---\ntitle: P\n---\n");

        let report = SiteBuilder::new(config).unwrap().build().unwrap();

        assert_eq!(report.pages, 1);
        assert!(report.is_success());
    }

    #[test]
    fn check_reports_malformed_posts() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write(config.content_dir.join("a.md"), "---\ntitle: A\n---\n");
        write(config.content_dir.join("b.md"), "no front matter");
        write(config.content_dir.join("c.md"), "---\ntitle: C\n");

        let report = SiteBuilder::new(config.clone()).unwrap().check().unwrap();

        assert_eq!(report.documents, 1);
        let mut paths: Vec<_> = report.failures.iter().map(|f| f.path.clone()).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![config.content_dir.join("b.md"), config.content_dir.join("c.md")]
        );
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn errors_on_missing_content_dir() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());

        let result = SiteBuilder::new(config).unwrap().build();

        assert!(matches!(result, Err(BuildError::MissingContentDir(_))));
    }

    #[test]
    fn errors_on_missing_templates_dir() {
        let temp = tempdir().unwrap();
        let config = BuildConfig {
            templates_dir: Some(temp.path().join("nope")),
            ..site(temp.path())
        };

        assert!(matches!(
            SiteBuilder::new(config),
            Err(BuildError::TemplateError(_))
        ));
    }
}
