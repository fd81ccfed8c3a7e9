//! Configuration file (folio.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_static::BuildConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct BuildSettings {
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Directory of user templates
    pub templates_dir: Option<String>,
    #[serde(default = "default_template")]
    pub default_template: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            base_url: default_base_url(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            output_dir: default_output_dir(),
            templates_dir: None,
            default_template: default_template(),
        }
    }
}

fn default_title() -> String {
    "Blog".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_content_dir() -> String {
    "content".to_string()
}
fn default_output_dir() -> String {
    "public".to_string()
}
fn default_template() -> String {
    "blog-post".to_string()
}

impl ConfigFile {
    /// Builder settings, with an optional output directory override.
    pub fn build_config(&self, output: Option<PathBuf>) -> BuildConfig {
        BuildConfig {
            content_dir: PathBuf::from(&self.build.content_dir),
            output_dir: output.unwrap_or_else(|| PathBuf::from(&self.build.output_dir)),
            templates_dir: self.build.templates_dir.as_ref().map(PathBuf::from),
            default_template: self.build.default_template.clone(),
            site_title: self.site.title.clone(),
            base_url: self.site.base_url.clone(),
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("folio.toml")).unwrap();

        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.build.content_dir, "content");
        assert_eq!(config.build.default_template, "blog-post");
        assert_eq!(config.site.base_url, "/");
    }

    #[test]
    fn reads_all_settings() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(
            &path,
            r#"
[site]
title = "Signals Weekly"
base_url = "/blog/"

[build]
content_dir = "posts"
output_dir = "dist"
templates_dir = "layouts"
default_template = "index-page"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap().build_config(None);

        assert_eq!(config.site_title, "Signals Weekly");
        assert_eq!(config.base_url, "/blog/");
        assert_eq!(config.content_dir, PathBuf::from("posts"));
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.templates_dir, Some(PathBuf::from("layouts")));
        assert_eq!(config.default_template, "index-page");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(&path, "[build]\noutput_dir = \"out\"\n").unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.build.output_dir, "out");
        assert_eq!(config.build.content_dir, "content");
        assert_eq!(config.site.title, "Blog");
    }

    #[test]
    fn output_override_wins() {
        let config = ConfigFile::default().build_config(Some(PathBuf::from("elsewhere")));

        assert_eq!(config.output_dir, PathBuf::from("elsewhere"));
    }

    #[test]
    fn errors_on_malformed_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(&path, "[site\ntitle = ").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }
}
