//! Template engine for rendering post pages.

use std::path::Path;

use folio_doc::{Metadata, TocEntry};
use minijinja::{path_loader, Environment};
use serde::Serialize;

/// Variables available to a page template.
///
/// Every metadata key is exposed at the top level under its source name
/// (`title`, `tags`, `featuredimage`, pass-through keys, ...). The builder's
/// own variables come after and win on a name clash.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext<'a> {
    #[serde(flatten)]
    pub metadata: &'a Metadata,
    /// Rendered body HTML
    pub content: &'a str,
    /// Table of contents
    pub toc: &'a [TocEntry],
    /// URL of this page
    pub url: &'a str,
    /// Site title
    pub site_title: &'a str,
    /// Base URL
    pub base_url: &'a str,
}

/// Template engine using minijinja.
///
/// Templates are looked up by template key: `blog-post` resolves to
/// `blog-post.html`. Files in the templates directory take precedence over the
/// built-in templates of the same name.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a template engine with only the built-in templates.
    pub fn new() -> Result<Self, minijinja::Error> {
        Self::with_templates_dir(None)
    }

    /// Create a template engine that also loads templates from `dir`.
    pub fn with_templates_dir(dir: Option<&Path>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();

        if let Some(dir) = dir {
            env.set_loader(path_loader(dir));
        }

        for (name, source) in BUILTIN_TEMPLATES {
            if dir.is_some_and(|dir| dir.join(name).is_file()) {
                tracing::debug!("Using custom template {}", name);
                continue;
            }
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    /// Whether a template exists for the given key.
    pub fn has_template(&self, key: &str) -> bool {
        self.env.get_template(&template_name(key)).is_ok()
    }

    /// Render a page using the template selected by `key`.
    pub fn render_page(&self, key: &str, context: &PageContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(&template_name(key))?;

        tmpl.render(context)
    }
}

fn template_name(key: &str) -> String {
    format!("{key}.html")
}

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("base.html", BASE_TEMPLATE),
    ("blog-post.html", BLOG_POST_TEMPLATE),
    ("index-page.html", INDEX_PAGE_TEMPLATE),
];

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% if title %}{{ title }} | {% endif %}{{ site_title }}</title>
  {% if description %}<meta name="description" content="{{ description }}">{% endif %}
</head>
<body>
  <header class="site-header">
    <a href="{{ base_url }}" class="site-title">{{ site_title }}</a>
  </header>
  <main class="main">
    {% block content %}{% endblock %}
  </main>
</body>
</html>"##;

const BLOG_POST_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="post{% if featuredpost %} featured{% endif %}">
  <header>
    <h1 class="post-title">{{ title }}</h1>
    {% if date %}<time datetime="{{ date }}">{{ date[:10] }}</time>{% endif %}
    {% if description %}<p class="post-description">{{ description }}</p>{% endif %}
    {% if featuredimage %}<img class="post-image" src="{{ featuredimage }}" alt="{{ title }}">{% endif %}
  </header>

  {% if toc %}
  <nav class="toc">
    <ul>
    {% for entry in toc %}
      <li class="toc-level-{{ entry.level }}"><a href="#{{ entry.id }}">{{ entry.title }}</a></li>
    {% endfor %}
    </ul>
  </nav>
  {% endif %}

  <div class="content">
    {{ content | safe }}
  </div>

  {% if tags %}
  <ul class="tags">
  {% for tag in tags %}
    <li class="tag">{{ tag }}</li>
  {% endfor %}
  </ul>
  {% endif %}
</article>
{% endblock %}"##;

const INDEX_PAGE_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<section class="page">
  {% if title %}<h1>{{ title }}</h1>{% endif %}
  {{ content | safe }}
</section>
{% endblock %}"##;
