//! Typed post metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};

use crate::frontmatter::MalformedDocument;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert a YAML value, returning `None` for null.
    fn from_yaml(key: &str, value: Value) -> Result<Option<Self>, MalformedDocument> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(Self::Bool(b))),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| {
                    scalar_text(item).ok_or_else(|| MalformedDocument::InvalidValue {
                        key: key.to_string(),
                        expected: "a list of plain values",
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(Self::List(items))),
            other => scalar_text(other).map(|s| Some(Self::Text(s))).ok_or_else(|| {
                MalformedDocument::InvalidValue {
                    key: key.to_string(),
                    expected: "a string, boolean or list of strings",
                }
            }),
        }
    }

    fn to_yaml(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(items) => {
                Value::Sequence(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Metadata of a post.
///
/// Keys the site generator knows about are typed fields; anything else is
/// kept in `extra` and handed to templates untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Name of the template used to render this post
    #[serde(rename = "templateKey", skip_serializing_if = "Option::is_none")]
    pub template_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Publication timestamp
    #[serde(
        serialize_with = "serialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<FixedOffset>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the post is highlighted on listing pages
    #[serde(rename = "featuredpost", skip_serializing_if = "Option::is_none")]
    pub featured_post: Option<bool>,

    /// Path to the cover image
    #[serde(rename = "featuredimage", skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,

    /// Tags in source order, duplicates kept
    pub tags: Vec<String>,

    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, MetaValue>,
}

impl Metadata {
    /// Build metadata from parsed key/value pairs.
    pub(crate) fn from_entries(entries: Vec<(String, Value)>) -> Result<Self, MalformedDocument> {
        let mut meta = Self::default();

        for (key, value) in entries {
            match key.as_str() {
                "templateKey" => meta.template_key = text_field(&key, value)?,
                "title" => meta.title = text_field(&key, value)?,
                "date" => meta.date = date_field(value)?,
                "description" => meta.description = text_field(&key, value)?,
                "featuredpost" => meta.featured_post = bool_field(&key, value)?,
                "featuredimage" => meta.featured_image = text_field(&key, value)?,
                "tags" => meta.tags = list_field(&key, value)?,
                _ => {
                    if let Some(value) = MetaValue::from_yaml(&key, value)? {
                        meta.extra.insert(key, value);
                    }
                }
            }
        }

        Ok(meta)
    }

    /// Look up a value by its source key, known or not.
    pub fn get(&self, key: &str) -> Option<MetaValue> {
        match key {
            "templateKey" => self.template_key.clone().map(MetaValue::Text),
            "title" => self.title.clone().map(MetaValue::Text),
            "date" => self.date.as_ref().map(|d| MetaValue::Text(format_date(d))),
            "description" => self.description.clone().map(MetaValue::Text),
            "featuredpost" => self.featured_post.map(MetaValue::Bool),
            "featuredimage" => self.featured_image.clone().map(MetaValue::Text),
            "tags" => Some(MetaValue::List(self.tags.clone())),
            _ => self.extra.get(key).cloned(),
        }
    }

    /// Template selected by this post, if any.
    pub fn template_key(&self) -> Option<&str> {
        self.template_key.as_deref()
    }

    /// Mapping in the order it is written back to a file.
    pub(crate) fn to_mapping(&self) -> Mapping {
        let mut mapping = Mapping::new();
        let mut put = |key: &str, value: Value| {
            mapping.insert(Value::String(key.to_string()), value);
        };

        if let Some(template_key) = &self.template_key {
            put("templateKey", Value::String(template_key.clone()));
        }
        if let Some(title) = &self.title {
            put("title", Value::String(title.clone()));
        }
        if let Some(date) = &self.date {
            put("date", Value::String(format_date(date)));
        }
        if let Some(description) = &self.description {
            put("description", Value::String(description.clone()));
        }
        if let Some(featured) = self.featured_post {
            put("featuredpost", Value::Bool(featured));
        }
        if let Some(image) = &self.featured_image {
            put("featuredimage", Value::String(image.clone()));
        }
        if !self.tags.is_empty() {
            put("tags", MetaValue::List(self.tags.clone()).to_yaml());
        }
        for (key, value) in &self.extra {
            put(key.as_str(), value.to_yaml());
        }

        mapping
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339, a date-time without offset (UTC) and a bare date
/// (midnight UTC).
pub fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, MalformedDocument> {
    let trimmed = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(date);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| MalformedDocument::InvalidDate {
            value: value.to_string(),
        })
}

/// Format a timestamp the way it is written back to a file.
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn serialize_date<S: Serializer>(
    date: &Option<DateTime<FixedOffset>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&format_date(date)),
        None => serializer.serialize_none(),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(key: &str, value: Value) -> Result<Option<String>, MalformedDocument> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(MalformedDocument::InvalidValue {
            key: key.to_string(),
            expected: "a string",
        }),
    }
}

fn bool_field(key: &str, value: Value) -> Result<Option<bool>, MalformedDocument> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b)),
        _ => Err(MalformedDocument::InvalidValue {
            key: key.to_string(),
            expected: "a boolean",
        }),
    }
}

fn list_field(key: &str, value: Value) -> Result<Vec<String>, MalformedDocument> {
    let invalid = || MalformedDocument::InvalidValue {
        key: key.to_string(),
        expected: "a list of strings",
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

fn date_field(value: Value) -> Result<Option<DateTime<FixedOffset>>, MalformedDocument> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => parse_date(&s).map(Some),
        other => Err(MalformedDocument::InvalidDate {
            value: scalar_text(other).unwrap_or_else(|| "<non-scalar>".to_string()),
        }),
    }
}
