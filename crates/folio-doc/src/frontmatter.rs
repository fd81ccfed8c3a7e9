//! Front-matter block extraction.

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_yaml::Value;

/// Marker line opening and closing the metadata block.
pub const DELIMITER: &str = "---";

/// Errors that make a content file unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedDocument {
    #[error("Missing opening --- delimiter on the first line")]
    MissingOpeningDelimiter,

    #[error("Unclosed metadata block - missing closing ---")]
    Unterminated,

    #[error("Invalid key/value syntax in metadata: {0}")]
    InvalidSyntax(String),

    #[error("Metadata key `{key}` must be {expected}")]
    InvalidValue { key: String, expected: &'static str },

    #[error("Invalid date `{value}`: expected an ISO-8601 timestamp")]
    InvalidDate { value: String },
}

/// Split a content file into its metadata region and body.
///
/// The first line must be the delimiter. The body is everything after the
/// closing delimiter line, untouched.
pub fn split_front_matter(source: &str) -> Result<(&str, &str), MalformedDocument> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let (first, rest) = next_line(source);
    if !is_delimiter(first) {
        return Err(MalformedDocument::MissingOpeningDelimiter);
    }

    let mut remaining = rest;
    while !remaining.is_empty() {
        let (line, after) = next_line(remaining);
        if is_delimiter(line) {
            let region = &rest[..rest.len() - remaining.len()];
            return Ok((region, after));
        }
        remaining = after;
    }

    Err(MalformedDocument::Unterminated)
}

/// Parse the metadata region into ordered key/value pairs.
pub(crate) fn parse_entries(region: &str) -> Result<Vec<(String, Value)>, MalformedDocument> {
    let blank = region.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(Vec::new());
    }

    let value: Value = serde_yaml::from_str(region)
        .map_err(|e| MalformedDocument::InvalidSyntax(e.to_string()))?;

    let mut entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(mapping) => mapping
            .into_iter()
            .map(|(key, value)| match key {
                Value::String(key) => Ok((key, value)),
                other => Err(MalformedDocument::InvalidSyntax(format!(
                    "keys must be plain strings, found {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(MalformedDocument::InvalidSyntax(
                "metadata block is not a list of `key: value` lines".to_string(),
            ))
        }
    };

    if entries.iter().any(|(_, value)| contains_number(value)) {
        SourceText(&mut entries)
            .deserialize(serde_yaml::Deserializer::from_str(region))
            .map_err(|e| MalformedDocument::InvalidSyntax(e.to_string()))?;
    }

    Ok(entries)
}

fn contains_number(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::Sequence(items) => items.iter().any(contains_number),
        _ => false,
    }
}

/// Replaces numbers with the scalar text they were written as.
///
/// `Value` resolves `1.10` to the float `1.1`; a second pass over the same
/// region asks for those scalars as strings, which yields them verbatim.
/// Entries must be in document order.
struct SourceText<'a>(&'a mut [(String, Value)]);

impl<'de> DeserializeSeed<'de> for SourceText<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for SourceText<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        for (_, value) in self.0.iter_mut() {
            if map.next_key::<IgnoredAny>()?.is_none() {
                return Ok(());
            }
            map.next_value_seed(ScalarText(value))?;
        }
        while map.next_key::<IgnoredAny>()?.is_some() {
            map.next_value::<IgnoredAny>()?;
        }
        Ok(())
    }
}

struct ScalarText<'a>(&'a mut Value);

impl<'de> DeserializeSeed<'de> for ScalarText<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        let value = self.0;
        if value.is_number() {
            *value = Value::String(String::deserialize(deserializer)?);
            return Ok(());
        }

        match value {
            Value::Sequence(items) => deserializer.deserialize_seq(ItemsText(items)),
            _ => IgnoredAny::deserialize(deserializer).map(|_| ()),
        }
    }
}

struct ItemsText<'a>(&'a mut [Value]);

impl<'de> Visitor<'de> for ItemsText<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        for item in self.0.iter_mut() {
            if seq.next_element_seed(ScalarText(item))?.is_none() {
                return Err(de::Error::custom("sequence ended early"));
            }
        }
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(())
    }
}

fn next_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, ""),
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}
