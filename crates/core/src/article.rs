//! Article input type for one formatting pass.
//!
//! This module defines the [`Article`] struct which represents a single feed
//! item flattened into a name-to-string placeholder map, together with the raw
//! published-date value and an optional locale hint. An article is constructed
//! once by the feed-fetch collaborator and is read-only for the lifetime of a
//! formatting pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flattened feed item.
///
/// Field names are case-sensitive keys; well-known fields (`title`,
/// `description`, `summary`, `link`, `author`, `pubdate`, `guid`) share the
/// map with any other placeholder the feed supplied. A missing field resolves
/// to the empty string everywhere in the pipeline, never to an error.
///
/// # Example
///
/// ```rust
/// use feedrelay_core::Article;
///
/// let article = Article::new([("title", "Hello World"), ("link", "https://example.com")]);
/// assert_eq!(article.field("title"), Some("Hello World"));
/// assert_eq!(article.field("missing"), None);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    /// Flattened placeholder name to value mapping.
    pub fields: BTreeMap<String, String>,

    /// The published-date value exactly as the feed supplied it.
    ///
    /// Used for `timestamp: article` embed resolution; the flattened
    /// `pubdate` field may already be formatted for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,

    /// Locale hint for date rendering, e.g. `en-US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl Article {
    /// Creates an article from an iterator of name/value pairs.
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            published_date: None,
            locale: None,
        }
    }

    /// Sets the raw published-date value.
    pub fn with_published_date(mut self, date: impl Into<String>) -> Self {
        self.published_date = Some(date.into());
        self
    }

    /// Sets the locale hint used by date-format transform steps.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Looks up a field by its exact name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Looks up a field, treating a missing field as empty.
    pub fn field_or_empty(&self, name: &str) -> &str {
        self.field(name).unwrap_or("")
    }
}
