//! Custom placeholder transform pipelines.
//!
//! A [`CustomPlaceholder`] derives a new named value from a source placeholder
//! by running an ordered list of [`TransformStep`]s, each consuming the
//! previous step's output. The result becomes addressable as
//! `{{custom::referenceName}}` in every templated field.
//!
//! Failures inside a step never abort the formatting pass: a malformed regex
//! or an unparsable date leaves the value unchanged and logs a warning.

use chrono::format::Locale;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::warn;

/// Percent-encode set equivalent to JavaScript's `encodeURIComponent`:
/// everything except alphanumerics and `- _ . ! ~ * ' ( )`. Space encodes
/// as `%20`, not `+`.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A named, pipeline-derived placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPlaceholder {
    pub id: String,

    /// Name the result is addressed by: `{{custom::referenceName}}`.
    pub reference_name: String,

    /// Placeholder supplying the initial value. When it resolves to empty or
    /// absent, the custom placeholder is empty and no steps run.
    pub source_placeholder: String,

    /// Steps applied strictly in order.
    pub steps: Vec<TransformStep>,
}

/// One transformation applied to the running value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformStep {
    /// Regex search and replace with capture-group back-references (`$1`).
    Regex {
        search: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replacement: Option<String>,
        /// JavaScript-style flag string; defaults to `gmi`. `g` selects
        /// replace-all, `i`/`m`/`s` map to the regex engine flags.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },

    /// ASCII-safe uppercase of the entire value.
    Uppercase,

    /// ASCII-safe lowercase of the entire value.
    Lowercase,

    /// Percent-encoding with `encodeURIComponent` semantics.
    UrlEncode,

    /// Parse the value as a timestamp and render it with strftime tokens.
    DateFormat {
        format: String,
        /// IANA timezone name, e.g. `America/New_York`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timezone: Option<String>,
        /// Locale for month/day names; the article locale is the fallback.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
}

/// Runs `steps` in order over `source`.
///
/// `default_locale` applies to date-format steps that do not carry their own
/// locale (the article's configured locale).
pub fn apply_pipeline(source: &str, steps: &[TransformStep], default_locale: Option<&str>) -> String {
    let mut value = source.to_string();

    for step in steps {
        value = apply_step(&value, step, default_locale);
    }

    value
}

fn apply_step(value: &str, step: &TransformStep, default_locale: Option<&str>) -> String {
    match step {
        TransformStep::Regex { search, replacement, flags } => {
            apply_regex(value, search, replacement.as_deref().unwrap_or(""), flags.as_deref())
        }
        TransformStep::Uppercase => value.to_uppercase(),
        TransformStep::Lowercase => value.to_lowercase(),
        TransformStep::UrlEncode => utf8_percent_encode(value, URL_COMPONENT).to_string(),
        TransformStep::DateFormat { format, timezone, locale } => {
            apply_date_format(value, format, timezone.as_deref(), locale.as_deref().or(default_locale))
        }
    }
}

fn apply_regex(value: &str, search: &str, replacement: &str, flags: Option<&str>) -> String {
    let flags = flags.unwrap_or("gmi");

    let regex = RegexBuilder::new(search)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build();

    let regex = match regex {
        Ok(regex) => regex,
        Err(err) => {
            warn!(search, %err, "invalid transform regex, passing value through");
            return value.to_string();
        }
    };

    let replaced = if flags.contains('g') {
        regex.replace_all(value, replacement)
    } else {
        regex.replace(value, replacement)
    };

    replaced.trim().to_string()
}

fn apply_date_format(value: &str, format: &str, timezone: Option<&str>, locale: Option<&str>) -> String {
    let Some(parsed) = parse_timestamp(value) else {
        warn!(value, "unparsable timestamp in date-format step, passing value through");
        return value.to_string();
    };

    let rendered = match timezone {
        Some(name) => match name.parse::<Tz>() {
            Ok(tz) => render_date(&parsed.with_timezone(&tz), format, locale),
            Err(_) => {
                warn!(timezone = name, "unknown timezone in date-format step, passing value through");
                return value.to_string();
            }
        },
        None => render_date(&parsed, format, locale),
    };

    rendered.unwrap_or_else(|| {
        warn!(format, "invalid date format string, passing value through");
        value.to_string()
    })
}

/// Accepts RFC 3339, RFC 2822, and common naive date formats. Naive values
/// are taken as UTC.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<chrono::FixedOffset>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt);
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset());
    }

    None
}

/// Renders through a fallible writer since an invalid strftime specifier
/// surfaces as a formatting error, not a parse error.
fn render_date<Z>(dt: &DateTime<Z>, format: &str, locale: Option<&str>) -> Option<String>
where
    Z: TimeZone,
    Z::Offset: std::fmt::Display,
{
    let mut out = String::new();

    let result = match locale.and_then(parse_locale) {
        Some(locale) => write!(out, "{}", dt.format_localized(format, locale)),
        None => write!(out, "{}", dt.format(format)),
    };

    result.ok().map(|_| out)
}

fn parse_locale(name: &str) -> Option<Locale> {
    Locale::try_from(name.replace('-', "_").as_str()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_replacement() {
        let steps = vec![TransformStep::Regex {
            search: "Hello".to_string(),
            replacement: Some("Goodbye".to_string()),
            flags: None,
        }];
        assert_eq!(apply_pipeline("Hello World", &steps, None), "Goodbye World");
    }

    #[test]
    fn test_regex_no_match_is_identity() {
        let steps = vec![TransformStep::Regex {
            search: "absent".to_string(),
            replacement: Some("x".to_string()),
            flags: None,
        }];
        assert_eq!(apply_pipeline("Hello World", &steps, None), "Hello World");
    }

    #[test]
    fn test_regex_default_flags_are_global_and_case_insensitive() {
        let steps = vec![TransformStep::Regex {
            search: "o".to_string(),
            replacement: Some("0".to_string()),
            flags: None,
        }];
        assert_eq!(apply_pipeline("FOO boo", &steps, None), "F00 b00");
    }

    #[test]
    fn test_regex_without_global_flag_replaces_first_only() {
        let steps = vec![TransformStep::Regex {
            search: "o".to_string(),
            replacement: Some("0".to_string()),
            flags: Some("i".to_string()),
        }];
        assert_eq!(apply_pipeline("foo", &steps, None), "f0o");
    }

    #[test]
    fn test_regex_capture_group_backreference() {
        let steps = vec![TransformStep::Regex {
            search: r"(\w+) (\w+)".to_string(),
            replacement: Some("$2 $1".to_string()),
            flags: None,
        }];
        assert_eq!(apply_pipeline("hello world", &steps, None), "world hello");
    }

    #[test]
    fn test_malformed_regex_passes_through() {
        let steps = vec![TransformStep::Regex {
            search: "[unclosed".to_string(),
            replacement: None,
            flags: None,
        }];
        assert_eq!(apply_pipeline("unchanged", &steps, None), "unchanged");
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(apply_pipeline("MiXeD", &[TransformStep::Uppercase], None), "MIXED");
        assert_eq!(apply_pipeline("MiXeD", &[TransformStep::Lowercase], None), "mixed");
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(
            apply_pipeline("a b&c=d", &[TransformStep::UrlEncode], None),
            "a%20b%26c%3Dd"
        );
        // encodeURIComponent-unreserved characters stay as-is.
        assert_eq!(
            apply_pipeline("A-Z_z.!~*'()", &[TransformStep::UrlEncode], None),
            "A-Z_z.!~*'()"
        );
    }

    #[test]
    fn test_date_format() {
        let steps = vec![TransformStep::DateFormat {
            format: "%Y-%m-%d".to_string(),
            timezone: None,
            locale: None,
        }];
        assert_eq!(apply_pipeline("2024-01-15T10:30:00Z", &steps, None), "2024-01-15");
    }

    #[test]
    fn test_date_format_with_timezone() {
        let steps = vec![TransformStep::DateFormat {
            format: "%H:%M".to_string(),
            timezone: Some("America/New_York".to_string()),
            locale: None,
        }];
        // 10:30 UTC is 05:30 in New York in January.
        assert_eq!(apply_pipeline("2024-01-15T10:30:00Z", &steps, None), "05:30");
    }

    #[test]
    fn test_unparsable_date_passes_through() {
        let steps = vec![TransformStep::DateFormat {
            format: "%Y".to_string(),
            timezone: None,
            locale: None,
        }];
        assert_eq!(apply_pipeline("not a date", &steps, None), "not a date");
    }

    #[test]
    fn test_unknown_timezone_passes_through() {
        let steps = vec![TransformStep::DateFormat {
            format: "%Y".to_string(),
            timezone: Some("Mars/Olympus_Mons".to_string()),
            locale: None,
        }];
        assert_eq!(apply_pipeline("2024-01-15T10:30:00Z", &steps, None), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_rfc2822_date_parsing() {
        let steps = vec![TransformStep::DateFormat {
            format: "%Y-%m-%d".to_string(),
            timezone: None,
            locale: None,
        }];
        assert_eq!(
            apply_pipeline("Mon, 15 Jan 2024 10:30:00 +0000", &steps, None),
            "2024-01-15"
        );
    }

    #[test]
    fn test_steps_chain_in_order() {
        let steps = vec![
            TransformStep::Regex {
                search: "Hello".to_string(),
                replacement: Some("Goodbye".to_string()),
                flags: None,
            },
            TransformStep::Uppercase,
        ];
        assert_eq!(apply_pipeline("Hello World", &steps, None), "GOODBYE WORLD");
    }

    #[test]
    fn test_step_deserialization() {
        let step: TransformStep =
            serde_json::from_str(r#"{"type":"REGEX","search":"a","replacement":"b","flags":"g"}"#).unwrap();
        assert!(matches!(step, TransformStep::Regex { .. }));

        let step: TransformStep = serde_json::from_str(r#"{"type":"URL_ENCODE"}"#).unwrap();
        assert!(matches!(step, TransformStep::UrlEncode));

        let step: TransformStep =
            serde_json::from_str(r#"{"type":"DATE_FORMAT","format":"%Y","timezone":"UTC"}"#).unwrap();
        assert!(matches!(step, TransformStep::DateFormat { .. }));
    }

    #[test]
    fn test_placeholder_deserialization() {
        let json = r#"{
            "id": "1",
            "referenceName": "x",
            "sourcePlaceholder": "title",
            "steps": [{"type": "UPPERCASE"}]
        }"#;
        let placeholder: CustomPlaceholder = serde_json::from_str(json).unwrap();
        assert_eq!(placeholder.reference_name, "x");
        assert_eq!(placeholder.source_placeholder, "title");
        assert_eq!(placeholder.steps.len(), 1);
    }
}
