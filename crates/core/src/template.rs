//! Placeholder resolution for template strings.
//!
//! Templates reference article fields with `{{accessor}}` tokens. An accessor
//! is usually a bare field name; prefixed accessors (`custom::name`,
//! `discord::mentions`, `raw::field`) are ordinary keys in the field map that
//! upstream stages insert. When fallback support is enabled an accessor may be
//! a `||`-delimited chain evaluated left to right, where the first sub-accessor
//! with a non-empty value wins and a `text::literal` segment resolves to the
//! literal verbatim and terminates the chain.
//!
//! A missing field resolves to the empty string, never an error. Append
//! strings configured on placeholder limits are themselves templates and are
//! resolved recursively; resolution depth is capped so self-referential
//! configurations cannot loop forever.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use feedrelay_core::template::{ResolveOptions, resolve};
//!
//! let fields = BTreeMap::from([("title".to_string(), "Hello".to_string())]);
//! let out = resolve("{{title}} / {{missing}}", &fields, &ResolveOptions::default());
//! assert_eq!(out, "Hello / ");
//! ```

use crate::limits::{PlaceholderLimit, apply_limit};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(.+?)\}\}").unwrap());

/// Recursion cap for nested resolution (append strings containing
/// placeholders). Templates nested deeper than this are returned unresolved.
const MAX_RESOLVE_DEPTH: usize = 8;

/// Prefix marking a literal fallback segment.
const LITERAL_PREFIX: &str = "text::";

/// Options controlling one resolution pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    /// Enables `||` fallback chains and `text::` literals.
    pub enable_fallback: bool,

    /// Placeholder limits to enforce on resolved values.
    pub limits: &'a [PlaceholderLimit],

    /// Budget substituted for a limit with `character_count` 0.
    pub platform_max: usize,
}

impl Default for ResolveOptions<'_> {
    fn default() -> Self {
        Self { enable_fallback: false, limits: &[], platform_max: 2000 }
    }
}

/// Resolves every `{{accessor}}` token in `template` against `fields`.
pub fn resolve(template: &str, fields: &BTreeMap<String, String>, options: &ResolveOptions) -> String {
    resolve_at_depth(template, fields, options, 0)
}

fn resolve_at_depth(
    template: &str,
    fields: &BTreeMap<String, String>,
    options: &ResolveOptions,
    depth: usize,
) -> String {
    if depth > MAX_RESOLVE_DEPTH {
        return template.to_string();
    }

    TOKEN
        .replace_all(template, |caps: &Captures| {
            let accessor = &caps[1];
            let (value, used) = resolve_accessor(accessor, fields, options.enable_fallback);

            match used {
                Some(used) => enforce_limit(value, used, accessor, fields, options, depth),
                // Literal fallback results are exempt from limits.
                None => value,
            }
        })
        .into_owned()
}

/// Resolves one accessor, returning the value and the sub-accessor that
/// supplied it. Literals and unmatched chains report no sub-accessor.
fn resolve_accessor<'a>(
    accessor: &'a str,
    fields: &BTreeMap<String, String>,
    enable_fallback: bool,
) -> (String, Option<&'a str>) {
    if !enable_fallback {
        return (fields.get(accessor).cloned().unwrap_or_default(), Some(accessor));
    }

    for sub in accessor.split("||") {
        if let Some(literal) = sub.strip_prefix(LITERAL_PREFIX) {
            return (literal.to_string(), None);
        }

        if let Some(value) = fields.get(sub)
            && !value.is_empty()
        {
            return (value.clone(), Some(sub));
        }
    }

    (String::new(), None)
}

/// Applies the first limit keyed to either the winning sub-accessor or the
/// full accessor string as written in the template.
fn enforce_limit(
    value: String,
    used: &str,
    accessor: &str,
    fields: &BTreeMap<String, String>,
    options: &ResolveOptions,
    depth: usize,
) -> String {
    let limit = options
        .limits
        .iter()
        .find(|l| l.placeholder == used || l.placeholder == accessor);

    let Some(limit) = limit else {
        return value;
    };

    let append = match &limit.append_string {
        Some(template) => {
            let nested = ResolveOptions { enable_fallback: true, limits: &[], platform_max: options.platform_max };
            resolve_at_depth(template, fields, &nested, depth + 1)
        }
        None => String::new(),
    };

    apply_limit(&value, limit.character_count, &append, options.platform_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_bare_placeholder_resolution() {
        let f = fields(&[("title", "Hello World")]);
        assert_eq!(resolve("{{title}}", &f, &ResolveOptions::default()), "Hello World");
    }

    #[test]
    fn test_no_tokens_remain_when_fields_present() {
        let f = fields(&[("title", "A"), ("link", "B")]);
        let out = resolve("{{title}} - {{link}} - {{title}}", &f, &ResolveOptions::default());
        assert!(!out.contains("{{"));
        assert!(!out.contains("}}"));
        assert_eq!(out, "A - B - A");
    }

    #[test]
    fn test_missing_field_resolves_to_empty() {
        let f = fields(&[]);
        assert_eq!(resolve("[{{nope}}]", &f, &ResolveOptions::default()), "[]");
    }

    #[test]
    fn test_fallback_chain_first_non_empty_wins() {
        let f = fields(&[("a", ""), ("b", "beta")]);
        let opts = ResolveOptions { enable_fallback: true, ..Default::default() };
        assert_eq!(resolve("{{a||b||text::literal}}", &f, &opts), "beta");
    }

    #[test]
    fn test_fallback_chain_literal_terminates() {
        let f = fields(&[("a", ""), ("b", "")]);
        let opts = ResolveOptions { enable_fallback: true, ..Default::default() };
        assert_eq!(resolve("{{a||b||text::literal}}", &f, &opts), "literal");
    }

    #[test]
    fn test_fallback_chain_first_wins_ignoring_rest() {
        let f = fields(&[("a", "alpha"), ("b", "beta")]);
        let opts = ResolveOptions { enable_fallback: true, ..Default::default() };
        assert_eq!(resolve("{{a||b||text::literal}}", &f, &opts), "alpha");
    }

    #[test]
    fn test_fallback_disabled_treats_chain_as_one_key() {
        let f = fields(&[("a", "alpha")]);
        assert_eq!(resolve("{{a||b}}", &f, &ResolveOptions::default()), "");
    }

    #[test]
    fn test_limit_applies_to_bare_accessor() {
        let f = fields(&[("title", "This is a very long title that exceeds the limit")]);
        let limits =
            vec![PlaceholderLimit { placeholder: "title".to_string(), character_count: 20, append_string: None }];
        let opts = ResolveOptions { limits: &limits, ..Default::default() };

        let out = resolve("{{title}}", &f, &opts);
        assert!(out.chars().count() <= 20);
        assert_eq!(out, "This is a very long");
    }

    #[test]
    fn test_limit_keyed_to_full_chain_accessor() {
        let f = fields(&[("description", "some long description text that goes on and on")]);
        let limits = vec![PlaceholderLimit {
            placeholder: "missing||description".to_string(),
            character_count: 10,
            append_string: None,
        }];
        let opts = ResolveOptions { enable_fallback: true, limits: &limits, ..Default::default() };

        // Matches the accessor exactly as written in the template.
        let out = resolve("{{missing||description}}", &f, &opts);
        assert!(out.chars().count() <= 10);

        // Does not apply to the bare field accessor.
        let out = resolve("{{description}}", &f, &opts);
        assert_eq!(out, "some long description text that goes on and on");
    }

    #[test]
    fn test_limit_append_string_is_templated() {
        let f = fields(&[
            ("description", "a very long description needing truncation for sure"),
            ("link", "url"),
        ]);
        let limits = vec![PlaceholderLimit {
            placeholder: "description".to_string(),
            character_count: 30,
            append_string: Some("... {{link}}".to_string()),
        }];
        let opts = ResolveOptions { limits: &limits, ..Default::default() };

        let out = resolve("{{description}}", &f, &opts);
        assert!(out.ends_with("... url"));
        assert!(out.chars().count() <= 30);
    }

    #[test]
    fn test_literal_fallback_exempt_from_limits() {
        let f = fields(&[]);
        let limits = vec![PlaceholderLimit {
            placeholder: "a||text::a rather long literal value".to_string(),
            character_count: 5,
            append_string: None,
        }];
        let opts = ResolveOptions { enable_fallback: true, limits: &limits, ..Default::default() };

        let out = resolve("{{a||text::a rather long literal value}}", &f, &opts);
        assert_eq!(out, "a rather long literal value");
    }

    #[test]
    fn test_self_referential_append_terminates() {
        let long = "t".repeat(50);
        let f = fields(&[("title", long.as_str())]);
        let limits = vec![PlaceholderLimit {
            placeholder: "title".to_string(),
            character_count: 20,
            append_string: Some("{{title}}".to_string()),
        }];
        let opts = ResolveOptions { limits: &limits, ..Default::default() };

        // Nested append resolution runs without limits, so recursion stops
        // after one level; the output stays within the configured budget.
        let out = resolve("{{title}}", &f, &opts);
        assert!(out.chars().count() <= 20);
    }

    #[test]
    fn test_limit_not_applied_when_value_fits() {
        let f = fields(&[("title", "short")]);
        let limits = vec![PlaceholderLimit {
            placeholder: "title".to_string(),
            character_count: 20,
            append_string: Some("...".to_string()),
        }];
        let opts = ResolveOptions { limits: &limits, ..Default::default() };
        assert_eq!(resolve("{{title}}", &f, &opts), "short");
    }

    #[test]
    fn test_unknown_token_text_left_outside_braces() {
        let f = fields(&[("title", "x")]);
        let out = resolve("prefix {{title}} suffix", &f, &ResolveOptions::default());
        assert_eq!(out, "prefix x suffix");
    }
}
