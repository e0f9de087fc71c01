//! Per-placeholder character budgets.
//!
//! A [`PlaceholderLimit`] caps the resolved value of one placeholder accessor
//! to a character count, truncating at a word boundary and appending an
//! optional suffix. The suffix may itself be a template; the resolver takes
//! care of resolving it before the budget is accounted here.

use serde::{Deserialize, Serialize};

/// A configured character budget for one placeholder accessor.
///
/// The `placeholder` key matches the accessor string literally as written in
/// the template, including any fallback chain syntax: a limit keyed
/// `missing||description` applies to templates using exactly that accessor,
/// not to `description` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderLimit {
    /// Accessor string the limit applies to.
    pub placeholder: String,

    /// Character budget. `0` means no limit (the platform maximum applies).
    pub character_count: usize,

    /// Suffix appended after truncation; may contain placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_string: Option<String>,
}

/// Truncates `value` to at most `character_count` characters.
///
/// A `character_count` of `0` is treated as "no limit" and substituted with
/// `platform_max`. Values within budget are returned unchanged and the append
/// string is not added. Over-budget values are cut at the last whole-word
/// boundary that leaves room for `append`, which is then concatenated.
/// The result never exceeds the effective budget.
pub fn apply_limit(value: &str, character_count: usize, append: &str, platform_max: usize) -> String {
    let budget = if character_count == 0 { platform_max } else { character_count };

    if value.chars().count() <= budget {
        return value.to_string();
    }

    let text_budget = budget.saturating_sub(append.chars().count());

    if text_budget == 0 {
        return append.chars().take(budget).collect();
    }

    let mut out = truncate_at_word_boundary(value, text_budget).to_string();
    out.push_str(append);
    out
}

/// Cuts `value` to at most `budget` characters, preferring the last
/// whitespace boundary at or before the cut. Trailing whitespace is removed.
/// Falls back to a hard cut when the prefix contains no whitespace.
pub(crate) fn truncate_at_word_boundary(value: &str, budget: usize) -> &str {
    if value.chars().count() <= budget {
        return value;
    }

    let cut = byte_index_of_char(value, budget);
    let prefix = &value[..cut];

    match prefix.rfind(char::is_whitespace) {
        Some(boundary) => prefix[..boundary].trim_end(),
        None => prefix,
    }
}

/// Byte index of the character at position `nth`, or the string length.
fn byte_index_of_char(value: &str, nth: usize) -> usize {
    value.char_indices().nth(nth).map_or(value.len(), |(i, _)| i)
}
