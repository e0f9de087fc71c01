//! Message splitting under the platform length ceiling.
//!
//! Content that exceeds the ceiling is partitioned greedily: each segment is
//! cut at the rightmost occurrence of the split character that still fits,
//! keeping the split character with the segment so the undecorated segments
//! concatenate back to the original content. When no split character occurs
//! within the budget the segment is hard-cut at the budget; this is a
//! documented degraded mode, not an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Split behavior for over-length content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitConfig {
    /// Character to cut at. Defaults to any whitespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_char: Option<char>,

    /// Prefixed to the first segment only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepend_char: Option<String>,

    /// Suffixed to the last segment only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_char: Option<String>,
}

/// Splits `content` into segments of at most `ceiling` characters.
///
/// Content within the ceiling is returned as a single undecorated segment.
/// Otherwise the prepend/append decorations are budgeted out of the ceiling,
/// the text is cut greedily at split-character boundaries, and the decorations
/// are applied to the first and last segments respectively. Interior segments
/// receive neither.
pub fn split_content(content: &str, config: &SplitConfig, ceiling: usize) -> Vec<String> {
    if content.chars().count() <= ceiling {
        return vec![content.to_string()];
    }

    let prepend = config.prepend_char.as_deref().unwrap_or("");
    let append = config.append_char.as_deref().unwrap_or("");

    let budget = ceiling
        .saturating_sub(prepend.chars().count())
        .saturating_sub(append.chars().count())
        .max(1);

    let mut segments = Vec::new();
    let mut remaining = content;

    while remaining.chars().count() > budget {
        let window_end = byte_index_of_char(remaining, budget);
        let window = &remaining[..window_end];

        let cut = match config.split_char {
            Some(c) => window.rfind(c).map(|i| i + c.len_utf8()),
            None => window
                .char_indices()
                .filter(|(_, c)| c.is_whitespace())
                .map(|(i, c)| i + c.len_utf8())
                .next_back(),
        };

        let cut = cut.unwrap_or_else(|| {
            debug!(budget, "no split character within budget, hard-cutting segment");
            window_end
        });

        segments.push(remaining[..cut].to_string());
        remaining = &remaining[cut..];
    }

    if !remaining.is_empty() || segments.is_empty() {
        segments.push(remaining.to_string());
    }

    if segments.len() > 1 {
        if !prepend.is_empty() {
            segments[0].insert_str(0, prepend);
        }

        if !append.is_empty() {
            let last = segments.len() - 1;
            segments[last].push_str(append);
        }
    }

    segments
}

/// Byte index of the character at position `nth`, or the string length.
fn byte_index_of_char(value: &str, nth: usize) -> usize {
    value.char_indices().nth(nth).map_or(value.len(), |(i, _)| i)
}
