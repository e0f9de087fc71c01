//! HTML to Discord-markup conversion.
//!
//! Feed fields frequently carry HTML; before substitution into templates they
//! are converted to the markup Discord renders: `**bold**`, `*italics*`,
//! `__underline__`, masked links, fenced code blocks, `* ` list items. The
//! [`MarkupOptions`] switches control image stripping, table rendering,
//! link-preview suppression for image URLs, and newline handling.
//!
//! Conversion runs on a field's resolved value before placeholder-limit
//! enforcement and before splitting.

mod tables;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};

/// Formatter switches, one per medium.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupOptions {
    /// Remove `<img>` elements entirely instead of emitting their URL.
    #[serde(default)]
    pub strip_images: bool,

    /// Render `<table>` structures as fenced fixed-width text blocks.
    #[serde(default)]
    pub format_tables: bool,

    /// Wrap bare image URLs in angle brackets to suppress link unfurling.
    #[serde(default)]
    pub disable_image_link_previews: bool,

    /// Collapse block boundaries and source newlines to spaces (default).
    /// When false, block elements are separated by explicit newlines.
    #[serde(default = "default_true")]
    pub ignore_new_lines: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            strip_images: false,
            format_tables: false,
            disable_image_link_previews: false,
            ignore_new_lines: true,
        }
    }
}

/// Converts an HTML fragment to Discord markup.
pub fn to_markup(html: &str, options: &MarkupOptions) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(fragment.root_element(), options, &mut out);
    tidy(&out, options)
}

fn render_children(element: ElementRef, options: &MarkupOptions, out: &mut String) {
    for child in element.children() {
        render_node(child, options, out);
    }
}

fn render_node(node: NodeRef<Node>, options: &MarkupOptions, out: &mut String) {
    if let Node::Text(text) = node.value() {
        push_text(out, text, options);
        return;
    }

    let Some(element) = ElementRef::wrap(node) else {
        return;
    };

    match element.value().name() {
        "script" | "style" | "head" | "template" => {}

        "img" => {
            if !options.strip_images {
                push_image(out, element, options);
            }
        }

        "strong" | "b" => push_wrapped(out, element, options, "**"),
        "em" | "i" => push_wrapped(out, element, options, "*"),
        "u" => push_wrapped(out, element, options, "__"),

        "code" => push_wrapped(out, element, options, "`"),

        "pre" => {
            // <pre><code> emits one fence, not a fence around inline code.
            let inner = match single_code_child(element) {
                Some(code) => code.text().collect::<String>().trim().to_string(),
                None => inline_text(element, options),
            };
            if !inner.is_empty() {
                block_break(out, 1, options);
                out.push_str("```");
                out.push_str(&inner);
                out.push_str("```");
                block_break(out, 1, options);
            }
        }

        "a" => push_anchor(out, element, options),

        "br" => {
            if options.ignore_new_lines {
                push_space(out);
            } else {
                out.push('\n');
            }
        }

        "ul" | "ol" => {
            for item in element.children().filter_map(ElementRef::wrap) {
                if item.value().name() != "li" {
                    continue;
                }

                let inner = inline_text(item, options);
                if !inner.is_empty() {
                    block_break(out, 1, options);
                    out.push_str("* ");
                    out.push_str(&inner);
                }
            }
            block_break(out, 1, options);
        }

        "table" => {
            if options.format_tables {
                let rendered = tables::render_table(element);
                if !rendered.is_empty() {
                    block_break(out, 1, options);
                    out.push_str(&rendered);
                    block_break(out, 1, options);
                }
            } else {
                render_children(element, options, out);
            }
        }

        "p" => {
            block_break(out, 2, options);
            render_children(element, options, out);
            block_break(out, 2, options);
        }

        "div" | "blockquote" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "section" | "article" | "tr" => {
            block_break(out, 1, options);
            render_children(element, options, out);
            block_break(out, 1, options);
        }

        _ => render_children(element, options, out),
    }
}

/// The sole `<code>` element child of a `<pre>`, when that is all it holds.
fn single_code_child(element: ElementRef) -> Option<ElementRef> {
    let only_whitespace_text = element.children().all(|c| match c.value() {
        Node::Text(t) => t.trim().is_empty(),
        _ => true,
    });

    let mut elements = element.children().filter_map(ElementRef::wrap);
    let first = elements.next()?;

    if only_whitespace_text && first.value().name() == "code" && elements.next().is_none() {
        Some(first)
    } else {
        None
    }
}

/// Renders an element's children into a fresh buffer, trimmed.
fn inline_text(element: ElementRef, options: &MarkupOptions) -> String {
    let mut buffer = String::new();
    render_children(element, options, &mut buffer);
    buffer.trim().to_string()
}

fn push_text(out: &mut String, text: &str, options: &MarkupOptions) {
    let mut pending_space = false;
    let mut pending_newline = false;

    for c in text.chars() {
        if c == '\n' && !options.ignore_new_lines {
            pending_newline = true;
            pending_space = false;
        } else if c.is_whitespace() {
            if !pending_newline {
                pending_space = true;
            }
        } else {
            if pending_newline {
                out.push('\n');
            } else if pending_space && !out.is_empty() && !out.ends_with(char::is_whitespace) {
                out.push(' ');
            }
            pending_newline = false;
            pending_space = false;
            out.push(c);
        }
    }

    if pending_newline {
        out.push('\n');
    } else if pending_space && !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn push_space(out: &mut String) {
    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn push_wrapped(out: &mut String, element: ElementRef, options: &MarkupOptions, marker: &str) {
    let inner = inline_text(element, options);
    if inner.is_empty() {
        return;
    }

    out.push_str(marker);
    out.push_str(&inner);
    out.push_str(marker);
}

fn push_image(out: &mut String, element: ElementRef, options: &MarkupOptions) {
    let src = element.value().attr("src").unwrap_or("").trim();
    if src.is_empty() {
        return;
    }

    push_space(out);

    if options.disable_image_link_previews {
        out.push('<');
        out.push_str(src);
        out.push('>');
    } else {
        out.push_str(src);
    }
}

fn push_anchor(out: &mut String, element: ElementRef, options: &MarkupOptions) {
    let href = element.value().attr("href").unwrap_or("").trim();
    let inner = inline_text(element, options);

    let wraps_image = element
        .children()
        .filter_map(ElementRef::wrap)
        .any(|child| child.value().name() == "img");

    if href.is_empty() {
        out.push_str(&inner);
    } else if inner == href || wraps_image {
        // A masked link around its own URL (or around an image) renders
        // better as the bare target.
        out.push_str(if inner.is_empty() { href } else { &inner });
    } else if inner.is_empty() {
        out.push_str(href);
    } else {
        out.push('[');
        out.push_str(&inner);
        out.push_str("](");
        out.push_str(href);
        out.push(')');
    }
}

/// Inserts a block boundary: a space under collapsed-newline mode, otherwise
/// up to `newlines` newline characters.
fn block_break(out: &mut String, newlines: usize, options: &MarkupOptions) {
    if out.is_empty() {
        return;
    }

    if options.ignore_new_lines {
        push_space(out);
        return;
    }

    let trailing = out.chars().rev().take_while(|c| *c == '\n').count();
    for _ in trailing..newlines {
        out.push('\n');
    }
}

/// Strips trailing space before newlines, caps blank runs, trims the ends.
fn tidy(raw: &str, options: &MarkupOptions) -> String {
    if options.ignore_new_lines {
        return raw.trim().to_string();
    }

    let mut lines: Vec<&str> = raw.lines().map(str::trim_end).collect();

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut out = String::new();
    let mut blank_run = 0;

    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_start());
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preserve() -> MarkupOptions {
        MarkupOptions { ignore_new_lines: false, ..Default::default() }
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(to_markup("just text", &MarkupOptions::default()), "just text");
    }

    #[test]
    fn test_bold_and_italics() {
        let out = to_markup("<p><strong>bold</strong> and <em>soft</em></p>", &MarkupOptions::default());
        assert_eq!(out, "**bold** and *soft*");
    }

    #[test]
    fn test_underline() {
        assert_eq!(to_markup("<u>under</u>", &MarkupOptions::default()), "__under__");
    }

    #[test]
    fn test_masked_link() {
        let out = to_markup(r#"<a href="https://example.com">click</a>"#, &MarkupOptions::default());
        assert_eq!(out, "[click](https://example.com)");
    }

    #[test]
    fn test_bare_link_when_text_equals_href() {
        let out = to_markup(
            r#"<a href="https://example.com">https://example.com</a>"#,
            &MarkupOptions::default(),
        );
        assert_eq!(out, "https://example.com");
    }

    #[test]
    fn test_anchor_wrapping_image_emits_image_only() {
        let out = to_markup(
            r#"<a href="https://example.com"><img src="https://example.com/x.png"></a>"#,
            &MarkupOptions::default(),
        );
        assert_eq!(out, "https://example.com/x.png");
        assert!(!out.contains("[]("));
    }

    #[test]
    fn test_image_url_emitted() {
        let out = to_markup(r#"<img src="https://example.com/a.png">"#, &MarkupOptions::default());
        assert_eq!(out, "https://example.com/a.png");
    }

    #[test]
    fn test_strip_images_leaves_nothing() {
        let options = MarkupOptions { strip_images: true, ..Default::default() };
        let out = to_markup(r#"<p>before <img src="https://example.com/a.png"> after</p>"#, &options);
        assert_eq!(out, "before after");
    }

    #[test]
    fn test_disable_image_link_previews_wraps_in_angle_brackets() {
        let options = MarkupOptions { disable_image_link_previews: true, ..Default::default() };
        let out = to_markup(r#"<img src="https://example.com/a.png">"#, &options);
        assert_eq!(out, "<https://example.com/a.png>");
    }

    #[test]
    fn test_inline_code_and_block_code() {
        assert_eq!(to_markup("<code>x = 1</code>", &MarkupOptions::default()), "`x = 1`");

        let out = to_markup("<pre><code>let x = 1;</code></pre>", &MarkupOptions::default());
        assert_eq!(out, "```let x = 1;```");
    }

    #[test]
    fn test_list_items_prefixed() {
        let out = to_markup("<ul><li>one</li><li>two</li></ul>", &preserve());
        assert_eq!(out, "* one\n* two");
    }

    #[test]
    fn test_paragraphs_collapse_by_default() {
        let out = to_markup("<p>first</p><p>second</p>", &MarkupOptions::default());
        assert_eq!(out, "first second");
    }

    #[test]
    fn test_paragraphs_separated_when_preserving_newlines() {
        let out = to_markup("<p>first</p><p>second</p>", &preserve());
        assert_eq!(out, "first\n\nsecond");
    }

    #[test]
    fn test_br_behavior() {
        assert_eq!(to_markup("a<br>b", &MarkupOptions::default()), "a b");
        assert_eq!(to_markup("a<br>b", &preserve()), "a\nb");
    }

    #[test]
    fn test_script_and_style_dropped() {
        let out = to_markup("<p>keep</p><script>alert(1)</script><style>p{}</style>", &MarkupOptions::default());
        assert_eq!(out, "keep");
    }

    #[test]
    fn test_table_without_option_flows_as_text() {
        let out = to_markup(
            "<table><tr><th>Name</th></tr><tr><td>value</td></tr></table>",
            &MarkupOptions::default(),
        );
        assert!(!out.contains("```"));
        assert!(out.contains("Name"));
        assert!(out.contains("value"));
    }

    #[test]
    fn test_table_rendered_as_code_fence() {
        let options = MarkupOptions { format_tables: true, ignore_new_lines: false, ..Default::default() };
        let out = to_markup(
            "<table><tr><th>Name</th><th>Count</th></tr><tr><td>alpha</td><td>1</td></tr></table>",
            &options,
        );
        assert!(out.starts_with("```"));
        assert!(out.ends_with("```"));
        // Header cells render uppercase.
        assert!(out.contains("NAME"));
        assert!(out.contains("COUNT"));
        assert!(out.contains("alpha"));
    }

    #[test]
    fn test_whitespace_collapsed() {
        let out = to_markup("<p>a    lot\n   of   space</p>", &MarkupOptions::default());
        assert_eq!(out, "a lot of space");
    }

    #[test]
    fn test_default_options() {
        let options = MarkupOptions::default();
        assert!(options.ignore_new_lines);
        assert!(!options.strip_images);
        assert!(!options.format_tables);
        assert!(!options.disable_image_link_previews);
    }

    #[test]
    fn test_options_deserialization_defaults() {
        let options: MarkupOptions = serde_json::from_str("{}").unwrap();
        assert!(options.ignore_new_lines);

        let options: MarkupOptions =
            serde_json::from_str(r#"{"stripImages":true,"ignoreNewLines":false}"#).unwrap();
        assert!(options.strip_images);
        assert!(!options.ignore_new_lines);
    }
}
