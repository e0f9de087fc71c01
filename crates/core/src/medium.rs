//! Per-destination medium configuration.
//!
//! A [`MediumConfig`] describes everything a single delivery target wants:
//! templates for content and embeds, component trees of either generation,
//! mention targets, filters, forum metadata, webhook identity, placeholder
//! limits, custom placeholder pipelines, formatter options, and split
//! behavior. Configurations deserialize from camelCase JSON as stored by the
//! control plane and are never mutated by the engine.

use crate::filters::FilterExpression;
use crate::limits::PlaceholderLimit;
use crate::markup::MarkupOptions;
use crate::pipeline::CustomPlaceholder;
use crate::split::SplitConfig;
use serde::{Deserialize, Serialize};

/// Complete configuration for one delivery medium.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediumConfig {
    /// Template for the message body.
    pub content: Option<String>,

    /// Embed templates, rendered onto the final split segment.
    pub embeds: Vec<EmbedTemplate>,

    /// Generation-1 components (button rows).
    pub components: Vec<ActionRowTemplate>,

    /// Generation-2 component trees. When non-empty these take precedence
    /// over `content`, `embeds`, and `components`.
    pub components_v2: Vec<ComponentTemplateV2>,

    /// Users and roles to mention, each optionally gated by a filter.
    pub mentions: Vec<MentionTarget>,

    /// Root filter deciding whether the article is delivered at all.
    pub filters: Option<FilterExpression>,

    /// Forum channel metadata (thread title and tags).
    pub forum: Option<ForumConfig>,

    /// Webhook identity overrides.
    pub webhook: Option<WebhookIdentity>,

    /// Per-placeholder character limits.
    pub placeholder_limits: Vec<PlaceholderLimit>,

    /// Custom placeholder transform pipelines.
    pub custom_placeholders: Vec<CustomPlaceholder>,

    /// HTML-to-markup conversion options.
    pub formatter: MarkupOptions,

    /// Content split behavior. Absent means truncate to the ceiling.
    pub split: Option<SplitConfig>,

    /// Enables `||` fallback chains and `text::` literals in templates.
    pub enable_placeholder_fallback: bool,
}

impl MediumConfig {
    /// True when the medium configures no content-bearing surface, meaning no
    /// deliverable payload could ever be produced from it. Forum metadata and
    /// webhook identity only decorate payloads and do not count.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty)
            && self.embeds.is_empty()
            && self.components.is_empty()
            && self.components_v2.is_empty()
    }
}

/// Embed template. Every string field is itself a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedTemplate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<u32>,
    pub footer: Option<EmbedFooterTemplate>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub author: Option<EmbedAuthorTemplate>,
    pub fields: Vec<EmbedFieldTemplate>,
    #[serde(deserialize_with = "timestamp_or_empty")]
    pub timestamp: Option<EmbedTimestamp>,
}

/// Control-plane configs store "no timestamp" as the empty string; treat it
/// the same as an absent field.
fn timestamp_or_empty<'de, D>(deserializer: D) -> Result<Option<EmbedTimestamp>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some("now") => Ok(Some(EmbedTimestamp::Now)),
        Some("article") => Ok(Some(EmbedTimestamp::Article)),
        Some(other) => Err(serde::de::Error::unknown_variant(other, &["now", "article", ""])),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedFooterTemplate {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedAuthorTemplate {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedFieldTemplate {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Source of an embed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedTimestamp {
    /// The instant the payload is assembled.
    Now,
    /// The article's published date. Omitted when it cannot be parsed.
    Article,
}

/// A generation-1 row of buttons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionRowTemplate {
    pub buttons: Vec<ButtonTemplate>,
}

/// Button template shared by both component generations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonTemplate {
    /// Discord button style. Style 5 is a link button and requires `url`.
    pub style: u8,
    pub label: String,
    pub url: Option<String>,
    pub emoji: Option<String>,
}

/// Generation-2 component tree nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentTemplateV2 {
    Section {
        #[serde(default)]
        text: Vec<String>,
        #[serde(default)]
        accessory: Option<SectionAccessory>,
    },
    Container {
        #[serde(default)]
        components: Vec<ComponentTemplateV2>,
        #[serde(default)]
        color: Option<u32>,
    },
    Separator {
        #[serde(default)]
        divider: bool,
    },
    MediaGallery {
        #[serde(default)]
        items: Vec<MediaGalleryItemTemplate>,
    },
    ActionRow {
        #[serde(default)]
        buttons: Vec<ButtonTemplate>,
    },
}

/// Accessory attached to a V2 section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionAccessory {
    Thumbnail { url: String },
    Button(ButtonTemplate),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaGalleryItemTemplate {
    pub url: String,
    pub description: Option<String>,
}

/// A user or role to mention when the article (and the target's own filter)
/// passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionTarget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MentionKind,
    #[serde(default)]
    pub filters: Option<FilterExpression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    User,
    Role,
}

/// Forum channel metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForumConfig {
    /// Thread title template. Defaults to `{{title}}` when absent.
    pub thread_title: Option<String>,
    pub tags: Vec<ForumTag>,
}

/// A forum tag, applied when its filter (if any) passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumTag {
    pub id: String,
    #[serde(default)]
    pub filters: Option<FilterExpression>,
}

/// Webhook username/avatar overrides. Both fields are templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookIdentity {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}
