//! Outgoing message payload shapes.
//!
//! These types serialize to the JSON body a Discord-compatible endpoint
//! expects: snake_case keys, absent optionals omitted, and numeric component
//! `type` discriminators.

use serde::Serialize;

/// Message flag marking a payload as using generation-2 components.
pub const V2_COMPONENTS_FLAG: u64 = 1 << 15;

/// Component type discriminators.
pub const TYPE_ACTION_ROW: u8 = 1;
pub const TYPE_BUTTON: u8 = 2;
pub const TYPE_SECTION: u8 = 9;
pub const TYPE_TEXT_DISPLAY: u8 = 10;
pub const TYPE_THUMBNAIL: u8 = 11;
pub const TYPE_MEDIA_GALLERY: u8 = 12;
pub const TYPE_SEPARATOR: u8 = 14;
pub const TYPE_CONTAINER: u8 = 17;

/// Result of assembling one article against one medium.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembleOutcome {
    /// Payloads to deliver, in order.
    Delivered(Vec<MessagePayload>),
    /// The article was rejected by the medium's root filter.
    Filtered,
}

impl AssembleOutcome {
    /// Unwraps the delivered payloads, or an empty slice when filtered.
    pub fn payloads(&self) -> &[MessagePayload] {
        match self {
            Self::Delivered(payloads) => payloads,
            Self::Filtered => &[],
        }
    }
}

/// One outgoing message body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied_tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl MessagePayload {
    /// True when the payload carries nothing deliverable.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty)
            && self.embeds.is_empty()
            && self.components.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    /// Whether the embed has any visible content worth sending.
    pub fn has_content(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.url.is_some()
            || self.image.is_some()
            || self.thumbnail.is_some()
            || !self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A rendered component node of either generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Component {
    ActionRow(ActionRow),
    Button(Box<Button>),
    Section(Section),
    TextDisplay(TextDisplay),
    Thumbnail(Thumbnail),
    MediaGallery(MediaGallery),
    Separator(Separator),
    Container(Container),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Component>,
}

impl ActionRow {
    pub fn new(components: Vec<Component>) -> Self {
        Self { kind: TYPE_ACTION_ROW, components }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<ButtonEmoji>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonEmoji {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessory: Option<Box<Component>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextDisplay {
    #[serde(rename = "type")]
    pub kind: u8,
    pub content: String,
}

impl TextDisplay {
    pub fn new(content: String) -> Self {
        Self { kind: TYPE_TEXT_DISPLAY, content }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    #[serde(rename = "type")]
    pub kind: u8,
    pub media: MediaItem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaGallery {
    #[serde(rename = "type")]
    pub kind: u8,
    pub items: Vec<MediaGalleryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaGalleryItem {
    pub media: MediaItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Separator {
    #[serde(rename = "type")]
    pub kind: u8,
    pub divider: bool,
}

impl Separator {
    pub fn new(divider: bool) -> Self {
        Self { kind: TYPE_SEPARATOR, divider }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_optionals_are_omitted() {
        let payload = MessagePayload { content: Some("hi".to_string()), ..Default::default() };
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json, serde_json::json!({ "content": "hi" }));
    }

    #[test]
    fn test_component_type_is_numeric() {
        let row = Component::ActionRow(ActionRow::new(vec![Component::Button(Box::new(Button {
            kind: TYPE_BUTTON,
            style: 5,
            label: "Read".to_string(),
            url: Some("https://example.com".to_string()),
            custom_id: None,
            emoji: None,
        }))]));

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["components"][0]["type"], 2);
        assert!(json["components"][0].get("custom_id").is_none());
    }

    #[test]
    fn test_v2_flag_value() {
        assert_eq!(V2_COMPONENTS_FLAG, 32768);
    }

    #[test]
    fn test_embed_with_only_footer_has_no_content() {
        let embed = Embed {
            footer: Some(EmbedFooter { text: "f".to_string(), icon_url: None }),
            ..Default::default()
        };
        assert!(!embed.has_content());

        let embed = Embed { title: Some("t".to_string()), ..Default::default() };
        assert!(embed.has_content());
    }

    #[test]
    fn test_payload_emptiness() {
        assert!(MessagePayload::default().is_empty());
        assert!(MessagePayload { content: Some(String::new()), ..Default::default() }.is_empty());

        let with_embed = MessagePayload {
            embeds: vec![Embed { title: Some("t".to_string()), ..Default::default() }],
            ..Default::default()
        };
        assert!(!with_embed.is_empty());
    }
}
