//! Message assembly.
//!
//! [`MessageEngine::assemble`] is the orchestration entry point: it gates the
//! article on the medium's root filter, formats every article field from HTML
//! to chat markup, runs custom placeholder pipelines, resolves the mention
//! token, then renders content, embeds, components, webhook identity, and
//! forum metadata into ready-to-send payloads.
//!
//! Assembly is a pure computation over its inputs. The engine holds only
//! tunables and is safe to share across threads.

use crate::article::Article;
use crate::error::{FeedRelayError, Result};
use crate::filters;
use crate::markup;
use crate::medium::{
    ActionRowTemplate, ButtonTemplate, ComponentTemplateV2, EmbedTemplate, EmbedTimestamp, MediumConfig, MentionKind,
    SectionAccessory,
};
use crate::payload::{
    ActionRow, AssembleOutcome, Button, ButtonEmoji, Component, Container, Embed, EmbedAuthor, EmbedField, EmbedFooter,
    EmbedMedia, MediaGallery, MediaGalleryItem, MediaItem, MessagePayload, Section, Separator, TextDisplay, Thumbnail,
    TYPE_BUTTON, TYPE_CONTAINER, TYPE_MEDIA_GALLERY, TYPE_SECTION, TYPE_THUMBNAIL, V2_COMPONENTS_FLAG,
};
use crate::pipeline;
use crate::split;
use crate::template::{self, ResolveOptions};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

const EMBED_TITLE_MAX: usize = 256;
const EMBED_DESCRIPTION_MAX: usize = 4096;
const EMBED_FOOTER_MAX: usize = 2048;
const EMBED_AUTHOR_MAX: usize = 256;
const EMBED_FIELD_NAME_MAX: usize = 256;
const EMBED_FIELD_VALUE_MAX: usize = 1024;
const BUTTON_LABEL_MAX: usize = 80;
const WEBHOOK_USERNAME_MAX: usize = 256;
const THREAD_TITLE_MAX: usize = 100;

const DEFAULT_THREAD_TITLE: &str = "{{title}}";
const EMPTY_THREAD_TITLE: &str = "New Article";

/// Link button style; the only style that carries a URL instead of a
/// custom_id.
const BUTTON_STYLE_LINK: u8 = 5;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Platform ceiling for message content, also substituted for
    /// placeholder limits with a character count of zero.
    pub max_content_length: usize,

    /// Maximum number of embeds attached to a payload.
    pub max_embeds: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_content_length: 2000, max_embeds: 10 }
    }
}

/// Turns articles plus medium configurations into deliverable payloads.
#[derive(Debug, Clone, Default)]
pub struct MessageEngine {
    config: EngineConfig,
}

impl MessageEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Assembles `article` against `medium`.
    ///
    /// Returns [`AssembleOutcome::Filtered`] when the medium's root filter
    /// rejects the article, and [`FeedRelayError::EmptyMediumConfig`] when
    /// the medium configures nothing that could produce a payload.
    pub fn assemble(&self, article: &Article, medium: &MediumConfig) -> Result<AssembleOutcome> {
        if medium.is_empty() {
            return Err(FeedRelayError::EmptyMediumConfig);
        }

        if let Some(filter) = &medium.filters
            && !filters::evaluate(filter, article)
        {
            return Ok(AssembleOutcome::Filtered);
        }

        let fields = self.build_fields(article, medium);
        let options = ResolveOptions {
            enable_fallback: medium.enable_placeholder_fallback,
            limits: &medium.placeholder_limits,
            platform_max: self.config.max_content_length,
        };
        let ctx = RenderContext { fields: &fields, options };

        let mut payloads = if medium.components_v2.is_empty() {
            self.assemble_split_payloads(medium, &ctx, article)
        } else {
            vec![assemble_v2_payload(&medium.components_v2, &ctx)]
        };

        apply_webhook_identity(&mut payloads, medium, &ctx);
        apply_forum_metadata(&mut payloads, medium, &ctx, article);

        payloads.retain(|p| !p.is_empty());
        Ok(AssembleOutcome::Delivered(payloads))
    }

    /// Builds the resolution field map: every article field converted from
    /// HTML to markup (the raw value stays reachable under a `raw::` key),
    /// plus `custom::` pipeline results and the `discord::mentions` token.
    fn build_fields(&self, article: &Article, medium: &MediumConfig) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();

        for (key, value) in &article.fields {
            fields.insert(format!("raw::{key}"), value.clone());
            fields.insert(key.clone(), markup::to_markup(value, &medium.formatter));
        }

        for placeholder in &medium.custom_placeholders {
            let source = fields.get(&placeholder.source_placeholder).cloned().unwrap_or_default();
            let value = if source.is_empty() {
                String::new()
            } else {
                pipeline::apply_pipeline(&source, &placeholder.steps, article.locale.as_deref())
            };
            fields.insert(format!("custom::{}", placeholder.reference_name), value);
        }

        let mentions: Vec<String> = medium
            .mentions
            .iter()
            .filter(|target| target.filters.as_ref().is_none_or(|f| filters::evaluate(f, article)))
            .map(|target| match target.kind {
                MentionKind::User => format!("<@{}>", target.id),
                MentionKind::Role => format!("<@&{}>", target.id),
            })
            .collect();

        if !mentions.is_empty() {
            fields.insert("discord::mentions".to_string(), mentions.join(" "));
        }

        fields
    }

    /// Renders content, splits it, and decorates the resulting payloads with
    /// embeds and generation-1 components (both on the final segment).
    fn assemble_split_payloads(
        &self,
        medium: &MediumConfig,
        ctx: &RenderContext,
        article: &Article,
    ) -> Vec<MessagePayload> {
        let content = medium.content.as_deref().map(|t| ctx.resolve(t)).unwrap_or_default();

        let segments = match &medium.split {
            Some(config) => split::split_content(&content, config, self.config.max_content_length),
            None => vec![truncate_chars(&content, self.config.max_content_length)],
        };

        let mut payloads: Vec<MessagePayload> = segments
            .into_iter()
            .map(|segment| MessagePayload {
                content: if segment.is_empty() { None } else { Some(segment) },
                ..Default::default()
            })
            .collect();

        let embeds = self.render_embeds(&medium.embeds, ctx, article);
        let components = render_action_rows(&medium.components, ctx);

        // Embeds and buttons follow the end of the article text.
        if let Some(last) = payloads.last_mut() {
            last.embeds = embeds;
            last.components = components;
        }

        payloads
    }

    fn render_embeds(&self, templates: &[EmbedTemplate], ctx: &RenderContext, article: &Article) -> Vec<Embed> {
        templates
            .iter()
            .filter_map(|template| render_embed(template, ctx, article))
            .take(self.config.max_embeds)
            .collect()
    }
}

/// Shared per-assembly resolution state.
struct RenderContext<'a> {
    fields: &'a BTreeMap<String, String>,
    options: ResolveOptions<'a>,
}

impl RenderContext<'_> {
    fn resolve(&self, template: &str) -> String {
        template::resolve(template, self.fields, &self.options)
    }

    /// Resolves a template destined for a URL slot: whitespace is escaped so
    /// the value survives as a single URL. Empty resolutions yield `None`.
    fn resolve_url(&self, template: &str) -> Option<String> {
        non_empty(escape_url_whitespace(&self.resolve(template)))
    }

    fn resolve_capped(&self, template: &str, cap: usize) -> String {
        truncate_chars(&self.resolve(template), cap)
    }
}

fn render_embed(template: &EmbedTemplate, ctx: &RenderContext, article: &Article) -> Option<Embed> {
    let embed = Embed {
        title: template.title.as_deref().map(|t| ctx.resolve_capped(t, EMBED_TITLE_MAX)).and_then(non_empty),
        description: template
            .description
            .as_deref()
            .map(|t| ctx.resolve_capped(t, EMBED_DESCRIPTION_MAX))
            .and_then(non_empty),
        url: template.url.as_deref().and_then(|t| ctx.resolve_url(t)),
        color: template.color,
        footer: template.footer.as_ref().and_then(|footer| {
            non_empty(ctx.resolve_capped(&footer.text, EMBED_FOOTER_MAX)).map(|text| EmbedFooter {
                text,
                icon_url: footer.icon_url.as_deref().and_then(|t| ctx.resolve_url(t)),
            })
        }),
        image: template.image.as_deref().and_then(|t| ctx.resolve_url(t)).map(|url| EmbedMedia { url }),
        thumbnail: template.thumbnail.as_deref().and_then(|t| ctx.resolve_url(t)).map(|url| EmbedMedia { url }),
        author: template.author.as_ref().and_then(|author| {
            non_empty(ctx.resolve_capped(&author.name, EMBED_AUTHOR_MAX)).map(|name| EmbedAuthor {
                name,
                url: author.url.as_deref().and_then(|t| ctx.resolve_url(t)),
                icon_url: author.icon_url.as_deref().and_then(|t| ctx.resolve_url(t)),
            })
        }),
        fields: template
            .fields
            .iter()
            .filter_map(|field| {
                let name = non_empty(ctx.resolve_capped(&field.name, EMBED_FIELD_NAME_MAX))?;
                let value = non_empty(ctx.resolve_capped(&field.value, EMBED_FIELD_VALUE_MAX))?;
                Some(EmbedField { name, value, inline: field.inline })
            })
            .collect(),
        timestamp: template.timestamp.and_then(|source| match source {
            EmbedTimestamp::Now => Some(Utc::now().to_rfc3339()),
            EmbedTimestamp::Article => {
                article.published_date.as_deref().and_then(pipeline::parse_timestamp).map(|dt| dt.to_rfc3339())
            }
        }),
    };

    embed.has_content().then_some(embed)
}

fn render_action_rows(templates: &[ActionRowTemplate], ctx: &RenderContext) -> Vec<Component> {
    templates
        .iter()
        .filter(|row| !row.buttons.is_empty())
        .map(|row| {
            Component::ActionRow(ActionRow::new(
                row.buttons.iter().map(|button| Component::Button(Box::new(render_button(button, ctx)))).collect(),
            ))
        })
        .collect()
}

fn render_button(template: &ButtonTemplate, ctx: &RenderContext) -> Button {
    let url = template.url.as_deref().and_then(|t| ctx.resolve_url(t));
    let is_link = template.style == BUTTON_STYLE_LINK && url.is_some();

    Button {
        kind: TYPE_BUTTON,
        style: template.style,
        label: ctx.resolve_capped(&template.label, BUTTON_LABEL_MAX),
        url,
        custom_id: if is_link { None } else { Some(Uuid::new_v4().to_string()) },
        emoji: template.emoji.as_ref().map(|name| ButtonEmoji { name: name.clone() }),
    }
}

/// Generation-2 components always produce exactly one payload, flagged and
/// without plain content.
fn assemble_v2_payload(templates: &[ComponentTemplateV2], ctx: &RenderContext) -> MessagePayload {
    MessagePayload {
        components: templates.iter().filter_map(|t| render_v2_component(t, ctx)).collect(),
        flags: Some(V2_COMPONENTS_FLAG),
        ..Default::default()
    }
}

fn render_v2_component(template: &ComponentTemplateV2, ctx: &RenderContext) -> Option<Component> {
    match template {
        ComponentTemplateV2::Section { text, accessory } => Some(Component::Section(Section {
            kind: TYPE_SECTION,
            components: text.iter().map(|t| Component::TextDisplay(TextDisplay::new(ctx.resolve(t)))).collect(),
            accessory: accessory.as_ref().and_then(|acc| render_accessory(acc, ctx)).map(Box::new),
        })),
        ComponentTemplateV2::Container { components, color } => Some(Component::Container(Container {
            kind: TYPE_CONTAINER,
            components: components.iter().filter_map(|c| render_v2_component(c, ctx)).collect(),
            accent_color: *color,
        })),
        ComponentTemplateV2::Separator { divider } => Some(Component::Separator(Separator::new(*divider))),
        ComponentTemplateV2::MediaGallery { items } => {
            let items: Vec<MediaGalleryItem> = items
                .iter()
                .filter_map(|item| {
                    let url = ctx.resolve_url(&item.url)?;
                    Some(MediaGalleryItem {
                        media: MediaItem { url },
                        description: item.description.as_deref().map(|t| ctx.resolve(t)).and_then(non_empty),
                    })
                })
                .collect();

            // A gallery whose items all resolved empty is omitted entirely.
            (!items.is_empty()).then(|| Component::MediaGallery(MediaGallery { kind: TYPE_MEDIA_GALLERY, items }))
        }
        ComponentTemplateV2::ActionRow { buttons } => Some(Component::ActionRow(ActionRow::new(
            buttons.iter().map(|button| Component::Button(Box::new(render_button(button, ctx)))).collect(),
        ))),
    }
}

fn render_accessory(accessory: &SectionAccessory, ctx: &RenderContext) -> Option<Component> {
    match accessory {
        SectionAccessory::Thumbnail { url } => ctx
            .resolve_url(url)
            .map(|url| Component::Thumbnail(Thumbnail { kind: TYPE_THUMBNAIL, media: MediaItem { url } })),
        SectionAccessory::Button(button) => Some(Component::Button(Box::new(render_button(button, ctx)))),
    }
}

fn apply_webhook_identity(payloads: &mut [MessagePayload], medium: &MediumConfig, ctx: &RenderContext) {
    let Some(webhook) = &medium.webhook else {
        return;
    };

    let username =
        webhook.username.as_deref().map(|t| ctx.resolve_capped(t, WEBHOOK_USERNAME_MAX)).and_then(non_empty);
    let avatar_url = webhook.avatar_url.as_deref().and_then(|t| ctx.resolve_url(t));

    for payload in payloads {
        payload.username.clone_from(&username);
        payload.avatar_url.clone_from(&avatar_url);
    }
}

/// Thread name and tags go on the first payload; that message opens the
/// thread and the rest post into it.
fn apply_forum_metadata(payloads: &mut [MessagePayload], medium: &MediumConfig, ctx: &RenderContext, article: &Article) {
    let Some(forum) = &medium.forum else {
        return;
    };

    let Some(first) = payloads.first_mut() else {
        return;
    };

    let template = forum.thread_title.as_deref().unwrap_or(DEFAULT_THREAD_TITLE);
    let title = ctx.resolve_capped(template, THREAD_TITLE_MAX);
    first.thread_name = Some(if title.is_empty() { EMPTY_THREAD_TITLE.to_string() } else { title });

    first.applied_tags = forum
        .tags
        .iter()
        .filter(|tag| tag.filters.as_ref().is_none_or(|f| filters::evaluate(f, article)))
        .map(|tag| tag.id.clone())
        .collect();
}

fn truncate_chars(value: &str, cap: usize) -> String {
    if value.chars().count() <= cap {
        return value.to_string();
    }

    value.chars().take(cap).collect()
}

fn escape_url_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());

    for c in value.chars() {
        if c.is_whitespace() {
            out.push_str("%20");
        } else {
            out.push(c);
        }
    }

    out
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
