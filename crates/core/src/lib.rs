pub mod article;
pub mod assembler;
pub mod error;
pub mod filters;
pub mod limits;
pub mod markup;
pub mod medium;
pub mod payload;
pub mod pipeline;
pub mod split;
pub mod template;

pub use article::Article;
pub use assembler::{EngineConfig, MessageEngine};
pub use error::{FeedRelayError, Result};
pub use filters::{FilterExpression, LogicalOp, RelationalOp, evaluate, validate_expression};
pub use limits::PlaceholderLimit;
pub use markup::{MarkupOptions, to_markup};
pub use medium::{
    ActionRowTemplate, ButtonTemplate, ComponentTemplateV2, EmbedTemplate, EmbedTimestamp, ForumConfig, ForumTag,
    MediumConfig, MentionKind, MentionTarget, SectionAccessory, WebhookIdentity,
};
pub use payload::{AssembleOutcome, Component, Embed, MessagePayload, V2_COMPONENTS_FLAG};
pub use pipeline::{CustomPlaceholder, TransformStep, apply_pipeline};
pub use split::{SplitConfig, split_content};
pub use template::{ResolveOptions, resolve};
