pub mod config;
pub mod error;
pub mod linearize;
pub mod markup;
pub mod model;
pub mod render;
pub mod resolver;
pub mod service;
pub mod timeline;

pub use config::Config;
pub use error::{ConvpageError, Result};
pub use linearize::linearize;
pub use markup::{EmojiPreset, MarkupOptions, MarkupRenderer};
pub use model::{
    Attachment, ContentReference, Conversation, ConversationArchive, ConversationView,
    DisplayAuthor, DisplayMessage, MessagePart,
};
pub use render::{HtmlRenderer, format_timestamp};
pub use resolver::{AssetMap, AssetResolver, NoAssets};
pub use service::{
    archive_to_raw_json, linearize_archive, load_archive, load_archive_value, parse_archive,
    render_archive_html, render_first_ids, split_archive_by_date,
};
