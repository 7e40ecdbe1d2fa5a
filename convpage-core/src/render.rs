use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::linearize::linearize;
use crate::markup::MarkupRenderer;
use crate::model::{
    AssetPointer, Attachment, Conversation, DisplayAuthor, DisplayMessage, MessagePart,
};
use crate::resolver::AssetResolver;

const DELETED_PLACEHOLDER: &str = "-Deleted-";
const TRANSCRIPT_PREFIX: &str = "[Transcript]: ";
const FILE_PREFIX: &str = "[File]: ";
const UNTITLED: &str = "Untitled";
const DEFAULT_DOCUMENT_TITLE: &str = "Conversations";
const DEFAULT_ASSET_WIDTH: u64 = 709;
const DEFAULT_ASSET_HEIGHT: u64 = 1536;

const STYLESHEET: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#fff;color:#0d0d0d}\
#root{max-width:48rem;margin:0 auto;padding:1rem}\
.message{padding:1.25rem 1.5rem;display:flex;flex-direction:column}\
.message.user{align-items:flex-end}\
.message.user .bubble{background:#f4f4f4;border-radius:1.5rem;padding:.625rem 1.25rem;max-width:70%}\
.message.custom .author{font-weight:600;margin-bottom:.25rem}\
.table-wrapper{overflow-x:auto}\
table{border-collapse:collapse}th,td{border:1px solid #ddd;padding:.25rem .5rem}\
blockquote{border-left:3px solid #ccc;margin:0;padding-left:1rem}\
.image-group{display:flex;gap:.25rem;flex-wrap:wrap;justify-content:flex-end}\
.thumbnail{max-width:100%;border-radius:.5rem}\
.timestamp{font-size:.75rem;color:#8e8e8e;margin-top:.25rem}\
.timestamp-left{align-self:flex-start}.timestamp-right{align-self:flex-end}";

/// Builds the visible HTML timeline from linearized conversations.
pub struct HtmlRenderer<'a> {
    markup: MarkupRenderer,
    resolver: &'a dyn AssetResolver,
    now: DateTime<Utc>,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(markup: MarkupRenderer, resolver: &'a dyn AssetResolver) -> Self {
        Self {
            markup,
            resolver,
            now: Utc::now(),
        }
    }

    /// Reference time for "Today, HH:MM" timestamps.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn render_document(&self, archive: &[Conversation]) -> Result<String> {
        let body = self.render_archive(archive)?;
        let title = archive
            .first()
            .and_then(|conversation| conversation.title.as_deref())
            .unwrap_or(DEFAULT_DOCUMENT_TITLE);

        let mut output = String::new();
        output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        output.push_str("<meta charset=\"utf-8\">\n");
        output.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        output.push_str(&format!("<title>{title}</title>\n"));
        output.push_str(&format!("<style>{STYLESHEET}</style>\n"));
        output.push_str("</head>\n<body>\n<div id=\"root\">\n");
        output.push_str(&body);
        output.push_str("</div>\n</body>\n</html>\n");
        Ok(output)
    }

    pub fn render_archive(&self, archive: &[Conversation]) -> Result<String> {
        let mut output = String::new();
        for conversation in archive {
            output.push_str(&self.render_conversation(conversation)?);
        }
        tracing::info!(conversations = archive.len(), "rendered archive");
        Ok(output)
    }

    pub fn render_conversation(&self, conversation: &Conversation) -> Result<String> {
        let messages = linearize(conversation)?;
        tracing::debug!(
            conversation = %conversation.label(),
            messages = messages.len(),
            "linearized conversation"
        );

        let title = conversation.title.as_deref().unwrap_or(UNTITLED);
        let mut output = format!("<div class=\"conversation\"><h4>{title}</h4>\n");
        for (idx, message) in messages.iter().enumerate() {
            output.push_str(&self.render_message(idx + 1, message));
            output.push('\n');
        }
        output.push_str("</div>\n");
        Ok(output)
    }

    fn render_message(&self, section: usize, message: &DisplayMessage) -> String {
        let class = match message.author {
            DisplayAuthor::Assistant => "chatgpt",
            DisplayAuthor::CustomUserInfo => "custom user info",
            DisplayAuthor::User(_) => "user",
        };

        let mut output =
            format!("<div class=\"message {class}\" data-section=\"message-{section}\">");
        match message.author {
            DisplayAuthor::Assistant => self.push_assistant_parts(&mut output, message),
            DisplayAuthor::CustomUserInfo => {
                output.push_str(&format!("<div class=\"author\">{}</div>", message.author));
                self.push_plain_parts(&mut output, message);
            }
            DisplayAuthor::User(_) => self.push_user_parts(&mut output, message),
        }

        if !message.attachments.is_empty() {
            output.push_str(&self.render_attachments(&message.attachments));
        }

        if let Some(formatted) = message
            .create_time
            .and_then(|seconds| format_timestamp(seconds, self.now))
        {
            let side = if message.author == DisplayAuthor::Assistant {
                "timestamp-left"
            } else {
                "timestamp-right"
            };
            output.push_str(&format!(
                "<div class=\"timestamp {side}\">{formatted}</div>"
            ));
        }

        output.push_str("</div>");
        output
    }

    fn push_assistant_parts(&self, output: &mut String, message: &DisplayMessage) {
        for part in visible_parts(message) {
            let html = self.render_part(part, message);
            output.push_str(&format!(
                "<div class=\"bubble\"><div class=\"bubble-content-chatgpt\"><div class=\"chatgpt-text-wrapper\">{html}</div></div></div>"
            ));
        }
    }

    fn push_plain_parts(&self, output: &mut String, message: &DisplayMessage) {
        for part in visible_parts(message) {
            let html = self.render_part(part, message);
            output.push_str(&format!("<div class=\"bubble\">{html}</div>"));
        }
    }

    fn push_user_parts(&self, output: &mut String, message: &DisplayMessage) {
        let asset_count = message.parts.iter().filter(|part| part.is_asset()).count();
        let mut thumbnails = Vec::new();
        let mut group_slot = None;

        for part in visible_parts(message) {
            let MessagePart::Asset(asset) = part else {
                let html = self.render_part(part, message);
                output.push_str(&format!("<div class=\"bubble\">{html}</div>"));
                continue;
            };

            let Some(link) = self.resolve_asset(asset) else {
                output.push_str(&format!("<div>{FILE_PREFIX}{DELETED_PLACEHOLDER}</div>"));
                continue;
            };

            if asset_count == 1 {
                output.push_str(&single_image(asset, &link));
            } else {
                if group_slot.is_none() {
                    group_slot = Some(output.len());
                }
                thumbnails.push(thumbnail(&link));
            }
        }

        if let Some(slot) = group_slot {
            let group = format!(
                "<div class=\"image-group\">{}</div>",
                thumbnails.concat()
            );
            output.insert_str(slot, &group);
        }
    }

    fn render_part(&self, part: &MessagePart, message: &DisplayMessage) -> String {
        match part {
            MessagePart::Text(text) => self.markup.render_text(text, &message.content_references),
            MessagePart::Transcript(text) => {
                format!("{TRANSCRIPT_PREFIX}{}", self.markup.render_transcript(text))
            }
            MessagePart::Asset(asset) => match self.resolve_asset(asset) {
                Some(link) => format!("{FILE_PREFIX}<a href=\"{link}\">{link}</a>"),
                None => format!("{FILE_PREFIX}{DELETED_PLACEHOLDER}"),
            },
        }
    }

    fn resolve_asset(&self, asset: &AssetPointer) -> Option<String> {
        let pointer = asset.asset_pointer.as_deref()?;
        let link = self.resolver.resolve_asset(pointer);
        if link.is_none() {
            tracing::debug!(pointer = %pointer, "asset pointer not resolved");
        }
        link
    }

    fn render_attachments(&self, attachments: &[Attachment]) -> String {
        let mut output = String::from("<div class=\"attachments-container\">");
        for attachment in attachments {
            let name = attachment.name.as_deref().unwrap_or(&attachment.id);
            let link = match self.resolver.resolve_attachment(&attachment.id) {
                Some(url) => format!("<a href=\"{url}\" target=\"_blank\">{name}</a>"),
                None => {
                    tracing::debug!(attachment_id = %attachment.id, "attachment not resolved");
                    format!("<span class=\"attachment-missing\">{DELETED_PLACEHOLDER}</span>")
                }
            };
            output.push_str(&format!(
                "<div class=\"attachment-item\"><div class=\"attachment-pdf\"><div class=\"attachment-name truncate font-semibold\">{name}</div><div class=\"truncate text-token-text-secondary\">PDF</div>{link}</div></div>"
            ));
        }
        output.push_str("</div>");
        output
    }
}

/// Parts that produce output; empty transcripts are dropped.
fn visible_parts(message: &DisplayMessage) -> impl Iterator<Item = &MessagePart> {
    message
        .parts
        .iter()
        .filter(|part| !matches!(part, MessagePart::Transcript(text) if text.is_empty()))
}

fn single_image(asset: &AssetPointer, link: &str) -> String {
    let width = asset.width.unwrap_or(DEFAULT_ASSET_WIDTH);
    let height = asset.height.unwrap_or(DEFAULT_ASSET_HEIGHT);
    let orientation = if width > height {
        "landscape max-w-96 max-h-64"
    } else {
        "portrait max-w-64 max-h-96"
    };

    format!(
        "<div class=\"image-single {orientation}\"><div class=\"image-container\"><img class=\"thumbnail\" src=\"{link}\" alt=\"Uploaded image\"></div></div>"
    )
}

fn thumbnail(link: &str) -> String {
    format!(
        "<div class=\"image-container\"><img class=\"thumbnail h-16 w-16\" src=\"{link}\" alt=\"Uploaded image\"></div>"
    )
}

/// `Today, HH:MM` on the same UTC day as `now`, otherwise `Mon D, YYYY, HH:MM`.
pub fn format_timestamp(seconds: f64, now: DateTime<Utc>) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    let millis = (seconds * 1000.0).round() as i64;
    let time = DateTime::<Utc>::from_timestamp_millis(millis)?;

    if time.date_naive() == now.date_naive() {
        Some(format!("Today, {}", time.format("%H:%M")))
    } else {
        Some(time.format("%b %-d, %Y, %H:%M").to_string())
    }
}
