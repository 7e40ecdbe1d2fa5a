use std::collections::HashSet;

use serde_json::Value;

use crate::error::{ConvpageError, Result};
use crate::model::{
    AssetPointer, Attachment, ContentReference, Conversation, DisplayAuthor, DisplayMessage,
    Message, MessageNode, MessagePart, RECIPIENT_ALL, ROLE_SYSTEM,
};

const DISPLAYABLE_CONTENT_TYPES: &[&str] = &["text", "multimodal_text"];
const ASSET_PART_TYPES: &[&str] = &[
    "audio_asset_pointer",
    "image_asset_pointer",
    "video_container_asset_pointer",
];
const TRANSCRIPT_PART_TYPE: &str = "audio_transcription";
const REAL_TIME_PART_TYPE: &str = "real_time_user_audio_video_asset_pointer";

/// Walks `current_node` back to the root and returns the displayable
/// messages in chronological (root-to-leaf) order.
pub fn linearize(conversation: &Conversation) -> Result<Vec<DisplayMessage>> {
    let mut messages = Vec::new();
    let mut visited = HashSet::new();
    let mut current = conversation.current_node.clone();

    while let Some(node_id) = current {
        let node =
            conversation
                .mapping
                .get(&node_id)
                .ok_or_else(|| ConvpageError::NodeNotFound {
                    conversation: conversation.label(),
                    node_id: node_id.clone(),
                })?;

        if !visited.insert(node_id.clone()) {
            return Err(ConvpageError::CyclicGraph {
                conversation: conversation.label(),
                limit: conversation.mapping.len(),
            });
        }

        match display_message(&node_id, node) {
            Some(message) => messages.push(message),
            None => tracing::trace!(node_id = %node_id, "skipping non-displayable node"),
        }

        current = node.parent.clone();
    }

    messages.reverse();
    Ok(messages)
}

fn display_message(node_id: &str, node: &MessageNode) -> Option<DisplayMessage> {
    let message = node.message.as_ref()?;
    if !is_eligible(message) {
        return None;
    }

    let attachments = pdf_attachments(message);
    let content_type = message.content.content_type.as_str();
    if !DISPLAYABLE_CONTENT_TYPES.contains(&content_type) && attachments.is_empty() {
        return None;
    }

    let parts = message
        .content
        .parts
        .iter()
        .flat_map(extract_parts)
        .collect::<Vec<_>>();
    if parts.is_empty() && attachments.is_empty() {
        return None;
    }

    Some(DisplayMessage {
        node_id: node_id.to_string(),
        author: DisplayAuthor::from_role(
            &message.author.role,
            message.metadata.is_user_system_message,
        ),
        parts,
        create_time: message.create_time,
        attachments,
        content_references: message
            .metadata
            .content_references
            .iter()
            .filter_map(ContentReference::from_value)
            .collect(),
    })
}

fn is_eligible(message: &Message) -> bool {
    if message.content.parts.is_empty() {
        return false;
    }

    if message.author.role == ROLE_SYSTEM && !message.metadata.is_user_system_message {
        return false;
    }

    message.recipient.as_deref() == Some(RECIPIENT_ALL)
}

fn pdf_attachments(message: &Message) -> Vec<Attachment> {
    message
        .metadata
        .attachments
        .iter()
        .filter(|attachment| attachment.is_pdf())
        .cloned()
        .collect()
}

fn extract_parts(part: &Value) -> Vec<MessagePart> {
    if let Some(text) = part.as_str() {
        if text.is_empty() {
            return Vec::new();
        }
        return vec![MessagePart::Text(text.to_string())];
    }

    let Some(content_type) = part.get("content_type").and_then(Value::as_str) else {
        return Vec::new();
    };

    if content_type == TRANSCRIPT_PART_TYPE {
        let text = part
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return vec![MessagePart::Transcript(text)];
    }

    if ASSET_PART_TYPES.contains(&content_type) {
        return vec![MessagePart::Asset(AssetPointer::from_value(part))];
    }

    if content_type == REAL_TIME_PART_TYPE {
        return real_time_assets(part);
    }

    Vec::new()
}

fn real_time_assets(part: &Value) -> Vec<MessagePart> {
    let mut assets = Vec::new();

    for key in ["audio_asset_pointer", "video_container_asset_pointer"] {
        if let Some(pointer) = part.get(key).filter(|value| is_present(value)) {
            assets.push(MessagePart::Asset(AssetPointer::from_value(pointer)));
        }
    }

    for frame in part
        .get("frames_asset_pointers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        assets.push(MessagePart::Asset(AssetPointer::from_value(frame)));
    }

    assets
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}
