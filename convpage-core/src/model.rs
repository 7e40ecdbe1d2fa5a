use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";
pub const ROLE_TOOL: &str = "tool";
pub const ROLE_SYSTEM: &str = "system";

pub const RECIPIENT_ALL: &str = "all";
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Missing and explicit `null` both fall back to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub type ConversationArchive = Vec<Conversation>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mapping: HashMap<String, MessageNode>,
    #[serde(default)]
    pub current_node: Option<String>,
}

impl Conversation {
    /// Label used in errors and logs.
    pub fn label(&self) -> String {
        self.title
            .as_deref()
            .or(self.conversation_id.as_deref())
            .unwrap_or("untitled")
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: Author,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Content,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(default)]
    pub create_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    /// Kept untyped; see [`ContentReference::from_value`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_references: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_user_system_message: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_token_size: Option<u64>,
}

impl Attachment {
    pub fn is_pdf(&self) -> bool {
        self.mime_type.as_deref() == Some(PDF_MIME_TYPE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub matched_text: Option<String>,
    pub start_idx: Option<i64>,
    pub end_idx: Option<i64>,
    pub items: Vec<ReferenceItem>,
    pub video_id: Option<String>,
    pub video_site: Option<String>,
}

impl ContentReference {
    /// Reads one exported reference, dropping fields of the wrong shape.
    /// Returns `None` only when the entry is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(ToString::to_string);

        Some(Self {
            kind: text("type").unwrap_or_default(),
            matched_text: text("matched_text"),
            start_idx: object.get("start_idx").and_then(offset),
            end_idx: object.get("end_idx").and_then(offset),
            items: object
                .get("items")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(ReferenceItem::from_value)
                .collect(),
            video_id: text("video_id"),
            video_site: text("video_site"),
        })
    }
}

/// Integer offsets, or floats with no fractional part.
fn offset(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    let number = value.as_f64()?;
    if number.fract() != 0.0 || number.abs() > 9_007_199_254_740_992.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let whole = number as i64;
    Some(whole)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub attribution: Option<String>,
}

impl ReferenceItem {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(ToString::to_string);

        Some(Self {
            title: text("title"),
            url: text("url"),
            attribution: text("attribution"),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetPointer {
    pub content_type: Option<String>,
    pub asset_pointer: Option<String>,
    pub size_bytes: Option<u64>,
    pub width: Option<u64>,
    pub height: Option<u64>,
}

impl AssetPointer {
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(ToString::to_string);
        let number = |key: &str| value.get(key).and_then(Value::as_u64);

        Self {
            content_type: text("content_type"),
            asset_pointer: text("asset_pointer"),
            size_bytes: number("size_bytes"),
            width: number("width"),
            height: number("height"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePart {
    Text(String),
    Transcript(String),
    Asset(AssetPointer),
}

impl MessagePart {
    pub fn is_asset(&self) -> bool {
        matches!(self, Self::Asset(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayAuthor {
    Assistant,
    CustomUserInfo,
    User(String),
}

impl DisplayAuthor {
    pub fn from_role(role: &str, is_user_system_message: bool) -> Self {
        match role {
            ROLE_ASSISTANT | ROLE_TOOL => Self::Assistant,
            ROLE_SYSTEM if is_user_system_message => Self::CustomUserInfo,
            other => Self::User(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Assistant => "ChatGPT",
            Self::CustomUserInfo => "Custom user info",
            Self::User(role) => role,
        }
    }
}

impl fmt::Display for DisplayAuthor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for DisplayAuthor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMessage {
    pub node_id: String,
    pub author: DisplayAuthor,
    pub parts: Vec<MessagePart>,
    pub create_time: Option<f64>,
    pub attachments: Vec<Attachment>,
    pub content_references: Vec<ContentReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationView {
    pub title: Option<String>,
    pub messages: Vec<DisplayMessage>,
}
