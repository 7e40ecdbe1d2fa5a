use std::fmt;
use std::str::FromStr;

use crate::error::{ConvpageError, Result};
use crate::model::ContentReference;

pub mod blocks;
pub mod entities;
pub mod inline;
pub mod references;
pub mod table;

pub use blocks::render_blocks;
pub use entities::decode_entities;
pub use inline::format_inline;
pub use references::apply_references;
pub use table::convert_tables;

pub const DEFAULT_MAX_LIST_DEPTH: usize = 16;

const STANDARD_EMOJI: &[char] = &[
    '\u{1F4A1}', // bulb
    '\u{1F449}', // pointer
    '\u{1F539}', // small blue diamond
    '\u{1F53B}', // red triangle
    '\u{1F525}', // fire
    '\u{1F31F}', // glowing star
    '\u{26A1}',  // lightning
];
const EXTENDED_EMOJI: &[char] = &[
    '\u{1F4A1}',
    '\u{1F449}',
    '\u{1F539}',
    '\u{1F53B}',
    '\u{1F525}',
    '\u{1F31F}',
    '\u{26A1}',
    '\u{1F680}', // rocket
    '\u{2764}',  // heart
];

/// Decorative emoji removed by the inline formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmojiPreset {
    #[default]
    Standard,
    Extended,
    Keep,
}

impl EmojiPreset {
    pub fn chars(self) -> &'static [char] {
        match self {
            Self::Standard => STANDARD_EMOJI,
            Self::Extended => EXTENDED_EMOJI,
            Self::Keep => &[],
        }
    }
}

impl fmt::Display for EmojiPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Extended => write!(f, "extended"),
            Self::Keep => write!(f, "keep"),
        }
    }
}

impl FromStr for EmojiPreset {
    type Err = ConvpageError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            "keep" | "none" => Ok(Self::Keep),
            other => Err(ConvpageError::InvalidConfig(format!(
                "unknown emoji preset: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupOptions {
    pub stripped_emoji: Vec<char>,
    pub max_list_depth: usize,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            stripped_emoji: EmojiPreset::default().chars().to_vec(),
            max_list_depth: DEFAULT_MAX_LIST_DEPTH,
        }
    }
}

impl MarkupOptions {
    pub fn with_emoji_preset(mut self, preset: EmojiPreset) -> Self {
        self.stripped_emoji = preset.chars().to_vec();
        self
    }
}

/// Runs message text through reference splicing, table conversion and the
/// block parser.
#[derive(Debug, Clone, Default)]
pub struct MarkupRenderer {
    options: MarkupOptions,
}

impl MarkupRenderer {
    pub fn new(options: MarkupOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MarkupOptions {
        &self.options
    }

    pub fn render_text(&self, text: &str, references: &[ContentReference]) -> String {
        let spliced = if references.is_empty() {
            text.to_string()
        } else {
            apply_references(text, references)
        };
        self.render_markup(&spliced)
    }

    pub fn render_transcript(&self, text: &str) -> String {
        self.render_markup(text)
    }

    pub fn format_inline(&self, text: &str) -> String {
        format_inline(text, &self.options.stripped_emoji)
    }

    fn render_markup(&self, text: &str) -> String {
        let tabled = convert_tables(text, &self.options);
        render_blocks(&tabled, &self.options)
    }
}
