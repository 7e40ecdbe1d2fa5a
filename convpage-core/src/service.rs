use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConvpageError, Result};
use crate::linearize::linearize;
use crate::markup::MarkupRenderer;
use crate::model::{ConversationArchive, ConversationView};
use crate::render::HtmlRenderer;
use crate::resolver::AssetResolver;
use crate::timeline;

fn read_archive_raw(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| ConvpageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ConvpageError::EmptyArchive {
            path: path.to_path_buf(),
        });
    }

    String::from_utf8(bytes).map_err(|_| ConvpageError::NonUtf8Archive {
        path: path.to_path_buf(),
    })
}

/// Loads the archive untyped so every field survives a round trip.
pub fn load_archive_value(path: &Path) -> Result<Value> {
    let raw = read_archive_raw(path)?;
    serde_json::from_str(&raw).map_err(|source| ConvpageError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_archive(path: &Path, value: Value) -> Result<ConversationArchive> {
    let archive: ConversationArchive =
        serde_json::from_value(value).map_err(|source| ConvpageError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(
        path = %path.display(),
        conversations = archive.len(),
        "loaded archive"
    );
    Ok(archive)
}

pub fn load_archive(path: &Path) -> Result<ConversationArchive> {
    let value = load_archive_value(path)?;
    parse_archive(path, value)
}

pub fn linearize_archive(archive: &ConversationArchive) -> Result<Vec<ConversationView>> {
    archive
        .iter()
        .map(|conversation| {
            Ok(ConversationView {
                title: conversation.title.clone(),
                messages: linearize(conversation)?,
            })
        })
        .collect()
}

pub fn archive_to_raw_json(views: &[ConversationView]) -> Result<String> {
    serde_json::to_string_pretty(views).map_err(|err| ConvpageError::Serialization(err.to_string()))
}

/// Renders the archive as a standalone page, or as the bare fragment when
/// `fragment` is set.
pub fn render_archive_html(
    archive: &ConversationArchive,
    markup: MarkupRenderer,
    resolver: &dyn AssetResolver,
    fragment: bool,
) -> Result<String> {
    let renderer = HtmlRenderer::new(markup, resolver);
    if fragment {
        renderer.render_archive(archive)
    } else {
        renderer.render_document(archive)
    }
}

pub fn split_archive_by_date(archive: &Value, dir: &Path) -> Result<Vec<PathBuf>> {
    timeline::write_nodes_by_date(archive, dir)
}

pub fn render_first_ids(archive: &Value) -> String {
    render_first_ids_from(&timeline::first_node_per_date(archive))
}

fn render_first_ids_from(firsts: &BTreeMap<String, String>) -> String {
    let mut output = String::new();
    for (date, node_id) in firsts {
        output.push_str(&format!("Date: {date}, First Message ID: {node_id}\n"));
    }
    output
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use crate::error::ConvpageError;
    use crate::markup::MarkupRenderer;
    use crate::resolver::NoAssets;
    use crate::service::{
        archive_to_raw_json, linearize_archive, load_archive, load_archive_value,
        render_archive_html, render_first_ids,
    };

    fn sample() -> serde_json::Value {
        json!([{
            "title": "hello",
            "current_node": "b",
            "mapping": {
                "a": {"parent": null, "message": {
                    "author": {"role": "user"}, "recipient": "all",
                    "content": {"content_type": "text", "parts": ["hi"]},
                    "metadata": {}, "create_time": 1_700_000_000.0
                }},
                "b": {"parent": "a", "message": {
                    "author": {"role": "assistant"}, "recipient": "all",
                    "content": {"content_type": "text", "parts": ["hello &amp; welcome"]},
                    "metadata": {}, "create_time": 1_700_000_010.0
                }}
            }
        }])
    }

    #[test]
    fn loads_and_renders_archive() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("conversations.json");
        fs::write(&path, sample().to_string()).expect("write");

        let archive = load_archive(&path).expect("load");
        let html = render_archive_html(&archive, MarkupRenderer::default(), &NoAssets, true)
            .expect("render");
        assert!(html.contains("<p>hello & welcome</p>"));
        assert!(!html.contains("<!DOCTYPE html>"));

        let page = render_archive_html(&archive, MarkupRenderer::default(), &NoAssets, false)
            .expect("render");
        assert!(page.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn raw_json_lists_linearized_messages() {
        let archive = serde_json::from_value(sample()).expect("archive");
        let views = linearize_archive(&archive).expect("linearize");
        let raw = archive_to_raw_json(&views).expect("json");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");

        assert_eq!(value[0]["title"], "hello");
        assert_eq!(value[0]["messages"][0]["author"], "user");
        assert_eq!(value[0]["messages"][1]["author"], "ChatGPT");
        assert_eq!(value[0]["messages"][1]["parts"][0]["text"], "hello &amp; welcome");
    }

    #[test]
    fn empty_and_invalid_files_are_reported() {
        let temp = tempdir().expect("tempdir");
        let empty = temp.path().join("empty.json");
        fs::write(&empty, "  \n").expect("write");
        assert!(matches!(
            load_archive_value(&empty),
            Err(ConvpageError::EmptyArchive { .. })
        ));

        let broken = temp.path().join("broken.json");
        fs::write(&broken, "[{").expect("write");
        assert!(matches!(
            load_archive_value(&broken),
            Err(ConvpageError::InvalidJson { .. })
        ));

        let missing = temp.path().join("missing.json");
        assert!(matches!(
            load_archive_value(&missing),
            Err(ConvpageError::Io { .. })
        ));
    }

    #[test]
    fn first_ids_are_listed_per_date() {
        assert_eq!(
            render_first_ids(&sample()),
            "Date: 2023-11-14, First Message ID: a\n"
        );
    }
}
