use std::cmp::Reverse;

use crate::model::ContentReference;

const REF_HIDDEN: &str = "hidden";
const REF_GROUPED_WEBPAGES: &str = "grouped_webpages";
const REF_VIDEO: &str = "video";

const FALLBACK_LINK_LABEL: &str = "External Link";
const FALLBACK_LINK_URL: &str = "#";

/// Rewrites `text` by splicing each reference's replacement over its
/// `[start_idx, end_idx)` character span.
///
/// References are applied from the highest start offset down so that every
/// edit happens to the right of the spans still waiting to be applied.
/// Overlapping spans are not detected; offsets past the end of the
/// (already edited) text are clamped instead.
pub fn apply_references(text: &str, references: &[ContentReference]) -> String {
    let mut sorted = references.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|reference| Reverse(reference.start_idx));

    let mut output = text.to_string();
    for reference in sorted {
        let Some((start, end)) = span(reference) else {
            continue;
        };
        let Some(replacement) = replacement(reference) else {
            continue;
        };

        output = splice(&output, start, end, &replacement);
    }

    output
}

fn span(reference: &ContentReference) -> Option<(usize, usize)> {
    if reference
        .matched_text
        .as_deref()
        .is_none_or(str::is_empty)
    {
        return None;
    }

    let start = usize::try_from(reference.start_idx?).ok()?;
    let end = usize::try_from(reference.end_idx?).ok()?;
    if start > end {
        tracing::warn!(
            start_idx = start,
            end_idx = end,
            kind = %reference.kind,
            "skipping content reference with inverted span"
        );
        return None;
    }

    Some((start, end))
}

fn replacement(reference: &ContentReference) -> Option<String> {
    match reference.kind.as_str() {
        REF_HIDDEN => Some(String::new()),
        REF_GROUPED_WEBPAGES => reference.items.first().map(|item| {
            let label = item
                .attribution
                .as_deref()
                .filter(|label| !label.is_empty())
                .unwrap_or(FALLBACK_LINK_LABEL);
            let url = item
                .url
                .as_deref()
                .filter(|url| !url.is_empty())
                .unwrap_or(FALLBACK_LINK_URL);
            format!(
                "<a href=\"{url}\" target=\"_blank\" rel=\"noopener\" class=\"custom-link\"><span class=\"truncate\">{label}</span></a>"
            )
        }),
        REF_VIDEO => reference
            .video_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(video_embed),
        _ => None,
    }
}

fn video_embed(video_id: &str) -> String {
    format!(
        "<div class=\"mb-3\"><div class=\"responsive-video-container\"><iframe class=\"aspect-video w-full rounded-lg\" src=\"https://www.youtube.com/embed/{video_id}\" frameborder=\"0\" allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share\" referrerpolicy=\"strict-origin-when-cross-origin\" allowfullscreen></iframe></div></div>"
    )
}

fn splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let start = byte_offset(text, start);
    let end = byte_offset(text, end);

    let mut output = String::with_capacity(text.len() + replacement.len());
    output.push_str(&text[..start]);
    output.push_str(replacement);
    output.push_str(&text[end..]);
    output
}

/// Byte position of the `chars`-th character, clamped to the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use crate::markup::references::apply_references;
    use crate::model::{ContentReference, ReferenceItem};

    fn reference(kind: &str, start: i64, end: i64) -> ContentReference {
        ContentReference {
            kind: kind.to_string(),
            matched_text: Some("x".to_string()),
            start_idx: Some(start),
            end_idx: Some(end),
            ..ContentReference::default()
        }
    }

    #[test]
    fn hidden_reference_deletes_span() {
        let output = apply_references("Hello world!", &[reference("hidden", 5, 10)]);
        assert_eq!(output, "Hellod!");

        let output = apply_references("Hello world!", &[reference("hidden", 5, 11)]);
        assert_eq!(output, "Hello!");
    }

    #[test]
    fn overlapping_spans_apply_against_edited_text() {
        let output = apply_references(
            "0123456789",
            &[reference("hidden", 0, 5), reference("hidden", 3, 8)],
        );
        assert_eq!(output, "");

        let output = apply_references(
            "0123456789",
            &[reference("hidden", 3, 8), reference("hidden", 2, 4)],
        );
        assert_eq!(output, "019");
    }

    #[test]
    fn empty_reference_set_is_identity() {
        assert_eq!(apply_references("unchanged", &[]), "unchanged");
    }

    #[test]
    fn applies_references_right_to_left() {
        let text = "AAA [1] BBB [2] CCC";
        let mut first = reference("grouped_webpages", 4, 7);
        first.items = vec![ReferenceItem {
            url: Some("https://one.example".to_string()),
            attribution: Some("one".to_string()),
            ..ReferenceItem::default()
        }];
        let second = reference("hidden", 12, 15);

        let output = apply_references(text, &[first, second]);
        assert_eq!(
            output,
            "AAA <a href=\"https://one.example\" target=\"_blank\" rel=\"noopener\" class=\"custom-link\"><span class=\"truncate\">one</span></a> BBB  CCC"
        );
    }

    #[test]
    fn grouped_webpages_fall_back_to_defaults() {
        let mut link = reference("grouped_webpages", 0, 3);
        link.items = vec![ReferenceItem::default()];

        let output = apply_references("[1] tail", &[link]);
        assert!(output.starts_with("<a href=\"#\""));
        assert!(output.contains(">External Link</span>"));
        assert!(output.ends_with(" tail"));
    }

    #[test]
    fn references_without_replacement_leave_text() {
        let empty_group = reference("grouped_webpages", 0, 3);
        let video_without_id = reference("video", 0, 3);
        let unknown = reference("sources_footnote", 0, 3);

        let output = apply_references("[1] tail", &[empty_group, video_without_id, unknown]);
        assert_eq!(output, "[1] tail");
    }

    #[test]
    fn video_reference_embeds_player() {
        let mut video = reference("video", 6, 9);
        video.video_id = Some("abc123".to_string());

        let output = apply_references("Watch [v]", &[video]);
        assert!(output.starts_with("Watch <div class=\"mb-3\">"));
        assert!(output.contains("https://www.youtube.com/embed/abc123"));
    }

    #[test]
    fn malformed_references_are_skipped() {
        let mut missing_text = reference("hidden", 0, 2);
        missing_text.matched_text = None;
        let mut missing_end = reference("hidden", 0, 2);
        missing_end.end_idx = None;
        let inverted = reference("hidden", 4, 1);
        let negative = reference("hidden", -1, 2);

        let output = apply_references(
            "keep all",
            &[missing_text, missing_end, inverted, negative],
        );
        assert_eq!(output, "keep all");
    }

    #[test]
    fn offsets_count_characters_and_clamp() {
        let output = apply_references("héllo wörld", &[reference("hidden", 6, 11)]);
        assert_eq!(output, "héllo ");

        let output = apply_references("short", &[reference("hidden", 3, 99)]);
        assert_eq!(output, "sho");
    }
}
