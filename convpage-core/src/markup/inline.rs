use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::markup::entities::decode_entities;

static DASH_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^-[ \t].*\n?)+").expect("valid regex"));
static DASH_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-+\s+(.*)$").expect("valid regex"));
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static LOOSE_H3_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*###[ \t]+(.*)$").expect("valid regex"));
static LOOSE_H2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*##[ \t]+(.*)$").expect("valid regex"));
static H3_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid regex"));
static H4_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#### (.*)$").expect("valid regex"));
static HR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^---$").expect("valid regex"));

const KEYCAP_SEQUENCE: &str = "\u{FE0F}\u{20E3}";

/// Applies entity decoding and the inline rewrites to one chunk of text.
/// Rules run in a fixed order; each one sees the output of the previous.
pub fn format_inline(input: &str, stripped_emoji: &[char]) -> String {
    let decoded = decode_entities(input);
    let grouped = group_dash_lines(&decoded);

    let emphasised = BOLD_RE.replace_all(&grouped, "<strong>${1}</strong>");
    let emphasised = ITALIC_RE.replace_all(&emphasised, "<i>${1}</i>");

    let headed = LOOSE_H3_RE.replace_all(&emphasised, "<h2>${1}</h2>");
    let headed = LOOSE_H2_RE.replace_all(&headed, "<h2>${1}</h2>");
    let headed = H3_RE.replace_all(&headed, "<h3>${1}</h3>");
    let headed = H4_RE.replace_all(&headed, "<h4>${1}</h4>");

    let stripped = strip_emoji(&headed, stripped_emoji).replace(KEYCAP_SEQUENCE, ".");

    HR_RE.replace_all(&stripped, "<hr>").into_owned()
}

fn group_dash_lines(input: &str) -> String {
    DASH_RUN_RE
        .replace_all(input, |captures: &Captures<'_>| {
            let items = captures[0]
                .trim_end()
                .split('\n')
                .map(|line| DASH_ITEM_RE.replace(line, "<li>${1}</li>").into_owned())
                .collect::<Vec<_>>();
            format!("<ul>\n{}\n</ul>\n", items.join("\n"))
        })
        .into_owned()
}

fn strip_emoji(input: &str, stripped_emoji: &[char]) -> String {
    if stripped_emoji.is_empty() {
        return input.to_string();
    }
    input
        .chars()
        .filter(|ch| !stripped_emoji.contains(ch))
        .collect()
}
