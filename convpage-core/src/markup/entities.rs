use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(lt|gt|amp|quot|#39|nbsp);").expect("valid regex"));

/// Decodes the small fixed set of entities the exporter emits, leaving tags
/// and unknown entities untouched. Decoded output is never rescanned.
pub fn decode_entities(input: &str) -> String {
    ENTITY_RE
        .replace_all(input, |captures: &Captures<'_>| match &captures[1] {
            "lt" => "<",
            "gt" => ">",
            "amp" => "&",
            "quot" => "\"",
            "#39" => "'",
            _ => " ",
        })
        .into_owned()
}
