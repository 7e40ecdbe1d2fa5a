use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::MarkupOptions;
use crate::markup::inline::format_inline;

static QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^>\s").expect("valid regex"));
static TABLE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:</?(?:table|thead|tbody|tr|th|td)\b|<div class="table-wrapper">)"#)
        .expect("valid regex")
});
static H4_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^####\s+(.*)").expect("valid regex"));
static H3_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^###\s+(.*)").expect("valid regex"));
static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^##\s+(.*)").expect("valid regex"));
static ORDERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,9})\.\s+(.*)").expect("valid regex"));
static UNORDERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s+(.*)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Ordered => "ol",
            Self::Unordered => "ul",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ListFrame {
    kind: ListKind,
    indent: usize,
    item_open: bool,
}

struct BlockWriter<'a> {
    html: String,
    stack: Vec<ListFrame>,
    options: &'a MarkupOptions,
}

/// Renders headings, nested lists, block-quotes and paragraphs line by line.
/// Lines that already carry table markup are passed through untouched.
pub fn render_blocks(text: &str, options: &MarkupOptions) -> String {
    let lines = text.split('\n').collect::<Vec<_>>();
    let mut writer = BlockWriter {
        html: String::new(),
        stack: Vec::new(),
        options,
    };

    let mut idx = 0;
    while idx < lines.len() {
        let right_trimmed = lines[idx].trim_end();
        idx += 1;

        if right_trimmed.is_empty() {
            writer.close_all();
            continue;
        }

        let line = right_trimmed.trim_start();
        let indent = right_trimmed
            .chars()
            .take_while(|ch| ch.is_whitespace())
            .count();

        if QUOTE_RE.is_match(line) {
            writer.close_all();
            let mut quoted = vec![line];
            while let Some(next) = lines.get(idx).map(|raw| raw.trim())
                && QUOTE_RE.is_match(next)
            {
                quoted.push(next);
                idx += 1;
            }
            writer.push_quote(&quoted);
            continue;
        }

        if TABLE_TAG_RE.is_match(line) {
            writer.close_all();
            writer.html.push_str(line);
            writer.html.push('\n');
            continue;
        }

        if let Some((level, content)) = heading(line) {
            writer.close_all();
            let content = writer.format(content);
            writer
                .html
                .push_str(&format!("<h{level}>{content}</h{level}>"));
            continue;
        }

        if let Some(captures) = ORDERED_ITEM_RE.captures(line) {
            let number = captures[1].parse::<u32>().unwrap_or(1);
            let content = captures.get(2).map_or("", |m| m.as_str());
            writer.push_item(ListKind::Ordered, indent, Some(number), content);
            continue;
        }

        if let Some(captures) = UNORDERED_ITEM_RE.captures(line) {
            let content = captures.get(1).map_or("", |m| m.as_str());
            writer.push_item(ListKind::Unordered, indent, None, content);
            continue;
        }

        writer.close_all();
        let content = writer.format(line);
        writer.html.push_str(&format!("<p>{content}</p>"));
    }

    writer.close_all();
    writer.html
}

fn heading(line: &str) -> Option<(u8, &str)> {
    [(4, &*H4_RE), (3, &*H3_RE), (2, &*H2_RE)]
        .into_iter()
        .find_map(|(level, re)| {
            re.captures(line)
                .and_then(|captures| captures.get(1))
                .map(|content| (level, content.as_str()))
        })
}

impl BlockWriter<'_> {
    fn format(&self, content: &str) -> String {
        format_inline(content, &self.options.stripped_emoji)
    }

    fn push_quote(&mut self, lines: &[&str]) {
        self.html.push_str("<blockquote>");
        for line in lines {
            let content = line.strip_prefix('>').unwrap_or(line).trim_start();
            let content = self.format(content);
            self.html.push_str(&format!("<p>{content}</p>"));
        }
        self.html.push_str("</blockquote>");
    }

    fn push_item(&mut self, kind: ListKind, indent: usize, number: Option<u32>, content: &str) {
        self.enter_list(kind, indent, number);

        let had_open_item = self.stack.last().is_some_and(|frame| frame.item_open);
        if had_open_item {
            self.html.push_str("</li>");
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.item_open = true;
        }

        let content = self.format(content);
        let host_kind = self.stack.last().map(|frame| frame.kind);
        match (host_kind, number) {
            (Some(ListKind::Ordered), Some(number)) => {
                self.html
                    .push_str(&format!("<li value=\"{number}\">{content}"));
            }
            _ => self.html.push_str(&format!("<li>{content}")),
        }
    }

    fn enter_list(&mut self, kind: ListKind, indent: usize, number: Option<u32>) {
        let Some(top) = self.stack.last().copied() else {
            self.open_list(kind, indent, number);
            return;
        };

        if top.kind != kind {
            while self
                .stack
                .last()
                .is_some_and(|frame| frame.indent >= indent && frame.kind != kind)
            {
                self.close_last();
            }
            let joins_existing = self
                .stack
                .last()
                .is_some_and(|frame| frame.kind == kind && frame.indent == indent);
            if !joins_existing {
                self.open_list(kind, indent, number);
            }
        } else if top.indent < indent {
            self.open_list(kind, indent, number);
        } else if top.indent > indent {
            while self.stack.last().is_some_and(|frame| frame.indent > indent) {
                self.close_last();
            }
            if !self.stack.last().is_some_and(|frame| frame.kind == kind) {
                self.open_list(kind, indent, number);
            }
        }
    }

    fn open_list(&mut self, kind: ListKind, indent: usize, number: Option<u32>) {
        if self.stack.len() >= self.options.max_list_depth.max(1) {
            return;
        }

        match number {
            Some(start) if kind == ListKind::Ordered && start != 1 => {
                self.html.push_str(&format!("<ol start=\"{start}\">"));
            }
            _ => self.html.push_str(&format!("<{}>", kind.tag())),
        }

        self.stack.push(ListFrame {
            kind,
            indent,
            item_open: false,
        });
    }

    fn close_last(&mut self) {
        if let Some(frame) = self.stack.pop() {
            if frame.item_open {
                self.html.push_str("</li>");
            }
            self.html.push_str(&format!("</{}>", frame.kind.tag()));
        }
    }

    fn close_all(&mut self) {
        while !self.stack.is_empty() {
            self.close_last();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::markup::MarkupOptions;
    use crate::markup::blocks::render_blocks;

    fn render(text: &str) -> String {
        render_blocks(text, &MarkupOptions::default())
    }

    #[test]
    fn dash_lines_form_one_unordered_list() {
        assert_eq!(render("- a\n- b\n"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn numbered_lines_carry_their_values() {
        assert_eq!(
            render("1. a\n2. b\n"),
            "<ol><li value=\"1\">a</li><li value=\"2\">b</li></ol>"
        );
        assert_eq!(
            render("5. a\n"),
            "<ol start=\"5\"><li value=\"5\">a</li></ol>"
        );
    }

    #[test]
    fn indented_items_nest_inside_the_open_item() {
        assert_eq!(
            render("- a\n  - b\n- c\n"),
            "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>"
        );
    }

    #[test]
    fn switching_kinds_at_same_indent_starts_new_list() {
        assert_eq!(
            render("- a\n1. b\n"),
            "<ul><li>a</li></ul><ol><li value=\"1\">b</li></ol>"
        );
    }

    #[test]
    fn returning_from_other_kind_rejoins_outer_list() {
        assert_eq!(
            render("- a\n  1. b\n- c"),
            "<ul><li>a<ol><li value=\"1\">b</li></ol></li><li>c</li></ul>"
        );
    }

    #[test]
    fn dedent_into_other_kind_opens_fresh_list() {
        assert_eq!(
            render("1. a\n    - b\n  - c"),
            "<ol><li value=\"1\">a<ul><li>b</li></ul><ul><li>c</li></ul></li></ol>"
        );
    }

    #[test]
    fn blank_line_closes_lists() {
        assert_eq!(
            render("- a\n\n- b"),
            "<ul><li>a</li></ul><ul><li>b</li></ul>"
        );
    }

    #[test]
    fn quote_run_becomes_one_blockquote() {
        assert_eq!(
            render("> line one\n> line two\n"),
            "<blockquote><p>line one</p><p>line two</p></blockquote>"
        );
    }

    #[test]
    fn quote_closes_open_lists() {
        assert_eq!(
            render("- a\n> quoted\nafter"),
            "<ul><li>a</li></ul><blockquote><p>quoted</p></blockquote><p>after</p>"
        );
    }

    #[test]
    fn headings_use_most_specific_marker() {
        assert_eq!(render("## Two"), "<h2>Two</h2>");
        assert_eq!(render("### Three"), "<h3>Three</h3>");
        assert_eq!(render("  #### **Four**"), "<h4><strong>Four</strong></h4>");
    }

    #[test]
    fn table_markup_passes_through() {
        assert_eq!(
            render("- a\n<TR><td>x</td></TR>\n"),
            "<ul><li>a</li></ul><TR><td>x</td></TR>\n"
        );
    }

    #[test]
    fn plain_lines_become_paragraphs() {
        assert_eq!(
            render("Hello *there*\n1.5 million"),
            "<p>Hello <i>there</i></p><p>1.5 million</p>"
        );
    }

    #[test]
    fn only_ascii_digits_start_ordered_items() {
        assert_eq!(render("\u{663}. three"), "<p>\u{663}. three</p>");
    }

    #[test]
    fn capped_item_of_other_kind_drops_its_value() {
        let options = MarkupOptions {
            max_list_depth: 1,
            ..MarkupOptions::default()
        };
        let html = render_blocks("- a\n  1. b", &options);
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn nesting_depth_is_capped() {
        let options = MarkupOptions {
            max_list_depth: 2,
            ..MarkupOptions::default()
        };
        let html = render_blocks("- a\n  - b\n    - c", &options);
        assert_eq!(html, "<ul><li>a<ul><li>b</li><li>c</li></ul></li></ul>");
    }
}
