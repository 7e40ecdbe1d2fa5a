use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::MarkupOptions;
use crate::markup::blocks::render_blocks;

static TABLE_ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|.*\|").expect("valid regex"));
static SEPARATOR_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[|\s-]+$").expect("valid regex"));

/// Converts every run of pipe-delimited rows into table markup. Other lines
/// are emitted right-trimmed with a trailing newline.
pub fn convert_tables(raw: &str, options: &MarkupOptions) -> String {
    let lines = raw.split('\n').map(str::trim_end).collect::<Vec<_>>();
    let mut html = String::new();
    let mut idx = 0;

    while idx < lines.len() {
        if !is_table_row(lines[idx]) {
            html.push_str(lines[idx]);
            html.push('\n');
            idx += 1;
            continue;
        }

        let start = idx;
        while idx < lines.len() && is_table_row(lines[idx]) {
            idx += 1;
        }
        html.push_str(&table_to_html(&lines[start..idx], options));
    }

    html
}

fn is_table_row(line: &str) -> bool {
    TABLE_ROW_RE.is_match(line)
}

fn table_to_html(rows: &[&str], options: &MarkupOptions) -> String {
    let has_header = rows.len() > 1 && SEPARATOR_ROW_RE.is_match(rows[1].trim());

    let mut html = String::from("<div class=\"table-wrapper\"><table>\n");
    if has_header {
        html.push_str("<thead>\n");
        html.push_str(&row_to_html(rows[0], "th", options));
        html.push_str("</thead>\n");
    }

    html.push_str("<tbody>\n");
    let body_start = if has_header { 2 } else { 0 };
    for row in rows.iter().skip(body_start) {
        html.push_str(&row_to_html(row, "td", options));
    }
    html.push_str("</tbody>\n</table></div>\n");

    html
}

fn row_to_html(row: &str, cell_tag: &str, options: &MarkupOptions) -> String {
    let mut html = String::from("<tr>");
    for cell in split_cells(row) {
        let content = render_blocks(cell.trim(), options);
        html.push_str(&format!("<{cell_tag}>{content}</{cell_tag}>"));
    }
    html.push_str("</tr>\n");
    html
}

fn split_cells(row: &str) -> Vec<&str> {
    let mut cells = row.split('|').collect::<Vec<_>>();
    if cells.first().is_some_and(|cell| cell.trim().is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|cell| cell.trim().is_empty()) {
        cells.pop();
    }
    cells
}
