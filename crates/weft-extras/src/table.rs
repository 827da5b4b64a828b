#![forbid(unsafe_code)]

//! Markdown table detection, parsing, and terminal layout.
//!
//! Detection is line-oriented: a contiguous run of `|`-containing lines
//! outside fenced code blocks is a candidate, and a candidate is a table
//! iff it contains a delimiter row (`|---|:---:|`). Layout measures cell
//! display widths (CJK and other fullwidth forms count as two columns) and
//! renders with box-drawing, ASCII, or compact rules.
//!
//! # Example
//!
//! ```
//! use weft_extras::table::{detect_tables, parse_table, render_table, TableOptions};
//!
//! let text = "| a | b |\n|---|---|\n| 1 | 2 |";
//! let spans = detect_tables(text);
//! assert_eq!(spans.len(), 1);
//!
//! let lines: Vec<&str> = text.lines().collect();
//! let table = parse_table(&lines).unwrap();
//! assert_eq!(table.header, vec!["a", "b"]);
//!
//! let rendered = render_table(&table, &TableOptions::default());
//! assert!(rendered.contains('│'));
//! ```

use std::fmt;
use std::str::FromStr;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Visual style for rendered tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStyle {
    /// Box-drawing characters.
    #[default]
    Unicode,

    /// `+`, `-`, `|` only.
    Ascii,

    /// Spaces as vertical rules, `─` as the header underline.
    Compact,
}

/// Error from parsing a table style name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTableStyleError(String);

impl fmt::Display for ParseTableStyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown table style: {:?}", self.0)
    }
}

impl std::error::Error for ParseTableStyleError {}

impl FromStr for TableStyle {
    type Err = ParseTableStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unicode" => Ok(Self::Unicode),
            "ascii" => Ok(Self::Ascii),
            "compact" => Ok(Self::Compact),
            _ => Err(ParseTableStyleError(s.to_string())),
        }
    }
}

/// Per-column text alignment, from the delimiter row's colons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Flush left (the default).
    #[default]
    Left,

    /// Centered (`:---:`).
    Center,

    /// Flush right (`---:`).
    Right,
}

/// Rendering options.
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Visual style. Default: [`TableStyle::Unicode`].
    pub style: TableStyle,

    /// Cells wider than this are truncated with `…`. Default: 50.
    pub max_column_width: usize,

    /// Columns are never narrower than this. Default: 3.
    pub min_column_width: usize,

    /// Spaces inside each cell, both sides. Default: 1.
    pub cell_padding: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            style: TableStyle::Unicode,
            max_column_width: 50,
            min_column_width: 3,
            cell_padding: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// A table's line range within the scanned text, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpan {
    /// First line of the table.
    pub start: usize,
    /// One past the last line.
    pub end: usize,
}

/// Is this a delimiter row: contains `-`, only whitespace/`|`/`-`/`:`?
#[must_use]
pub fn is_delimiter_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| c.is_whitespace() || matches!(c, '|' | '-' | ':'))
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Scan `text` for Markdown tables, skipping fenced code blocks.
#[must_use]
pub fn detect_tables(text: &str) -> Vec<TableSpan> {
    let lines: Vec<&str> = text.lines().collect();
    let mut spans = Vec::new();
    let mut in_fence = false;
    let mut run_start: Option<usize> = None;

    let mut close_run = |run_start: &mut Option<usize>, end: usize| {
        if let Some(start) = run_start.take()
            && lines[start..end].iter().any(|l| is_delimiter_row(l))
        {
            spans.push(TableSpan { start, end });
        }
    };

    for (i, line) in lines.iter().enumerate() {
        if is_fence(line) {
            close_run(&mut run_start, i);
            in_fence = !in_fence;
            continue;
        }
        if !in_fence && line.contains('|') {
            run_start.get_or_insert(i);
        } else {
            close_run(&mut run_start, i);
        }
    }
    close_run(&mut run_start, lines.len());
    spans
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A parsed Markdown table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownTable {
    /// Header cells (empty when the delimiter row came first).
    pub header: Vec<String>,

    /// Body rows, each padded to the column count.
    pub rows: Vec<Vec<String>>,

    /// Per-column alignment from the delimiter row.
    pub alignments: Vec<Alignment>,
}

/// Split a table row on `|`, stripping the outer pipes.
fn split_row(line: &str) -> Vec<String> {
    let mut trimmed = line.trim();
    trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn alignment_of(cell: &str) -> Alignment {
    let starts = cell.starts_with(':');
    let ends = cell.ends_with(':');
    match (starts, ends) {
        (true, true) => Alignment::Center,
        (false, true) => Alignment::Right,
        _ => Alignment::Left,
    }
}

/// Parse the lines of one detected table. Returns `None` when no delimiter
/// row is present.
#[must_use]
pub fn parse_table(lines: &[&str]) -> Option<MarkdownTable> {
    let delimiter_at = lines.iter().position(|l| is_delimiter_row(l))?;
    let alignments: Vec<Alignment> = split_row(lines[delimiter_at])
        .iter()
        .map(|cell| alignment_of(cell))
        .collect();

    let header = if delimiter_at > 0 {
        split_row(lines[delimiter_at - 1])
    } else {
        Vec::new()
    };

    let mut rows: Vec<Vec<String>> = lines
        .iter()
        .enumerate()
        .filter(|&(i, l)| i != delimiter_at && i + 1 != delimiter_at && !is_delimiter_row(l))
        .map(|(_, l)| split_row(l))
        .collect();

    let columns = rows
        .iter()
        .map(Vec::len)
        .chain([header.len(), alignments.len()])
        .max()
        .unwrap_or(0);

    let mut header = header;
    if !header.is_empty() {
        header.resize(columns, String::new());
    }
    for row in &mut rows {
        row.resize(columns, String::new());
    }
    let mut alignments = alignments;
    alignments.resize(columns, Alignment::Left);

    Some(MarkdownTable {
        header,
        rows,
        alignments,
    })
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Terminal display width of a string (CJK and fullwidth forms count 2).
#[must_use]
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to at most `max` display columns, appending `…` when cut.
/// Cuts on grapheme boundaries.
#[must_use]
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if display_width(s) <= max {
        return s.to_string();
    }
    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for grapheme in s.graphemes(true) {
        let w = display_width(grapheme);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(grapheme);
    }
    out.push('…');
    out
}

fn spaces(n: usize) -> String {
    " ".repeat(n)
}

fn pad_cell(text: &str, width: usize, align: Alignment) -> String {
    let pad = width.saturating_sub(display_width(text));
    match align {
        Alignment::Left => format!("{text}{}", spaces(pad)),
        Alignment::Right => format!("{}{text}", spaces(pad)),
        Alignment::Center => {
            let left = pad / 2;
            format!("{}{text}{}", spaces(left), spaces(pad - left))
        }
    }
}

fn column_widths(table: &MarkdownTable, options: &TableOptions) -> Vec<usize> {
    let columns = table.alignments.len();
    let mut widths = vec![options.min_column_width; columns];
    let header_rows = if table.header.is_empty() {
        None
    } else {
        Some(&table.header)
    };
    for row in header_rows.into_iter().chain(&table.rows) {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).min(options.max_column_width);
    }
    widths
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

struct BorderSet {
    top: Option<(&'static str, &'static str, &'static str, &'static str)>,
    separator: Option<(&'static str, &'static str, &'static str, &'static str)>,
    bottom: Option<(&'static str, &'static str, &'static str, &'static str)>,
    horizontal: &'static str,
    vertical: &'static str,
}

const UNICODE_BORDERS: BorderSet = BorderSet {
    top: Some(("┌", "┬", "┐", "─")),
    separator: Some(("├", "┼", "┤", "─")),
    bottom: Some(("└", "┴", "┘", "─")),
    horizontal: "─",
    vertical: "│",
};

const ASCII_BORDERS: BorderSet = BorderSet {
    top: Some(("+", "+", "+", "-")),
    separator: Some(("+", "+", "+", "-")),
    bottom: Some(("+", "+", "+", "-")),
    horizontal: "-",
    vertical: "|",
};

fn border_line(
    (left, mid, right, fill): (&str, &str, &str, &str),
    widths: &[usize],
    padding: usize,
) -> String {
    let mut line = String::from(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str(mid);
        }
        line.push_str(&fill.repeat(width + 2 * padding));
    }
    line.push_str(right);
    line
}

fn bordered_row(
    table: &MarkdownTable,
    row: &[String],
    widths: &[usize],
    options: &TableOptions,
    vertical: &str,
) -> String {
    let pad = spaces(options.cell_padding);
    let mut line = String::from(vertical);
    for (i, width) in widths.iter().enumerate() {
        let raw = row.get(i).map_or("", String::as_str);
        let cell = truncate_to_width(raw, *width);
        line.push_str(&pad);
        line.push_str(&pad_cell(&cell, *width, table.alignments[i]));
        line.push_str(&pad);
        line.push_str(vertical);
    }
    line
}

fn render_bordered(table: &MarkdownTable, options: &TableOptions, borders: &BorderSet) -> String {
    let widths = column_widths(table, options);
    let mut lines = Vec::new();

    if let Some(top) = borders.top {
        lines.push(border_line(top, &widths, options.cell_padding));
    }
    if !table.header.is_empty() {
        lines.push(bordered_row(table, &table.header, &widths, options, borders.vertical));
        if let Some(separator) = borders.separator {
            lines.push(border_line(separator, &widths, options.cell_padding));
        }
    }
    for row in &table.rows {
        lines.push(bordered_row(table, row, &widths, options, borders.vertical));
    }
    if let Some(bottom) = borders.bottom {
        lines.push(border_line(bottom, &widths, options.cell_padding));
    }
    lines.join("\n")
}

fn render_compact(table: &MarkdownTable, options: &TableOptions) -> String {
    let widths = column_widths(table, options);
    let gap = spaces(options.cell_padding.max(1));
    let row_line = |row: &[String]| -> String {
        widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let raw = row.get(i).map_or("", String::as_str);
                pad_cell(&truncate_to_width(raw, *width), *width, table.alignments[i])
            })
            .collect::<Vec<_>>()
            .join(&gap)
    };

    let mut lines = Vec::new();
    if !table.header.is_empty() {
        lines.push(row_line(&table.header));
        lines.push(
            widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join(&gap),
        );
    }
    for row in &table.rows {
        lines.push(row_line(row));
    }
    lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a parsed table to a multi-line string.
#[must_use]
pub fn render_table(table: &MarkdownTable, options: &TableOptions) -> String {
    match options.style {
        TableStyle::Unicode => render_bordered(table, options, &UNICODE_BORDERS),
        TableStyle::Ascii => render_bordered(table, options, &ASCII_BORDERS),
        TableStyle::Compact => render_compact(table, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "| Name | Qty |\n|------|----:|\n| apples | 3 |\n| 日本語 | 10 |";

    fn basic_table() -> MarkdownTable {
        let lines: Vec<&str> = BASIC.lines().collect();
        parse_table(&lines).expect("table parses")
    }

    // ── Detection ───────────────────────────────────────────────────────

    #[test]
    fn detects_a_simple_table() {
        let spans = detect_tables(BASIC);
        assert_eq!(spans, vec![TableSpan { start: 0, end: 4 }]);
    }

    #[test]
    fn pipe_lines_without_delimiter_are_not_a_table() {
        let text = "a | b\nc | d";
        assert!(detect_tables(text).is_empty());
    }

    #[test]
    fn detects_table_inside_prose() {
        let text = "intro\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\noutro";
        let spans = detect_tables(text);
        assert_eq!(spans, vec![TableSpan { start: 2, end: 5 }]);
    }

    #[test]
    fn fenced_code_is_skipped() {
        let text = "```\n| a | b |\n|---|---|\n```\ntext";
        assert!(detect_tables(text).is_empty());
    }

    #[test]
    fn table_after_fence_is_found() {
        let text = "```\n| not | table |\n|---|---|\n```\n| a | b |\n|---|---|\n| 1 | 2 |";
        let spans = detect_tables(text);
        assert_eq!(spans, vec![TableSpan { start: 4, end: 7 }]);
    }

    #[test]
    fn two_tables_two_spans() {
        let text = "| a |\n|---|\n| 1 |\n\n| b |\n|---|\n| 2 |";
        assert_eq!(detect_tables(text).len(), 2);
    }

    #[test]
    fn delimiter_row_shapes() {
        assert!(is_delimiter_row("|---|---|"));
        assert!(is_delimiter_row("| :--- | ---: |"));
        assert!(is_delimiter_row("---"));
        assert!(!is_delimiter_row("| a | b |"));
        assert!(!is_delimiter_row(""));
        assert!(!is_delimiter_row("| ::: |"));
    }

    // ── Parsing ─────────────────────────────────────────────────────────

    #[test]
    fn parses_header_rows_and_alignments() {
        let table = basic_table();
        assert_eq!(table.header, vec!["Name", "Qty"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["apples", "3"]);
        assert_eq!(table.alignments, vec![Alignment::Left, Alignment::Right]);
    }

    #[test]
    fn center_alignment() {
        let lines = ["| a | b | c |", "| :--- | :---: | ---: |", "| 1 | 2 | 3 |"];
        let table = parse_table(&lines).unwrap();
        assert_eq!(
            table.alignments,
            vec![Alignment::Left, Alignment::Center, Alignment::Right]
        );
    }

    #[test]
    fn ragged_rows_are_padded() {
        let lines = ["| a | b | c |", "|---|---|---|", "| 1 |", "| 1 | 2 | 3 | 4 |"];
        let table = parse_table(&lines).unwrap();
        assert_eq!(table.alignments.len(), 4);
        for row in &table.rows {
            assert_eq!(row.len(), 4);
        }
    }

    #[test]
    fn headerless_table() {
        let lines = ["|---|---|", "| 1 | 2 |"];
        let table = parse_table(&lines).unwrap();
        assert!(table.header.is_empty());
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn no_delimiter_no_table() {
        assert!(parse_table(&["| a | b |", "| 1 | 2 |"]).is_none());
    }

    // ── Width and truncation ────────────────────────────────────────────

    #[test]
    fn cjk_width_is_two_per_glyph() {
        assert_eq!(display_width("日本語"), 6);
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("カタカナ"), 8);
        assert_eq!(display_width("한글"), 4);
    }

    #[test]
    fn truncation_appends_ellipsis() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert!(display_width(&truncate_to_width("hello world", 6)) <= 6);
    }

    #[test]
    fn truncation_respects_wide_glyphs() {
        // Budget 4: one CJK glyph (2) + another would exceed 3, so one
        // glyph plus the ellipsis.
        let cut = truncate_to_width("日本語です", 4);
        assert_eq!(cut, "日…");
        assert!(display_width(&cut) <= 4);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    #[test]
    fn renders_unicode_style() {
        let rendered = render_table(&basic_table(), &TableOptions::default());
        let expected = "\
┌────────┬─────┐
│ Name   │ Qty │
├────────┼─────┤
│ apples │   3 │
│ 日本語 │  10 │
└────────┴─────┘";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn renders_ascii_style() {
        let options = TableOptions {
            style: TableStyle::Ascii,
            ..Default::default()
        };
        let rendered = render_table(&basic_table(), &options);
        let expected = "\
+--------+-----+
| Name   | Qty |
+--------+-----+
| apples |   3 |
| 日本語 |  10 |
+--------+-----+";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn renders_compact_style() {
        let options = TableOptions {
            style: TableStyle::Compact,
            ..Default::default()
        };
        let rendered = render_table(&basic_table(), &options);
        let expected = "\
Name   Qty
────── ───
apples   3
日本語  10";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn over_wide_cells_truncate_in_render() {
        let options = TableOptions {
            max_column_width: 6,
            ..Default::default()
        };
        let lines = ["| h |", "|---|", "| abcdefghij |"];
        let table = parse_table(&lines).unwrap();
        let rendered = render_table(&table, &options);
        assert!(rendered.contains("abcde…"));
        assert!(!rendered.contains("abcdefg"));
    }

    #[test]
    fn min_column_width_applies() {
        let lines = ["| a |", "|---|", "| b |"];
        let table = parse_table(&lines).unwrap();
        let rendered = render_table(&table, &TableOptions::default());
        // min width 3 + padding 1 both sides = 5 fill cells.
        assert!(rendered.starts_with("┌─────┐"));
    }

    #[test]
    fn centered_rendering() {
        let lines = ["| head |", "| :-: |", "| x |"];
        let table = parse_table(&lines).unwrap();
        let rendered = render_table(&table, &TableOptions::default());
        assert!(rendered.contains("│  x   │"));
    }

    // ── Style parsing ───────────────────────────────────────────────────

    #[test]
    fn style_from_str() {
        assert_eq!("unicode".parse::<TableStyle>().unwrap(), TableStyle::Unicode);
        assert_eq!("ASCII".parse::<TableStyle>().unwrap(), TableStyle::Ascii);
        assert_eq!("compact".parse::<TableStyle>().unwrap(), TableStyle::Compact);
    }

    #[test]
    fn unknown_style_names_the_value() {
        let err = "fancy".parse::<TableStyle>().unwrap_err();
        assert!(err.to_string().contains("fancy"));
    }
}
