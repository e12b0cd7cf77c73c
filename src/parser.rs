use log::debug;

use crate::block::{Block, Document, Inline};
use crate::config::TableStyle;
use crate::inline::{open_tag, parse_cell, parse_inline, parse_inline_into, render_html};

const FENCE: &str = "```";

/// What a trimmed line opens, in the order the rules are tried.
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Fence { language: &'a str },
    Table,
    Heading { level: u8, text: &'a str },
    List { ordered: bool, text: &'a str },
    Blank,
    Text,
}

fn classify(trimmed: &str) -> LineKind<'_> {
    if let Some(info) = trimmed.strip_prefix(FENCE) {
        return LineKind::Fence {
            language: info.trim(),
        };
    }
    if trimmed.starts_with('|') && trimmed.ends_with('|') {
        return LineKind::Table;
    }
    if let Some((level, text)) = heading(trimmed) {
        return LineKind::Heading { level, text };
    }
    if let Some((ordered, text)) = list_marker(trimmed) {
        return LineKind::List { ordered, text };
    }
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    LineKind::Text
}

/// `#`s followed by whitespace. The level is clamped to 6.
fn heading(trimmed: &str) -> Option<(u8, &str)> {
    let rest = trimmed.trim_start_matches('#');
    let hashes = trimmed.len() - rest.len();
    if hashes == 0 || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((hashes.min(6) as u8, rest.trim_start()))
}

/// `- item` or `12. item`, returning whether the list is numbered.
fn list_marker(trimmed: &str) -> Option<(bool, &str)> {
    if let Some(text) = trimmed.strip_prefix("- ") {
        return Some((false, text.trim_start()));
    }

    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let text = trimmed[digits..].strip_prefix('.')?;
    if !text.starts_with(char::is_whitespace) {
        return None;
    }
    Some((true, text.trim_start()))
}

/// A row made only of pipes, dashes, colons and spaces, with something
/// other than pipes in it.
fn is_delimiter_row(trimmed: &str) -> bool {
    trimmed.chars().any(|c| c != '|')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':') || c.is_whitespace())
}

fn split_cells(trimmed: &str) -> Vec<&str> {
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

/// Parse markdown text into a document using the default table style
pub fn parse(markdown: &str) -> Document {
    parse_with_style(markdown, &TableStyle::default())
}

/// Parse markdown text into a document, rendering tables with `style`
pub fn parse_with_style(markdown: &str, style: &TableStyle) -> Document {
    let mut state = ParseState {
        lines: markdown.lines().collect(),
        pos: 0,
        blocks: Vec::new(),
        style,
    };

    while state.pos < state.lines.len() {
        state.next_block();
    }

    Document::from(state.blocks)
}

struct ParseState<'a> {
    lines: Vec<&'a str>,
    // Index of the next unread line
    pos: usize,
    blocks: Vec<Block>,
    style: &'a TableStyle,
}

impl<'a> ParseState<'a> {
    fn current(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied().map(str::trim)
    }

    fn emit(&mut self, block: Block) {
        debug!("{} block ending before line {}", block.kind(), self.pos + 1);
        self.blocks.push(block);
    }

    fn next_block(&mut self) {
        let Some(trimmed) = self.current() else {
            return;
        };

        match classify(trimmed) {
            LineKind::Fence { language } => self.code_block(language),
            LineKind::Table => self.table(),
            LineKind::Heading { level, text } => {
                self.pos += 1;
                self.emit(Block::Heading {
                    level,
                    content: parse_inline(text),
                });
            }
            LineKind::List { ordered, .. } => self.list(ordered),
            LineKind::Blank => self.pos += 1,
            LineKind::Text => self.paragraph(trimmed),
        }
    }

    fn code_block(&mut self, language: &str) {
        let language = if language.is_empty() { "text" } else { language };
        self.pos += 1;

        let start = self.pos;
        while let Some(trimmed) = self.current() {
            if trimmed.starts_with(FENCE) {
                break;
            }
            self.pos += 1;
        }
        let mut body = &self.lines[start..self.pos];

        // Skip the closing fence, if any
        if self.pos < self.lines.len() {
            self.pos += 1;
        }

        while let [first, rest @ ..] = body
            && first.trim().is_empty()
        {
            body = rest;
        }
        while let [rest @ .., last] = body
            && last.trim().is_empty()
        {
            body = rest;
        }

        let code = body.join("\n");
        self.emit(Block::CodeBlock {
            language: language.to_string(),
            code,
        });
    }

    fn table(&mut self) {
        let mut table = TableBuilder::default();

        while let Some(trimmed) = self.current() {
            if !trimmed.starts_with('|') {
                break;
            }
            self.pos += 1;
            if is_delimiter_row(trimmed) {
                continue;
            }
            let cells = split_cells(trimmed).into_iter().map(parse_cell).collect();
            table.push_row(cells);
        }

        let markup = table.markup(self.style);
        self.emit(Block::Table { markup });
    }

    fn list(&mut self, ordered: bool) {
        let mut content = Inline::default();

        while let Some(trimmed) = self.current() {
            match classify(trimmed) {
                LineKind::List { ordered: kind, text } if kind == ordered => {
                    parse_inline_into(text, &mut content);
                    self.pos += 1;
                }
                _ => break,
            }
        }

        self.emit(Block::ListItem { ordered, content });
    }

    fn paragraph(&mut self, first: &str) {
        let mut text = first.to_string();
        self.pos += 1;

        while let Some(trimmed) = self.current() {
            if classify(trimmed) != LineKind::Text {
                break;
            }
            text.push(' ');
            text.push_str(trimmed);
            self.pos += 1;
        }

        self.emit(Block::Paragraph {
            content: parse_inline(&text),
        });
    }
}

/// Rows of a table, rendered only once the whole table is read.
#[derive(Default)]
struct TableBuilder {
    header: Option<Vec<Inline>>,
    rows: Vec<Vec<Inline>>,
}

impl TableBuilder {
    fn push_row(&mut self, cells: Vec<Inline>) {
        if self.header.is_none() {
            self.header = Some(cells);
        } else {
            self.rows.push(cells);
        }
    }

    fn markup(&self, style: &TableStyle) -> String {
        let mut out = open_tag("table", &style.class, "");

        if let Some(header) = &self.header {
            out.push_str("<thead><tr>");
            for cell in header {
                out.push_str(&open_tag("th", &style.header_cell_class, ""));
                out.push_str(&render_html(cell, style));
                out.push_str("</th>");
            }
            out.push_str("</tr></thead>");
        }

        out.push_str("<tbody>");
        for row in &self.rows {
            out.push_str("<tr>");
            for cell in row {
                out.push_str(&open_tag("td", &style.body_cell_class, ""));
                out.push_str(&render_html(cell, style));
                out.push_str("</td>");
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table>");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{InlineRun, Mark};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn unstyled(markdown: &str) -> Vec<Block> {
        parse_with_style(markdown, &TableStyle::unstyled()).blocks
    }

    fn text_of(block: &Block) -> String {
        block.content().map(Inline::text).unwrap_or_default()
    }

    #[test]
    fn empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn heading() {
        let blocks = parse("# Hello **world**");
        assert_eq!(
            blocks.blocks,
            vec![Block::Heading {
                level: 1,
                content: Inline {
                    runs: vec![InlineRun::plain("Hello "), InlineRun::marked("world", Mark::Bold)],
                    links: vec![],
                },
            }]
        );
    }

    #[rstest]
    #[case("## two", 2)]
    #[case("###### six", 6)]
    #[case("######## eight", 6)]
    #[case("   ### indented", 3)]
    fn heading_levels(#[case] input: &str, #[case] level: u8) {
        match &parse(input).blocks[..] {
            [Block::Heading { level: parsed, .. }] => assert_eq!(*parsed, level),
            other => panic!("expected one heading, got {other:?}"),
        }
    }

    #[rstest]
    #[case("#hashtag")]
    #[case("#")]
    #[case("#   ")]
    fn hash_without_space_is_paragraph(#[case] input: &str) {
        let blocks = parse(input);
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks.blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn hashtag_line_continues_into_paragraph() {
        let blocks = parse("#tag\nmore text");
        assert_eq!(blocks.len(), 1);
        assert_eq!(text_of(&blocks.blocks[0]), "#tag more text");
    }

    #[test]
    fn paragraph_lines_are_joined() {
        let blocks = parse("first line\n  second line\nthird\n\nnext paragraph");
        let texts: Vec<_> = blocks.iter().map(text_of).collect();
        assert_eq!(texts, vec!["first line second line third", "next paragraph"]);
    }

    #[test]
    fn paragraph_stops_at_block_start() {
        let blocks = parse("intro\n# Title\ntext\n- item\nafter\n```\ncode\n```");
        let kinds: Vec<_> = blocks.iter().map(Block::kind).collect();
        assert_eq!(
            kinds,
            vec!["paragraph", "heading", "paragraph", "list", "paragraph", "code"]
        );
    }

    #[test]
    fn code_fence() {
        assert_eq!(
            parse("```js\nconst x = 1;\n```").blocks,
            vec![Block::CodeBlock {
                language: "js".to_string(),
                code: "const x = 1;".to_string(),
            }]
        );
    }

    #[test]
    fn code_fence_keeps_content_verbatim() {
        let blocks = parse("```rust\n\nfn main() {\n    let a = **b**;\n}\n\n```\nafter");
        assert_eq!(
            blocks.blocks[0],
            Block::CodeBlock {
                language: "rust".to_string(),
                code: "fn main() {\n    let a = **b**;\n}".to_string(),
            }
        );
        assert_eq!(text_of(&blocks.blocks[1]), "after");
    }

    #[test]
    fn code_fence_without_language() {
        assert_eq!(
            parse("```\nplain\n```").blocks,
            vec![Block::CodeBlock {
                language: "text".to_string(),
                code: "plain".to_string(),
            }]
        );
    }

    #[test]
    fn empty_code_fence() {
        assert_eq!(
            parse("```py\n```").blocks,
            vec![Block::CodeBlock {
                language: "py".to_string(),
                code: String::new(),
            }]
        );
    }

    #[test]
    fn unterminated_code_fence_runs_to_end() {
        assert_eq!(
            parse("```sh\necho hi\n# not a heading").blocks,
            vec![Block::CodeBlock {
                language: "sh".to_string(),
                code: "echo hi\n# not a heading".to_string(),
            }]
        );
    }

    #[test]
    fn list_grouping_splits_on_kind_change() {
        assert_eq!(
            parse("- a\n- b\n1. c").blocks,
            vec![
                Block::ListItem {
                    ordered: false,
                    content: Inline {
                        runs: vec![InlineRun::plain("a"), InlineRun::plain("b")],
                        links: vec![],
                    },
                },
                Block::ListItem {
                    ordered: true,
                    content: Inline {
                        runs: vec![InlineRun::plain("c")],
                        links: vec![],
                    },
                },
            ]
        );
    }

    #[test]
    fn numbered_list_markers_are_stripped() {
        let blocks = parse("1. one\n2. two\n10. ten");
        assert_eq!(blocks.len(), 1);
        let Block::ListItem { ordered, content } = &blocks.blocks[0] else {
            panic!("expected list");
        };
        assert!(ordered);
        assert_eq!(content.text(), "onetwoten");
    }

    #[test]
    fn list_links_keep_unique_keys_across_lines() {
        let blocks = parse("- [a](u1)\n- [b](u2)");
        let content = blocks.blocks[0].content().unwrap();
        let keys: Vec<_> = content.links.iter().map(|link| link.key.clone()).collect();
        assert_eq!(keys, vec!["link_0", "link_1"]);
        assert_eq!(content.runs[1].link.as_deref(), Some("link_1"));
    }

    #[rstest]
    #[case("-item")]
    #[case("1.item")]
    #[case("1)")]
    fn list_markers_need_whitespace(#[case] input: &str) {
        assert!(matches!(parse(input).blocks[..], [Block::Paragraph { .. }]));
    }

    #[test]
    fn blank_line_ends_list() {
        let kinds: Vec<_> = parse("- a\n\n- b").iter().map(Block::kind).collect();
        assert_eq!(kinds, vec!["list", "list"]);
    }

    #[test]
    fn table_shape() {
        let blocks = unstyled("| A | B |\n|---|---|\n| 1 | 2 |");
        assert_eq!(
            blocks,
            vec![Block::Table {
                markup: "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
                         <tbody><tr><td>1</td><td>2</td></tr></tbody></table>"
                    .to_string(),
            }]
        );
    }

    #[rstest]
    #[case("| A | B |\n| :-- | --: |\n| 1 | 2 |\n| 3 | 4 |", 3)]
    #[case("| A |\n|:|\n| 1 |", 2)]
    #[case("| A |\n| :--: |\n| 1 |", 2)]
    #[case("| A |\n| :: |\n| 1 |", 2)]
    #[case("| A |\n|   |\n| 1 |", 2)]
    #[case("| A | B |\n|---|---|\n| 1 | 2 |", 2)]
    fn table_row_counts(#[case] input: &str, #[case] rows: usize) {
        let blocks = unstyled(input);
        let Block::Table { markup } = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(markup.matches("<thead>").count(), 1);
        assert_eq!(markup.matches("<tr>").count(), rows);
        assert!(markup.contains("<td>1</td>"));
    }

    #[rstest]
    #[case("|---|", true)]
    #[case("| :--- | ---: |", true)]
    #[case("|:|", true)]
    #[case("|   |", true)]
    #[case("|", false)]
    #[case("||", false)]
    #[case("| - a |", false)]
    fn delimiter_rows(#[case] row: &str, #[case] expected: bool) {
        assert_eq!(is_delimiter_row(row), expected);
    }

    #[rstest]
    #[case("| 2 * 3 |", "<td>2 * 3</td>")]
    #[case("| *ptr |", "<td>*ptr</td>")]
    #[case("| a[i] |", "<td>a[i]</td>")]
    #[case("| `x |", "<td>`x</td>")]
    #[case("| **b** * 2 |", "<td><strong>b</strong> * 2</td>")]
    fn table_cells_keep_stray_delimiters(#[case] row: &str, #[case] cell: &str) {
        let blocks = unstyled(&format!("| x |\n|---|\n{row}"));
        let Block::Table { markup } = &blocks[0] else {
            panic!("expected table");
        };
        assert!(markup.contains(cell), "{markup}");
    }

    #[test]
    fn table_header_only() {
        assert_eq!(
            unstyled("| A |\n|---|"),
            vec![Block::Table {
                markup: "<table><thead><tr><th>A</th></tr></thead><tbody></tbody></table>".to_string(),
            }]
        );
    }

    #[test]
    fn table_of_delimiters_is_still_balanced() {
        assert_eq!(
            unstyled("|---|"),
            vec![Block::Table {
                markup: "<table><tbody></tbody></table>".to_string(),
            }]
        );
    }

    #[test]
    fn table_cells_are_formatted_and_escaped() {
        let blocks = unstyled("| **Name** | `a<b` |\n|---|---|\n| [x](http://x.y) | *i* |");
        let Block::Table { markup } = &blocks[0] else {
            panic!("expected table");
        };
        assert!(markup.contains("<th><strong>Name</strong></th>"));
        assert!(markup.contains("<th><code>a&lt;b</code></th>"));
        assert!(markup.contains(
            "<td><a href=\"http://x.y\" target=\"_blank\" rel=\"noopener noreferrer\">x</a></td>"
        ));
        assert!(markup.contains("<td><em>i</em></td>"));
    }

    #[test]
    fn styled_table_uses_classes() {
        let style = TableStyle::default();
        let blocks = parse("| A |\n|---|\n| 1 |");
        let Block::Table { markup } = &blocks.blocks[0] else {
            panic!("expected table");
        };
        assert!(markup.starts_with(&format!("<table class=\"{}\">", style.class)));
        assert!(markup.contains(&format!("<th class=\"{}\">A</th>", style.header_cell_class)));
        assert!(markup.contains(&format!("<td class=\"{}\">1</td>", style.body_cell_class)));
    }

    #[test]
    fn table_ends_at_non_pipe_line() {
        let blocks = unstyled("| A |\n| 1 |\n| 2\nafter");
        assert_eq!(blocks.len(), 2);
        let Block::Table { markup } = &blocks[0] else {
            panic!("expected table");
        };
        assert!(markup.contains("<td>2</td>"));
        assert_eq!(text_of(&blocks[1]), "after");
    }

    #[test]
    fn table_is_deterministic() {
        let md = "| [a](u) | b |\n|---|---|\n| c | d |";
        assert_eq!(parse(md), parse(md));
    }

    #[test]
    fn pipe_line_not_ending_in_pipe_is_text() {
        let blocks = parse("| not a table");
        assert!(matches!(blocks.blocks[..], [Block::Paragraph { .. }]));
    }

    #[test]
    fn mixed_document() {
        let md = "# Title\n\nIntro with [a link](https://example.com).\n\n## Steps\n\n1. first\n2. **second**\n\n```bash\nls -la\n```\n\n| K | V |\n|---|---|\n| a | b |\n\nDone.";
        let kinds: Vec<_> = parse(md).iter().map(Block::kind).collect();
        assert_eq!(
            kinds,
            vec!["heading", "paragraph", "heading", "list", "code", "table", "paragraph"]
        );
    }

    #[test]
    fn crlf_line_endings() {
        let kinds: Vec<_> = parse("# T\r\n\r\ntext\r\n").iter().map(Block::kind).collect();
        assert_eq!(kinds, vec!["heading", "paragraph"]);
    }
}
