//! Inline formatting: `**bold**`, `*italic*`, `` `code` `` and `[label](href)`.
//!
//! The formatter walks an immutable input with a byte cursor. At each
//! position the matchers in [`MATCHERS`] are tried in order and the first
//! one that recognises a construct consumes it. Text up to the next trigger
//! character becomes a plain run. A trigger character that no matcher
//! accepts is dropped so that unbalanced markup cannot stall the scan.
//! Table cells keep such characters as literal text instead.

use html_escape::{encode_double_quoted_attribute, encode_text};
use log::trace;

use crate::block::{Inline, InlineRun, LinkAnnotation, Mark};
use crate::config::TableStyle;

/// Characters that may open a formatted construct.
const TRIGGERS: &[char] = &['*', '`', '['];

/// Something a matcher recognised at the cursor.
#[derive(Debug, PartialEq, Eq)]
enum Matched<'a> {
    Marked { text: &'a str, mark: Mark },
    Link { label: &'a str, href: &'a str },
}

/// Returns what was recognised at the start of the input and how many bytes
/// it spans.
type Matcher = fn(&str) -> Option<(Matched<'_>, usize)>;

/// Matchers in priority order. Bold precedes italic so `**x**` is never
/// read as two italic delimiters.
const MATCHERS: [Matcher; 4] = [match_bold, match_italic, match_code, match_link];

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }
}

/// Parse `text` into runs and link annotations.
pub fn parse_inline(text: &str) -> Inline {
    let mut inline = Inline::default();
    parse_inline_into(text, &mut inline);
    inline
}

/// Parse `text` and append the result to `out`.
///
/// New link keys continue the numbering already present in `out`, so a
/// block built from several lines keeps its keys unique.
pub fn parse_inline_into(text: &str, out: &mut Inline) {
    scan(text, out, Unmatched::Drop);
}

/// Parse a table cell. Unmatched triggers stay in the text, so `2 * 3`
/// and `a[i]` survive intact.
pub fn parse_cell(text: &str) -> Inline {
    let mut inline = Inline::default();
    scan(text, &mut inline, Unmatched::Keep);
    inline
}

/// What happens to a trigger character no matcher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unmatched {
    Drop,
    Keep,
}

fn scan(text: &str, out: &mut Inline, unmatched: Unmatched) {
    let mut cursor = Cursor::new(text);

    while !cursor.eof() {
        let rest = cursor.rest();

        if let Some((matched, len)) = MATCHERS.iter().find_map(|matcher| matcher(rest)) {
            push_matched(matched, out);
            cursor.advance(len);
            continue;
        }

        match rest.find(TRIGGERS) {
            Some(0) if unmatched == Unmatched::Drop => {
                trace!("dropping unmatched {:?} at byte {}", &rest[..1], cursor.pos);
                cursor.advance(1);
            }
            Some(0) => {
                // Literal up to the next trigger after this one
                let end = rest[1..].find(TRIGGERS).map_or(rest.len(), |i| i + 1);
                out.runs.push(InlineRun::plain(&rest[..end]));
                cursor.advance(end);
            }
            Some(end) => {
                out.runs.push(InlineRun::plain(&rest[..end]));
                cursor.advance(end);
            }
            None => {
                out.runs.push(InlineRun::plain(rest));
                cursor.advance(rest.len());
            }
        }
    }
}

fn push_matched(matched: Matched<'_>, out: &mut Inline) {
    match matched {
        Matched::Marked { text, mark } => out.runs.push(InlineRun::marked(text, mark)),
        Matched::Link { label, href } => {
            let key = format!("link_{}", out.links.len());
            out.links.push(LinkAnnotation {
                key: key.clone(),
                href: href.to_string(),
            });
            out.runs.push(InlineRun::linked(label, key));
        }
    }
}

/// Match `open inner close` where `inner` is non-empty and free of `stop`.
/// Returns the inner text and the total matched length.
fn delimited<'a>(input: &'a str, open: &str, close: &str, stop: char) -> Option<(&'a str, usize)> {
    let body = input.strip_prefix(open)?;
    let end = body.find(stop)?;
    if end == 0 || !body[end..].starts_with(close) {
        return None;
    }
    Some((&body[..end], open.len() + end + close.len()))
}

fn match_bold(input: &str) -> Option<(Matched<'_>, usize)> {
    let (text, len) = delimited(input, "**", "**", '*')?;
    Some((Matched::Marked { text, mark: Mark::Bold }, len))
}

fn match_italic(input: &str) -> Option<(Matched<'_>, usize)> {
    let (text, len) = delimited(input, "*", "*", '*')?;
    Some((Matched::Marked { text, mark: Mark::Italic }, len))
}

fn match_code(input: &str) -> Option<(Matched<'_>, usize)> {
    let (text, len) = delimited(input, "`", "`", '`')?;
    Some((Matched::Marked { text, mark: Mark::Code }, len))
}

fn match_link(input: &str) -> Option<(Matched<'_>, usize)> {
    let (label, label_len) = delimited(input, "[", "]", ']')?;
    let (href, href_len) = delimited(&input[label_len..], "(", ")", ')')?;
    Some((Matched::Link { label, href }, label_len + href_len))
}

/// Render formatted runs as an HTML fragment, used for table cells.
pub fn render_html(inline: &Inline, style: &TableStyle) -> String {
    let mut out = String::new();

    for run in &inline.runs {
        let mut html = encode_text(&run.text).into_owned();

        for mark in &run.marks {
            html = match mark {
                Mark::Bold => format!("<strong>{html}</strong>"),
                Mark::Italic => format!("<em>{html}</em>"),
                Mark::Code => format!("{}{html}</code>", open_tag("code", &style.code_class, "")),
            };
        }

        if let Some(link) = run.link.as_deref().and_then(|key| inline.link(key)) {
            let attrs = format!(
                " href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\"",
                encode_double_quoted_attribute(&link.href)
            );
            html = format!("{}{html}</a>", open_tag("a", &style.link_class, &attrs));
        }

        out.push_str(&html);
    }

    out
}

/// Opening tag with a class attribute when `class` is non-empty, followed by
/// `attrs` verbatim.
pub(crate) fn open_tag(name: &str, class: &str, attrs: &str) -> String {
    if class.is_empty() {
        format!("<{name}{attrs}>")
    } else {
        format!(
            "<{name} class=\"{}\"{attrs}>",
            encode_double_quoted_attribute(class)
        )
    }
}
