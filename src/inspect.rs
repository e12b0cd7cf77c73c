use crate::block::{Block, Document};

const PREVIEW_CHARS: usize = 50;

/// One line per block: index, style, counts and a text preview.
pub fn summarize(document: &Document) -> Vec<String> {
    document
        .iter()
        .enumerate()
        .map(|(i, block)| format!("{i:>3}  {}", describe(block)))
        .collect()
}

fn describe(block: &Block) -> String {
    match block {
        Block::Paragraph { .. } | Block::Heading { .. } | Block::ListItem { .. } => {
            let style = match block {
                Block::Heading { level, .. } => format!("h{level}"),
                Block::ListItem { ordered: true, .. } => "number".to_string(),
                Block::ListItem { ordered: false, .. } => "bullet".to_string(),
                _ => "normal".to_string(),
            };
            let content = block.content().cloned().unwrap_or_default();
            format!(
                "{style:<7} runs={} links={}  {:?}",
                content.runs.len(),
                content.links.len(),
                preview(&content.text())
            )
        }
        Block::CodeBlock { language, code } => {
            format!("{:<7} lang={language} lines={}", "code", code.lines().count())
        }
        Block::Table { markup } => format!(
            "{:<7} rows={} bytes={}",
            "table",
            markup.matches("<tr>").count(),
            markup.len()
        ),
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(PREVIEW_CHARS).collect();
    short.push('…');
    short
}
