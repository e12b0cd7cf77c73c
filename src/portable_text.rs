use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::block::{Block, Document, Inline, InlineRun, Mark};

/// A block in the store's portable block-tree format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_type")]
pub enum PortableBlock {
    #[serde(rename = "block")]
    Text(TextBlock),
    #[serde(rename = "code")]
    Code {
        #[serde(rename = "_key")]
        key: String,
        language: String,
        code: String,
    },
    #[serde(rename = "table")]
    Table {
        #[serde(rename = "_key")]
        key: String,
        html: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(rename = "_key")]
    pub key: String,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_item: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub children: Vec<PortableSpan>,
    pub mark_defs: Vec<MarkDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortableSpan {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    #[serde(rename = "_key")]
    pub key: String,
    pub text: String,
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkDef {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    #[serde(rename = "_key")]
    pub key: String,
    pub href: String,
}

/// Random `_key` values, never repeated within one generator.
#[derive(Default)]
pub struct KeyGen {
    issued: HashSet<String>,
}

impl KeyGen {
    pub fn next_key(&mut self) -> String {
        loop {
            let key = Uuid::new_v4().simple().to_string()[..12].to_string();
            if self.issued.insert(key.clone()) {
                return key;
            }
        }
    }
}

/// Convert a document into portable blocks with fresh keys
pub fn to_portable_text(document: &Document) -> Vec<PortableBlock> {
    let mut keys = KeyGen::default();
    document
        .iter()
        .map(|block| block_to_portable(block, &mut keys))
        .collect()
}

fn block_to_portable(block: &Block, keys: &mut KeyGen) -> PortableBlock {
    match block {
        Block::Paragraph { content } => text_block(content, "normal".to_string(), None, keys),
        Block::Heading { level, content } => {
            text_block(content, format!("h{}", (*level).clamp(1, 6)), None, keys)
        }
        Block::ListItem { ordered, content } => {
            let list_item = if *ordered { "number" } else { "bullet" };
            text_block(content, "normal".to_string(), Some(list_item), keys)
        }
        Block::CodeBlock { language, code } => PortableBlock::Code {
            key: keys.next_key(),
            language: language.clone(),
            code: code.clone(),
        },
        Block::Table { markup } => PortableBlock::Table {
            key: keys.next_key(),
            html: markup.clone(),
        },
    }
}

fn text_block(
    content: &Inline,
    style: String,
    list_item: Option<&'static str>,
    keys: &mut KeyGen,
) -> PortableBlock {
    PortableBlock::Text(TextBlock {
        key: keys.next_key(),
        style,
        list_item,
        level: list_item.map(|_| 1),
        children: content
            .runs
            .iter()
            .map(|run| span_to_portable(run, keys))
            .collect(),
        mark_defs: content
            .links
            .iter()
            .map(|link| MarkDef {
                kind: "link",
                key: link.key.clone(),
                href: link.href.clone(),
            })
            .collect(),
    })
}

fn span_to_portable(run: &InlineRun, keys: &mut KeyGen) -> PortableSpan {
    let mut marks: Vec<String> = run
        .marks
        .iter()
        .map(|mark| mark_name(*mark).to_string())
        .collect();
    marks.extend(run.link.iter().cloned());

    PortableSpan {
        kind: "span",
        key: keys.next_key(),
        text: run.text.clone(),
        marks,
    }
}

fn mark_name(mark: Mark) -> &'static str {
    match mark {
        Mark::Bold => "strong",
        Mark::Italic => "em",
        Mark::Code => "code",
    }
}
