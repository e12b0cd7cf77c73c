use serde::Serialize;

/// Formatting applied to an inline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Code,
}

/// A hyperlink target referenced by runs of the owning block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkAnnotation {
    pub key: String,
    pub href: String,
}

/// A span of literal text with its formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineRun {
    pub text: String,
    pub marks: Vec<Mark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
            link: None,
        }
    }

    pub fn marked(text: impl Into<String>, mark: Mark) -> Self {
        Self {
            text: text.into(),
            marks: vec![mark],
            link: None,
        }
    }

    pub fn linked(text: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
            link: Some(key.into()),
        }
    }

    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks.contains(&mark)
    }
}

/// Formatted text content of a block, together with the link annotations
/// its runs refer to. Link keys are unique within one `Inline`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inline {
    pub runs: Vec<InlineRun>,
    pub links: Vec<LinkAnnotation>,
}

impl Inline {
    /// Plain text of all runs, without formatting.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn link(&self, key: &str) -> Option<&LinkAnnotation> {
        self.links.iter().find(|link| link.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Block-level elements parsed from Markdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Inline,
    },
    Heading {
        level: u8,
        content: Inline,
    },
    /// A contiguous group of list lines of the same kind.
    ListItem {
        ordered: bool,
        content: Inline,
    },
    CodeBlock {
        language: String,
        code: String,
    },
    /// A table rendered to a self-contained HTML fragment.
    Table {
        markup: String,
    },
}

impl Block {
    /// Inline content for text-bearing blocks.
    pub fn content(&self) -> Option<&Inline> {
        match self {
            Block::Paragraph { content }
            | Block::Heading { content, .. }
            | Block::ListItem { content, .. } => Some(content),
            Block::CodeBlock { .. } | Block::Table { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph { .. } => "paragraph",
            Block::Heading { .. } => "heading",
            Block::ListItem { .. } => "list",
            Block::CodeBlock { .. } => "code",
            Block::Table { .. } => "table",
        }
    }
}

/// Blocks of a converted document in reading order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl From<Vec<Block>> for Document {
    fn from(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}
