mod block;
mod config;
mod error;
mod inline;
mod inspect;
mod parser;
mod portable_text;
mod post;
mod publish;
mod store;

pub use block::{Block, Document, Inline, InlineRun, LinkAnnotation, Mark};
pub use config::{Config, StoreConfig, TableStyle};
pub use error::{ConfigError, PostError, StoreError};
pub use inline::{parse_cell, parse_inline, parse_inline_into, render_html};
pub use inspect::summarize;
pub use portable_text::{KeyGen, MarkDef, PortableBlock, PortableSpan, TextBlock, to_portable_text};
pub use post::{BlogPost, Post, PostInput, Reference, Slug, TagRecord, generate_slug, tag_slug};
pub use publish::{Outcome, PublishReport, build_record, publish, resolve_tags};
pub use store::{ContentStore, MemoryStore, SanityStore};

/// Parse markdown text into a document.
pub fn parse_blocks(markdown: &str) -> Document {
    parser::parse(markdown)
}

/// Parse markdown text into a document with custom table classes.
pub fn parse_blocks_with_style(markdown: &str, style: &TableStyle) -> Document {
    parser::parse_with_style(markdown, style)
}

/// Convert markdown to portable blocks using the default table style.
pub fn markdown_to_portable_text(markdown: &str) -> Vec<PortableBlock> {
    to_portable_text(&parse_blocks(markdown))
}

/// Convert markdown to portable blocks with custom table classes.
pub fn markdown_to_portable_text_with_style(markdown: &str, style: &TableStyle) -> Vec<PortableBlock> {
    to_portable_text(&parse_blocks_with_style(markdown, style))
}
