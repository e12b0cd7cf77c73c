use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PostError;
use crate::portable_text::PortableBlock;

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").unwrap());
static NON_TAG_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// A post as written in the input JSON file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: Option<String>,
    pub slug: Option<String>,
}

/// A post that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Markdown source.
    pub content: String,
    pub tags: Vec<String>,
    pub published_at: Option<String>,
}

impl PostInput {
    pub fn from_file(path: &Path) -> Result<Self, PostError> {
        if !path.exists() {
            return Err(PostError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path).map_err(|source| PostError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| PostError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(self) -> Result<Post, PostError> {
        let title = non_empty(self.title).ok_or(PostError::MissingField("title"))?;
        let content = non_empty(self.content).ok_or(PostError::MissingField("content"))?;

        let slug = match non_empty(self.slug) {
            Some(slug) => slug,
            None => generate_slug(&title),
        };
        if slug.is_empty() {
            return Err(PostError::EmptySlug(title));
        }

        let published_at = non_empty(self.published_at);
        if let Some(value) = &published_at {
            DateTime::parse_from_rfc3339(value).map_err(|source| PostError::InvalidDate {
                value: value.clone(),
                source,
            })?;
        }

        Ok(Post {
            title,
            slug,
            excerpt: self.excerpt.unwrap_or_default(),
            content,
            tags: self.tags,
            published_at,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// URL slug for a post title.
pub fn generate_slug(title: &str) -> String {
    let lower = title.to_lowercase();
    let kept = NON_SLUG_CHARS.replace_all(&lower, "");
    let dashed = WHITESPACE.replace_all(&kept, "-");
    let collapsed = DASHES.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

/// URL slug for a tag name.
pub fn tag_slug(name: &str) -> String {
    let lower = name.to_lowercase();
    let dashed = WHITESPACE.replace_all(&lower, "-");
    NON_TAG_SLUG_CHARS.replace_all(&dashed, "").into_owned()
}

/// ISO 8601 timestamp in the form the store writes, e.g. `2024-02-05T12:00:00.000Z`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slug {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub current: String,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            kind: "slug",
            current: current.into(),
        }
    }
}

/// Reference to another document, as stored in an array field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_ref")]
    pub target: String,
}

impl Reference {
    pub fn new(key: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: "reference",
            key: key.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub name: String,
    pub slug: Slug,
}

impl TagRecord {
    pub fn new(name: &str) -> Self {
        Self {
            kind: "tag",
            name: name.to_string(),
            slug: Slug::new(tag_slug(name)),
        }
    }
}

/// The blog post document sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub title: String,
    pub slug: Slug,
    pub excerpt: String,
    pub published_at: String,
    pub content: Vec<PortableBlock>,
    pub tags: Vec<Reference>,
}

impl BlogPost {
    pub fn new(
        post: &Post,
        content: Vec<PortableBlock>,
        tags: Vec<Reference>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: "blogPost",
            title: post.title.clone(),
            slug: Slug::new(post.slug.as_str()),
            excerpt: post.excerpt.clone(),
            published_at: post.published_at.clone().unwrap_or_else(|| timestamp(now)),
            content,
            tags,
        }
    }
}
