use std::fmt;

use chrono::{DateTime, Utc};
use log::info;

use crate::config::TableStyle;
use crate::error::StoreError;
use crate::parser::parse_with_style;
use crate::portable_text::{KeyGen, to_portable_text};
use crate::post::{BlogPost, Post, Reference, TagRecord};
use crate::store::ContentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => f.write_str("created"),
            Outcome::Updated => f.write_str("updated"),
        }
    }
}

/// Identifying fields of a published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub outcome: Outcome,
    pub id: String,
    pub title: String,
    pub slug: String,
}

/// Reference each tag by name, creating the ones the store does not have.
pub fn resolve_tags<S: ContentStore + ?Sized>(
    store: &mut S,
    names: &[String],
) -> Result<Vec<Reference>, StoreError> {
    let mut keys = KeyGen::default();
    let mut refs = Vec::with_capacity(names.len());

    for name in names {
        let id = match store.find_tag(name)? {
            Some(id) => id,
            None => {
                let id = store.create_tag(&TagRecord::new(name))?;
                info!("created tag {name:?} ({id})");
                id
            }
        };
        refs.push(Reference::new(keys.next_key(), id));
    }

    Ok(refs)
}

/// Convert the post's markdown and build the record the store receives.
pub fn build_record<S: ContentStore + ?Sized>(
    store: &mut S,
    post: &Post,
    style: &TableStyle,
    now: DateTime<Utc>,
) -> Result<BlogPost, StoreError> {
    let document = parse_with_style(&post.content, style);
    info!("converted {:?} into {} blocks", post.title, document.len());

    let tags = if post.tags.is_empty() {
        Vec::new()
    } else {
        resolve_tags(store, &post.tags)?
    };

    Ok(BlogPost::new(post, to_portable_text(&document), tags, now))
}

/// Create the post, or update the existing post with the same slug.
pub fn publish<S: ContentStore + ?Sized>(
    store: &mut S,
    post: &Post,
    style: &TableStyle,
    now: DateTime<Utc>,
) -> Result<PublishReport, StoreError> {
    let record = build_record(store, post, style, now)?;

    let (outcome, id) = match store.find_post(&post.slug)? {
        Some(id) => {
            info!("updating existing post {id}");
            store.update_post(&id, &record)?;
            (Outcome::Updated, id)
        }
        None => {
            info!("creating new post {:?}", post.slug);
            (Outcome::Created, store.create_post(&record)?)
        }
    };

    Ok(PublishReport {
        outcome,
        id,
        title: record.title,
        slug: record.slug.current,
    })
}
