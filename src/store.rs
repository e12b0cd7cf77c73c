//! Persistence of tags and blog posts.
//!
//! [`ContentStore`] is the seam between conversion and the hosted CMS.
//! [`SanityStore`] talks to the CMS over HTTP; [`MemoryStore`] keeps
//! everything in process for dry runs and tests.

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::StoreConfig;
use crate::error::{ConfigError, StoreError};
use crate::post::{BlogPost, TagRecord};

pub trait ContentStore {
    /// Id of the tag with this exact name.
    fn find_tag(&self, name: &str) -> Result<Option<String>, StoreError>;

    fn create_tag(&mut self, tag: &TagRecord) -> Result<String, StoreError>;

    /// Id of the blog post with this slug.
    fn find_post(&self, slug: &str) -> Result<Option<String>, StoreError>;

    fn create_post(&mut self, post: &BlogPost) -> Result<String, StoreError>;

    fn update_post(&mut self, id: &str, post: &BlogPost) -> Result<(), StoreError>;
}

/// In-process store with sequential ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tags: Vec<(String, TagRecord)>,
    posts: Vec<(String, BlogPost)>,
    next_id: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, id: &str) -> Option<&BlogPost> {
        self.posts
            .iter()
            .find(|(post_id, _)| post_id == id)
            .map(|(_, post)| post)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &TagRecord)> {
        self.tags.iter().map(|(id, tag)| (id.as_str(), tag))
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    fn mint_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

impl ContentStore for MemoryStore {
    fn find_tag(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .tags
            .iter()
            .find(|(_, tag)| tag.name == name)
            .map(|(id, _)| id.clone()))
    }

    fn create_tag(&mut self, tag: &TagRecord) -> Result<String, StoreError> {
        if self.find_tag(&tag.name)?.is_some() {
            return Err(StoreError::Conflict(tag.name.clone()));
        }
        let id = self.mint_id("tag");
        self.tags.push((id.clone(), tag.clone()));
        Ok(id)
    }

    fn find_post(&self, slug: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .posts
            .iter()
            .find(|(_, post)| post.slug.current == slug)
            .map(|(id, _)| id.clone()))
    }

    fn create_post(&mut self, post: &BlogPost) -> Result<String, StoreError> {
        if self.find_post(&post.slug.current)?.is_some() {
            return Err(StoreError::Conflict(post.slug.current.clone()));
        }
        let id = self.mint_id("post");
        self.posts.push((id.clone(), post.clone()));
        Ok(id)
    }

    fn update_post(&mut self, id: &str, post: &BlogPost) -> Result<(), StoreError> {
        let (_, stored) = self
            .posts
            .iter_mut()
            .find(|(post_id, _)| post_id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        *stored = post.clone();
        Ok(())
    }
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct MutateResponse {
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    id: String,
}

/// Store backed by the Sanity HTTP API.
pub struct SanityStore {
    agent: ureq::Agent,
    base_url: String,
    dataset: String,
    authorization: String,
}

impl SanityStore {
    pub fn new(config: &StoreConfig) -> Result<Self, ConfigError> {
        let project_id = config
            .project_id
            .as_deref()
            .ok_or(ConfigError::MissingSetting("project_id"))?;
        let token = config
            .token
            .as_deref()
            .ok_or(ConfigError::MissingSetting("token"))?;

        Ok(Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: format!(
                "https://{project_id}.api.sanity.io/v{}/data",
                config.api_version
            ),
            dataset: config.dataset.clone(),
            authorization: format!("Bearer {token}"),
        })
    }

    fn query<T: DeserializeOwned>(&self, groq: &str, params: &[(&str, &str)]) -> Result<T, StoreError> {
        let url = format!("{}/query/{}", self.base_url, self.dataset);
        let mut request = self
            .agent
            .get(url.as_str())
            .header("Authorization", self.authorization.as_str())
            .query("query", groq);
        for (name, value) in params {
            request = request.query(format!("${name}"), serde_json::to_string(value)?);
        }

        debug!("query {groq}");
        let response: QueryResponse<T> = request.call()?.body_mut().read_json()?;
        Ok(response.result)
    }

    fn mutate(&self, mutation: Value) -> Result<String, StoreError> {
        let url = format!("{}/mutate/{}", self.base_url, self.dataset);
        let body = json!({ "mutations": [mutation] });

        let response: MutateResponse = self
            .agent
            .post(url.as_str())
            .header("Authorization", self.authorization.as_str())
            .query("returnIds", "true")
            .send_json(&body)?
            .body_mut()
            .read_json()?;

        response
            .results
            .into_iter()
            .next()
            .map(|result| result.id)
            .ok_or_else(|| StoreError::Response("mutation returned no results".to_string()))
    }
}

impl ContentStore for SanityStore {
    fn find_tag(&self, name: &str) -> Result<Option<String>, StoreError> {
        self.query(
            r#"*[_type == "tag" && name == $name][0]._id"#,
            &[("name", name)],
        )
    }

    fn create_tag(&mut self, tag: &TagRecord) -> Result<String, StoreError> {
        self.mutate(json!({ "create": tag }))
    }

    fn find_post(&self, slug: &str) -> Result<Option<String>, StoreError> {
        self.query(
            r#"*[_type == "blogPost" && slug.current == $slug][0]._id"#,
            &[("slug", slug)],
        )
    }

    fn create_post(&mut self, post: &BlogPost) -> Result<String, StoreError> {
        self.mutate(json!({ "create": post }))
    }

    fn update_post(&mut self, id: &str, post: &BlogPost) -> Result<(), StoreError> {
        let mut fields = serde_json::to_value(post)?;
        if let Value::Object(map) = &mut fields {
            map.remove("_type");
        }
        self.mutate(json!({ "patch": { "id": id, "set": fields } }))?;
        Ok(())
    }
}
