use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// A single article as served by the tag items endpoint.
///
/// Only the fields the list view reads are modelled; everything else in the
/// upstream payload is ignored by serde.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub tags: Vec<PostTag>,
    pub user: Author,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostTag {
    pub name: String,
}

/// Author block embedded in every post.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub items_count: u64,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

impl Post {
    /// Comma-separated tag names, in the order the API lists them.
    pub fn tag_names(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
