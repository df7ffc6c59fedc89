//! Post data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parser::{extract_hashtags, normalize_hashtag, parse_twitter_timestamp};

/// A scraped hashtag post.
///
/// Field names follow the flattened tweet JSON the scraper writes, so dumps
/// deserialize directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    /// Tweet ID.
    pub id: String,
    /// Full post text.
    pub text: String,
    /// Raw Twitter timestamp, e.g. `Sun Apr 27 02:30:12 +0000 2025`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Hashtags as tagged by the platform, without `#`.
    pub tagged_hashtags: Vec<String>,
    pub tagged_users: Vec<String>,
    pub attached_urls: Vec<String>,
    pub attached_media: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retweet_count: Option<u64>,
    /// View count; the platform reports it as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PostUser>,
}

impl Post {
    /// Create a post with minimal required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// When the post was made. Missing or malformed timestamps read as now.
    pub fn posted_at(&self) -> DateTime<Utc> {
        match &self.created_at {
            Some(raw) => parse_twitter_timestamp(raw),
            None => Utc::now(),
        }
    }

    /// Normalized hashtags: the tagged list, or those found in the text when
    /// the list is empty. Duplicates removed, first occurrence kept.
    pub fn hashtags(&self) -> Vec<String> {
        let raw = if self.tagged_hashtags.is_empty() {
            extract_hashtags(&self.text)
        } else {
            self.tagged_hashtags.clone()
        };

        let mut hashtags: Vec<String> = Vec::with_capacity(raw.len());
        for tag in raw {
            let tag = normalize_hashtag(&tag);
            if !tag.is_empty() && !hashtags.contains(&tag) {
                hashtags.push(tag);
            }
        }
        hashtags
    }
}

/// Author profile attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Handle, without `@`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friends_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

impl PostUser {
    /// Handle with `@` prefix, if known.
    #[must_use]
    pub fn at_handle(&self) -> Option<String> {
        self.screen_name.as_ref().map(|h| format!("@{h}"))
    }
}
