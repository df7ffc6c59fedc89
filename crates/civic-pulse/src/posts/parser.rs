//! Parsing scraped tweet JSON into [`Post`]s.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use super::types::{Post, PostUser};

/// Twitter's `created_at` layout.
pub const TWITTER_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid regex"));

/// Entry lists in the two timeline shapes the scraper captures.
const TIMELINE_ENTRY_PATHS: [&str; 2] = [
    "/data/search_by_raw_query/search_timeline/timeline/instructions",
    "/data/threaded_conversation_with_injections_v2/instructions",
];

/// Parser for raw tweet payloads and hashtag dumps.
pub struct PostParser;

impl PostParser {
    /// Flatten one GraphQL tweet result.
    ///
    /// Returns `None` when the payload has no text.
    pub fn parse_tweet(data: &Value) -> Option<Post> {
        let legacy = data.get("legacy")?;
        let text = legacy.get("full_text").and_then(Value::as_str)?;

        let post = Post {
            id: str_at(legacy, "/id_str").unwrap_or_default(),
            text: text.to_string(),
            created_at: str_at(legacy, "/created_at"),
            tagged_hashtags: collect_strings(legacy, "/entities/hashtags", "text"),
            tagged_users: collect_strings(legacy, "/entities/user_mentions", "screen_name"),
            attached_urls: collect_strings(legacy, "/entities/urls", "expanded_url"),
            attached_media: collect_strings(legacy, "/entities/media", "media_url_https"),
            language: str_at(legacy, "/lang"),
            user_id: str_at(legacy, "/user_id_str"),
            conversation_id: str_at(legacy, "/conversation_id_str"),
            favorite_count: legacy.pointer("/favorite_count").and_then(Value::as_u64),
            reply_count: legacy.pointer("/reply_count").and_then(Value::as_u64),
            retweet_count: legacy.pointer("/retweet_count").and_then(Value::as_u64),
            views: str_at(data, "/views/count"),
            user: data
                .pointer("/core/user_results/result/legacy")
                .filter(|u| u.is_object())
                .map(parse_user),
        };
        Some(post)
    }

    /// Extract posts from a captured search or conversation timeline response.
    ///
    /// Only `tweet` entries are considered; posts are deduplicated by ID.
    pub fn parse_timeline(response: &Value) -> Vec<Post> {
        let Some(instructions) = TIMELINE_ENTRY_PATHS
            .iter()
            .find_map(|path| response.pointer(path).and_then(Value::as_array))
        else {
            tracing::debug!("Response has no timeline instructions");
            return Vec::new();
        };

        let mut posts: Vec<Post> = Vec::new();
        let entries = instructions
            .iter()
            .filter_map(|i| i.get("entries").and_then(Value::as_array))
            .flatten();

        for entry in entries {
            let entry_id = entry.get("entryId").and_then(Value::as_str).unwrap_or_default();
            if !entry_id.contains("tweet") {
                continue;
            }
            let Some(result) = entry.pointer("/content/itemContent/tweet_results/result") else {
                continue;
            };
            let Some(post) = Self::parse_tweet(result) else {
                tracing::debug!(entry_id, "Tweet entry has no text, skipping");
                continue;
            };
            if !post.id.is_empty() && posts.iter().any(|p| p.id == post.id) {
                continue;
            }
            posts.push(post);
        }

        tracing::debug!(count = posts.len(), "Parsed posts from timeline");
        posts
    }

    /// Load a hashtag dump: a JSON object of hashtag to post list.
    pub fn load_dump(path: &Path) -> Result<BTreeMap<String, Vec<Post>>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dump {}", path.display()))?;
        let dump: BTreeMap<String, Vec<Post>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dump {}", path.display()))?;

        let total: usize = dump.values().map(Vec::len).sum();
        tracing::info!(hashtags = dump.len(), posts = total, "Loaded post dump");
        Ok(dump)
    }
}

fn parse_user(user: &Value) -> PostUser {
    PostUser {
        id: str_at(user, "/id_str"),
        name: str_at(user, "/name"),
        screen_name: str_at(user, "/screen_name"),
        description: str_at(user, "/description"),
        followers_count: user.pointer("/followers_count").and_then(Value::as_u64),
        friends_count: user.pointer("/friends_count").and_then(Value::as_u64),
        statuses_count: user.pointer("/statuses_count").and_then(Value::as_u64),
        verified: user.pointer("/verified").and_then(Value::as_bool),
        profile_image_url: str_at(user, "/profile_image_url_https"),
    }
}

fn str_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn collect_strings(value: &Value, pointer: &str, field: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Hashtags in `text`, without the `#`, in order of appearance.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Parse a Twitter `created_at` timestamp, falling back to now.
pub fn parse_twitter_timestamp(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_str(raw.trim(), TWITTER_TIMESTAMP_FORMAT) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!(raw, error = %e, "Unparseable timestamp, using current time");
            Utc::now()
        }
    }
}

/// Canonical storage key for a hashtag: trimmed, no leading `#`, lowercase.
pub fn normalize_hashtag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;
    use std::io::Write;

    fn tweet_result(id: &str, text: &str) -> Value {
        json!({
            "legacy": {
                "id_str": id,
                "full_text": text,
                "created_at": "Sun Apr 27 02:30:12 +0000 2025",
                "lang": "en",
                "favorite_count": 5,
                "reply_count": 1,
                "retweet_count": 2,
                "entities": {
                    "hashtags": [{"text": "Roads"}, {"text": "Pune"}],
                    "user_mentions": [{"screen_name": "pmc"}],
                    "urls": [{"expanded_url": "https://example.org/report"}]
                }
            },
            "views": {"count": "250"},
            "core": {"user_results": {"result": {"legacy": {
                "id_str": "7",
                "name": "Resident",
                "screen_name": "resident",
                "followers_count": 10
            }}}}
        })
    }

    #[test]
    fn test_parse_tweet() {
        let post = PostParser::parse_tweet(&tweet_result("100", "Pothole on FC road")).unwrap();
        assert_eq!(post.id, "100");
        assert_eq!(post.text, "Pothole on FC road");
        assert_eq!(post.tagged_hashtags, vec!["Roads", "Pune"]);
        assert_eq!(post.tagged_users, vec!["pmc"]);
        assert_eq!(post.attached_urls, vec!["https://example.org/report"]);
        assert!(post.attached_media.is_empty());
        assert_eq!(post.views.as_deref(), Some("250"));
        assert_eq!(post.favorite_count, Some(5));
        let user = post.user.unwrap();
        assert_eq!(user.screen_name.as_deref(), Some("resident"));
        assert_eq!(user.followers_count, Some(10));
    }

    #[test]
    fn test_parse_tweet_without_text() {
        assert!(PostParser::parse_tweet(&json!({"legacy": {"id_str": "1"}})).is_none());
        assert!(PostParser::parse_tweet(&json!({})).is_none());
    }

    #[test]
    fn test_parse_timeline() {
        let response = json!({
            "data": {"search_by_raw_query": {"search_timeline": {"timeline": {"instructions": [
                {"entries": [
                    {"entryId": "tweet-1", "content": {"itemContent": {"tweet_results": {"result": tweet_result("1", "first")}}}},
                    {"entryId": "cursor-bottom", "content": {}},
                    {"entryId": "tweet-1", "content": {"itemContent": {"tweet_results": {"result": tweet_result("1", "first")}}}},
                    {"entryId": "tweet-2", "content": {"itemContent": {"tweet_results": {"result": tweet_result("2", "second")}}}}
                ]},
                {"type": "TimelineTerminateTimeline"}
            ]}}}}
        });
        let posts = PostParser::parse_timeline(&response);
        assert_eq!(posts.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_parse_conversation_timeline() {
        let response = json!({
            "data": {"threaded_conversation_with_injections_v2": {"instructions": [
                {"entries": [
                    {"entryId": "tweet-9", "content": {"itemContent": {"tweet_results": {"result": tweet_result("9", "reply")}}}}
                ]}
            ]}}
        });
        assert_eq!(PostParser::parse_timeline(&response).len(), 1);
        assert!(PostParser::parse_timeline(&json!({"data": {}})).is_empty());
    }

    #[test]
    fn test_load_dump() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"CivicIssues": [{{"id": "1", "text": "Broken streetlight"}}], "Pune": []}}"#
        )
        .unwrap();

        let dump = PostParser::load_dump(file.path()).unwrap();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump["CivicIssues"][0].text, "Broken streetlight");
    }

    #[test]
    fn test_load_dump_errors() {
        assert!(PostParser::load_dump(Path::new("/nonexistent/dump.json")).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(PostParser::load_dump(file.path()).is_err());
    }

    #[test]
    fn test_extract_hashtags() {
        assert_eq!(
            extract_hashtags("Flooding at #Sion, again! #Mumbai_Rains #"),
            vec!["Sion", "Mumbai_Rains"]
        );
        assert!(extract_hashtags("no tags here").is_empty());
    }

    #[test]
    fn test_parse_twitter_timestamp() {
        let dt = parse_twitter_timestamp("Sun Apr 27 02:30:12 +0530 2025");
        assert_eq!(dt.day(), 26);
        assert_eq!(dt.hour(), 21);
        assert_eq!(dt.minute(), 0);

        let before = Utc::now();
        assert!(parse_twitter_timestamp("yesterday") >= before);
    }

    #[test]
    fn test_normalize_hashtag() {
        assert_eq!(normalize_hashtag("  #CivicIssues "), "civicissues");
        assert_eq!(normalize_hashtag("pune"), "pune");
        assert_eq!(normalize_hashtag("#"), "");
    }
}
