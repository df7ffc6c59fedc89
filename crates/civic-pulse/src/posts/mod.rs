//! Hashtag posts scraped from Twitter/X.
//!
//! Provides the post model and parsing for raw tweet payloads and dumps.

mod parser;
mod types;

pub use parser::{
    extract_hashtags, normalize_hashtag, parse_twitter_timestamp, PostParser,
    TWITTER_TIMESTAMP_FORMAT,
};
pub use types::{Post, PostUser};
