/// Fetching comment trees and turning them into unread counts
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::error::FetchError;
use crate::tracked::TrackedThread;
use crate::unread::count_unread_in_payload;

const REDDIT_BASE: &str = "https://www.reddit.com";

/// Anything that can produce the `[postMeta, commentTreeRoot]` payload for a thread
#[async_trait(?Send)]
pub trait ThreadSource {
    async fn fetch_thread(&self, thread: &TrackedThread) -> Result<Value, FetchError>;
}

/// Fetches thread JSON straight from reddit
#[derive(Debug, Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    pub fn new() -> Self {
        Self::with_base_url(REDDIT_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        RedditClient {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn thread_json_url(&self, thread: &TrackedThread) -> String {
        if thread.subreddit_name.is_empty() {
            format!("{}/comments/{}.json", self.base_url, thread.thread_id)
        } else {
            format!(
                "{}/r/{}/comments/{}.json",
                self.base_url, thread.subreddit_name, thread.thread_id
            )
        }
    }
}

impl Default for RedditClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl ThreadSource for RedditClient {
    async fn fetch_thread(&self, thread: &TrackedThread) -> Result<Value, FetchError> {
        let url = self.thread_json_url(thread);
        log::debug!("Fetching comments for {} from {}", thread.thread_id, url);

        let payload = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        if payload.is_array() {
            Ok(payload)
        } else {
            Err(FetchError::Payload(format!("expected an array from {}", url)))
        }
    }
}

/// Fetch every thread concurrently and set its unread count
///
/// A thread whose fetch fails gets an unread count of 0. The order of the
/// returned threads matches the input.
pub async fn refresh_unread_counts<S: ThreadSource + ?Sized>(
    source: &S,
    threads: Vec<TrackedThread>,
) -> Vec<TrackedThread> {
    let tallies = join_all(threads.iter().map(|thread| async move {
        match source.fetch_thread(thread).await {
            Ok(payload) => count_unread_in_payload(&payload, thread.last_viewed_at),
            Err(e) => {
                log::warn!("Could not count unread comments for {}: {}", thread.thread_id, e);
                0
            }
        }
    }))
    .await;

    threads
        .into_iter()
        .zip(tallies)
        .map(|(mut thread, tally)| {
            thread.unread_count = u32::try_from(tally).unwrap_or(u32::MAX);
            thread
        })
        .collect()
}
