/// Data structures for tracked threads
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::StorageType;
use crate::thread_id::{subreddit_url, thread_url};

/// A reddit thread the user is following
///
/// Stored under its thread id, e.g.
///
/// ```json
/// "75odv7": {
///   "threadId": "75odv7",
///   "type": "COMMENT",
///   "title": "some title",
///   "tagline": "submitted 19 hours ago by user",
///   "subredditName": "rust",
///   "lastViewedAt": "2017-10-12T07:08:41Z",
///   "unreadCount": 0
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedThread {
    pub thread_id: String,
    #[serde(rename = "type", default = "comment_type")]
    pub kind: StorageType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub subreddit_name: String,
    pub last_viewed_at: DateTime<Utc>,
    /// Derived from the latest fetch, never the source of truth
    #[serde(default)]
    pub unread_count: u32,
}

fn comment_type() -> StorageType {
    StorageType::Comment
}

impl TrackedThread {
    pub fn new(
        thread_id: String,
        title: String,
        tagline: String,
        subreddit_name: String,
        last_viewed_at: DateTime<Utc>,
    ) -> TrackedThread {
        TrackedThread {
            thread_id,
            kind: StorageType::Comment,
            title,
            tagline,
            subreddit_name,
            last_viewed_at,
            unread_count: 0,
        }
    }

    /// Record a visit at `now`
    pub fn viewed(&mut self, now: DateTime<Utc>) {
        self.last_viewed_at = now;
    }

    pub fn url(&self) -> String {
        thread_url(&self.subreddit_name, &self.thread_id)
    }

    pub fn subreddit_url(&self) -> Option<String> {
        if self.subreddit_name.is_empty() {
            None
        } else {
            Some(subreddit_url(&self.subreddit_name))
        }
    }
}
