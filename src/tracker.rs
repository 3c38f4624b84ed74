/// Visit and startup workflows over the store
///
/// Recomputing unread counts and refreshing the last-viewed time are
/// separate operations; callers decide the order.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::retention::select_stale_thread_ids;
use crate::settings::{SETTING_KEYS, Settings, StorageType};
use crate::storage::{
    delete_threads, load_settings, load_thread, load_tracked_records, save_thread, Repository,
};
use crate::thread_id::{extract_subreddit, extract_thread_id};
use crate::tracked::TrackedThread;

/// What the content script saw on a thread page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadVisit {
    pub url: String,
    pub title: String,
    pub tagline: String,
}

impl ThreadVisit {
    fn into_thread(self, thread_id: String, now: DateTime<Utc>) -> TrackedThread {
        let subreddit = extract_subreddit(&self.url);
        TrackedThread::new(thread_id, self.title, self.tagline, subreddit, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum VisitOutcome {
    /// No thread id in the URL, nothing tracked
    Untrackable,
    /// Auto-follow is off and the thread is not followed
    NotFollowed,
    #[serde(rename_all = "camelCase")]
    FirstVisit { thread_id: String },
    /// Comments newer than `previous_last_viewed` are unread
    #[serde(rename_all = "camelCase")]
    Revisited {
        thread_id: String,
        previous_last_viewed: DateTime<Utc>,
    },
}

/// Handle a thread page load: create the record on a first visit (when
/// auto-follow is on) or refresh last-viewed on a return visit.
pub async fn record_visit<R: Repository + ?Sized>(
    repo: &R,
    visit: ThreadVisit,
    now: DateTime<Utc>,
) -> StoreResult<VisitOutcome> {
    let thread_id = extract_thread_id(&visit.url);
    if thread_id.is_empty() {
        log::debug!("No thread id in {}, not tracking", visit.url);
        return Ok(VisitOutcome::Untrackable);
    }

    let existing = match load_thread(repo, &thread_id).await {
        Ok(existing) => existing,
        Err(StoreError::Decode(reason)) => {
            log::warn!("Replacing unreadable record for {}: {}", thread_id, reason);
            let thread = visit.into_thread(thread_id.clone(), now);
            save_thread(repo, &thread).await?;
            return Ok(VisitOutcome::FirstVisit { thread_id });
        }
        Err(e) => return Err(e),
    };

    if let Some(mut existing) = existing {
        let previous_last_viewed = existing.last_viewed_at;
        if existing.subreddit_name.is_empty() {
            existing.subreddit_name = extract_subreddit(&visit.url);
        }
        existing.title = visit.title;
        existing.tagline = visit.tagline;
        existing.viewed(now);
        save_thread(repo, &existing).await?;
        log::debug!("Revisited {}, last viewed {}", thread_id, previous_last_viewed);
        return Ok(VisitOutcome::Revisited {
            thread_id,
            previous_last_viewed,
        });
    }

    let settings = load_settings(repo).await?;
    if !settings.auto_follow {
        return Ok(VisitOutcome::NotFollowed);
    }

    let thread = visit.into_thread(thread_id.clone(), now);
    save_thread(repo, &thread).await?;
    log::info!("First visit to {}, now following", thread.title);
    Ok(VisitOutcome::FirstVisit { thread_id })
}

/// Follow a thread explicitly, regardless of the auto-follow setting.
/// Returns `None` for URLs without a thread id.
pub async fn follow_thread<R: Repository + ?Sized>(
    repo: &R,
    visit: ThreadVisit,
    now: DateTime<Utc>,
) -> StoreResult<Option<TrackedThread>> {
    let thread_id = extract_thread_id(&visit.url);
    if thread_id.is_empty() {
        return Ok(None);
    }
    let thread = visit.into_thread(thread_id, now);
    save_thread(repo, &thread).await.map(Some)
}

pub async fn unfollow_thread<R: Repository + ?Sized>(
    repo: &R,
    thread_id: &str,
) -> StoreResult<bool> {
    delete_threads(repo, &[thread_id.to_string()]).await
}

/// Refresh the last-viewed time of a followed thread.
/// Returns the updated record, or `None` if the thread is not followed.
pub async fn mark_viewed<R: Repository + ?Sized>(
    repo: &R,
    thread_id: &str,
    now: DateTime<Utc>,
) -> StoreResult<Option<TrackedThread>> {
    match load_thread(repo, thread_id).await? {
        Some(mut thread) => {
            thread.viewed(now);
            save_thread(repo, &thread).await.map(Some)
        }
        None => Ok(None),
    }
}

/// Delete the whole viewing history, keeping settings
pub async fn clear_history<R: Repository + ?Sized>(repo: &R) -> StoreResult<bool> {
    let keys: Vec<String> = repo
        .get_all_by(&|_, kind| kind == Some(StorageType::Comment))
        .await?
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    delete_threads(repo, &keys).await
}

/// Delete every thread not viewed within the configured retention window,
/// along with thread records that no longer decode.
/// Returns the keys that were selected for deletion.
pub async fn prune_stale_threads<R: Repository + ?Sized>(
    repo: &R,
    now: DateTime<Utc>,
) -> StoreResult<Vec<String>> {
    let settings = load_settings(repo).await?;
    let records = load_tracked_records(repo).await?;

    let mut stale = select_stale_thread_ids(&records.threads, settings.delete_frequency, now);
    stale.extend(records.unreadable);
    let stale: Vec<String> = stale.into_iter().collect();
    if stale.is_empty() {
        return Ok(stale);
    }

    if delete_threads(repo, &stale).await? {
        log::info!(
            "Deleted {} threads not viewed in {}",
            stale.len(),
            settings.delete_frequency.label()
        );
    } else {
        log::warn!("Some stale threads were still present after deletion: {:?}", stale);
    }
    Ok(stale)
}

/// Save defaults for any setting not yet in the store. Existing values are kept.
pub async fn init_settings<R: Repository + ?Sized>(repo: &R) -> StoreResult<Settings> {
    let stored = repo.get(&SETTING_KEYS).await?;
    let missing = Settings::missing_defaults(&stored);
    if !missing.is_empty() {
        log::debug!("Saving default settings: {:?}", missing.keys().collect::<Vec<_>>());
        repo.save(missing).await?;
    }
    load_settings(repo).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::settings::RetentionFrequency;
    use crate::storage::{load_tracked_threads, save_settings, Entries, MemoryRepository};
    use serde_json::json;
    use chrono::{Duration, TimeZone};
    use futures::executor::block_on;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 1, 20, 10, 0, 0).unwrap()
    }

    fn visit(url: &str) -> ThreadVisit {
        ThreadVisit {
            url: url.to_string(),
            title: "some title".to_string(),
            tagline: "submitted 19 hours ago by user".to_string(),
        }
    }

    fn with_settings(settings: Settings) -> MemoryRepository {
        let repo = MemoryRepository::new();
        block_on(save_settings(&repo, &settings)).unwrap();
        repo
    }

    #[test]
    fn test_first_visit_creates_record() {
        let repo = MemoryRepository::new();

        let url = "https://www.reddit.com/r/rust/comments/75odv7/title/";

        let outcome = block_on(record_visit(&repo, visit(url), now())).unwrap();

        assert_eq!(
            outcome,
            VisitOutcome::FirstVisit {
                thread_id: "75odv7".to_string()
            }
        );
        let stored = block_on(load_thread(&repo, "75odv7")).unwrap().unwrap();
        assert_eq!(stored.subreddit_name, "rust");
        assert_eq!(stored.last_viewed_at, now());
    }

    #[test]
    fn test_revisit_refreshes_last_viewed() {
        let repo = MemoryRepository::new();
        let url = "https://www.reddit.com/r/rust/comments/75odv7/title/";
        let earlier = now() - Duration::hours(5);
        block_on(record_visit(&repo, visit(url), earlier)).unwrap();

        let outcome = block_on(record_visit(&repo, visit(url), now())).unwrap();

        assert_eq!(
            outcome,
            VisitOutcome::Revisited {
                thread_id: "75odv7".to_string(),
                previous_last_viewed: earlier,
            }
        );
        let stored = block_on(load_thread(&repo, "75odv7")).unwrap().unwrap();
        assert_eq!(stored.last_viewed_at, now());
    }

    #[test]
    fn test_untrackable_url_saves_nothing() {
        let repo = MemoryRepository::new();

        let url = "https://www.reddit.com/r/rust/";

        let outcome = block_on(record_visit(&repo, visit(url), now())).unwrap();

        assert_eq!(outcome, VisitOutcome::Untrackable);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_auto_follow_off() {
        let repo = with_settings(Settings {
            auto_follow: false,
            ..Settings::default()
        });
        let url = "https://www.reddit.com/r/rust/comments/75odv7";

        let outcome = block_on(record_visit(&repo, visit(url), now())).unwrap();
        assert_eq!(outcome, VisitOutcome::NotFollowed);
        assert!(block_on(load_thread(&repo, "75odv7")).unwrap().is_none());

        block_on(follow_thread(&repo, visit(url), now())).unwrap();
        let outcome = block_on(record_visit(&repo, visit(url), now())).unwrap();
        assert!(matches!(outcome, VisitOutcome::Revisited { .. }));
    }

    #[test]
    fn test_visit_propagates_store_failure() {
        let repo = MemoryRepository::new();
        repo.fail_next("QUOTA_BYTES quota exceeded");

        let url = "https://www.reddit.com/comments/abc";

        let result = block_on(record_visit(&repo, visit(url), now()));

        assert_eq!(
            result,
            Err(StoreError::Host("QUOTA_BYTES quota exceeded".to_string()))
        );
    }

    fn with_legacy_record(id: &str) -> MemoryRepository {
        let mut entries = Entries::new();
        entries.insert(
            id.to_string(),
            json!({
                "type": "COMMENT",
                "articleId": id,
                "lastViewedTime": "Thu Oct 12 2017 07:08:41 GMT-0400 (EDT)"
            }),
        );
        MemoryRepository::with_entries(entries)
    }

    #[test]
    fn test_visit_replaces_unreadable_record() {
        let repo = with_legacy_record("abc");
        let url = "https://www.reddit.com/r/rust/comments/abc/title/";

        let first = block_on(record_visit(&repo, visit(url), now() - Duration::hours(1))).unwrap();
        let second = block_on(record_visit(&repo, visit(url), now())).unwrap();

        assert_eq!(
            first,
            VisitOutcome::FirstVisit {
                thread_id: "abc".to_string()
            }
        );
        assert_eq!(
            second,
            VisitOutcome::Revisited {
                thread_id: "abc".to_string(),
                previous_last_viewed: now() - Duration::hours(1),
            }
        );
    }

    #[test]
    fn test_unreadable_record_replaced_even_with_auto_follow_off() {
        let repo = with_legacy_record("abc");
        block_on(save_settings(
            &repo,
            &Settings {
                auto_follow: false,
                ..Settings::default()
            },
        ))
        .unwrap();

        let url = "https://www.reddit.com/comments/abc";
        block_on(record_visit(&repo, visit(url), now())).unwrap();

        let stored = block_on(load_thread(&repo, "abc")).unwrap();
        assert_eq!(stored.map(|t| t.last_viewed_at), Some(now()));
    }

    #[test]
    fn test_revisit_fills_missing_subreddit() {
        let repo = MemoryRepository::new();
        let short_url = "https://www.reddit.com/comments/abc";
        block_on(record_visit(&repo, visit(short_url), now() - Duration::hours(2))).unwrap();

        let url = "https://www.reddit.com/r/rust/comments/abc/title/";
        block_on(record_visit(&repo, visit(url), now())).unwrap();

        let stored = block_on(load_thread(&repo, "abc")).unwrap().unwrap();
        assert_eq!(stored.subreddit_name, "rust");
        assert_eq!(
            stored.subreddit_url(),
            Some("https://www.reddit.com/r/rust".to_string())
        );

        // a short link later does not blank it again
        block_on(record_visit(&repo, visit(short_url), now())).unwrap();
        let stored = block_on(load_thread(&repo, "abc")).unwrap().unwrap();
        assert_eq!(stored.subreddit_name, "rust");
    }

    #[test]
    fn test_prune_removes_unreadable_records() {
        let repo = with_legacy_record("abc");
        let url = "https://www.reddit.com/comments/fresh";
        block_on(record_visit(&repo, visit(url), now())).unwrap();

        let deleted = block_on(prune_stale_threads(&repo, now())).unwrap();

        assert_eq!(deleted, vec!["abc".to_string()]);
        assert!(block_on(repo.get(&["abc"])).unwrap().is_empty());
        assert!(block_on(load_thread(&repo, "fresh")).unwrap().is_some());
    }

    #[test]
    fn test_unfollow_and_mark_viewed() {
        let repo = MemoryRepository::new();
        let url = "https://www.reddit.com/comments/abc";
        block_on(follow_thread(&repo, visit(url), now() - Duration::days(1))).unwrap();

        let updated = block_on(mark_viewed(&repo, "abc", now())).unwrap();
        assert_eq!(updated.map(|t| t.last_viewed_at), Some(now()));

        assert!(block_on(unfollow_thread(&repo, "abc")).unwrap());
        assert_eq!(block_on(mark_viewed(&repo, "abc", now())).unwrap(), None);
    }

    #[test]
    fn test_clear_history_keeps_settings() {
        let repo = with_settings(Settings::default());
        for id in ["a", "b"] {
            let url = format!("https://www.reddit.com/comments/{}", id);
            block_on(record_visit(&repo, visit(&url), now())).unwrap();
        }

        assert!(block_on(clear_history(&repo)).unwrap());

        assert!(block_on(load_tracked_threads(&repo)).unwrap().is_empty());
        assert_eq!(repo.len(), SETTING_KEYS.len());
    }

    #[test]
    fn test_prune_stale_threads() {
        let repo = with_settings(Settings {
            delete_frequency: RetentionFrequency::Day3,
            ..Settings::default()
        });
        let visits = [
            ("fresh", now() - Duration::days(3) + Duration::seconds(1)),
            ("exact", now() - Duration::days(3)),
            ("old", now() - Duration::days(14)),
        ];
        for (id, at) in visits {
            let url = format!("https://www.reddit.com/comments/{}", id);
            block_on(record_visit(&repo, visit(&url), at)).unwrap();
        }

        let deleted = block_on(prune_stale_threads(&repo, now())).unwrap();

        assert_eq!(deleted, vec!["exact".to_string(), "old".to_string()]);
        let remaining: Vec<String> = block_on(load_tracked_threads(&repo))
            .unwrap()
            .into_iter()
            .map(|t| t.thread_id)
            .collect();
        assert_eq!(remaining, vec!["fresh".to_string()]);

        // a second run finds nothing left to delete
        assert!(block_on(prune_stale_threads(&repo, now())).unwrap().is_empty());
    }

    #[test]
    fn test_init_settings_keeps_existing_values() {
        let repo = with_settings(Settings {
            unread_comment_color: "#123456".to_string(),
            ..Settings::default()
        });
        let repo_empty = MemoryRepository::new();

        let settings = block_on(init_settings(&repo)).unwrap();
        let defaults = block_on(init_settings(&repo_empty)).unwrap();

        assert_eq!(settings.unread_comment_color, "#123456");
        assert_eq!(defaults, Settings::default());
        assert_eq!(repo_empty.len(), SETTING_KEYS.len());
    }
}
