/// Viewing history: sorting, searching and display formatting
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::tracked::TrackedThread;

const MAX_TITLE_LENGTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    Subreddit,
    LastViewed,
    UnreadCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn reversed(self) -> Direction {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: Direction,
}

impl Default for SortState {
    /// Most unread first
    fn default() -> Self {
        SortState {
            column: SortColumn::UnreadCount,
            direction: Direction::Descending,
        }
    }
}

impl SortState {
    /// A new column sorts ascending; the current column flips direction
    pub fn toggle(self, clicked: SortColumn) -> SortState {
        if clicked == self.column {
            SortState {
                column: self.column,
                direction: self.direction.reversed(),
            }
        } else {
            SortState {
                column: clicked,
                direction: Direction::Ascending,
            }
        }
    }
}

/// Sort threads by the given column, breaking ties by thread id
pub fn sort_threads(threads: &[TrackedThread], state: SortState) -> Vec<TrackedThread> {
    let mut sorted = threads.to_vec();

    sorted.sort_by(|a, b| {
        let ordering = compare_by(a, b, state.column).then_with(|| a.thread_id.cmp(&b.thread_id));
        match state.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });

    sorted
}

fn compare_by(a: &TrackedThread, b: &TrackedThread, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortColumn::Subreddit => a.subreddit_name.cmp(&b.subreddit_name),
        SortColumn::LastViewed => a.last_viewed_at.cmp(&b.last_viewed_at),
        SortColumn::UnreadCount => a.unread_count.cmp(&b.unread_count),
    }
}

/// Case-insensitive search over title, subreddit and tagline
pub fn filter_threads(threads: &[TrackedThread], query: &str) -> Vec<TrackedThread> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return threads.to_vec();
    }

    threads
        .iter()
        .filter(|thread| {
            thread.title.to_lowercase().contains(&query)
                || thread.subreddit_name.to_lowercase().contains(&query)
                || thread.tagline.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

pub fn shorten_title(title: &str) -> String {
    if title.chars().count() >= MAX_TITLE_LENGTH {
        let short: String = title.chars().take(MAX_TITLE_LENGTH).collect();
        format!("{}...", short)
    } else {
        title.to_string()
    }
}

/// Rough relative time, e.g. "3 hours ago"
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    let (amount, unit) = if elapsed.num_minutes() < 1 {
        return "just now".to_string();
    } else if elapsed.num_hours() < 1 {
        (elapsed.num_minutes(), "minute")
    } else if elapsed.num_days() < 1 {
        (elapsed.num_hours(), "hour")
    } else {
        (elapsed.num_days(), "day")
    };

    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}
