/// Thread identity extraction for reddit comment URLs
use url::Url;

const REDDIT_BASE: &str = "https://www.reddit.com";

/// Extract the thread id from a reddit comments URL
///
/// reddit api - GET [/r/subreddit]/comments/article
///
/// Algorithm:
/// 1. Parse the URL and walk its path segments
/// 2. Find the first segment equal to "comments"
/// 3. The id is the segment right after it
///
/// Query strings and fragments are not path segments, so they never leak
/// into the id. No validation is done on the id's characters.
///
/// Examples:
/// - https://www.reddit.com/r/java/comments/74x9gv/title?ref=x → 74x9gv
/// - https://www.reddit.com/comments/74x9gv?sort=new → 74x9gv
///
/// Returns an empty string when no id can be derived; callers treat that as
/// an untrackable page.
pub fn extract_thread_id(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    path_segments(url)
        .and_then(|segments| {
            let mut rest = segments.into_iter().skip_while(|s| s != "comments");
            rest.next()?;
            rest.next()
        })
        .unwrap_or_default()
}

/// Extract the subreddit name from a URL such as `https://www.reddit.com/r/java/...`
pub fn extract_subreddit(url: &str) -> String {
    path_segments(url)
        .and_then(|segments| {
            let mut rest = segments.into_iter().skip_while(|s| s != "r");
            rest.next()?;
            rest.next()
        })
        .unwrap_or_default()
}

/// Link to a thread. Threads with an unknown subreddit use the short form.
pub fn thread_url(subreddit: &str, thread_id: &str) -> String {
    if subreddit.is_empty() {
        format!("{}/comments/{}", REDDIT_BASE, thread_id)
    } else {
        format!("{}/r/{}/comments/{}", REDDIT_BASE, subreddit, thread_id)
    }
}

pub fn subreddit_url(subreddit: &str) -> String {
    format!("{}/r/{}", REDDIT_BASE, subreddit)
}

fn path_segments(url: &str) -> Option<Vec<String>> {
    let parsed = Url::parse(url.trim()).ok()?;
    let segments = parsed.path_segments()?.map(str::to_string).collect();
    Some(segments)
}
