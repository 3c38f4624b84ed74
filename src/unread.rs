/// Unread comment tally over a fetched reddit comment tree
///
/// The payload for `/comments/<id>.json` is a two element array:
/// `[postListing, commentListing]`. Each listing holds `children`, each
/// comment (`t1`) may hold `replies`, which is another listing or an empty
/// string. Large threads end in `more` nodes pointing at comments that were
/// not included, so every count here is a lower bound.
use chrono::{DateTime, Utc};
use serde_json::Value;

const MORE_KIND: &str = "more";

/// One node of a comment tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentNode {
    pub kind: Option<String>,
    pub author: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub children: Vec<CommentNode>,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Build a node from reddit JSON.
    ///
    /// Fields are read from the node's `data` object when it has one, and
    /// from the node itself otherwise. Anything unrecognised becomes an empty
    /// placeholder rather than an error.
    pub fn from_value(value: &Value) -> CommentNode {
        let Some(node) = value.as_object() else {
            return CommentNode::default();
        };
        let data = node.get("data").and_then(Value::as_object);
        let field = |name: &str| data.and_then(|d| d.get(name)).or_else(|| node.get(name));

        let text = |name: &str| {
            field(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        CommentNode {
            kind: node.get("kind").and_then(Value::as_str).map(str::to_string),
            author: text("author"),
            body: text("body"),
            created_at: field("created_utc").and_then(epoch_seconds),
            children: field("children").map(nodes_from).unwrap_or_default(),
            replies: field("replies").map(nodes_from).unwrap_or_default(),
        }
    }

    /// A continuation marker for comments the payload did not include
    pub fn is_more(&self) -> bool {
        self.kind.as_deref() == Some(MORE_KIND)
    }

    /// A real comment carries an author, a body and a creation time
    pub fn is_comment(&self) -> bool {
        self.author.is_some() && self.body.is_some() && self.created_at.is_some()
    }
}

/// `children` is an array of nodes; `replies` is a listing object, an array,
/// or `""` when a comment has none.
fn nodes_from(value: &Value) -> Vec<CommentNode> {
    match value {
        Value::Array(items) => items.iter().map(CommentNode::from_value).collect(),
        Value::Object(_) => vec![CommentNode::from_value(value)],
        _ => Vec::new(),
    }
}

/// A JS millisecond timestamp. NaN and infinities give `None`.
pub fn from_epoch_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

fn epoch_seconds(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = value.as_f64()?;
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

/// Count comments in the tree created strictly after `since`
///
/// Every reachable node is visited once through both `children` and
/// `replies`. Placeholders add nothing but are still walked; `more` nodes
/// are skipped together with anything beneath them.
pub fn count_unread_since(root: &CommentNode, since: DateTime<Utc>) -> usize {
    let mut count = 0;
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.is_more() {
            continue;
        }

        if node.is_comment() && node.created_at.is_some_and(|created| created > since) {
            count += 1;
        }

        stack.extend(node.children.iter());
        stack.extend(node.replies.iter());
    }

    count
}

/// Count unread comments in a raw `[postMeta, commentTreeRoot]` payload.
/// Any other shape counts as zero.
pub fn count_unread_in_payload(payload: &Value, since: DateTime<Utc>) -> usize {
    match payload.as_array().map(Vec::as_slice) {
        Some([_post, comments]) => {
            count_unread_since(&CommentNode::from_value(comments), since)
        }
        _ => {
            log::debug!("Comment payload is not a two element array, counting 0 unread");
            0
        }
    }
}
