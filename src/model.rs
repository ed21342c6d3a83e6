//! Wire records exchanged with the upstream services.
//!
//! # Responsibilities
//! - Typed views of the directory and post-store JSON payloads
//! - Composite feed entries produced by the aggregation join
//!
//! # Design Decisions
//! - Field names follow the upstream camelCase contract via serde renames
//! - Post fields the upstream may omit are `Option`; the aggregator decides
//!   what an absent author id means, not the decoder
//! - Records are request-scoped copies; nothing here is persisted

use serde::{Deserialize, Serialize};

/// A user as returned by the directory upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub user_name: String,
    pub profile_name: String,
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: Option<i64>,
    pub content: Option<String>,
}

/// A post as returned by the post-store upstream.
///
/// `user_id` is the author's id in the directory. Posts without one cannot
/// be joined and are dropped by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: Option<i64>,
    pub content: Option<String>,
    pub likes: Option<i64>,
    pub comments: Option<Vec<CommentRecord>>,
    pub user_id: Option<i64>,
}

/// One feed line: a post joined with its author's profile name.
///
/// Emitted only when the join succeeded, so `user_id` always equals the
/// post's author id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub profile_name: String,
    pub post: PostRecord,
    pub user_id: i64,
}
