//! Static degraded response for feed outages.
//!
//! # Responsibilities
//! - Produce a fixed, clearly-marked placeholder feed
//! - Log the failure that caused degradation
//!
//! # Design Decisions
//! - Availability over freshness: callers get a well-formed 200 body
//!   during an outage, never an error page
//! - The sentinel author name makes degraded mode detectable by client
//!   UIs and tests

use crate::feed::aggregator::FeedError;
use crate::model::{FeedEntry, PostRecord};
use crate::observability::metrics;

/// Sentinel author shown on every fallback entry.
pub const FALLBACK_PROFILE_NAME: &str = "Fall Back Sample";

/// Placeholder content of the fallback post.
pub const FALLBACK_POST_CONTENT: &str = "Fallback post content";

const FALLBACK_ENTRY_COUNT: usize = 3;

/// Provider of the degraded feed response.
#[derive(Debug, Default)]
pub struct FallbackProvider;

impl FallbackProvider {
    /// The degraded feed served when aggregation fails.
    pub fn feed_fallback(&self, cause: &FeedError) -> Vec<FeedEntry> {
        tracing::error!(error = %cause, "Serving degraded feed fallback");
        metrics::record_fallback();

        let post = PostRecord {
            id: Some(1),
            content: Some(FALLBACK_POST_CONTENT.to_string()),
            likes: Some(0),
            comments: None,
            user_id: Some(1),
        };
        (0..FALLBACK_ENTRY_COUNT)
            .map(|_| FeedEntry {
                profile_name: FALLBACK_PROFILE_NAME.to_string(),
                post: post.clone(),
                user_id: 1,
            })
            .collect()
    }
}
