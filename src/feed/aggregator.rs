//! Feed aggregation over the directory and post-store upstreams.
//!
//! # Responsibilities
//! - Fan out to both upstreams, breaker-guarded, concurrently
//! - Join posts to their authors by user id
//! - Fail the whole operation on any dependency failure
//!
//! # Design Decisions
//! - The breaker decorator is explicit: gate check, call, outcome report,
//!   all visible in `guarded` rather than woven in by a framework
//! - Posts whose author cannot be resolved are dropped and logged, never
//!   emitted with a missing author (defined policy, not an error path)
//! - A partial feed is never returned as success; callers cannot tell a
//!   half-populated feed from corruption

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{FeedEntry, PostRecord, UserRecord};
use crate::observability::metrics;
use crate::resilience::BreakerRegistry;
use crate::upstream::{Dependency, UpstreamClient, UpstreamError};

/// Failure of a feed operation, caught at the aggregator boundary.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The directory has no user with this name. A client error, not a
    /// dependency outage; never routed to the fallback.
    #[error("user not found: {user_name}")]
    UserNotFound { user_name: String },

    /// The breaker refused the call without attempting it.
    #[error("{dependency}: call suppressed, circuit open")]
    ShortCircuited { dependency: &'static str },

    /// The upstream call itself failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Orchestrates upstream fetches and the author/post join.
#[derive(Debug)]
pub struct FeedAggregator {
    client: UpstreamClient,
    breakers: Arc<BreakerRegistry>,
}

impl FeedAggregator {
    /// Create an aggregator over the given client and breaker registry.
    pub fn new(client: UpstreamClient, breakers: Arc<BreakerRegistry>) -> Self {
        Self { client, breakers }
    }

    /// Fetch all users and all posts, join them, and emit feed entries in
    /// upstream post order.
    ///
    /// Both fetches run concurrently; the first failure aborts the other,
    /// and dropping the returned future cancels whatever is in flight.
    pub async fn feed(&self, auth: Option<&str>) -> Result<Vec<FeedEntry>, FeedError> {
        let (users, posts) = futures_util::try_join!(
            self.guarded::<Vec<UserRecord>>(Dependency::Directory, "/users/all", auth),
            self.guarded::<Vec<PostRecord>>(Dependency::Posts, "/posts/all", auth),
        )?;

        tracing::debug!(
            users = users.len(),
            posts = posts.len(),
            "Joining upstream collections"
        );
        Ok(join_feed(&users, posts))
    }

    /// Fetch the posts of one user, resolved by name via the directory.
    ///
    /// An unknown user is reported distinctly; any dependency failure
    /// fails the whole operation.
    pub async fn posts_by_user(
        &self,
        user_name: &str,
        auth: Option<&str>,
    ) -> Result<Vec<FeedEntry>, FeedError> {
        let path = format!("/users/name/{}", user_name);
        let user: UserRecord = match self.guarded(Dependency::Directory, &path, auth).await {
            Ok(user) => user,
            Err(FeedError::Upstream(UpstreamError::NotFound { .. })) => {
                return Err(FeedError::UserNotFound {
                    user_name: user_name.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let path = format!("/posts/userId/{}", user.id);
        let posts: Vec<PostRecord> = self.guarded(Dependency::Posts, &path, auth).await?;

        Ok(posts
            .into_iter()
            .map(|post| FeedEntry {
                profile_name: user.profile_name.clone(),
                user_id: user.id,
                post,
            })
            .collect())
    }

    /// Breaker-gated upstream fetch: check the gate, make the call, report
    /// the outcome.
    ///
    /// A 404 counts as a successful dependency interaction. The dependency
    /// answered; counting client errors as failures would let bad requests
    /// trip the breaker and mask a healthy upstream.
    async fn guarded<T: DeserializeOwned>(
        &self,
        dependency: Dependency,
        path: &str,
        auth: Option<&str>,
    ) -> Result<T, FeedError> {
        let Some(permit) = self.breakers.before_call(dependency) else {
            tracing::warn!(dependency = %dependency, "Call short-circuited, circuit open");
            metrics::record_upstream_call(dependency.name(), "short_circuit");
            return Err(FeedError::ShortCircuited {
                dependency: dependency.name(),
            });
        };

        // If this future is dropped before the fetch resolves, the permit
        // guard is dropped with it and the breaker reclaims the slot.
        match self.client.fetch_json::<T>(dependency, path, auth).await {
            Ok(value) => {
                permit.success();
                metrics::record_upstream_call(dependency.name(), "success");
                Ok(value)
            }
            Err(err @ UpstreamError::NotFound { .. }) => {
                permit.success();
                metrics::record_upstream_call(dependency.name(), "not_found");
                Err(err.into())
            }
            Err(err) => {
                permit.failure();
                metrics::record_upstream_call(dependency.name(), "failure");
                tracing::error!(dependency = %dependency, error = %err, "Upstream call failed");
                Err(err.into())
            }
        }
    }
}

/// Join posts to their authors by user id, preserving post order.
///
/// Posts with an absent or unknown author id are dropped and logged.
fn join_feed(users: &[UserRecord], posts: Vec<PostRecord>) -> Vec<FeedEntry> {
    let user_index: HashMap<i64, &UserRecord> = users.iter().map(|u| (u.id, u)).collect();

    let mut entries = Vec::with_capacity(posts.len());
    for post in posts {
        let Some(author_id) = post.user_id else {
            tracing::warn!(post_id = ?post.id, "Dropping post without an author id");
            continue;
        };
        let Some(user) = user_index.get(&author_id) else {
            tracing::warn!(
                post_id = ?post.id,
                user_id = author_id,
                "Dropping post with unknown author"
            );
            continue;
        };
        entries.push(FeedEntry {
            profile_name: user.profile_name.clone(),
            user_id: user.id,
            post,
        });
    }
    entries
}
