//! # Capability Ports
//!
//! External collaborators appear in this crate only as traits. The pipeline
//! crates depend on these; adapters (and test mocks) implement them.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::action::AuditRecord;
use crate::error::Result;
use crate::models::{
    CommentListing, Mention, PostCursor, PostListing, PostQuery, ThreadCursor, ThreadView,
    UserIdentity, UserRef,
};
use crate::role::ForumRole;

/// The remote forum API, bound to one account credential.
///
/// Errors surface as `ModError` with the transient/fatal split of the error
/// module; "content already gone" style refusals are transient.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ForumClient: Send + Sync {
    /// Identity of the account behind this client.
    async fn self_identity(&self) -> Result<UserIdentity>;

    async fn user_info(&self, user: &UserRef) -> Result<UserIdentity>;

    async fn list_threads(&self, forum: &str) -> Result<Vec<ThreadView>>;

    async fn list_posts(&self, tid: i64, query: PostQuery) -> Result<PostListing>;

    /// When `is_comment` is set, `pid` names a comment and the listing is
    /// the page containing it; otherwise `pid` names the owning post.
    async fn list_comments(
        &self,
        tid: i64,
        pid: i64,
        page: u32,
        is_comment: bool,
    ) -> Result<CommentListing>;

    /// The @mention feed of this account, newest first.
    async fn list_mentions(&self) -> Result<Vec<Mention>>;

    async fn hide_thread(&self, fid: i64, tid: i64) -> Result<()>;

    async fn delete_thread(&self, fid: i64, tid: i64) -> Result<()>;

    /// Deletes a post or a comment; the remote API shares the call.
    async fn delete_post(&self, fid: i64, tid: i64, pid: i64) -> Result<()>;

    async fn ban_user(&self, forum: &str, user_id: i64, days: i32, reason: &str) -> Result<()>;

    async fn add_to_blacklist(&self, forum: &str, user_id: i64) -> Result<()>;
}

/// Durable review watermarks. Every write is a single atomic upsert.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn thread_cursor(&self, tid: i64) -> Result<Option<ThreadCursor>>;

    async fn upsert_thread_cursor(&self, cursor: &ThreadCursor) -> Result<()>;

    async fn post_cursor(&self, pid: i64) -> Result<Option<PostCursor>>;

    async fn upsert_post_cursor(&self, cursor: &PostCursor) -> Result<()>;

    async fn comment_seen(&self, pid: i64) -> Result<bool>;

    async fn mark_comment_seen(&self, pid: i64, tid: i64, parent_pid: i64) -> Result<()>;
}

/// Append-only audit trail of executed actions.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<()>;
}

/// Ranked standing per (user, forum) pair.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// `None` when the user has no stored standing in the forum.
    async fn role(&self, user_id: i64, forum: &str) -> Result<Option<ForumRole>>;

    async fn upsert_role(&self, user_id: i64, forum: &str, role: ForumRole) -> Result<()>;
}

/// Appointed-executor lookup: which delegated credential may act on a forum.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ExecutorDirectory: Send + Sync {
    /// `None` when the forum has no appointed executor account.
    async fn executor_for(&self, forum: &str) -> Result<Option<Arc<dyn ForumClient>>>;
}
