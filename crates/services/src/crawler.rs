//! # Incremental crawler
//!
//! Walks a forum's threads, the posts of threads with new activity, and the
//! comments of posts with new replies, consulting the cursor store so that
//! unchanged content is never re-inspected. Every item needing inspection
//! runs through the checker registry, the merge fold, and the executor.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, error, warn};

use domains::{
    Action, AuditSink, CommentView, ContentRef, CursorStore, ExecutorDirectory, ForumClient,
    ModError, PostCursor, PostQuery, PostView, Result, ThreadCursor, ThreadView,
    COMMENT_PAGE_SIZE, INLINE_COMMENT_LIMIT, POST_PAGE_SIZE,
};

use crate::checker::{CheckContext, CheckerRegistry};
use crate::executor::Executor;

/// Default number of concurrent remote fetches per forum.
pub const DEFAULT_FETCH_PERMITS: usize = 8;

pub struct Crawler {
    pub directory: Arc<dyn ExecutorDirectory>,
    pub cursors: Arc<dyn CursorStore>,
    pub audit: Arc<dyn AuditSink>,
    pub registry: Arc<CheckerRegistry>,
    pub cx: CheckContext,
    /// Forum name → enabled checker names.
    pub plan: HashMap<String, HashSet<String>>,
    pub fetch_permits: usize,
    pub dry_run: bool,
}

impl Crawler {
    /// One bounded pass over every configured forum. Forums sweep
    /// concurrently and independently; one forum's failure never touches
    /// another's sweep.
    pub async fn sweep_all(&self) {
        join_all(self.plan.keys().map(|forum| async move {
            if let Err(e) = self.sweep(forum).await {
                error!(forum = %forum, error = %e, "forum sweep failed");
            }
        }))
        .await;
    }

    /// One bounded pass over a single forum.
    pub async fn sweep(&self, forum: &str) -> Result<()> {
        let Some(client) = self.directory.executor_for(forum).await? else {
            debug!(forum, "no appointed executor; sweep skipped");
            return Ok(());
        };
        let sweep = ForumSweep {
            exec: Executor::new(
                client.clone(),
                self.audit.clone(),
                self.cx.roles.clone(),
                self.dry_run,
            ),
            client,
            limiter: Semaphore::new(self.fetch_permits),
            enabled: self.plan.get(forum).cloned().unwrap_or_default(),
            registry: self.registry.as_ref(),
            cursors: self.cursors.as_ref(),
            cx: &self.cx,
        };
        sweep.run(forum).await
    }
}

/// State for one forum's pass: the executor credential, the fetch limiter,
/// and the forum's enabled-checker set.
struct ForumSweep<'a> {
    client: Arc<dyn ForumClient>,
    exec: Executor,
    limiter: Semaphore,
    enabled: HashSet<String>,
    registry: &'a CheckerRegistry,
    cursors: &'a dyn CursorStore,
    cx: &'a CheckContext,
}

impl ForumSweep<'_> {
    async fn run(&self, forum: &str) -> Result<()> {
        let threads = {
            let _permit = self.permit().await;
            self.client.list_threads(forum).await?
        };
        debug!(forum, count = threads.len(), "thread sweep started");

        let descend = join_all(
            threads
                .iter()
                .filter(|t| !t.is_live)
                .map(|thread| async move {
                    match self.visit_thread(thread).await {
                        Ok(true) => Some(thread),
                        Ok(false) => None,
                        Err(e) => {
                            isolate("thread", thread.tid, &e);
                            None
                        }
                    }
                }),
        )
        .await;

        join_all(
            descend
                .into_iter()
                .flatten()
                .map(|thread| self.sweep_posts(thread)),
        )
        .await;
        Ok(())
    }

    /// Returns whether post-level inspection is warranted.
    async fn visit_thread(&self, thread: &ThreadView) -> Result<bool> {
        match self.cursors.thread_cursor(thread.tid).await? {
            Some(prev) if thread.last_activity > prev.last_activity => {
                self.cursors
                    .upsert_thread_cursor(&ThreadCursor {
                        tid: thread.tid,
                        fid: thread.forum.fid,
                        last_activity: thread.last_activity,
                    })
                    .await?;
                Ok(true)
            }
            // the watermark never moves backwards
            Some(_) => Ok(false),
            None => {
                let item = ContentRef::from_thread(thread);
                let action = self.review_and_execute(&item).await?;
                self.cursors
                    .upsert_thread_cursor(&ThreadCursor {
                        tid: thread.tid,
                        fid: thread.forum.fid,
                        last_activity: thread.last_activity,
                    })
                    .await?;
                // removed content needs no further descent
                Ok(!action.kind.is_removal())
            }
        }
    }

    async fn sweep_posts(&self, thread: &ThreadView) {
        if let Err(e) = self.visit_posts(thread).await {
            isolate("post sweep", thread.tid, &e);
        }
    }

    async fn visit_posts(&self, thread: &ThreadView) -> Result<()> {
        let posts = self.collect_posts(thread).await?;

        let flagged = join_all(posts.iter().map(|post| async move {
            match self.visit_post(post).await {
                Ok(true) => Some(post),
                Ok(false) => None,
                Err(e) => {
                    isolate("post", post.pid, &e);
                    None
                }
            }
        }))
        .await;

        join_all(
            flagged
                .into_iter()
                .flatten()
                .map(|post| self.sweep_comments(post)),
        )
        .await;
        Ok(())
    }

    /// Reconstructs the post set since the last-known floor: the newest
    /// page, plus the front of the thread when the newest page does not
    /// reach floor 1, plus the hot page when the gap is large.
    async fn collect_posts(&self, thread: &ThreadView) -> Result<Vec<PostView>> {
        let newest = {
            let _permit = self.permit().await;
            self.client
                .list_posts(thread.tid, PostQuery::newest())
                .await?
        };

        let mut by_pid: HashMap<i64, PostView> =
            newest.posts.into_iter().map(|p| (p.pid, p)).collect();

        let reaches_front = by_pid.values().any(|p| p.floor == 1);
        if !by_pid.is_empty() && !reaches_front {
            let top_floor = by_pid.values().map(|p| p.floor).max().unwrap_or(0);
            let gap = top_floor.saturating_sub(by_pid.len() as u32);
            if gap > 0 {
                let first = {
                    let _permit = self.permit().await;
                    self.client
                        .list_posts(thread.tid, PostQuery::oldest(gap.min(POST_PAGE_SIZE)))
                        .await?
                };
                by_pid.extend(first.posts.into_iter().map(|p| (p.pid, p)));

                if gap > POST_PAGE_SIZE {
                    let hot = {
                        let _permit = self.permit().await;
                        self.client.list_posts(thread.tid, PostQuery::hot()).await?
                    };
                    by_pid.extend(hot.posts.into_iter().map(|p| (p.pid, p)));
                }
            }
        }
        Ok(by_pid.into_values().collect())
    }

    /// Returns whether comment-level inspection is warranted.
    async fn visit_post(&self, post: &PostView) -> Result<bool> {
        match self.cursors.post_cursor(post.pid).await? {
            Some(prev) if post.reply_count > prev.reply_count => {
                self.cursors
                    .upsert_post_cursor(&PostCursor {
                        pid: post.pid,
                        tid: post.tid,
                        reply_count: post.reply_count,
                    })
                    .await?;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => {
                let item = ContentRef::from_post(post);
                let action = self.review_and_execute(&item).await?;
                self.cursors
                    .upsert_post_cursor(&PostCursor {
                        pid: post.pid,
                        tid: post.tid,
                        reply_count: post.reply_count,
                    })
                    .await?;
                Ok(!action.kind.is_removal())
            }
        }
    }

    async fn sweep_comments(&self, post: &PostView) {
        if let Err(e) = self.visit_comments(post).await {
            isolate("comment sweep", post.pid, &e);
        }
    }

    async fn visit_comments(&self, post: &PostView) -> Result<()> {
        let comments = self.collect_comments(post).await?;
        join_all(comments.iter().map(|comment| async move {
            if let Err(e) = self.visit_comment(comment).await {
                isolate("comment", comment.pid, &e);
            }
        }))
        .await;
        Ok(())
    }

    /// The inlined comments, completed from the remote when they cannot be
    /// the full set.
    async fn collect_comments(&self, post: &PostView) -> Result<Vec<CommentView>> {
        let inline_complete = post.reply_count <= INLINE_COMMENT_LIMIT
            && post.comments.len() == post.reply_count as usize;
        if inline_complete {
            return Ok(post.comments.clone());
        }

        let page = post.reply_count / COMMENT_PAGE_SIZE + 1;
        let listing = {
            let _permit = self.permit().await;
            self.client
                .list_comments(post.tid, post.pid, page, false)
                .await?
        };

        let mut by_pid: HashMap<i64, CommentView> = post
            .comments
            .iter()
            .map(|c| (c.pid, c.clone()))
            .collect();
        by_pid.extend(listing.comments.into_iter().map(|c| (c.pid, c)));
        Ok(by_pid.into_values().collect())
    }

    /// Comments are inspected at most once, ever.
    async fn visit_comment(&self, comment: &CommentView) -> Result<()> {
        if self.cursors.comment_seen(comment.pid).await? {
            return Ok(());
        }
        let item = ContentRef::from_comment(comment);
        self.review_and_execute(&item).await?;
        self.cursors
            .mark_comment_seen(comment.pid, comment.tid, comment.parent_pid)
            .await?;
        Ok(())
    }

    async fn review_and_execute(&self, item: &ContentRef) -> Result<Action> {
        let action = self.registry.review(item, &self.enabled, self.cx).await?;
        self.exec.execute(&action).await?;
        Ok(action)
    }

    async fn permit(&self) -> SemaphorePermit<'_> {
        match self.limiter.acquire().await {
            Ok(permit) => permit,
            // the limiter is owned by this sweep and never closed
            Err(_) => unreachable!("fetch limiter closed mid-sweep"),
        }
    }
}

/// One item's failure never aborts its siblings: contract violations are
/// surfaced loudly, transient remote failures quietly.
fn isolate(level: &str, id: i64, err: &ModError) {
    if err.is_transient() {
        warn!(level, id, error = %err, "item skipped after remote failure");
    } else {
        error!(level, id, error = %err, "item processing failed");
    }
}
