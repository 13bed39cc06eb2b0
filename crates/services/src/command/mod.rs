//! # Command bot
//!
//! Polls the listener account's @mention feed, parses mentions into command
//! invocations, permission-gates them, and routes the resulting actions
//! through the executor under the forum's delegated credential.

mod builtin;
mod registry;

pub use builtin::{DeleteBanCommand, DeleteCommand, PingCommand, SetRoleCommand};
pub use registry::{Command, CommandRegistry, Invocation};

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use domains::{
    AuditSink, ContentKind, ContentRef, ExecutorDirectory, ForumClient, Mention, ModError,
    PostQuery, Result, RoleStore, MENTION_TRUNCATION_BYTES,
};

use crate::executor::Executor;

/// Default concurrent-mention budget, separate from the crawler's.
pub const DEFAULT_COMMAND_PERMITS: usize = 4;

/// How long the mention feed lags behind the content endpoints.
const DEFAULT_FEED_LAG: Duration = Duration::from_secs(3);

pub struct CommandBot {
    listener: Arc<dyn ForumClient>,
    /// Display name the mention prefix must match.
    listener_name: String,
    directory: Arc<dyn ExecutorDirectory>,
    roles: Arc<dyn RoleStore>,
    audit: Arc<dyn AuditSink>,
    registry: CommandRegistry,
    /// Forums the bot serves; mentions elsewhere are ignored.
    forums: HashSet<String>,
    permits: usize,
    feed_lag: Duration,
    dry_run: bool,
    /// Newest mention timestamp already processed.
    last_seen: AtomicI64,
}

impl CommandBot {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        listener: Arc<dyn ForumClient>,
        listener_name: String,
        directory: Arc<dyn ExecutorDirectory>,
        roles: Arc<dyn RoleStore>,
        audit: Arc<dyn AuditSink>,
        registry: CommandRegistry,
        forums: HashSet<String>,
        dry_run: bool,
    ) -> Self {
        CommandBot {
            listener,
            listener_name,
            directory,
            roles,
            audit,
            registry,
            forums,
            permits: DEFAULT_COMMAND_PERMITS,
            feed_lag: DEFAULT_FEED_LAG,
            dry_run,
            last_seen: AtomicI64::new(0),
        }
    }

    pub fn with_permits(mut self, permits: usize) -> Self {
        self.permits = permits;
        self
    }

    pub fn with_feed_lag(mut self, feed_lag: Duration) -> Self {
        self.feed_lag = feed_lag;
        self
    }

    /// One poll of the mention feed. Mentions newer than the watermark are
    /// processed concurrently; each failure is isolated to its mention.
    pub async fn poll_once(&self) -> Result<()> {
        let mentions = self.listener.list_mentions().await?;
        let floor = self.last_seen.load(Ordering::Acquire);
        if let Some(newest) = mentions.iter().map(|m| m.created_at).max() {
            self.last_seen.fetch_max(newest, Ordering::AcqRel);
        }

        let fresh: Vec<&Mention> = mentions
            .iter()
            .filter(|m| m.created_at > floor)
            .filter(|m| self.forums.contains(&m.forum.name))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        debug!(count = fresh.len(), "processing new mentions");

        let limiter = Semaphore::new(self.permits);
        join_all(fresh.into_iter().map(|mention| {
            let limiter = &limiter;
            async move {
                let _permit = match limiter.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => unreachable!("mention limiter closed mid-poll"),
                };
                if let Err(e) = self.handle(mention).await {
                    isolate(mention, &e);
                }
            }
        }))
        .await;
        Ok(())
    }

    async fn handle(&self, mention: &Mention) -> Result<()> {
        let Some(executor_client) =
            self.directory.executor_for(&mention.forum.name).await?
        else {
            debug!(forum = %mention.forum.name, "no appointed executor; mention ignored");
            return Ok(());
        };

        let (text, parent) = self.resolve_text(mention).await?;
        let Some(tokens) = parse_mention(&self.listener_name, &text) else {
            return Ok(());
        };
        let Some(command) = self.registry.get(&tokens[0]) else {
            debug!(word = %tokens[0], "unknown command word; mention ignored");
            return Ok(());
        };

        let role = self
            .roles
            .role(mention.author.user_id, &mention.forum.name)
            .await?
            .unwrap_or_default();
        if role.rank < command.min_rank() {
            debug!(
                issuer = %mention.author.name,
                word = command.word(),
                "insufficient rank; mention ignored"
            );
            return Ok(());
        }

        self.remove_mention(mention, &executor_client).await;

        let mut invocation =
            Invocation::new(mention, &tokens[1..], &self.listener, parent, self.feed_lag);
        let mut action = command.run(&mut invocation).await?;
        action.plugin = "command".to_string();
        action.sender = Some(mention.author.name.clone());

        let exec = Executor::new(
            executor_client,
            self.audit.clone(),
            self.roles.clone(),
            self.dry_run,
        );
        exec.execute(&action).await?;
        Ok(())
    }

    /// The full text of the mentioning content. The feed truncates long
    /// bodies, so those need a follow-up fetch, which also yields the
    /// parent content for free.
    async fn resolve_text(&self, mention: &Mention) -> Result<(String, Option<ContentRef>)> {
        if mention.text.len() < MENTION_TRUNCATION_BYTES {
            return Ok((mention.text.clone(), None));
        }
        tokio::time::sleep(self.feed_lag).await;
        match mention.kind {
            ContentKind::Comment => {
                let listing = self
                    .listener
                    .list_comments(mention.tid, mention.pid, 1, true)
                    .await?;
                let comment = listing
                    .comments
                    .iter()
                    .find(|c| c.pid == mention.pid)
                    .ok_or_else(|| ModError::Gone(format!("comment {}", mention.pid)))?;
                Ok((
                    comment.text.clone(),
                    Some(ContentRef::from_post(&listing.parent)),
                ))
            }
            ContentKind::Thread => {
                let listing = self
                    .listener
                    .list_posts(mention.tid, PostQuery::envelope())
                    .await?;
                Ok((
                    listing.thread.text.clone(),
                    Some(ContentRef::from_thread(&listing.thread)),
                ))
            }
            ContentKind::Post => {
                let listing = self
                    .listener
                    .list_posts(mention.tid, PostQuery::newest())
                    .await?;
                let text = listing
                    .posts
                    .iter()
                    .find(|p| p.pid == mention.pid)
                    .map(|p| p.text.clone())
                    .unwrap_or_default();
                Ok((text, Some(ContentRef::from_thread(&listing.thread))))
            }
        }
    }

    /// The command message itself is cleaned up before the command runs.
    /// Best-effort: a failure here never blocks the command.
    async fn remove_mention(&self, mention: &Mention, client: &Arc<dyn ForumClient>) {
        if self.dry_run {
            debug!(pid = mention.pid, "dry-run: command message kept");
            return;
        }
        let result = match mention.kind {
            ContentKind::Thread => client.delete_thread(mention.forum.fid, mention.tid).await,
            ContentKind::Post | ContentKind::Comment => {
                client
                    .delete_post(mention.forum.fid, mention.tid, mention.pid)
                    .await
            }
        };
        if let Err(e) = result {
            warn!(pid = mention.pid, error = %e, "could not remove command message");
        }
    }
}

/// Splits a mention body into command tokens: the body must start with the
/// `@listener ` prefix and contain at least a command word.
pub fn parse_mention(listener: &str, text: &str) -> Option<Vec<String>> {
    let prefix = format!("@{listener} ");
    let rest = text.strip_prefix(&prefix)?;
    let tokens: Vec<String> = rest.split_whitespace().map(str::to_owned).collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

fn isolate(mention: &Mention, err: &ModError) {
    if err.is_transient() {
        warn!(pid = mention.pid, error = %err, "mention skipped after remote failure");
    } else {
        error!(pid = mention.pid, error = %err, "mention processing failed");
    }
}
