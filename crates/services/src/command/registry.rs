//! Command registry: one entry per command word. Adding a command means
//! adding a type and a `register` call; the dispatch loop never changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use domains::{
    Action, ContentKind, ContentRef, ForumClient, Mention, PostQuery, Rank, Result,
};

/// An ad-hoc moderation command issued by mentioning the listener account.
#[async_trait]
pub trait Command: Send + Sync {
    /// The first token that selects this command.
    fn word(&self) -> &'static str;

    /// Minimum rank allowed to invoke it.
    fn min_rank(&self) -> Rank;

    /// Binds positional arguments and produces the action to execute.
    /// Unbindable user input yields `Action::none()`, never an error.
    async fn run(&self, invocation: &mut Invocation<'_>) -> Result<Action>;
}

/// One parsed mention on its way into a command.
pub struct Invocation<'a> {
    pub mention: &'a Mention,
    /// Tokens after the command word, in declared order; tokens beyond a
    /// command's fields stay here as opaque trailing arguments.
    pub args: &'a [String],
    listener: &'a Arc<dyn ForumClient>,
    parent: Option<ContentRef>,
    feed_lag: Duration,
}

impl<'a> Invocation<'a> {
    pub fn new(
        mention: &'a Mention,
        args: &'a [String],
        listener: &'a Arc<dyn ForumClient>,
        parent: Option<ContentRef>,
        feed_lag: Duration,
    ) -> Self {
        Invocation {
            mention,
            args,
            listener,
            parent,
            feed_lag,
        }
    }

    /// The content the mention hangs off: thread and post mentions resolve
    /// to the thread, comment mentions to the parent post. Resolved lazily
    /// and cached; commands that never need it cost no fetch.
    pub async fn parent(&mut self) -> Result<ContentRef> {
        if let Some(parent) = &self.parent {
            return Ok(parent.clone());
        }
        let parent = resolve_parent(self.listener, self.mention, self.feed_lag).await?;
        self.parent = Some(parent.clone());
        Ok(parent)
    }
}

/// Resolves what a mention was written under. The feed lags behind the
/// content endpoints, hence the wait before fetching.
pub(crate) async fn resolve_parent(
    listener: &Arc<dyn ForumClient>,
    mention: &Mention,
    feed_lag: Duration,
) -> Result<ContentRef> {
    tokio::time::sleep(feed_lag).await;
    match mention.kind {
        ContentKind::Comment => {
            let listing = listener
                .list_comments(mention.tid, mention.pid, 1, true)
                .await?;
            Ok(ContentRef::from_post(&listing.parent))
        }
        ContentKind::Thread | ContentKind::Post => {
            let listing = listener
                .list_posts(mention.tid, PostQuery::envelope())
                .await?;
            Ok(ContentRef::from_thread(&listing.thread))
        }
    }
}

/// Maps command words to their implementations.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry::default()
    }

    /// All built-in commands.
    pub fn standard() -> Self {
        use super::builtin::{DeleteBanCommand, DeleteCommand, PingCommand, SetRoleCommand};
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(PingCommand));
        registry.register(Arc::new(DeleteCommand));
        registry.register(Arc::new(DeleteBanCommand));
        registry.register(Arc::new(SetRoleCommand));
        registry
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        debug!(word = command.word(), "command registered");
        self.commands.insert(command.word(), command);
    }

    pub fn get(&self, word: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(word)
    }
}
