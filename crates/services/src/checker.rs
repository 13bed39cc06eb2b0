//! # Checker matrix
//!
//! A checker inspects one content item and proposes an action. The registry
//! holds every known checker, applies the office/trusted/enabled gating,
//! runs the survivors concurrently and folds their proposals into one
//! composite action.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::debug;

use domains::{merge_all, Action, ContentKind, ContentRef, Rank, Result, RoleStore};

use crate::checkers::{BlacklistLoopChecker, KeywordChecker, LevelWallChecker};

/// Tunables for the built-in checkers, supplied by configuration.
#[derive(Debug, Clone, Default)]
pub struct ReviewRules {
    pub keywords: Vec<String>,
    /// Keyword hits only count against authors at or below this level.
    pub keyword_max_level: u8,
    /// Threads from authors at or below this level are removed outright.
    pub level_wall: u8,
    /// Official/operator accounts exempt from most checkers.
    pub office_accounts: HashSet<i64>,
}

/// Shared read-only context handed to every checker invocation.
#[derive(Clone)]
pub struct CheckContext {
    pub roles: Arc<dyn RoleStore>,
    pub rules: ReviewRules,
}

/// A named, stateless moderation predicate bound to one or more content
/// kinds.
#[async_trait]
pub trait Checker: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Content kinds this checker inspects.
    fn kinds(&self) -> &'static [ContentKind];

    /// Skip content authored by the configured office accounts.
    fn ignore_official(&self) -> bool {
        true
    }

    /// Skip authors ranked TrustedCreator or above.
    fn ignore_trusted(&self) -> bool {
        true
    }

    /// Inspect one item. `Action::none()` is the explicit "no objection".
    async fn check(&self, item: &ContentRef, cx: &CheckContext) -> Result<Action>;
}

/// Holds the set of registered checkers; the explicit `standard()` list is
/// the only registration point.
#[derive(Default)]
pub struct CheckerRegistry {
    checkers: Vec<Arc<dyn Checker>>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        CheckerRegistry::default()
    }

    /// All built-in checkers.
    pub fn standard() -> Self {
        let mut registry = CheckerRegistry::new();
        registry.register(Arc::new(KeywordChecker));
        registry.register(Arc::new(BlacklistLoopChecker));
        registry.register(Arc::new(LevelWallChecker));
        registry
    }

    pub fn register(&mut self, checker: Arc<dyn Checker>) {
        debug!(name = checker.name(), "checker registered");
        self.checkers.push(checker);
    }

    /// Checkers bound to a content kind.
    pub fn for_kind(&self, kind: ContentKind) -> Vec<Arc<dyn Checker>> {
        self.checkers
            .iter()
            .filter(|c| c.kinds().contains(&kind))
            .cloned()
            .collect()
    }

    /// Runs every enabled checker for the item concurrently and folds the
    /// proposals into one composite action.
    ///
    /// `enabled` is the forum's configured checker allow-list; gating also
    /// exempts office accounts and trusted authors per checker flags.
    pub async fn review(
        &self,
        item: &ContentRef,
        enabled: &HashSet<String>,
        cx: &CheckContext,
    ) -> Result<Action> {
        let candidates: Vec<Arc<dyn Checker>> = self
            .for_kind(item.kind)
            .into_iter()
            .filter(|c| enabled.contains(c.name()))
            .collect();
        if candidates.is_empty() {
            return Ok(Action::none());
        }

        let official = cx.rules.office_accounts.contains(&item.author.user_id);
        // one role lookup per item, shared by every gating decision
        let role = cx
            .roles
            .role(item.author.user_id, &item.forum.name)
            .await?
            .unwrap_or_default();
        let trusted = role.rank >= Rank::TrustedCreator;

        let eligible: Vec<Arc<dyn Checker>> = candidates
            .into_iter()
            .filter(|c| !(official && c.ignore_official()))
            .filter(|c| !(trusted && c.ignore_trusted()))
            .collect();

        let proposals = join_all(eligible.iter().map(|c| c.check(item, cx))).await;
        let mut actions = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            actions.push(proposal?);
        }
        merge_all(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{ActionKind, ForumRef, ForumRole, MockRoleStore, UserIdentity, UserRef};

    struct AlwaysBan;

    #[async_trait]
    impl Checker for AlwaysBan {
        fn name(&self) -> &'static str {
            "always-ban"
        }
        fn description(&self) -> &'static str {
            "test checker that bans everyone"
        }
        fn kinds(&self) -> &'static [ContentKind] {
            &[ContentKind::Thread, ContentKind::Post, ContentKind::Comment]
        }
        async fn check(&self, item: &ContentRef, _cx: &CheckContext) -> Result<Action> {
            Ok(Action::ban(
                item.forum.clone(),
                UserRef::Id(item.author.user_id),
                1,
                self.name(),
            ))
        }
    }

    fn thread_item() -> ContentRef {
        ContentRef {
            kind: ContentKind::Thread,
            forum: ForumRef {
                fid: 1,
                name: "rust".into(),
            },
            tid: 10,
            pid: None,
            parent_pid: None,
            author: UserIdentity {
                user_id: 42,
                name: "someone".into(),
                level: 3,
            },
            text: "hello".into(),
        }
    }

    fn registry() -> CheckerRegistry {
        let mut registry = CheckerRegistry::new();
        registry.register(Arc::new(AlwaysBan));
        registry
    }

    fn context(role: Option<ForumRole>, office: Vec<i64>) -> CheckContext {
        let mut roles = MockRoleStore::new();
        roles.expect_role().returning(move |_, _| Ok(role));
        CheckContext {
            roles: Arc::new(roles),
            rules: ReviewRules {
                office_accounts: office.into_iter().collect(),
                ..ReviewRules::default()
            },
        }
    }

    fn enabled() -> HashSet<String> {
        ["always-ban".to_string()].into_iter().collect()
    }

    #[tokio::test]
    async fn test_enabled_checker_runs() {
        let action = registry()
            .review(&thread_item(), &enabled(), &context(None, vec![]))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::Ban);
    }

    #[tokio::test]
    async fn test_disabled_checker_is_skipped() {
        let action = registry()
            .review(&thread_item(), &HashSet::new(), &context(None, vec![]))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }

    #[tokio::test]
    async fn test_office_account_is_exempt() {
        let action = registry()
            .review(&thread_item(), &enabled(), &context(None, vec![42]))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }

    #[tokio::test]
    async fn test_trusted_author_is_exempt() {
        let cx = context(Some(ForumRole::new(Rank::TrustedCreator)), vec![]);
        let action = registry()
            .review(&thread_item(), &enabled(), &cx)
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }

    #[tokio::test]
    async fn test_ordinary_author_is_not_exempt() {
        let cx = context(Some(ForumRole::new(Rank::Ordinary)), vec![]);
        let action = registry()
            .review(&thread_item(), &enabled(), &cx)
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::Ban);
    }
}
