//! Keeps blacklisted users banned: every new piece of content from a user
//! whose role carries the blacklist flag draws a fresh 90-day ban.

use async_trait::async_trait;

use domains::{Action, ContentKind, ContentRef, Result, UserRef};

use crate::checker::{CheckContext, Checker};

const REBAN_DAYS: i32 = 90;

pub struct BlacklistLoopChecker;

#[async_trait]
impl Checker for BlacklistLoopChecker {
    fn name(&self) -> &'static str {
        "blacklist-loop"
    }

    fn description(&self) -> &'static str {
        "re-bans blacklisted users whenever they post"
    }

    fn kinds(&self) -> &'static [ContentKind] {
        &[ContentKind::Thread, ContentKind::Post, ContentKind::Comment]
    }

    async fn check(&self, item: &ContentRef, cx: &CheckContext) -> Result<Action> {
        let role = cx
            .roles
            .role(item.author.user_id, &item.forum.name)
            .await?;
        if role.is_some_and(|r| r.blacklisted) {
            return Ok(Action::ban(
                item.forum.clone(),
                UserRef::Id(item.author.user_id),
                REBAN_DAYS,
                self.name(),
            ));
        }
        Ok(Action::none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ReviewRules;
    use domains::{ActionKind, ForumRef, ForumRole, MockRoleStore, Rank, UserIdentity};
    use std::sync::Arc;

    fn item() -> ContentRef {
        ContentRef {
            kind: ContentKind::Comment,
            forum: ForumRef {
                fid: 1,
                name: "rust".into(),
            },
            tid: 10,
            pid: Some(30),
            parent_pid: Some(20),
            author: UserIdentity {
                user_id: 42,
                name: "someone".into(),
                level: 3,
            },
            text: "back again".into(),
        }
    }

    fn context(role: Option<ForumRole>) -> CheckContext {
        let mut roles = MockRoleStore::new();
        roles.expect_role().returning(move |_, _| Ok(role));
        CheckContext {
            roles: Arc::new(roles),
            rules: ReviewRules::default(),
        }
    }

    #[tokio::test]
    async fn test_blacklisted_author_is_rebanned() {
        let role = ForumRole {
            rank: Rank::Ordinary,
            blacklisted: true,
        };
        let action = BlacklistLoopChecker
            .check(&item(), &context(Some(role)))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::Ban);
        assert_eq!(action.ban_days, Some(90));
    }

    #[tokio::test]
    async fn test_clean_author_passes() {
        let action = BlacklistLoopChecker
            .check(&item(), &context(None))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }
}
