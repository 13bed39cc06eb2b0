//! Level wall: new threads from authors at or below the configured level
//! are removed. Thread-only; replies are left to the other checkers.

use async_trait::async_trait;

use domains::{Action, ContentKind, ContentRef, Result};

use crate::checker::{CheckContext, Checker};

pub struct LevelWallChecker;

#[async_trait]
impl Checker for LevelWallChecker {
    fn name(&self) -> &'static str {
        "level-wall"
    }

    fn description(&self) -> &'static str {
        "removes threads from authors below the level wall"
    }

    fn kinds(&self) -> &'static [ContentKind] {
        &[ContentKind::Thread]
    }

    async fn check(&self, item: &ContentRef, cx: &CheckContext) -> Result<Action> {
        if cx.rules.level_wall > 0 && item.author.level <= cx.rules.level_wall {
            return Ok(Action::delete(item.clone(), self.name()));
        }
        Ok(Action::none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ReviewRules;
    use domains::{ActionKind, ForumRef, MockRoleStore, UserIdentity};
    use std::sync::Arc;

    fn context(level_wall: u8) -> CheckContext {
        CheckContext {
            roles: Arc::new(MockRoleStore::new()),
            rules: ReviewRules {
                level_wall,
                ..ReviewRules::default()
            },
        }
    }

    fn thread(level: u8) -> ContentRef {
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
                level,
            },
            text: "first post".into(),
        }
    }

    #[tokio::test]
    async fn test_below_wall_is_removed() {
        let action = LevelWallChecker
            .check(&thread(2), &context(3))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::DeleteThread);
    }

    #[tokio::test]
    async fn test_above_wall_passes() {
        let action = LevelWallChecker
            .check(&thread(9), &context(3))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }

    #[tokio::test]
    async fn test_disabled_wall_passes_everyone() {
        let action = LevelWallChecker
            .check(&thread(1), &context(0))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }
}
