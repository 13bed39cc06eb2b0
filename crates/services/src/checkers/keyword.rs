//! Removes content containing configured keywords, unless the author has
//! leveled past the configured threshold.

use async_trait::async_trait;

use domains::{Action, ContentKind, ContentRef, Result};

use crate::checker::{CheckContext, Checker};

pub struct KeywordChecker;

#[async_trait]
impl Checker for KeywordChecker {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn description(&self) -> &'static str {
        "removes keyword hits from low-level authors"
    }

    fn kinds(&self) -> &'static [ContentKind] {
        &[ContentKind::Thread, ContentKind::Post, ContentKind::Comment]
    }

    async fn check(&self, item: &ContentRef, cx: &CheckContext) -> Result<Action> {
        if item.author.level > cx.rules.keyword_max_level {
            return Ok(Action::none());
        }
        for keyword in &cx.rules.keywords {
            if item.text.contains(keyword.as_str()) {
                return Ok(Action::delete(item.clone(), self.name()));
            }
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

    fn context(keywords: Vec<&str>, max_level: u8) -> CheckContext {
        CheckContext {
            roles: Arc::new(MockRoleStore::new()),
            rules: ReviewRules {
                keywords: keywords.into_iter().map(String::from).collect(),
                keyword_max_level: max_level,
                ..ReviewRules::default()
            },
        }
    }

    fn item(text: &str, level: u8) -> ContentRef {
        ContentRef {
            kind: ContentKind::Post,
            forum: ForumRef {
                fid: 1,
                name: "rust".into(),
            },
            tid: 10,
            pid: Some(20),
            parent_pid: None,
            author: UserIdentity {
                user_id: 42,
                name: "someone".into(),
                level,
            },
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn test_keyword_hit_deletes() {
        let action = KeywordChecker
            .check(&item("加微信详聊", 2), &context(vec!["微信"], 6))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::DeletePost);
        assert!(action.notes.contains("keyword"));
    }

    #[tokio::test]
    async fn test_high_level_author_passes() {
        let action = KeywordChecker
            .check(&item("加微信详聊", 12), &context(vec!["微信"], 6))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }

    #[tokio::test]
    async fn test_clean_text_passes() {
        let action = KeywordChecker
            .check(&item("just discussing rust", 2), &context(vec!["微信"], 6))
            .await
            .unwrap();
        assert_eq!(action.kind, ActionKind::None);
    }
}
