#![allow(dead_code)]

//! Shared fixtures for the scenario tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use domains::{
    CommentView, ContentKind, ForumRef, Mention, MockForumClient, PostListing, PostView,
    ThreadView, UserIdentity,
};
use services::{CheckContext, CheckerRegistry, Crawler, ReviewRules};
use storage_adapters::{MemoryStore, StaticDirectory};

pub const FORUM: &str = "rust";
pub const FID: i64 = 9;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn forum() -> ForumRef {
    ForumRef {
        fid: FID,
        name: FORUM.to_string(),
    }
}

pub fn user(user_id: i64, name: &str, level: u8) -> UserIdentity {
    UserIdentity {
        user_id,
        name: name.to_string(),
        level,
    }
}

pub fn thread(tid: i64, text: &str, author: UserIdentity, last_activity: i64) -> ThreadView {
    ThreadView {
        tid,
        forum: forum(),
        title: text.chars().take(20).collect(),
        text: text.to_string(),
        author,
        last_activity,
        is_live: false,
    }
}

pub fn post(
    pid: i64,
    tid: i64,
    floor: u32,
    reply_count: u32,
    text: &str,
    author: UserIdentity,
) -> PostView {
    PostView {
        pid,
        tid,
        forum: forum(),
        floor,
        reply_count,
        author,
        text: text.to_string(),
        comments: vec![],
    }
}

pub fn comment(pid: i64, parent_pid: i64, tid: i64, text: &str, author: UserIdentity) -> CommentView {
    CommentView {
        pid,
        parent_pid,
        tid,
        forum: forum(),
        author,
        text: text.to_string(),
    }
}

pub fn mention(
    kind: ContentKind,
    tid: i64,
    pid: i64,
    text: &str,
    author: UserIdentity,
    created_at: i64,
) -> Mention {
    Mention {
        forum: forum(),
        tid,
        pid,
        kind,
        author,
        text: text.to_string(),
        created_at,
    }
}

pub fn listing(thread: ThreadView, posts: Vec<PostView>) -> PostListing {
    PostListing { thread, posts }
}

pub fn rules_with_keywords(keywords: &[&str]) -> ReviewRules {
    ReviewRules {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        keyword_max_level: 6,
        ..ReviewRules::default()
    }
}

/// A crawler over one forum, backed by the given mock client and memory
/// store, with the standard checker registry.
pub fn crawler(
    client: Arc<MockForumClient>,
    store: Arc<MemoryStore>,
    enabled: &[&str],
    rules: ReviewRules,
) -> Crawler {
    crawler_with_registry(client, store, enabled, rules, CheckerRegistry::standard())
}

pub fn crawler_with_registry(
    client: Arc<MockForumClient>,
    store: Arc<MemoryStore>,
    enabled: &[&str],
    rules: ReviewRules,
    registry: CheckerRegistry,
) -> Crawler {
    let mut directory = StaticDirectory::new();
    directory.insert(FORUM, client);

    let mut plan = HashMap::new();
    plan.insert(
        FORUM.to_string(),
        enabled.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
    );

    Crawler {
        directory: Arc::new(directory),
        cursors: store.clone(),
        audit: store.clone(),
        registry: Arc::new(registry),
        cx: CheckContext {
            roles: store,
            rules,
        },
        plan,
        fetch_permits: 8,
        dry_run: false,
    }
}
