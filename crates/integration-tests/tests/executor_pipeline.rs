//! Executor behavior on its own: dry-run suppression, transient-failure
//! tolerance, construction contracts, and the audit trail shape.

mod common;

use std::sync::Arc;

use common::FORUM;
use domains::{
    Action, ActionKind, ContentKind, ContentRef, ForumRole, MockForumClient, ModError, Rank,
    RoleStore, UserRef,
};
use services::Executor;
use storage_adapters::MemoryStore;

fn content(kind: ContentKind) -> ContentRef {
    ContentRef {
        kind,
        forum: common::forum(),
        tid: 100,
        pid: match kind {
            ContentKind::Thread => None,
            _ => Some(200),
        },
        parent_pid: None,
        author: common::user(42, "offender", 3),
        text: "出售 加微信详聊".into(),
    }
}

fn executor(client: MockForumClient, store: Arc<MemoryStore>, dry_run: bool) -> Executor {
    Executor::new(Arc::new(client), store.clone(), store, dry_run)
}

#[tokio::test]
async fn test_dry_run_suppresses_calls_and_audit() {
    common::init_tracing();
    let store = Arc::new(MemoryStore::new());
    // no expectations: any remote call would panic
    let exec = executor(MockForumClient::new(), store.clone(), true);

    let action = Action::delete(content(ContentKind::Thread), "keyword");
    let record = exec.execute(&action).await.unwrap();

    assert!(record.is_none());
    assert!(store.audit_records().is_empty());
}

#[tokio::test]
async fn test_empty_action_is_a_no_op() {
    let store = Arc::new(MemoryStore::new());
    let exec = executor(MockForumClient::new(), store.clone(), false);

    let record = exec.execute(&Action::none()).await.unwrap();
    assert!(record.is_none());
    assert!(store.audit_records().is_empty());
}

#[tokio::test]
async fn test_gone_content_is_tolerated_without_audit() {
    let store = Arc::new(MemoryStore::new());
    let mut client = MockForumClient::new();
    client
        .expect_self_identity()
        .returning(|| Ok(common::user(1, "executor-account", 18)));
    client
        .expect_delete_thread()
        .times(1)
        .returning(|_, tid| Err(ModError::Gone(format!("thread {tid}"))));

    let exec = executor(client, store.clone(), false);
    let action = Action::delete(content(ContentKind::Thread), "keyword");
    let record = exec.execute(&action).await.unwrap();

    assert!(record.is_none(), "not executed, not an error");
    assert!(store.audit_records().is_empty());
}

#[tokio::test]
async fn test_missing_target_fails_fast() {
    let store = Arc::new(MemoryStore::new());
    let mut client = MockForumClient::new();
    client
        .expect_self_identity()
        .returning(|| Ok(common::user(1, "executor-account", 18)));

    let mut action = Action::none();
    action.kind = ActionKind::DeleteThread;
    action.notes.insert("broken".into());

    let err = executor(client, store.clone(), false)
        .execute(&action)
        .await
        .unwrap_err();
    assert!(matches!(err, ModError::Contract(_)));
    assert!(store.audit_records().is_empty());
}

#[tokio::test]
async fn test_ban_days_reach_the_remote_clamped() {
    let store = Arc::new(MemoryStore::new());
    let mut client = MockForumClient::new();
    client
        .expect_self_identity()
        .returning(|| Ok(common::user(1, "executor-account", 18)));
    client
        .expect_user_info()
        .times(1)
        .returning(|_| Ok(common::user(42, "offender", 3)));
    // 7 requested days land on the remote's 10-day bucket
    client
        .expect_ban_user()
        .withf(|forum, uid, days, reason| {
            forum == FORUM && *uid == 42 && *days == 10 && reason.contains("repeat")
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let action = Action::ban(common::forum(), UserRef::Id(42), 7, "repeat-offender");
    let record = executor(client, store.clone(), false)
        .execute(&action)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.kind, ActionKind::Ban);
    assert_eq!(record.object, "rust:offender");
    assert_eq!(store.audit_records().len(), 1);
}

#[tokio::test]
async fn test_blacklist_calls_the_remote_list() {
    let store = Arc::new(MemoryStore::new());
    let mut client = MockForumClient::new();
    client
        .expect_self_identity()
        .returning(|| Ok(common::user(1, "executor-account", 18)));
    client
        .expect_user_info()
        .times(1)
        .returning(|_| Ok(common::user(42, "offender", 3)));
    client
        .expect_add_to_blacklist()
        .withf(|forum, uid| forum == FORUM && *uid == 42)
        .times(1)
        .returning(|_, _| Ok(()));

    let action = Action::blacklist(common::forum(), UserRef::Id(42), "circumvention");
    let record = executor(client, store.clone(), false)
        .execute(&action)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.kind, ActionKind::Blacklist);
}

#[tokio::test]
async fn test_permission_edit_writes_through_the_role_store() {
    let store = Arc::new(MemoryStore::new());
    let mut client = MockForumClient::new();
    client
        .expect_self_identity()
        .returning(|| Ok(common::user(1, "executor-account", 18)));
    client
        .expect_user_info()
        .times(1)
        .returning(|_| Ok(common::user(55, "helper-user", 9)));

    let action = Action::set_role(
        common::forum(),
        UserRef::Name("helper-user".into()),
        ForumRole::new(Rank::HighAdmin),
        "高权限小吧主",
    );
    executor(client, store.clone(), false)
        .execute(&action)
        .await
        .unwrap();

    let role = store.role(55, FORUM).await.unwrap().unwrap();
    assert_eq!(role.rank, Rank::HighAdmin);
}

#[tokio::test]
async fn test_delete_and_ban_runs_both_call_sequences() {
    let store = Arc::new(MemoryStore::new());
    let mut client = MockForumClient::new();
    client
        .expect_self_identity()
        .returning(|| Ok(common::user(1, "executor-account", 18)));
    client
        .expect_delete_post()
        .times(1)
        .returning(|_, _, _| Ok(()));
    client
        .expect_ban_user()
        .withf(|_, uid, days, _| *uid == 42 && *days == 3)
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let action = Action::delete_and_ban(content(ContentKind::Post), 3, "keyword");
    let record = executor(client, store.clone(), false)
        .execute(&action)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.kind, ActionKind::DeletePostAndBan);
    assert_eq!(record.object, "rust:200:offender");
    // the note carries provenance and a bounded text preview
    assert!(record.note.contains("keyword"));
    assert!(record.note.contains("微信"));
}
