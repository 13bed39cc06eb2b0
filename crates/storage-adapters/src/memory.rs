//! # In-memory store
//!
//! Backs the persistence ports with process-local maps. Used by the test
//! suites and by dry-run experiments where durable cursors are unwanted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;

use domains::{
    AuditRecord, AuditSink, CursorStore, ExecutorDirectory, ForumClient, ForumRole, PostCursor,
    Result, RoleStore, ThreadCursor,
};

#[derive(Default)]
pub struct MemoryStore {
    threads: DashMap<i64, ThreadCursor>,
    posts: DashMap<i64, PostCursor>,
    /// pid → (tid, parent pid)
    comments: DashMap<i64, (i64, i64)>,
    roles: DashMap<(i64, String), ForumRole>,
    audit: Mutex<Vec<AuditRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Snapshot of the audit trail, for assertions.
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.audit
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Seeds a user's standing, for test setup.
    pub fn seed_role(&self, user_id: i64, forum: &str, role: ForumRole) {
        self.roles.insert((user_id, forum.to_string()), role);
    }
}

#[async_trait]
impl CursorStore for MemoryStore {
    async fn thread_cursor(&self, tid: i64) -> Result<Option<ThreadCursor>> {
        Ok(self.threads.get(&tid).map(|c| c.clone()))
    }

    async fn upsert_thread_cursor(&self, cursor: &ThreadCursor) -> Result<()> {
        self.threads.insert(cursor.tid, cursor.clone());
        Ok(())
    }

    async fn post_cursor(&self, pid: i64) -> Result<Option<PostCursor>> {
        Ok(self.posts.get(&pid).map(|c| c.clone()))
    }

    async fn upsert_post_cursor(&self, cursor: &PostCursor) -> Result<()> {
        self.posts.insert(cursor.pid, cursor.clone());
        Ok(())
    }

    async fn comment_seen(&self, pid: i64) -> Result<bool> {
        Ok(self.comments.contains_key(&pid))
    }

    async fn mark_comment_seen(&self, pid: i64, tid: i64, parent_pid: i64) -> Result<()> {
        self.comments.insert(pid, (tid, parent_pid));
        Ok(())
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        if let Ok(mut records) = self.audit.lock() {
            records.push(record.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn role(&self, user_id: i64, forum: &str) -> Result<Option<ForumRole>> {
        Ok(self
            .roles
            .get(&(user_id, forum.to_string()))
            .map(|role| *role))
    }

    async fn upsert_role(&self, user_id: i64, forum: &str, role: ForumRole) -> Result<()> {
        self.roles.insert((user_id, forum.to_string()), role);
        Ok(())
    }
}

/// Maps forum names to pre-built clients. The production directory lives
/// with the credential plumbing; this one serves tests and single-account
/// deployments.
#[derive(Default)]
pub struct StaticDirectory {
    clients: HashMap<String, Arc<dyn ForumClient>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        StaticDirectory::default()
    }

    pub fn insert(&mut self, forum: &str, client: Arc<dyn ForumClient>) {
        self.clients.insert(forum.to_string(), client);
    }
}

#[async_trait]
impl ExecutorDirectory for StaticDirectory {
    async fn executor_for(&self, forum: &str) -> Result<Option<Arc<dyn ForumClient>>> {
        Ok(self.clients.get(forum).cloned())
    }
}
